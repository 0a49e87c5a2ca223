//! Centralized limits and thresholds.
//!
//! A handful of recursion/worklist guards used by the mutually recursive
//! C3–C7 algorithms, so a malformed or pathologically recursive translation
//! unit fails with a typed [`crate::diagnostics::Failure`] rather than
//! overflowing the stack.

/// Maximum depth for the inheritance BFS walk (§4.3) before it is treated as
/// a (diagnosable) cycle rather than silently looping forever.
pub const MAX_BASE_CLASS_WALK_DEPTH: usize = 4096;

/// Maximum number of candidates considered in one overload resolution call
/// (§4.6), bounding pathological operator-lookup unions.
pub const MAX_OVERLOAD_CANDIDATES: usize = 8192;

/// Maximum number of base-class substitutions explored by match-base-class
/// backtracking (§4.7 MBC) before the search is abandoned as non-terminating.
pub const MAX_MBC_GRID_EXPANSIONS: usize = 4096;

/// Maximum chain length walked when resolving a `TemplateArgumentContext`
/// parent chain (§3 Template Argument Context).
pub const MAX_ARGUMENT_CONTEXT_CHAIN: usize = 1024;
