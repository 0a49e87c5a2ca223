//! Lightweight cross-crate handles.
//!
//! `SymbolId` is defined here (rather than in `cppdoc-symbols`) so that
//! `cppdoc-ast` can carry a back-pointer from a `Declaration`/`Stat` to its
//! owning symbol without creating a dependency cycle: the parser-output
//! crate never needs to know how `cppdoc-symbols` represents a symbol, only
//! that a small `Copy` handle identifies one.

/// Identifies a `Symbol` inside a `SymbolArena` (see `cppdoc-symbols`).
/// Never reused across symbols within one analysis session; stable for the
/// lifetime of the session (spec §3 Lifecycles).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn from_index(index: usize) -> Self {
        SymbolId(index as u32)
    }
}
