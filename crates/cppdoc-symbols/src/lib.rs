//! C2 — the Symbol Table.
//!
//! A tree of [`Symbol`]s rooted at a translation unit: every scope (root,
//! namespace, class, function) is itself a symbol, and its children are
//! looked up by name into an *ordered list* rather than a single slot, so
//! that overload sets and repeated forward declarations have somewhere to
//! live (spec §4.2).
//!
//! Grounded on the teacher's `tsz-binder` crate: a growable arena of
//! symbols addressed by a small `Copy` id (`SymbolArena`/`SymbolId`), with
//! a separate flags/kind tag per symbol and lazily-populated caches hung
//! off individual symbols rather than recomputed on every query.

mod arena;
mod symbol;
mod table;

pub use arena::SymbolArena;
pub use symbol::{ClassMemberCache, EvaluationCache, Symbol, SymbolKind};
pub use table::SymbolTable;

pub use cppdoc_common::SymbolId;
