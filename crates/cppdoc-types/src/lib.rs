//! C1 — the Type Universe.
//!
//! A hash-consed, immutable type graph: every type is interned, so
//! structural equality is pointer (here, index) equality. This crate owns
//! construction, canonicalization, and the structural queries (`entity_of`,
//! `element_of`, ...) that the rest of the semantic core builds on.
//!
//! Grounded on the teacher's `tsz-solver` crate: a `TypeInterner` mapping a
//! structural `TypeKey` to a small `Copy` `TypeId` handle, with intrinsics
//! pre-registered at fixed indices and all other construction quarantined
//! to `intern.rs` (see `tsz-solver/src/tests/typekey_contract_tests.rs`,
//! which asserts exactly that quarantine).

mod intern;
mod key;
mod queries;

pub use intern::TypeInterner;
pub use key::{
    CvFlags, DeclInstantKey, FunctionFlags, FunctionKey, GenericArgKey, InitItem, PrimitiveKind,
    PrimitiveType, RefKind, TypeKey,
};
pub use queries::{Decomposed, ValueCategory};

/// A handle to an interned, canonical type. Cheap to copy and compare;
/// equal `TypeId`s always denote structurally equal types (spec invariant
/// 1: "∀ constructors `c`, `c(x) == c(x)`").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
