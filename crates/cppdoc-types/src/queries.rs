//! Structural queries over interned types: decomposing cv/ref wrappers,
//! walking into function signatures, and classifying the unknown marker
//! types used while evaluation is still in flight.

use crate::intern::TypeInterner;
use crate::key::{CvFlags, PrimitiveKind, PrimitiveType, TypeKey};
use crate::TypeId;
use cppdoc_common::SymbolId;
use smallvec::SmallVec;

/// C++ value category, tagging an expression rather than a type (spec §3:
/// "expression types are tagged with a value category").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    LValue,
    XValue,
    PRValue,
}

/// The result of stripping cv-qualification and reference-ness off a type,
/// down to its entity (spec invariant 4: `entity_of(cv(ref(T,r),c)) ==
/// (entity_of(T), c, r)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decomposed {
    pub entity: TypeId,
    pub cv: CvFlags,
    pub ref_kind: Option<crate::key::RefKind>,
}

impl TypeInterner {
    /// Strips any outer `LRef`/`RRef` and `Cv` wrapper, returning the bare
    /// entity type together with what was stripped. Because `Cv` is always
    /// canonicalized to sit inside a reference (never outside one), this
    /// only ever needs to look at most two levels deep.
    pub fn decompose(&self, id: TypeId) -> Decomposed {
        match self.key(id).clone() {
            TypeKey::LRef(inner) => {
                let mut inner_decomposed = self.decompose(inner);
                inner_decomposed.ref_kind = Some(crate::key::RefKind::LRef);
                inner_decomposed
            }
            TypeKey::RRef(inner) => {
                let mut inner_decomposed = self.decompose(inner);
                inner_decomposed.ref_kind = Some(crate::key::RefKind::RRef);
                inner_decomposed
            }
            TypeKey::Cv(inner, flags) => Decomposed { entity: inner, cv: flags, ref_kind: None },
            _ => Decomposed { entity: id, cv: CvFlags::empty(), ref_kind: None },
        }
    }

    /// The entity type with all cv/ref wrapping removed.
    pub fn entity_of(&self, id: TypeId) -> TypeId {
        self.decompose(id).entity
    }

    /// For `Ptr`/`Array`/`Member`/`LRef`/`RRef`, the type one level inside.
    /// Returns `None` for entity types that do not wrap another type.
    pub fn element_of(&self, id: TypeId) -> Option<TypeId> {
        match self.key(id) {
            TypeKey::Ptr(inner) => Some(*inner),
            TypeKey::Array(inner, _) => Some(*inner),
            TypeKey::Member(_, inner) => Some(*inner),
            TypeKey::LRef(inner) | TypeKey::RRef(inner) => Some(*inner),
            TypeKey::Cv(inner, _) => Some(*inner),
            _ => None,
        }
    }

    /// Number of formal parameters of a `Function`/`GenericFunction` type.
    /// Panics if `id` is not a function type; callers are expected to have
    /// already checked the type's shape (mirrors the teacher's solver
    /// queries, which assume a caller-validated entity).
    pub fn param_count(&self, id: TypeId) -> usize {
        match self.key(id) {
            TypeKey::Function(f) | TypeKey::GenericFunction(f) => f.params.len(),
            _ => panic!("param_count called on a non-function TypeId"),
        }
    }

    pub fn param(&self, id: TypeId, index: usize) -> TypeId {
        match self.key(id) {
            TypeKey::Function(f) | TypeKey::GenericFunction(f) => f.params[index],
            _ => panic!("param called on a non-function TypeId"),
        }
    }

    pub fn return_type(&self, id: TypeId) -> TypeId {
        match self.key(id) {
            TypeKey::Function(f) | TypeKey::GenericFunction(f) => f.ret,
            _ => panic!("return_type called on a non-function TypeId"),
        }
    }

    /// Whether `id` is one of the "evaluation is still pending" markers
    /// (`Any`, a bare `GenericArg`) that C4/C5 must treat as deferring
    /// rather than failing outright.
    pub fn is_unknown(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Any | TypeKey::GenericArg(_))
    }

    pub fn is_function(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Function(_) | TypeKey::GenericFunction(_))
    }

    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::LRef(_) | TypeKey::RRef(_))
    }

    /// The declaration symbol behind a `Decl`/`DeclInstant` type, or `None`
    /// for anything else (primitives, pointers, functions, ...). Used by
    /// name resolution to turn a base-class type back into the symbol whose
    /// scope should be searched.
    pub fn as_decl_symbol(&self, id: TypeId) -> Option<SymbolId> {
        match self.key(id) {
            TypeKey::Decl(sym) => Some(*sym),
            TypeKey::DeclInstant(instant) => Some(instant.symbol),
            _ => None,
        }
    }

    /// `(symbol, parent-decl-type, ordered args)` behind a `DeclInstant`,
    /// or `None` if `id` is not one.
    pub fn decl_instant_parts(&self, id: TypeId) -> Option<(SymbolId, Option<TypeId>, SmallVec<[TypeId; 4]>)> {
        match self.key(id) {
            TypeKey::DeclInstant(instant) => Some((instant.symbol, instant.parent, instant.args.clone())),
            _ => None,
        }
    }

    /// `(owning template, argument index, placeholder symbol)` behind a
    /// `GenericArg`, or `None` if `id` is not one.
    pub fn generic_arg_parts(&self, id: TypeId) -> Option<(SymbolId, u32, SymbolId)> {
        match self.key(id) {
            TypeKey::GenericArg(g) => Some((g.owner_decl, g.arg_index, g.arg_symbol)),
            _ => None,
        }
    }

    /// `(kind, width)` behind a `Primitive`, or `None` otherwise.
    pub fn primitive_parts(&self, id: TypeId) -> Option<(PrimitiveKind, u8)> {
        match self.key(id) {
            TypeKey::Primitive(p) => Some((p.kind, p.width)),
            _ => None,
        }
    }

    pub fn is_primitive(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Primitive(_))
    }

    pub fn is_ptr(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Ptr(_))
    }

    /// The element type and rank of an `Array`, or `None` otherwise.
    pub fn array_parts(&self, id: TypeId) -> Option<(TypeId, u64)> {
        match self.key(id) {
            TypeKey::Array(elem, rank) => Some((*elem, *rank)),
            _ => None,
        }
    }

    /// Owner and pointee of a pointer-to-member `Member` type.
    pub fn member_parts(&self, id: TypeId) -> Option<(TypeId, TypeId)> {
        match self.key(id) {
            TypeKey::Member(owner, inner) => Some((*owner, *inner)),
            _ => None,
        }
    }

    pub fn function_flags(&self, id: TypeId) -> Option<crate::key::FunctionFlags> {
        match self.key(id) {
            TypeKey::Function(f) | TypeKey::GenericFunction(f) => Some(f.flags),
            _ => None,
        }
    }

    pub fn is_generic_function(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::GenericFunction(_))
    }

    pub fn init_items(&self, id: TypeId) -> Option<SmallVec<[crate::key::InitItem; 4]>> {
        match self.key(id) {
            TypeKey::Init(items) => Some(items.clone()),
            _ => None,
        }
    }

    pub fn is_zero(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Zero)
    }

    pub fn is_nullptr(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Nullptr)
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Primitive(PrimitiveType { kind: crate::key::PrimitiveKind::Void, .. }))
    }

    /// Whether `id` names a class-like entity (`Decl`/`DeclInstant`), as
    /// opposed to a primitive/pointer/function/etc. Does not itself check
    /// the pointed-to symbol's `SymbolKind` — `cppdoc-sema` does that once
    /// it has the symbol table in hand.
    pub fn is_decl_like(&self, id: TypeId) -> bool {
        matches!(self.key(id), TypeKey::Decl(_) | TypeKey::DeclInstant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RefKind;

    #[test]
    fn entity_of_strips_cv_and_ref() {
        let mut i = TypeInterner::new();
        let qualified = i.cv(TypeInterner::INT, CvFlags::CONST);
        let reffed = i.lref(qualified);

        let decomposed = i.decompose(reffed);
        assert_eq!(decomposed.entity, TypeInterner::INT);
        assert_eq!(decomposed.cv, CvFlags::CONST);
        assert_eq!(decomposed.ref_kind, Some(RefKind::LRef));
        assert_eq!(i.entity_of(reffed), TypeInterner::INT);
    }

    #[test]
    fn unqualified_type_decomposes_to_itself() {
        let i = TypeInterner::new();
        let decomposed = i.decompose(TypeInterner::INT);
        assert_eq!(decomposed.entity, TypeInterner::INT);
        assert!(decomposed.cv.is_empty());
        assert_eq!(decomposed.ref_kind, None);
    }

    #[test]
    fn any_and_generic_arg_are_unknown() {
        let mut i = TypeInterner::new();
        assert!(i.is_unknown(TypeInterner::ANY));
        assert!(!i.is_unknown(TypeInterner::INT));
        let arg = i.generic_arg(cppdoc_common::SymbolId(0), 0, cppdoc_common::SymbolId(1));
        assert!(i.is_unknown(arg));
    }

    #[test]
    fn function_queries_read_back_params_and_return() {
        let mut i = TypeInterner::new();
        let params = smallvec::smallvec![TypeInterner::INT, TypeInterner::BOOL];
        let f = i.function(TypeInterner::VOID, params, crate::key::FunctionFlags::empty());
        assert!(i.is_function(f));
        assert_eq!(i.param_count(f), 2);
        assert_eq!(i.param(f, 0), TypeInterner::INT);
        assert_eq!(i.param(f, 1), TypeInterner::BOOL);
        assert_eq!(i.return_type(f), TypeInterner::VOID);
    }
}
