//! The interner: the only place a [`TypeKey`] is built. Every public factory
//! method here is responsible for putting its result into canonical form
//! before hashing it, so that structural equality reduces to `TypeId`
//! equality (spec invariant 1).

use crate::key::{
    CvFlags, FunctionFlags, FunctionKey, GenericArgKey, InitItem, PrimitiveKind, PrimitiveType,
    TypeKey,
};
use crate::{TypeId, queries::ValueCategory};
use cppdoc_common::SymbolId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Index order of the pre-registered intrinsics, fixed at construction so
/// that e.g. `TypeInterner::VOID` is a compile-time constant rather than a
/// lookup.
#[repr(u32)]
enum FixedSlot {
    Void,
    Bool,
    Int,
    UnsignedInt,
    Char,
    UnsignedChar,
    WCharT,
    Float,
    Double,
    Zero,
    Nullptr,
    Any,
    IntPtr,
}

/// Hash-consing table mapping structural [`TypeKey`]s to [`TypeId`] handles.
///
/// One `TypeInterner` is created per checking session (spec §5: "exactly one
/// `TypeInterner`... for the lifetime of a checking session") and is never
/// mutated concurrently; all sharing across threads, if any, happens through
/// `&TypeInterner` after construction settles into steady state, mirroring
/// the teacher's `tsz-solver::TypeInterner`.
#[derive(Debug)]
pub struct TypeInterner {
    keys: Vec<TypeKey>,
    index: FxHashMap<TypeKey, TypeId>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub const VOID: TypeId = TypeId(FixedSlot::Void as u32);
    pub const BOOL: TypeId = TypeId(FixedSlot::Bool as u32);
    pub const INT: TypeId = TypeId(FixedSlot::Int as u32);
    pub const UNSIGNED_INT: TypeId = TypeId(FixedSlot::UnsignedInt as u32);
    pub const CHAR: TypeId = TypeId(FixedSlot::Char as u32);
    pub const UNSIGNED_CHAR: TypeId = TypeId(FixedSlot::UnsignedChar as u32);
    pub const WCHAR_T: TypeId = TypeId(FixedSlot::WCharT as u32);
    pub const FLOAT: TypeId = TypeId(FixedSlot::Float as u32);
    pub const DOUBLE: TypeId = TypeId(FixedSlot::Double as u32);
    pub const ZERO: TypeId = TypeId(FixedSlot::Zero as u32);
    pub const NULLPTR: TypeId = TypeId(FixedSlot::Nullptr as u32);
    pub const ANY: TypeId = TypeId(FixedSlot::Any as u32);
    pub const INT_PTR: TypeId = TypeId(FixedSlot::IntPtr as u32);

    pub fn new() -> Self {
        let mut interner = TypeInterner { keys: Vec::new(), index: FxHashMap::default() };
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::Void, width: 0 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::Bool, width: 1 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::SignedInt, width: 32 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::UnsignedInt, width: 32 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::SignedChar, width: 8 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::UnsignedChar, width: 8 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::UnsignedWideChar, width: 16 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::Float, width: 32 }));
        interner.intern(TypeKey::Primitive(PrimitiveType { kind: PrimitiveKind::Float, width: 64 }));
        interner.intern(TypeKey::Zero);
        interner.intern(TypeKey::Nullptr);
        interner.intern(TypeKey::Any);
        interner.intern(TypeKey::IntPtr);
        debug_assert_eq!(interner.keys.len(), 13, "FixedSlot table drifted out of sync with new()");
        interner
    }

    fn intern(&mut self, key: TypeKey) -> TypeId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = TypeId(self.keys.len() as u32);
        self.keys.push(key.clone());
        self.index.insert(key, id);
        id
    }

    pub(crate) fn key(&self, id: TypeId) -> &TypeKey {
        &self.keys[id.index()]
    }

    /// Applies `const`/`volatile` qualification, merging into an existing
    /// `Cv` node and lifting through references so that `cv(ref(T))`
    /// canonicalizes to `ref(cv(T))` (spec §4.1, invariant: "cv applied to a
    /// reference lifts to the referent").
    pub fn cv(&mut self, inner: TypeId, flags: CvFlags) -> TypeId {
        if flags.is_empty() {
            return inner;
        }
        match self.key(inner).clone() {
            TypeKey::Cv(base, existing) => {
                let merged = existing | flags;
                self.intern(TypeKey::Cv(base, merged))
            }
            TypeKey::LRef(referent) => {
                let qualified = self.cv(referent, flags);
                self.intern(TypeKey::LRef(qualified))
            }
            TypeKey::RRef(referent) => {
                let qualified = self.cv(referent, flags);
                self.intern(TypeKey::RRef(qualified))
            }
            _ => self.intern(TypeKey::Cv(inner, flags)),
        }
    }

    /// Forms an lvalue reference. Collapses nested references per the
    /// reference-collapsing rule: lvalue reference always wins (`T& &` and
    /// `T&& &` both collapse to `T&`).
    pub fn lref(&mut self, inner: TypeId) -> TypeId {
        match self.key(inner).clone() {
            TypeKey::LRef(referent) | TypeKey::RRef(referent) => self.intern(TypeKey::LRef(referent)),
            _ => self.intern(TypeKey::LRef(inner)),
        }
    }

    /// Forms an rvalue reference. `T& &&` collapses to `T&` (lref still
    /// wins); only `T&& &&` stays `T&&`.
    pub fn rref(&mut self, inner: TypeId) -> TypeId {
        match self.key(inner).clone() {
            TypeKey::LRef(referent) => self.intern(TypeKey::LRef(referent)),
            TypeKey::RRef(referent) => self.intern(TypeKey::RRef(referent)),
            _ => self.intern(TypeKey::RRef(inner)),
        }
    }

    /// Constructs (or reuses) a primitive type of the given kind and width.
    /// The nine intrinsic widths registered by `new()` are reused via the
    /// ordinary hash-cons path; anything else (e.g. a 16-bit `short`) is
    /// interned fresh the first time it is requested.
    pub fn primitive(&mut self, kind: PrimitiveKind, width: u8) -> TypeId {
        self.intern(TypeKey::Primitive(PrimitiveType { kind, width }))
    }

    pub fn ptr(&mut self, inner: TypeId) -> TypeId {
        self.intern(TypeKey::Ptr(inner))
    }

    /// Forms an array of `inner` with the given outermost rank. Nesting
    /// `Array(Array(T, m), n)` merges into a single node by summing the
    /// ranks rather than stacking array-of-array wrappers (spec §4.1: "array
    /// rank merging").
    pub fn array(&mut self, inner: TypeId, rank: u64) -> TypeId {
        if rank == 0 {
            return inner;
        }
        match self.key(inner).clone() {
            TypeKey::Array(elem, existing_rank) => self.intern(TypeKey::Array(elem, existing_rank + rank)),
            _ => self.intern(TypeKey::Array(inner, rank)),
        }
    }

    pub fn member(&mut self, owner: TypeId, inner: TypeId) -> TypeId {
        self.intern(TypeKey::Member(owner, inner))
    }

    pub fn function(&mut self, ret: TypeId, params: SmallVec<[TypeId; 4]>, flags: FunctionFlags) -> TypeId {
        self.intern(TypeKey::Function(FunctionKey { ret, params, flags }))
    }

    pub fn generic_function(&mut self, ret: TypeId, params: SmallVec<[TypeId; 4]>, flags: FunctionFlags) -> TypeId {
        self.intern(TypeKey::GenericFunction(FunctionKey { ret, params, flags }))
    }

    pub fn decl(&mut self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKey::Decl(symbol))
    }

    pub fn decl_instant(&mut self, symbol: SymbolId, parent: Option<TypeId>, args: SmallVec<[TypeId; 4]>) -> TypeId {
        self.intern(TypeKey::DeclInstant(crate::key::DeclInstantKey { symbol, parent, args }))
    }

    pub fn generic_arg(&mut self, owner_decl: SymbolId, arg_index: u32, arg_symbol: SymbolId) -> TypeId {
        self.intern(TypeKey::GenericArg(GenericArgKey { owner_decl, arg_index, arg_symbol }))
    }

    pub fn init(&mut self, items: impl IntoIterator<Item = (TypeId, ValueCategory)>) -> TypeId {
        let items: SmallVec<[InitItem; 4]> =
            items.into_iter().map(|(ty, category)| InitItem { ty, category }).collect();
        self.intern(TypeKey::Init(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_is_id_equality() {
        let mut i = TypeInterner::new();
        let a = i.ptr(TypeInterner::INT);
        let b = i.ptr(TypeInterner::INT);
        assert_eq!(a, b);
    }

    #[test]
    fn cv_merges_and_is_idempotent() {
        let mut i = TypeInterner::new();
        let c = i.cv(TypeInterner::INT, CvFlags::CONST);
        let cv = i.cv(c, CvFlags::VOLATILE);
        let cv_again = i.cv(cv, CvFlags::CONST);
        assert_eq!(cv, cv_again);
        match i.key(cv) {
            TypeKey::Cv(base, flags) => {
                assert_eq!(*base, TypeInterner::INT);
                assert_eq!(*flags, CvFlags::CONST | CvFlags::VOLATILE);
            }
            other => panic!("expected Cv, got {other:?}"),
        }
    }

    #[test]
    fn lref_wins_over_rref_on_collapse() {
        let mut i = TypeInterner::new();
        let rref = i.rref(TypeInterner::INT);
        let collapsed = i.lref(rref);
        assert_eq!(i.key(collapsed), &TypeKey::LRef(TypeInterner::INT));

        let lref = i.lref(TypeInterner::INT);
        let still_lref = i.rref(lref);
        assert_eq!(still_lref, lref);
    }

    #[test]
    fn cv_lifts_into_reference() {
        let mut i = TypeInterner::new();
        let lref = i.lref(TypeInterner::INT);
        let qualified = i.cv(lref, CvFlags::CONST);
        match i.key(qualified) {
            TypeKey::LRef(inner) => {
                assert_eq!(i.key(*inner), &TypeKey::Cv(TypeInterner::INT, CvFlags::CONST));
            }
            other => panic!("expected LRef, got {other:?}"),
        }
    }

    #[test]
    fn array_rank_merges_on_renesting() {
        let mut i = TypeInterner::new();
        let arr3 = i.array(TypeInterner::INT, 3);
        let arr5 = i.array(arr3, 2);
        assert_eq!(i.key(arr5), &TypeKey::Array(TypeInterner::INT, 5));
    }
}
