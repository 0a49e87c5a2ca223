//! `TypeKey` — the structural shape behind a `TypeId`, and its component
//! flag/value types.

use crate::TypeId;
use cppdoc_common::SymbolId;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Bool,
    SignedInt,
    UnsignedInt,
    SignedChar,
    UnsignedChar,
    UnsignedWideChar,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveType {
    pub kind: PrimitiveKind,
    pub width: u8,
}

bitflags::bitflags! {
    /// `const`/`volatile` qualification. Never nests: a second application
    /// merges into the existing set (spec invariant 2).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CvFlags: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    LRef,
    RRef,
}

bitflags::bitflags! {
    /// Flags carried on a `Function` type: calling convention bits plus the
    /// function's own cv/ref qualification and variadic ellipsis.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FunctionFlags: u16 {
        const VARIADIC_ELLIPSIS = 1 << 0;
        const CONST = 1 << 1;
        const VOLATILE = 1 << 2;
        const REF_LVALUE = 1 << 3;
        const REF_RVALUE = 1 << 4;
        const CC_CDECL = 1 << 5;
        const CC_STDCALL = 1 << 6;
        const CC_FASTCALL = 1 << 7;
        const CC_THISCALL = 1 << 8;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub ret: TypeId,
    pub params: SmallVec<[TypeId; 4]>,
    pub flags: FunctionFlags,
}

/// One element of an `Init` (brace-initializer) bundle: the element's type
/// together with its value category, per spec §3 ("Init(items*) carrying
/// each element's value-category").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InitItem {
    pub ty: TypeId,
    pub category: crate::queries::ValueCategory,
}

/// Identity key for a template-class instantiation: `(symbol, ordered args,
/// parent)` per spec §3.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeclInstantKey {
    pub symbol: SymbolId,
    pub parent: Option<TypeId>,
    pub args: SmallVec<[TypeId; 4]>,
}

/// A template-parameter placeholder bound to an owning template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GenericArgKey {
    pub owner_decl: SymbolId,
    pub arg_index: u32,
    pub arg_symbol: SymbolId,
}

/// The structural shape of one interned type node.
///
/// Canonical form invariants (enforced by the factory functions in
/// `intern.rs`, never by constructing this enum directly):
/// - `Cv` never wraps another `Cv` (merges).
/// - `Cv` never wraps `LRef`/`RRef` directly (lifts to the referent).
/// - `LRef`/`RRef` never wrap another `LRef`/`RRef` (collapses, lref wins).
/// - `Array` never wraps another `Array` at depth 1 (bumps rank instead).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Primitive(PrimitiveType),
    LRef(TypeId),
    RRef(TypeId),
    Ptr(TypeId),
    Array(TypeId, u64),
    Cv(TypeId, CvFlags),
    Member(TypeId, TypeId),
    Function(FunctionKey),
    Decl(SymbolId),
    DeclInstant(DeclInstantKey),
    GenericArg(GenericArgKey),
    GenericFunction(FunctionKey),
    Init(SmallVec<[InitItem; 4]>),
    Zero,
    Nullptr,
    Any,
    IntPtr,
}
