//! Top-level program shape and the variadic-pack wrapper used throughout
//! the generic/template syntax (parameter packs, argument packs).

use crate::decl::Declaration;
use crate::expr::Expr;
use crate::ty::Type;
use std::rc::Rc;

/// One element of a possibly-variadic list: `T` for an ordinary entry,
/// `T...` for a pack expansion. Mirrors the original `VariadicItem<T>`.
#[derive(Clone, Debug)]
pub struct VariadicItem<T> {
    pub item: T,
    pub is_variadic: bool,
}

impl<T> VariadicItem<T> {
    pub fn new(item: T) -> Self {
        VariadicItem { item, is_variadic: false }
    }

    pub fn variadic(item: T) -> Self {
        VariadicItem { item, is_variadic: true }
    }
}

pub type VariadicList<T> = Vec<VariadicItem<T>>;

/// A generic argument at a template-id use site: `Foo<int, N>` has two,
/// one a type argument, one a value argument.
#[derive(Clone, Debug)]
pub struct GenericArgument {
    pub ty: Option<Rc<Type>>,
    pub expr: Option<Rc<Expr>>,
}

/// An entire preprocessed, parsed translation unit: an ordered list of
/// top-level declarations. This is the root input to the Declaration
/// Driver (C8).
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub decls: Vec<Rc<Declaration>>,
    /// Count of forward declarations synthesized for a bare C-style type
    /// reference (e.g. `struct Foo* p;` with no prior `struct Foo;`),
    /// carried through from the original implementation for parity with
    /// its forward-declaration bookkeeping.
    pub created_forward_decl_by_c_style_type_reference: u32,
}
