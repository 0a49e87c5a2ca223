//! Parser-output node shapes consumed by the cppdoc semantic core.
//!
//! The preprocessor, lexer, and parser are external collaborators (spec §1):
//! this crate only defines the *shape* of what they hand to the core — the
//! declaration/type/expression/statement syntax trees — never how to
//! produce it from source text.
//!
//! Nodes are tagged variants (no visitor-class hierarchy, per the design
//! notes: "tagged variants with exhaustive pattern matching replace visitor
//! classes"), shared by `Rc` the way the original `Ptr<T>` reference-counted
//! pointers are: the tree is acyclic and never mutated in place, except for
//! the single post-parse back-pointer from a declaration to its symbol.

pub mod decl;
pub mod expr;
pub mod name;
pub mod program;
pub mod stat;
pub mod ty;

pub use decl::{
    AccessSpecifier, BaseSpecifier, ClassTag, Declaration, DeclarationKind, Declarator, EnumTag,
    FunctionBody, Initializer, InitializerKind,
};
pub use expr::{
    BinaryOp, CharPrefix, Expr, FloatSuffix, IntegerSuffix, Literal, MemberAccessOp, UnaryOp,
};
pub use name::{CppName, CppNameType};
pub use program::{GenericArgument, Program, VariadicItem, VariadicList};
pub use stat::{Stat, StatKind};
pub use ty::{CvQualifiers, GenericArgNode, PrimitiveKeyword, RefQualifier, Type};
