//! Declaration nodes: the top-level and member syntax the Declaration
//! Driver (C8) walks to populate the symbol table.

use crate::expr::Expr;
use crate::name::CppName;
use crate::ty::Type;
use cppdoc_common::{SymbolId, Span};
use std::cell::Cell;
use std::rc::Rc;

/// `= expr`, `(args)`, or `{args}` initialization, each carrying a
/// possibly-variadic argument list (variadic only in a pack-expansion
/// context, e.g. a base-class initializer list).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InitializerKind {
    Equal,
    Constructor,
    Universal,
}

#[derive(Clone, Debug)]
pub struct Initializer {
    pub kind: InitializerKind,
    pub arguments: Vec<crate::program::VariadicItem<Rc<Expr>>>,
}

/// One declared entity within a declaration (`int a, *b, c[3];` has three).
#[derive(Clone, Debug)]
pub struct Declarator {
    pub ty: Rc<Type>,
    pub ellipsis: bool,
    pub name: CppName,
    pub initializer: Option<Initializer>,
}

/// A single declaration, tagged by kind.
///
/// Every variant carries the common `name` and a `symbol` cell: the
/// back-pointer to the owning `Symbol`, written exactly once by the
/// Declaration Driver after the symbol is created (spec §3: "every
/// Declaration carries a name and back-pointer to its owning symbol after
/// the Declaration Driver runs"). The tree itself is otherwise immutable
/// and shared by `Rc`, so this is the one deliberate exception, modeled as
/// a `Cell` rather than by rebuilding the tree.
#[derive(Debug)]
pub struct Declaration {
    pub name: CppName,
    pub span: Span,
    pub implicitly_generated_member: bool,
    pub symbol: Cell<Option<SymbolId>>,
    pub kind: DeclarationKind,
}

impl Declaration {
    pub fn new(name: CppName, span: Span, kind: DeclarationKind) -> Self {
        Declaration { name, span, implicitly_generated_member: false, symbol: Cell::new(None), kind }
    }

    pub fn implicit(name: CppName, span: Span, kind: DeclarationKind) -> Self {
        Declaration { name, span, implicitly_generated_member: true, symbol: Cell::new(None), kind }
    }

    pub fn attach_symbol(&self, id: SymbolId) {
        self.symbol.set(Some(id));
    }

    pub fn symbol_id(&self) -> Option<SymbolId> {
        self.symbol.get()
    }
}

#[derive(Debug)]
pub enum DeclarationKind {
    /// `class Foo;` / `struct Foo;` with no body — a forward declaration
    /// of a class-like entity.
    Forward { tag: ClassTag },
    Variable { declarator: Declarator, is_extern: bool, is_static: bool },
    Function { declarator: Declarator, is_static: bool, is_virtual: bool, params: Vec<Rc<Declaration>>, body: Option<FunctionBody> },
    Enum { tag: EnumTag, is_scoped: bool, underlying: Option<Rc<Type>>, items: Vec<Rc<Declaration>> },
    EnumItem { value: Option<Rc<Expr>> },
    Class { tag: ClassTag, bases: Vec<BaseSpecifier>, members: Vec<Rc<Declaration>>, template_params: Vec<Rc<Declaration>> },
    TypeAlias { target: Rc<Type>, template_params: Vec<Rc<Declaration>> },
    ValueAlias { target: Rc<Expr> },
    Namespace { members: Vec<Rc<Declaration>>, is_inline: bool },
    UsingNamespace { path: Vec<String> },
    Using { path: Vec<String>, member: String },
    /// A template type or non-type parameter introduced by an enclosing
    /// template's parameter list.
    TemplateTypeParameter { default_type: Option<Rc<Type>>, is_pack: bool },
    TemplateValueParameter { value_type: Rc<Type>, default_value: Option<Rc<Expr>>, is_pack: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassTag {
    Class,
    Struct,
    Union,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumTag {
    Enum,
}

#[derive(Clone, Debug)]
pub struct BaseSpecifier {
    pub ty: Rc<Type>,
    pub is_virtual: bool,
    pub access: AccessSpecifier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessSpecifier {
    Public,
    Protected,
    Private,
}

/// A function body, parsed eagerly into a placeholder and forced lazily on
/// demand (spec §4.8: "defer function-body statements ... parsed on demand
/// when a consumer needs inside-function references").
#[derive(Debug)]
pub struct FunctionBody {
    statements: Cell<Option<Rc<crate::stat::Stat>>>,
    forcer: Box<dyn Fn() -> Rc<crate::stat::Stat>>,
}

impl FunctionBody {
    pub fn deferred(forcer: impl Fn() -> Rc<crate::stat::Stat> + 'static) -> Self {
        FunctionBody { statements: Cell::new(None), forcer: Box::new(forcer) }
    }

    pub fn immediate(body: Rc<crate::stat::Stat>) -> Self {
        FunctionBody { statements: Cell::new(Some(body.clone())), forcer: Box::new(move || body.clone()) }
    }

    /// Force the suspended parse, memoizing the result. Safe to call
    /// repeatedly; only the first call invokes the parser.
    pub fn force(&self) -> Rc<crate::stat::Stat> {
        if let Some(existing) = self.statements.take() {
            self.statements.set(Some(existing.clone()));
            return existing;
        }
        let body = (self.forcer)();
        self.statements.set(Some(body.clone()));
        body
    }

    pub fn is_forced(&self) -> bool {
        let existing = self.statements.take();
        let forced = existing.is_some();
        self.statements.set(existing);
        forced
    }
}
