//! The `Symbol` node itself and its lazily-populated caches.

use cppdoc_ast::Declaration;
use cppdoc_common::SymbolId;
use cppdoc_types::TypeId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// What a symbol denotes. Identity is nominal, not name-based: two distinct
/// `Symbol`s with the same name in the same scope (e.g. overloaded
/// functions, or a class and a later forward-redeclared class) remain
/// distinct entries in the owning scope's child list (spec §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Root,
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    EnumItem,
    TypeAlias,
    ValueAlias,
    Variable,
    FunctionSymbol,
    GenericTypeArgument,
    GenericValueArgument,
}

impl SymbolKind {
    /// Whether this kind introduces a class-like scope (one that
    /// participates in inheritance walking and has a `this`-type).
    pub fn is_class_like(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::Struct | SymbolKind::Union)
    }
}

/// Base-class list and `this`-type for a class-like symbol. Populated on
/// first query by the name resolver / type evaluator, not at symbol
/// creation time, since computing it requires evaluating base-specifier
/// types which may themselves need to resolve names through this very
/// symbol.
#[derive(Clone, Debug, Default)]
pub struct ClassMemberCache {
    pub base_classes: Vec<TypeId>,
    pub this_type: Option<TypeId>,
}

/// The type(s) this symbol evaluates to (a singleton for most symbol kinds;
/// potentially several for an overloaded function group considered as a
/// unit). Memoized once C4/C5 have computed it once.
#[derive(Clone, Debug, Default)]
pub struct EvaluationCache {
    pub types: SmallVec<[TypeId; 1]>,
}

/// One entry in the symbol tree.
#[derive(Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub parent: Option<SymbolId>,

    pub(crate) children: FxHashMap<String, SmallVec<[SymbolId; 1]>>,
    pub(crate) child_order: Vec<String>,

    /// The declaration that actually defines this symbol's body, if one has
    /// been seen (spec §4.2: "implementation declaration (optional)").
    pub impl_decl: Option<Rc<Declaration>>,
    /// Every forward declaration seen for this symbol, in source order.
    pub forward_decls: Vec<Rc<Declaration>>,

    pub class_member_cache: Option<ClassMemberCache>,
    pub evaluation_cache: Option<EvaluationCache>,

    /// Assigned by `SymbolTable::mint_unique_ids` once the tree has
    /// stopped growing; `None` before that pass runs.
    pub unique_id: Option<u32>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, parent: Option<SymbolId>) -> Self {
        Symbol {
            kind,
            name: name.into(),
            parent,
            children: FxHashMap::default(),
            child_order: Vec::new(),
            impl_decl: None,
            forward_decls: Vec::new(),
            class_member_cache: None,
            evaluation_cache: None,
            unique_id: None,
        }
    }

    /// The ordered list of children sharing `name`, in declaration order.
    /// Empty (not missing) when no such child exists.
    pub fn children_named(&self, name: &str) -> &[SymbolId] {
        self.children.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All children across every name, in the order their names were first
    /// introduced (used by unique-id minting to get a stable traversal).
    pub fn children_in_order(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.child_order.iter().flat_map(move |name| self.children_named(name).iter().copied())
    }
}
