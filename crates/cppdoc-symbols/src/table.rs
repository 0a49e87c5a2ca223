//! Tree operations over a `SymbolArena`: the public surface C3-C8 use to
//! populate and query the symbol tree.

use crate::arena::SymbolArena;
use crate::symbol::{ClassMemberCache, SymbolKind};
use cppdoc_ast::{Declaration, DeclarationKind};
use cppdoc_common::SymbolId;
use smallvec::SmallVec;
use std::rc::Rc;

/// A populated symbol tree, rooted at a single `Root` symbol representing
/// the translation unit's global namespace.
#[derive(Debug)]
pub struct SymbolTable {
    pub arena: SymbolArena,
    pub root: SymbolId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut arena = SymbolArena::new();
        let root = arena.alloc(SymbolKind::Root, "", None);
        SymbolTable { arena, root }
    }

    /// Introduces a new child symbol under `parent`, appending it to the
    /// ordered list for `name` (spec §4.2: "names resolve to ordered lists
    /// to preserve overload-set semantics").
    pub fn add_child(&mut self, parent: SymbolId, kind: SymbolKind, name: impl Into<String>) -> SymbolId {
        let name = name.into();
        let id = self.arena.alloc(kind, name.clone(), Some(parent));
        let parent_symbol = self.arena.get_mut(parent);
        if !parent_symbol.children.contains_key(&name) {
            parent_symbol.child_order.push(name.clone());
        }
        parent_symbol.children.entry(name).or_insert_with(SmallVec::new).push(id);
        id
    }

    /// The ordered list of `parent`'s children named `name`; empty if none.
    pub fn try_children(&self, parent: SymbolId, name: &str) -> &[SymbolId] {
        self.arena.get(parent).children_named(name)
    }

    /// Makes an already-existing symbol additionally reachable as `name`
    /// under `parent`, without changing the symbol's own identity or
    /// parent pointer. Used by `using Ns::member;` declarations, which
    /// introduce a second name for a symbol that still belongs to its
    /// original scope (spec §4.8 `Using`).
    pub fn alias_child(&mut self, parent: SymbolId, name: impl Into<String>, symbol: SymbolId) {
        let name = name.into();
        let parent_symbol = self.arena.get_mut(parent);
        if !parent_symbol.children.contains_key(&name) {
            parent_symbol.child_order.push(name.clone());
        }
        let list = parent_symbol.children.entry(name).or_insert_with(SmallVec::new);
        if !list.contains(&symbol) {
            list.push(symbol);
        }
    }

    /// Whether `symbol` has a forward declaration matching `predicate`,
    /// e.g. `any_forward_decl(id, |k| matches!(k, DeclarationKind::Forward
    /// { tag: ClassTag::Class }))` for "was this class ever forward
    /// declared". Takes a predicate rather than a const type parameter,
    /// since Rust has no analogue for a declaration-kind type argument.
    pub fn any_forward_decl(&self, symbol: SymbolId, predicate: impl Fn(&DeclarationKind) -> bool) -> bool {
        self.arena.get(symbol).forward_decls.iter().any(|decl| predicate(&decl.kind))
    }

    /// The declaration that gives `symbol` its body/definition, if seen.
    pub fn impl_decl(&self, symbol: SymbolId) -> Option<&Rc<Declaration>> {
        self.arena.get(symbol).impl_decl.as_ref()
    }

    pub fn set_impl_decl(&mut self, symbol: SymbolId, decl: Rc<Declaration>) {
        self.arena.get_mut(symbol).impl_decl = Some(decl);
    }

    pub fn push_forward_decl(&mut self, symbol: SymbolId, decl: Rc<Declaration>) {
        self.arena.get_mut(symbol).forward_decls.push(decl);
    }

    /// Returns the class-member cache for `symbol`, computing it with
    /// `populate` on first access and memoizing the result. `populate` runs
    /// at most once per symbol.
    pub fn class_member_cache(
        &mut self,
        symbol: SymbolId,
        populate: impl FnOnce(&Self) -> ClassMemberCache,
    ) -> &ClassMemberCache {
        if self.arena.get(symbol).class_member_cache.is_none() {
            let cache = populate(self);
            self.arena.get_mut(symbol).class_member_cache = Some(cache);
        }
        self.arena.get(symbol).class_member_cache.as_ref().expect("just populated")
    }

    /// Assigns a stable `unique_id` to every symbol in the tree via a
    /// pre-order walk, to be run once the tree has stopped growing (spec
    /// §4.2: "unique-id minting traverses the tree post-population for
    /// stable external references").
    pub fn mint_unique_ids(&mut self) {
        let _span = tracing::debug_span!("mint_unique_ids").entered();
        let mut next_id = 0u32;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            self.arena.get_mut(id).unique_id = Some(next_id);
            next_id += 1;
            let children: Vec<SymbolId> = self.arena.get(id).children_in_order().collect();
            stack.extend(children.into_iter().rev());
        }
        tracing::debug!(count = next_id, "minted unique symbol ids");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_preserves_declaration_order_for_overloads() {
        let mut table = SymbolTable::new();
        let a = table.add_child(table.root, SymbolKind::FunctionSymbol, "f");
        let b = table.add_child(table.root, SymbolKind::FunctionSymbol, "f");
        assert_eq!(table.try_children(table.root, "f"), &[a, b]);
    }

    #[test]
    fn distinct_symbols_with_same_name_are_distinct_ids() {
        let mut table = SymbolTable::new();
        let a = table.add_child(table.root, SymbolKind::Class, "Widget");
        let b = table.add_child(table.root, SymbolKind::Class, "Widget");
        assert_ne!(a, b);
    }

    #[test]
    fn try_children_on_unknown_name_is_empty() {
        let mut table = SymbolTable::new();
        table.add_child(table.root, SymbolKind::Namespace, "n");
        assert!(table.try_children(table.root, "nonexistent").is_empty());
    }

    #[test]
    fn mint_unique_ids_assigns_every_symbol_a_distinct_id() {
        let mut table = SymbolTable::new();
        let ns = table.add_child(table.root, SymbolKind::Namespace, "n");
        table.add_child(ns, SymbolKind::Class, "Widget");
        table.add_child(table.root, SymbolKind::Variable, "g");

        table.mint_unique_ids();

        let mut ids: Vec<u32> = table.arena.iter().map(|(_, s)| s.unique_id.expect("minted")).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..table.arena.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn class_member_cache_populates_once() {
        let mut table = SymbolTable::new();
        let class = table.add_child(table.root, SymbolKind::Class, "Widget");
        let mut calls = 0;
        table.class_member_cache(class, |_| {
            calls += 1;
            ClassMemberCache::default()
        });
        table.class_member_cache(class, |_| {
            calls += 1;
            ClassMemberCache::default()
        });
        assert_eq!(calls, 1);
    }
}
