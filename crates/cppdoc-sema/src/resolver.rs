//! C3 — the Name Resolver.
//!
//! Two search policies (spec §4.3): [`LookupPolicy::AccessibleInScope`]
//! walks outward through enclosing scopes and, inside a class, through its
//! bases; [`LookupPolicy::ChildSymbolFromOutside`] only looks at one
//! scope's immediate children, transparently following `using namespace`
//! directives. Inheritance walking and ADL both build on the latter.
//!
//! Grounded on the teacher's `symbol_resolver.rs`: a set of focused lookup
//! helpers extending the shared engine state rather than one do-everything
//! resolver function.

use crate::context::SemaContext;
use cppdoc_common::SymbolId;
use cppdoc_symbols::SymbolKind;
use cppdoc_types::TypeId;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupPolicy {
    AccessibleInScope,
    ChildSymbolFromOutside,
}

/// An ordered list of symbols a name resolved to, preserving overload-set
/// and redeclaration-set order (spec §4.2/§4.3).
pub type ResolvedName = SmallVec<[SymbolId; 1]>;

impl<'a> SemaContext<'a> {
    pub fn lookup(&mut self, scope: SymbolId, name: &str, policy: LookupPolicy) -> ResolvedName {
        match policy {
            LookupPolicy::AccessibleInScope => self.lookup_accessible_in_scope(scope, name),
            LookupPolicy::ChildSymbolFromOutside => self.lookup_child_from_outside(scope, name),
        }
    }

    fn lookup_accessible_in_scope(&mut self, scope: SymbolId, name: &str) -> ResolvedName {
        let mut current = Some(scope);
        while let Some(id) = current {
            let hit = self.lookup_child_from_outside(id, name);
            if !hit.is_empty() {
                return hit;
            }
            if self.symbols.arena.get(id).kind.is_class_like() {
                let hit = self.lookup_in_base_classes(id, name);
                if !hit.is_empty() {
                    return hit;
                }
            }
            current = self.symbols.arena.get(id).parent;
        }
        SmallVec::new()
    }

    fn lookup_child_from_outside(&mut self, scope: SymbolId, name: &str) -> ResolvedName {
        let direct: ResolvedName = self.symbols.try_children(scope, name).iter().copied().collect();
        if !direct.is_empty() {
            return direct;
        }
        if let Some(used) = self.using_directives.get(&scope).cloned() {
            for used_namespace in used {
                let hit: ResolvedName =
                    self.symbols.try_children(used_namespace, name).iter().copied().collect();
                if !hit.is_empty() {
                    return hit;
                }
            }
        }
        SmallVec::new()
    }

    /// Breadth-first walk of a class's direct/indirect bases, stopping at
    /// the first frontier (distance from `class_symbol`) that answers the
    /// name, with a visited set to avoid revisiting a diamond-shared base
    /// twice (spec §4.3).
    fn lookup_in_base_classes(&mut self, class_symbol: SymbolId, name: &str) -> ResolvedName {
        let mut visited = FxHashSet::default();
        visited.insert(class_symbol);
        let mut frontier = self.direct_base_symbols(class_symbol);
        let mut depth = 0usize;
        while !frontier.is_empty() && depth < cppdoc_common::limits::MAX_BASE_CLASS_WALK_DEPTH {
            let mut answers = ResolvedName::new();
            let mut next_frontier = Vec::new();
            for base in frontier {
                if !visited.insert(base) {
                    continue;
                }
                let hit = self.lookup_child_from_outside(base, name);
                if !hit.is_empty() {
                    answers.extend(hit);
                } else {
                    next_frontier.extend(self.direct_base_symbols(base));
                }
            }
            if !answers.is_empty() {
                return answers;
            }
            frontier = next_frontier;
            depth += 1;
        }
        SmallVec::new()
    }

    /// Member lookup for `a.b`/`a->b` (spec §4.5): `class_symbol`'s own
    /// children first, falling back to the base-class BFS used by
    /// `AccessibleInScope` — but, unlike that policy, never continuing
    /// outward into enclosing scopes once the class and its bases are
    /// exhausted.
    pub fn lookup_member(&mut self, class_symbol: SymbolId, name: &str) -> ResolvedName {
        let direct = self.lookup_child_from_outside(class_symbol, name);
        if !direct.is_empty() {
            return direct;
        }
        self.lookup_in_base_classes(class_symbol, name)
    }

    /// The immediate base-class symbols of `class_symbol`, read from its
    /// (already-populated) class-member cache. Returns an empty list for a
    /// symbol whose cache has not been populated yet — callers that need
    /// bases populated first should go through `ensure_class_member_cache`
    /// in `type_eval` before resolving names through them.
    fn direct_base_symbols(&self, class_symbol: SymbolId) -> Vec<SymbolId> {
        let symbol = self.symbols.arena.get(class_symbol);
        let Some(cache) = &symbol.class_member_cache else {
            return Vec::new();
        };
        cache.base_classes.iter().filter_map(|&ty| self.decl_symbol_of(ty)).collect()
    }

    fn decl_symbol_of(&self, ty: TypeId) -> Option<SymbolId> {
        self.types.as_decl_symbol(self.types.entity_of(ty))
    }

    /// Associated namespaces and classes for one argument type, per ADL
    /// (spec §4.3): the type's enclosing namespace, and for a class type,
    /// its bases and their enclosing namespaces too.
    pub fn adl_associated_scopes(&mut self, argument_types: &[TypeId]) -> Vec<SymbolId> {
        let mut scopes = Vec::new();
        let mut seen = FxHashSet::default();
        for &ty in argument_types {
            let entity = self.types.entity_of(ty);
            let Some(class_symbol) = self.decl_symbol_of(entity) else {
                continue;
            };
            self.collect_adl_scopes_for(class_symbol, &mut scopes, &mut seen);
        }
        scopes
    }

    fn collect_adl_scopes_for(&self, symbol: SymbolId, scopes: &mut Vec<SymbolId>, seen: &mut FxHashSet<SymbolId>) {
        if !seen.insert(symbol) {
            return;
        }
        let mut enclosing = self.symbols.arena.get(symbol).parent;
        while let Some(scope) = enclosing {
            if self.symbols.arena.get(scope).kind == SymbolKind::Namespace
                || self.symbols.arena.get(scope).kind == SymbolKind::Root
            {
                scopes.push(scope);
                break;
            }
            enclosing = self.symbols.arena.get(scope).parent;
        }
        if self.symbols.arena.get(symbol).kind.is_class_like() {
            scopes.push(symbol);
            for base in self.direct_base_symbols(symbol) {
                self.collect_adl_scopes_for(base, scopes, seen);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppdoc_symbols::SymbolTable;
    use cppdoc_types::TypeInterner;
    use cppdoc_xref::Recorder;

    fn new_context() -> (TypeInterner, SymbolTable, Recorder, crate::context::EvaluationCache) {
        (TypeInterner::new(), SymbolTable::new(), Recorder::new(), crate::context::EvaluationCache::default())
    }

    #[test]
    fn child_from_outside_finds_direct_child_only() {
        let (mut types, mut symbols, mut recorder, mut cache) = new_context();
        let root = symbols.root;
        let ns = symbols.add_child(root, SymbolKind::Namespace, "n");
        symbols.add_child(ns, SymbolKind::Variable, "x");
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        assert!(ctx.lookup(root, "x", LookupPolicy::ChildSymbolFromOutside).is_empty());
        assert_eq!(ctx.lookup(ns, "x", LookupPolicy::ChildSymbolFromOutside).len(), 1);
    }

    #[test]
    fn accessible_in_scope_walks_outward() {
        let (mut types, mut symbols, mut recorder, mut cache) = new_context();
        let root = symbols.root;
        symbols.add_child(root, SymbolKind::Variable, "global_var");
        let ns = symbols.add_child(root, SymbolKind::Namespace, "n");
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let found = ctx.lookup(ns, "global_var", LookupPolicy::AccessibleInScope);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn using_directive_makes_namespace_members_transparent() {
        let (mut types, mut symbols, mut recorder, mut cache) = new_context();
        let root = symbols.root;
        let ns = symbols.add_child(root, SymbolKind::Namespace, "n");
        symbols.add_child(ns, SymbolKind::Variable, "x");
        let consumer = symbols.add_child(root, SymbolKind::Namespace, "consumer");
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        assert!(ctx.lookup(consumer, "x", LookupPolicy::ChildSymbolFromOutside).is_empty());
        ctx.add_using_directive(consumer, ns);
        assert_eq!(ctx.lookup(consumer, "x", LookupPolicy::ChildSymbolFromOutside).len(), 1);
    }
}
