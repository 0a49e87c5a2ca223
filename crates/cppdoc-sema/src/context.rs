//! The two pieces of state threaded through every evaluation path:
//! [`SemaContext`], the mutable engine (type universe, symbol table,
//! cross-reference recorder, per-symbol evaluation cache), and
//! [`ParsingArguments`], a cheap-to-clone value describing *where* the
//! current evaluation is happening.
//!
//! `ParsingArguments` is never mutated in place (spec §5): every method
//! that changes one field returns a modified copy, the way the original
//! `ParsingArguments` C++ value is threaded through `Ast_Evaluate*.cpp` by
//! value. Grounded on the teacher's `impl<'a> CheckerState<'a>` extension
//! pattern (`tsz-checker/src/context.rs` et al.): one engine struct holding
//! `&mut` borrows of the shared tables, extended by `impl` blocks in each
//! sibling module instead of one monolithic file.

use cppdoc_common::{CheckerOptions, SymbolId};
use cppdoc_symbols::SymbolTable;
use cppdoc_types::{TypeId, TypeInterner};
use cppdoc_xref::Recorder;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// An immutable snapshot of template-argument bindings (pattern symbol →
/// bound type), shared by reference once constructed. Two
/// `ArgumentContext`s are the "same identity" for evaluation-cache purposes
/// iff they share an `id` (spec §5: "keyed by ... argument-context
/// identity").
#[derive(Clone, Debug)]
pub struct ArgumentContext {
    id: u64,
    bindings: Rc<FxHashMap<SymbolId, TypeId>>,
}

impl ArgumentContext {
    pub fn empty() -> Self {
        ArgumentContext { id: 0, bindings: Rc::new(FxHashMap::default()) }
    }

    pub fn get(&self, pattern: SymbolId) -> Option<TypeId> {
        self.bindings.get(&pattern).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn identity(&self) -> u64 {
        self.id
    }
}

/// Where the current evaluation is happening: the enclosing scope, the
/// enclosing function's symbol (if inside a function body), an active
/// template-argument context, and the evaluator options in effect.
///
/// `Clone` is the only way to derive a new value; every `with_*` method
/// consumes `&self` and returns an independent copy so callers cannot
/// observe a caller's context change underneath them.
#[derive(Clone, Debug)]
pub struct ParsingArguments {
    pub scope: SymbolId,
    pub function_symbol: Option<SymbolId>,
    pub argument_context: ArgumentContext,
    pub options: CheckerOptions,
}

impl ParsingArguments {
    pub fn new(scope: SymbolId) -> Self {
        ParsingArguments {
            scope,
            function_symbol: None,
            argument_context: ArgumentContext::empty(),
            options: CheckerOptions::default(),
        }
    }

    pub fn with_scope(&self, scope: SymbolId) -> Self {
        ParsingArguments { scope, ..self.clone() }
    }

    pub fn with_function_symbol(&self, function_symbol: SymbolId) -> Self {
        ParsingArguments { function_symbol: Some(function_symbol), ..self.clone() }
    }

    pub fn with_argument_context(&self, argument_context: ArgumentContext) -> Self {
        ParsingArguments { argument_context, ..self.clone() }
    }

    pub fn with_options(&self, options: CheckerOptions) -> Self {
        ParsingArguments { options, ..self.clone() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct EvalCacheKey {
    symbol: SymbolId,
    parent_decl_type: Option<TypeId>,
    argument_context_id: u64,
}

#[derive(Clone, Debug)]
enum EvalCacheEntry {
    /// Evaluation of this key is already on the call stack; seeing this key
    /// again is a re-entrant cycle.
    InProgress,
    Done(smallvec::SmallVec<[TypeId; 1]>),
}

/// Detects and memoizes per-symbol type evaluation (spec §5). A cycle is
/// not an error by itself — it is reported only if the `InProgress`
/// sentinel escapes all the way back up to the recursion's top without
/// being resolved by the caller that re-entered it.
#[derive(Default, Debug)]
pub struct EvaluationCache {
    entries: FxHashMap<EvalCacheKey, EvalCacheEntry>,
}

/// Whether a cache probe found a previously computed answer, detected a
/// cycle, or found nothing.
pub enum CacheProbe {
    Hit(smallvec::SmallVec<[TypeId; 1]>),
    Cycle,
    Miss,
}

impl EvaluationCache {
    fn key(symbol: SymbolId, parent_decl_type: Option<TypeId>, args: &ArgumentContext) -> EvalCacheKey {
        EvalCacheKey { symbol, parent_decl_type, argument_context_id: args.identity() }
    }

    /// Probes the cache; on `Miss`, marks the key `InProgress` so a
    /// recursive re-entry sees `Cycle` instead of looping forever.
    pub fn probe_or_enter(
        &mut self,
        symbol: SymbolId,
        parent_decl_type: Option<TypeId>,
        args: &ArgumentContext,
    ) -> CacheProbe {
        let key = Self::key(symbol, parent_decl_type, args);
        match self.entries.get(&key) {
            Some(EvalCacheEntry::Done(types)) => CacheProbe::Hit(types.clone()),
            Some(EvalCacheEntry::InProgress) => CacheProbe::Cycle,
            None => {
                self.entries.insert(key, EvalCacheEntry::InProgress);
                CacheProbe::Miss
            }
        }
    }

    pub fn complete(
        &mut self,
        symbol: SymbolId,
        parent_decl_type: Option<TypeId>,
        args: &ArgumentContext,
        result: smallvec::SmallVec<[TypeId; 1]>,
    ) {
        let key = Self::key(symbol, parent_decl_type, args);
        self.entries.insert(key, EvalCacheEntry::Done(result));
    }
}

/// The mutable semantic-analysis engine: owns (via `&mut` borrow) the type
/// universe, symbol table, cross-reference recorder, and evaluation cache
/// for one checking session.
pub struct SemaContext<'a> {
    pub types: &'a mut TypeInterner,
    pub symbols: &'a mut SymbolTable,
    pub recorder: &'a mut Recorder,
    pub eval_cache: &'a mut EvaluationCache,
    /// Namespaces made transparently visible to a scope by a
    /// `using namespace N;` directive seen inside it (spec §4.3:
    /// "`ChildSymbolFromOutside` ... following using-directives
    /// transparently"). Sema-layer bookkeeping, not part of the symbol
    /// tree itself.
    pub using_directives: FxHashMap<SymbolId, Vec<SymbolId>>,
    next_argument_context_id: u64,
}

impl<'a> SemaContext<'a> {
    pub fn new(
        types: &'a mut TypeInterner,
        symbols: &'a mut SymbolTable,
        recorder: &'a mut Recorder,
        eval_cache: &'a mut EvaluationCache,
    ) -> Self {
        SemaContext {
            types,
            symbols,
            recorder,
            eval_cache,
            using_directives: FxHashMap::default(),
            next_argument_context_id: 1,
        }
    }

    pub fn add_using_directive(&mut self, scope: SymbolId, used_namespace: SymbolId) {
        self.using_directives.entry(scope).or_default().push(used_namespace);
    }

    /// Builds a fresh `ArgumentContext` with its own identity, to be used
    /// when entering a new template instantiation.
    pub fn fresh_argument_context(&mut self, bindings: FxHashMap<SymbolId, TypeId>) -> ArgumentContext {
        let id = self.next_argument_context_id;
        self.next_argument_context_id += 1;
        ArgumentContext { id, bindings: Rc::new(bindings) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_scope_does_not_mutate_original() {
        let base = ParsingArguments::new(SymbolId(0));
        let moved = base.with_scope(SymbolId(7));
        assert_eq!(base.scope, SymbolId(0));
        assert_eq!(moved.scope, SymbolId(7));
    }

    #[test]
    fn eval_cache_detects_reentry() {
        let mut cache = EvaluationCache::default();
        let args = ArgumentContext::empty();
        assert!(matches!(cache.probe_or_enter(SymbolId(1), None, &args), CacheProbe::Miss));
        assert!(matches!(cache.probe_or_enter(SymbolId(1), None, &args), CacheProbe::Cycle));
    }

    #[test]
    fn eval_cache_hits_after_completion() {
        let mut cache = EvaluationCache::default();
        let args = ArgumentContext::empty();
        let _ = cache.probe_or_enter(SymbolId(2), None, &args);
        cache.complete(SymbolId(2), None, &args, smallvec::smallvec![TypeInterner::INT]);
        match cache.probe_or_enter(SymbolId(2), None, &args) {
            CacheProbe::Hit(types) => assert_eq!(types.as_slice(), &[TypeInterner::INT]),
            _ => panic!("expected cache hit"),
        }
    }
}
