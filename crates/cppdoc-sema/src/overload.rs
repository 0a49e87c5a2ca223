//! C6 — the Overload Resolver.
//!
//! Ranks each viable candidate's parameter-by-parameter conversions (spec
//! §4.6) and picks the unique best, or surfaces the whole viable set when
//! none dominates. `Any`-typed argument positions are tracked but never
//! ranked: they are neutral for both viability and the pairwise "better
//! than" comparison (spec §8 testable property 8: "adding an Any-typed
//! argument never promotes an unviable candidate to viable").

use crate::context::SemaContext;
use cppdoc_common::SymbolId;
use cppdoc_types::{FunctionFlags, TypeId};

/// Ranks better to worse, matching spec §4.6 (the original's fuller
/// ordering per `SPEC_FULL.md` §2 also threads `EllipsisMatch` in between
/// `UserDefinedConversion` and `Illegal`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionRank {
    Exact,
    TrivialConversion,
    IntegralPromotion,
    StandardConversion,
    UserDefinedConversion,
    EllipsisMatch,
    Illegal,
}

/// One callable thing competing in an overload resolution: a symbol
/// (`None` for a synthesized built-in candidate) and its function type.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub symbol: Option<SymbolId>,
    pub function_ty: TypeId,
}

#[derive(Clone, Debug)]
pub enum OverloadOutcome {
    Unique(Candidate),
    Ambiguous(Vec<Candidate>),
    NoViable,
}

impl<'a> SemaContext<'a> {
    /// Ranks `arg` against `param`. `Exact` only for identical `TypeId`s;
    /// `TrivialConversion` for a cv/ref-only mismatch on the same entity;
    /// `IntegralPromotion` for a small-integer-to-`int` widening;
    /// `StandardConversion` for numeric conversions, pointer-to-void,
    /// array-to-pointer decay, and derived-to-base; `Illegal` otherwise.
    pub fn rank_argument(&mut self, param: TypeId, arg: TypeId) -> ConversionRank {
        if param == arg {
            return ConversionRank::Exact;
        }
        let param_decomposed = self.types.decompose(param);
        let arg_decomposed = self.types.decompose(arg);
        if param_decomposed.entity == arg_decomposed.entity {
            return ConversionRank::TrivialConversion;
        }

        if let (Some((pk, pw)), Some((ak, aw))) = (
            self.types.primitive_parts(param_decomposed.entity),
            self.types.primitive_parts(arg_decomposed.entity),
        ) {
            use cppdoc_types::PrimitiveKind as P;
            let arg_is_small_int = matches!(ak, P::Bool | P::SignedChar | P::UnsignedChar) || aw < 32;
            if arg_is_small_int && matches!(pk, P::SignedInt | P::UnsignedInt) && pw >= 32 {
                return ConversionRank::IntegralPromotion;
            }
            return ConversionRank::StandardConversion;
        }

        if self.types.is_zero(arg_decomposed.entity) || self.types.is_nullptr(arg_decomposed.entity) {
            if self.types.is_ptr(param_decomposed.entity) || self.types.primitive_parts(param_decomposed.entity).is_some() {
                return ConversionRank::StandardConversion;
            }
        }

        if let (Some(param_inner), Some(arg_inner)) =
            (self.types.element_of(param_decomposed.entity), self.types.element_of(arg_decomposed.entity))
        {
            if self.types.is_ptr(param_decomposed.entity) && self.types.is_ptr(arg_decomposed.entity) {
                let param_pointee = self.types.entity_of(param_inner);
                let arg_pointee = self.types.entity_of(arg_inner);
                if self.types.is_void(param_pointee) {
                    return ConversionRank::StandardConversion;
                }
                if self.is_base_of(param_pointee, arg_pointee) {
                    return ConversionRank::StandardConversion;
                }
            }
        }

        if let Some((elem, _)) = self.types.array_parts(arg_decomposed.entity) {
            let decayed = self.types.ptr(elem);
            if decayed == param_decomposed.entity || self.is_base_of(param_decomposed.entity, elem) {
                return ConversionRank::StandardConversion;
            }
        }

        if self.is_base_of(param_decomposed.entity, arg_decomposed.entity) {
            return ConversionRank::StandardConversion;
        }

        ConversionRank::Illegal
    }

    /// Whether `derived` is `base` or has it anywhere in its (possibly
    /// indirect) base-class set, via the same BFS the name resolver uses.
    pub fn is_base_of(&mut self, base: TypeId, derived: TypeId) -> bool {
        if base == derived {
            return true;
        }
        let Some(derived_symbol) = self.types.as_decl_symbol(derived) else { return false };
        self.ensure_class_member_cache(derived_symbol);
        let mut frontier = self
            .symbols
            .arena
            .get(derived_symbol)
            .class_member_cache
            .as_ref()
            .map(|c| c.base_classes.clone())
            .unwrap_or_default();
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(candidate) = frontier.pop() {
            if !seen.insert(candidate) {
                continue;
            }
            if self.types.entity_of(candidate) == base {
                return true;
            }
            if let Some(sym) = self.types.as_decl_symbol(self.types.entity_of(candidate)) {
                self.ensure_class_member_cache(sym);
                if let Some(cache) = &self.symbols.arena.get(sym).class_member_cache {
                    frontier.extend(cache.base_classes.iter().copied());
                }
            }
        }
        false
    }

    /// Runs the full per-candidate ranking and selection algorithm.
    /// `any_positions` marks argument indices whose type is `Any`
    /// (spec §4.6: these are tracked but never ranked).
    pub fn resolve_overload(&mut self, candidates: &[Candidate], args: &[TypeId]) -> OverloadOutcome {
        let mut viable: Vec<(Candidate, Vec<ConversionRank>)> = Vec::new();
        for &candidate in candidates.iter().take(cppdoc_common::limits::MAX_OVERLOAD_CANDIDATES) {
            let Some(ranks) = self.rank_candidate(candidate, args) else { continue };
            viable.push((candidate, ranks));
        }
        if viable.is_empty() {
            return OverloadOutcome::NoViable;
        }
        if viable.len() == 1 {
            return OverloadOutcome::Unique(viable[0].0);
        }
        let mut dominated = vec![false; viable.len()];
        for i in 0..viable.len() {
            for j in 0..viable.len() {
                if i == j {
                    continue;
                }
                if ranks_dominate(&viable[j].1, &viable[i].1) {
                    dominated[i] = true;
                }
            }
        }
        let winners: Vec<Candidate> =
            viable.iter().zip(dominated.iter()).filter(|(_, d)| !**d).map(|(c, _)| c.0).collect();
        match winners.len() {
            1 => OverloadOutcome::Unique(winners[0]),
            _ => OverloadOutcome::Ambiguous(if winners.is_empty() { viable.into_iter().map(|(c, _)| c).collect() } else { winners }),
        }
    }

    /// Ranks every argument position against `candidate`'s parameter list;
    /// `None` if the candidate is unviable (position count mismatch, or an
    /// `Illegal` rank in a non-`Any` position).
    fn rank_candidate(&mut self, candidate: Candidate, args: &[TypeId]) -> Option<Vec<ConversionRank>> {
        let param_count = self.types.param_count(candidate.function_ty);
        let flags = self.types.function_flags(candidate.function_ty).unwrap_or(FunctionFlags::empty());
        let variadic = flags.contains(FunctionFlags::VARIADIC_ELLIPSIS);
        if args.len() < param_count || (args.len() > param_count && !variadic) {
            return None;
        }
        let mut ranks = Vec::with_capacity(param_count);
        for (i, &arg) in args.iter().enumerate().take(param_count) {
            if self.types.is_unknown(arg) {
                continue;
            }
            let param = self.types.param(candidate.function_ty, i);
            let rank = self.rank_argument(param, arg);
            if rank == ConversionRank::Illegal {
                return None;
            }
            ranks.push(rank);
        }
        for _ in param_count..args.len() {
            ranks.push(ConversionRank::EllipsisMatch);
        }
        Some(ranks)
    }
}

/// Whether `a`'s ranks dominate `b`'s: no worse anywhere, strictly better
/// somewhere (spec §4.6 step 4). Ranks are compared position-by-position;
/// differing lengths (only possible via ellipsis tails) compare only over
/// the shared prefix.
fn ranks_dominate(a: &[ConversionRank], b: &[ConversionRank]) -> bool {
    let len = a.len().min(b.len());
    let mut strictly_better = false;
    for i in 0..len {
        if a[i] > b[i] {
            return false;
        }
        if a[i] < b[i] {
            strictly_better = true;
        }
    }
    strictly_better
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationCache;
    use cppdoc_symbols::SymbolTable;
    use cppdoc_types::TypeInterner;
    use cppdoc_xref::Recorder;

    fn harness() -> (TypeInterner, SymbolTable, Recorder, EvaluationCache) {
        (TypeInterner::new(), SymbolTable::new(), Recorder::new(), EvaluationCache::default())
    }

    #[test]
    fn exact_beats_standard_conversion() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let exact_fn = ctx.types.function(TypeInterner::VOID, smallvec::smallvec![TypeInterner::INT], FunctionFlags::empty());
        let convert_fn = ctx.types.function(TypeInterner::VOID, smallvec::smallvec![TypeInterner::FLOAT], FunctionFlags::empty());
        let candidates = [
            Candidate { symbol: None, function_ty: exact_fn },
            Candidate { symbol: None, function_ty: convert_fn },
        ];
        let outcome = ctx.resolve_overload(&candidates, &[TypeInterner::INT]);
        match outcome {
            OverloadOutcome::Unique(c) => assert_eq!(c.function_ty, exact_fn),
            other => panic!("expected unique exact match, got {other:?}"),
        }
    }

    #[test]
    fn any_argument_never_disqualifies() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let f = ctx.types.function(TypeInterner::VOID, smallvec::smallvec![TypeInterner::BOOL], FunctionFlags::empty());
        let candidates = [Candidate { symbol: None, function_ty: f }];
        let outcome = ctx.resolve_overload(&candidates, &[TypeInterner::ANY]);
        assert!(matches!(outcome, OverloadOutcome::Unique(_)));
    }
}
