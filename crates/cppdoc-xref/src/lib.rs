//! C9 — the Cross-Reference Recorder.
//!
//! Collects, as evaluation proceeds, the three kinds of token-to-symbol
//! association the rest of the core produces (spec §4.9): a plain name
//! resolution, an overload-resolution narrowing of a prior resolution, and
//! a "needed a value, found a type" recoverable mismatch. Each is recorded
//! keyed by the token's source span, with the symbol → span inverse
//! maintained alongside for consumers that start from a symbol instead of a
//! location.
//!
//! Grounded on the teacher's pattern of a single append-mostly side table
//! fed by the checker as it walks expressions (see `tsz-checker`'s
//! `error_reporter` and `symbols` modules for the keyed-by-span,
//! inverse-indexed shape), adapted here to the three-kind taxonomy the
//! spec names instead of diagnostics.

use cppdoc_common::{SymbolId, Span};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Which of the three recording moments produced an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    /// An identifier resolved to one or more symbols in the normal sense.
    Resolved,
    /// Overload resolution narrowed a prior `Resolved` call on the same
    /// token down to a subset.
    OverloadedResolution,
    /// The expression position required a value but a type name was found.
    NeedValueButType,
}

type SymbolList = SmallVec<[SymbolId; 1]>;

#[derive(Debug, Default)]
struct Bucket {
    by_span: FxHashMap<Span, SymbolList>,
    by_symbol: FxHashMap<SymbolId, SmallVec<[Span; 1]>>,
}

impl Bucket {
    fn insert(&mut self, span: Span, symbols: &[SymbolId]) {
        let entry = self.by_span.entry(span).or_default();
        for &symbol in symbols {
            if !entry.contains(&symbol) {
                entry.push(symbol);
            }
            let inverse = self.by_symbol.entry(symbol).or_default();
            if !inverse.contains(&span) {
                inverse.push(span);
            }
        }
    }
}

/// The recorder: three independently keyed [`Bucket`]s, one per
/// [`ResolutionKind`].
#[derive(Debug, Default)]
pub struct Recorder {
    resolved: Bucket,
    overloaded: Bucket,
    need_value_but_type: Bucket,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, kind: ResolutionKind) -> &mut Bucket {
        match kind {
            ResolutionKind::Resolved => &mut self.resolved,
            ResolutionKind::OverloadedResolution => &mut self.overloaded,
            ResolutionKind::NeedValueButType => &mut self.need_value_but_type,
        }
    }

    fn bucket(&self, kind: ResolutionKind) -> &Bucket {
        match kind {
            ResolutionKind::Resolved => &self.resolved,
            ResolutionKind::OverloadedResolution => &self.overloaded,
            ResolutionKind::NeedValueButType => &self.need_value_but_type,
        }
    }

    /// Records that `span` resolved to `symbols` under `kind`. Idempotent:
    /// recording the same (span, symbol) pair twice under the same kind has
    /// no further effect (spec §4.9: "ordering of inserts for the same
    /// token-symbol pair is idempotent").
    pub fn record(&mut self, kind: ResolutionKind, span: Span, symbols: &[SymbolId]) {
        self.bucket_mut(kind).insert(span, symbols);
    }

    pub fn symbols_at(&self, kind: ResolutionKind, span: Span) -> &[SymbolId] {
        self.bucket(kind).by_span.get(&span).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn spans_of(&self, kind: ResolutionKind, symbol: SymbolId) -> &[Span] {
        self.bucket(kind).by_symbol.get(&symbol).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u32) -> SymbolId {
        SymbolId(n)
    }

    #[test]
    fn records_and_inverts() {
        let mut r = Recorder::new();
        let span = Span::new(0, 3);
        r.record(ResolutionKind::Resolved, span, &[sym(1), sym(2)]);
        assert_eq!(r.symbols_at(ResolutionKind::Resolved, span), &[sym(1), sym(2)]);
        assert_eq!(r.spans_of(ResolutionKind::Resolved, sym(1)), &[span]);
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut r = Recorder::new();
        let span = Span::new(0, 3);
        r.record(ResolutionKind::Resolved, span, &[sym(1)]);
        r.record(ResolutionKind::Resolved, span, &[sym(1)]);
        assert_eq!(r.symbols_at(ResolutionKind::Resolved, span), &[sym(1)]);
        assert_eq!(r.spans_of(ResolutionKind::Resolved, sym(1)), &[span]);
    }

    #[test]
    fn kinds_are_independent_buckets() {
        let mut r = Recorder::new();
        let span = Span::new(5, 8);
        r.record(ResolutionKind::Resolved, span, &[sym(1)]);
        r.record(ResolutionKind::OverloadedResolution, span, &[sym(1)]);
        assert_eq!(r.symbols_at(ResolutionKind::Resolved, span), &[sym(1)]);
        assert_eq!(r.symbols_at(ResolutionKind::NeedValueButType, span), &[] as &[SymbolId]);
    }
}
