//! The typed failure taxonomy the semantic core signals instead of
//! formatting diagnostic messages (presentation is an external concern).
//!
//! See spec §7. `IllegalExpression` and `TypeCheckerFailure` unwind a single
//! expression or template candidate and are recovered close to where they
//! are thrown; `UnexpectedSymbolCategory` and `FinishEvaluatingReturnType`
//! are the two non-local exits scoped in the design notes.

use crate::span::Span;

/// A kind of failure the core can signal. Not an error message — presentation
/// belongs to the external renderer/IDE layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Expression form is wrong in context; the expression's type set is
    /// left empty.
    IllegalExpression,
    /// An unrecoverable inconsistency (mismatched deduction, invalid
    /// `this`-adjust, nested variadic pack, ...).
    TypeCheckerFailure,
    /// Internal invariant violation: a symbol used in a role it does not
    /// support.
    UnexpectedSymbolCategory,
    /// Benign early-exit used only while evaluating a function's deduced
    /// return type; caught at the declaration-driver boundary.
    FinishEvaluatingReturnType,
    /// No conversion applies in the built-in primitive lattice.
    NotConvertable,
}

/// A thrown failure, carrying the originating span when one is available.
/// `FinishEvaluatingReturnType` carries no span — it is pure control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Failure {
    pub kind: FailureKind,
    pub span: Option<Span>,
}

impl Failure {
    pub const fn new(kind: FailureKind, span: Span) -> Self {
        Failure { kind, span: Some(span) }
    }

    pub const fn illegal_expression(span: Span) -> Self {
        Failure::new(FailureKind::IllegalExpression, span)
    }

    pub const fn type_checker_failure(span: Span) -> Self {
        Failure::new(FailureKind::TypeCheckerFailure, span)
    }

    pub const fn unexpected_symbol_category() -> Self {
        Failure { kind: FailureKind::UnexpectedSymbolCategory, span: None }
    }

    pub const fn finish_evaluating_return_type() -> Self {
        Failure { kind: FailureKind::FinishEvaluatingReturnType, span: None }
    }

    pub const fn not_convertable(span: Span) -> Self {
        Failure::new(FailureKind::NotConvertable, span)
    }

    /// Whether this failure should terminate the whole analysis instead of
    /// being caught near its origin (spec §7 propagation policy).
    pub const fn is_programming_bug(&self) -> bool {
        matches!(self.kind, FailureKind::UnexpectedSymbolCategory)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FailureKind::IllegalExpression => write!(f, "illegal expression"),
            FailureKind::TypeCheckerFailure => write!(f, "type checker failure"),
            FailureKind::UnexpectedSymbolCategory => write!(f, "unexpected symbol category"),
            FailureKind::FinishEvaluatingReturnType => write!(f, "finish evaluating return type"),
            FailureKind::NotConvertable => write!(f, "not convertable"),
        }
    }
}

impl std::error::Error for Failure {}

/// Convenience alias used throughout C3–C8.
pub type SemaResult<T> = Result<T, Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programming_bugs_are_flagged() {
        assert!(Failure::unexpected_symbol_category().is_programming_bug());
        assert!(!Failure::illegal_expression(Span::new(0, 1)).is_programming_bug());
    }
}
