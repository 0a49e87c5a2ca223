//! Common types and utilities for the cppdoc C++ semantic core.
//!
//! This crate provides foundational types used across all `cppdoc` crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`) and line/column positions (`Location`, `Range`)
//! - The typed failure taxonomy the core signals instead of panicking
//! - `ParsingArguments`-style configuration (`CheckerOptions`)
//! - Centralized limits and thresholds

pub mod checker_options;
pub mod diagnostics;
pub mod ids;
pub mod interner;
pub mod limits;
pub mod position;
pub mod span;

pub use checker_options::{CallingConvention, CheckerOptions};
pub use diagnostics::{Failure, FailureKind, SemaResult};
pub use ids::SymbolId;
pub use interner::{Atom, Interner};
pub use position::{LineMap, Location, Range};
pub use span::Span;
