//! `cppdoc` — the `Session` facade wiring the semantic core's crates
//! together for a host (an IDE, a documentation generator, a batch
//! checker) that already has a parsed translation unit in hand.
//!
//! Parsing, lexing, and preprocessing are someone else's problem (spec §1);
//! a `Session` only ever consumes a `cppdoc_ast::Program` an external
//! front end handed it. This mirrors the teacher's `wasm` root crate, which
//! wires `tsz-scanner` → `tsz-parser` → `tsz-binder` → `tsz-solver` →
//! `tsz-checker` → `tsz-emitter` behind one entry point — trimmed here of
//! its CLI/bin targets, which are out of scope.

use cppdoc_ast::Program;
use cppdoc_common::{SemaResult, Span, SymbolId};
use cppdoc_sema::{ParsingArguments, SemaContext};
use cppdoc_symbols::SymbolTable;
use cppdoc_types::TypeInterner;
use cppdoc_xref::{Recorder, ResolutionKind};

/// Owns the four pieces of mutable engine state a checking pass threads
/// through (type universe, symbol table, cross-reference recorder,
/// evaluation cache) and lends them to a [`cppdoc_sema::SemaContext`] for
/// the duration of each call, the way the teacher's `CheckerState` owns
/// the binder/solver tables for a compilation.
#[derive(Default)]
pub struct Session {
    types: TypeInterner,
    symbols: SymbolTable,
    recorder: Recorder,
    eval_cache: cppdoc_sema::EvaluationCache,
}

impl Session {
    pub fn new() -> Self {
        Session {
            types: TypeInterner::new(),
            symbols: SymbolTable::new(),
            recorder: Recorder::new(),
            eval_cache: cppdoc_sema::EvaluationCache::default(),
        }
    }

    /// Runs C8 (the declaration driver) over every top-level declaration in
    /// `program`, in turn exercising C2–C7 and recording cross-references
    /// into C9 as resolution happens. Declarations already driven in a
    /// prior call remain in the symbol table — a `Session` accumulates
    /// state across calls the way a real translation-unit-by-translation-unit
    /// checking session would.
    pub fn check_program(&mut self, program: &Program) -> SemaResult<()> {
        let _span = tracing::info_span!("check_program", decls = program.decls.len()).entered();
        let mut ctx = self.context();
        ctx.drive_program(program)?;
        self.symbols.mint_unique_ids();
        Ok(())
    }

    /// Borrows a [`SemaContext`] directly, for a host that wants to drive
    /// individual declarations or expressions itself rather than through
    /// [`Session::check_program`] (e.g. an IDE re-checking one edited
    /// declaration in isolation).
    pub fn context(&mut self) -> SemaContext<'_> {
        SemaContext::new(&mut self.types, &mut self.symbols, &mut self.recorder, &mut self.eval_cache)
    }

    pub fn root_scope(&self) -> SymbolId {
        self.symbols.root
    }

    pub fn types(&self) -> &TypeInterner {
        &self.types
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The symbols a source span resolved to under `kind` (spec §4.9),
    /// e.g. for an IDE "go to definition" query.
    pub fn symbols_at(&self, kind: ResolutionKind, span: Span) -> &[SymbolId] {
        self.recorder.symbols_at(kind, span)
    }

    /// Every span a symbol was referenced from under `kind` (spec §4.9),
    /// e.g. for an IDE "find all references" query.
    pub fn references_of(&self, kind: ResolutionKind, symbol: SymbolId) -> &[Span] {
        self.recorder.spans_of(kind, symbol)
    }

    /// A fresh [`ParsingArguments`] scoped to the translation unit's root,
    /// for a host driving C3–C7 directly against this session's state.
    pub fn root_arguments(&self) -> ParsingArguments {
        ParsingArguments::new(self.symbols.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppdoc_ast::{CppName, Declaration, DeclarationKind, Declarator};
    use cppdoc_common::Span;
    use std::rc::Rc;

    #[test]
    fn checking_an_empty_program_yields_an_empty_root_scope() {
        let mut session = Session::new();
        let program = Program { decls: vec![], created_forward_decl_by_c_style_type_reference: 0 };
        session.check_program(&program).unwrap();
        assert_eq!(session.symbols().arena.len(), 1);
    }

    #[test]
    fn driving_a_variable_declaration_makes_it_a_child_of_the_root_scope() {
        let mut session = Session::new();
        let ty = Rc::new(cppdoc_ast::Type::Primitive {
            keyword: cppdoc_ast::PrimitiveKeyword::Int,
            span: Span::new(0, 3),
        });
        let decl = Rc::new(Declaration::new(
            CppName::normal("count", Span::new(0, 5)),
            Span::new(0, 5),
            DeclarationKind::Variable {
                declarator: Declarator {
                    ty: ty.clone(),
                    ellipsis: false,
                    name: CppName::normal("count", Span::new(0, 5)),
                    initializer: None,
                },
                is_extern: false,
                is_static: false,
            },
        ));
        let program = Program { decls: vec![decl], created_forward_decl_by_c_style_type_reference: 0 };
        session.check_program(&program).unwrap();
        let root = session.root_scope();
        assert_eq!(session.symbols().try_children(root, "count").len(), 1);
    }
}
