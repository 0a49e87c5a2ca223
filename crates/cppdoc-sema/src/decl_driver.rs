//! C8 — the Declaration Driver.
//!
//! Walks the declaration tree handed down by the parser, creating and
//! attaching symbols, evaluating declared types eagerly (spec §4.8: "so
//! redeclaration compatibility can be checked"), and leaving function
//! bodies deferred until a consumer forces them. Also the home of implicit
//! special-member generation and the one call boundary that catches the
//! benign `FinishEvaluatingReturnType` early-exit (spec §5/§9).

use crate::context::{CacheProbe, SemaContext};
use crate::ParsingArguments;
use cppdoc_ast::{ClassTag, Declaration, DeclarationKind, Program};
use cppdoc_common::{Failure, FailureKind, SemaResult, SymbolId};
use cppdoc_symbols::SymbolKind;
use cppdoc_types::TypeId;
use smallvec::SmallVec;
use std::rc::Rc;

impl<'a> SemaContext<'a> {
    /// Walks an entire translation unit, populating the symbol table
    /// rooted at `symbols.root`.
    pub fn drive_program(&mut self, program: &Program) -> SemaResult<()> {
        let pa = ParsingArguments::new(self.symbols.root);
        for decl in &program.decls {
            self.drive_declaration(decl, &pa)?;
        }
        Ok(())
    }

    fn drive_declaration(&mut self, decl: &Rc<Declaration>, pa: &ParsingArguments) -> SemaResult<()> {
        let _span = tracing::debug_span!("drive_declaration", name = %decl.name.name).entered();
        match &decl.kind {
            DeclarationKind::Forward { tag } => {
                let kind = class_tag_to_kind(*tag);
                let existing = self.find_existing_class_symbol(pa.scope, &decl.name.name);
                let symbol = existing.unwrap_or_else(|| self.symbols.add_child(pa.scope, kind, decl.name.name.clone()));
                decl.attach_symbol(symbol);
                self.symbols.push_forward_decl(symbol, decl.clone());
                Ok(())
            }
            DeclarationKind::Variable { declarator, .. } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::Variable, decl.name.name.clone());
                decl.attach_symbol(symbol);
                self.symbols.set_impl_decl(symbol, decl.clone());
                let ty = self.eval_type(&declarator.ty, pa)?;
                self.cache_symbol_type(symbol, ty);
                Ok(())
            }
            DeclarationKind::Function { declarator, body, .. } => {
                let symbol = self.declare_function_symbol(decl, pa)?;
                let ty = self.eval_type(&declarator.ty, pa)?;
                self.cache_symbol_type(symbol, ty);
                if body.is_some() {
                    self.symbols.set_impl_decl(symbol, decl.clone());
                } else {
                    self.symbols.push_forward_decl(symbol, decl.clone());
                }
                Ok(())
            }
            DeclarationKind::Enum { items, .. } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::Enum, decl.name.name.clone());
                decl.attach_symbol(symbol);
                self.symbols.set_impl_decl(symbol, decl.clone());
                let enum_pa = pa.with_scope(symbol);
                for item in items {
                    self.drive_declaration(item, &enum_pa)?;
                    if let Some(item_symbol) = item.symbol_id() {
                        let enum_ty = self.types.decl(symbol);
                        self.cache_symbol_type(item_symbol, enum_ty);
                    }
                }
                Ok(())
            }
            DeclarationKind::EnumItem { .. } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::EnumItem, decl.name.name.clone());
                decl.attach_symbol(symbol);
                self.symbols.set_impl_decl(symbol, decl.clone());
                Ok(())
            }
            DeclarationKind::Class { tag, members, template_params, .. } => {
                let kind = class_tag_to_kind(*tag);
                let existing = self.find_existing_class_symbol(pa.scope, &decl.name.name);
                let symbol = existing.unwrap_or_else(|| self.symbols.add_child(pa.scope, kind, decl.name.name.clone()));
                decl.attach_symbol(symbol);
                self.symbols.set_impl_decl(symbol, decl.clone());
                let class_pa = pa.with_scope(symbol);
                for param in template_params {
                    self.drive_declaration(param, &class_pa)?;
                }
                for member in members {
                    self.drive_declaration(member, &class_pa)?;
                }
                self.ensure_class_member_cache(symbol);
                self.generate_implicit_special_members(symbol, members);
                Ok(())
            }
            DeclarationKind::TypeAlias { target, template_params } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::TypeAlias, decl.name.name.clone());
                decl.attach_symbol(symbol);
                self.symbols.set_impl_decl(symbol, decl.clone());
                let alias_pa = pa.with_scope(symbol);
                for param in template_params {
                    self.drive_declaration(param, &alias_pa)?;
                }
                let ty = self.eval_type(target, &alias_pa)?;
                self.cache_symbol_type(symbol, ty);
                Ok(())
            }
            DeclarationKind::ValueAlias { target } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::ValueAlias, decl.name.name.clone());
                decl.attach_symbol(symbol);
                self.symbols.set_impl_decl(symbol, decl.clone());
                let candidates = self.eval_expr(target, pa)?;
                if let Some(first) = candidates.first() {
                    self.cache_symbol_type(symbol, first.ty);
                }
                Ok(())
            }
            DeclarationKind::Namespace { members, .. } => {
                let existing = self.symbols.try_children(pa.scope, &decl.name.name).first().copied();
                let symbol = existing.unwrap_or_else(|| {
                    self.symbols.add_child(pa.scope, SymbolKind::Namespace, decl.name.name.clone())
                });
                decl.attach_symbol(symbol);
                let ns_pa = pa.with_scope(symbol);
                for member in members {
                    self.drive_declaration(member, &ns_pa)?;
                }
                Ok(())
            }
            DeclarationKind::UsingNamespace { path } => {
                if let Some(target) = self.resolve_path(pa.scope, path) {
                    self.add_using_directive(pa.scope, target);
                }
                Ok(())
            }
            DeclarationKind::Using { path, member } => {
                let Some(base) = self.resolve_path(pa.scope, path) else { return Ok(()) };
                let hits: SmallVec<[SymbolId; 1]> =
                    self.lookup(base, member, crate::resolver::LookupPolicy::ChildSymbolFromOutside);
                for hit in hits {
                    self.symbols.alias_child(pa.scope, member.clone(), hit);
                }
                Ok(())
            }
            DeclarationKind::TemplateTypeParameter { .. } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::GenericTypeArgument, decl.name.name.clone());
                decl.attach_symbol(symbol);
                Ok(())
            }
            DeclarationKind::TemplateValueParameter { .. } => {
                let symbol = self.symbols.add_child(pa.scope, SymbolKind::GenericValueArgument, decl.name.name.clone());
                decl.attach_symbol(symbol);
                Ok(())
            }
        }
    }

    fn declare_function_symbol(&mut self, decl: &Rc<Declaration>, pa: &ParsingArguments) -> SemaResult<SymbolId> {
        let symbol = self.symbols.add_child(pa.scope, SymbolKind::FunctionSymbol, decl.name.name.clone());
        decl.attach_symbol(symbol);
        Ok(symbol)
    }

    /// A `Forward`/`Class` declaration reuses an already-declared class-like
    /// symbol of the same name in `scope` instead of minting a second,
    /// distinct symbol — spec §4.8's redeclaration compatibility applies to
    /// functions; for classes the original keeps one symbol across forward
    /// declarations and the eventual definition.
    fn find_existing_class_symbol(&self, scope: SymbolId, name: &str) -> Option<SymbolId> {
        self.symbols.try_children(scope, name).iter().copied().find(|&id| self.symbols.arena.get(id).kind.is_class_like())
    }

    fn resolve_path(&mut self, scope: SymbolId, path: &[String]) -> Option<SymbolId> {
        let mut current = scope;
        for (i, segment) in path.iter().enumerate() {
            let policy = if i == 0 {
                crate::resolver::LookupPolicy::AccessibleInScope
            } else {
                crate::resolver::LookupPolicy::ChildSymbolFromOutside
            };
            let hits = self.lookup(current, segment, policy);
            current = *hits.first()?;
        }
        Some(current)
    }

    fn cache_symbol_type(&mut self, symbol: SymbolId, ty: TypeId) {
        self.symbols.arena.get_mut(symbol).evaluation_cache =
            Some(cppdoc_symbols::EvaluationCache { types: smallvec::smallvec![ty] });
    }

    /// The canonical type of a single symbol, evaluating and caching it on
    /// first access from whichever declaration gives it a type (the
    /// implementation if present, else the first forward declaration).
    ///
    /// Guards re-entry through `eval_cache` (spec §5): a symbol whose own
    /// declared type recurses back into itself (`using T = T*;`, a member
    /// whose type syntactically names the enclosing class) hits
    /// `CacheProbe::Cycle` instead of recursing without bound.
    pub fn symbol_type(&mut self, symbol: SymbolId, pa: &ParsingArguments) -> SemaResult<TypeId> {
        if let Some(cache) = &self.symbols.arena.get(symbol).evaluation_cache {
            if let Some(&ty) = cache.types.first() {
                return Ok(ty);
            }
        }
        let decl = self
            .symbols
            .impl_decl(symbol)
            .cloned()
            .or_else(|| self.symbols.arena.get(symbol).forward_decls.first().cloned());
        let Some(decl) = decl else {
            return Ok(cppdoc_types::TypeInterner::ANY);
        };
        match self.eval_cache.probe_or_enter(symbol, None, &pa.argument_context) {
            CacheProbe::Hit(types) => {
                let ty = types.first().copied().unwrap_or(cppdoc_types::TypeInterner::ANY);
                self.cache_symbol_type(symbol, ty);
                return Ok(ty);
            }
            CacheProbe::Cycle => return Err(Failure::type_checker_failure(decl.span)),
            CacheProbe::Miss => {}
        }
        let declared_ty = match &decl.kind {
            DeclarationKind::Variable { declarator, .. } | DeclarationKind::Function { declarator, .. } => {
                self.eval_type(&declarator.ty, pa)?
            }
            DeclarationKind::TypeAlias { target, .. } => self.eval_type(target, pa)?,
            DeclarationKind::Class { .. } | DeclarationKind::Forward { .. } => self.types.decl(symbol),
            DeclarationKind::Enum { .. } => self.types.decl(symbol),
            _ => cppdoc_types::TypeInterner::ANY,
        };
        self.eval_cache.complete(symbol, None, &pa.argument_context, smallvec::smallvec![declared_ty]);
        self.cache_symbol_type(symbol, declared_ty);
        Ok(declared_ty)
    }

    /// Forces a deferred function body, evaluating its statements for
    /// cross-reference purposes. Catches the benign
    /// `FinishEvaluatingReturnType` early-exit at this boundary (spec §5/§9)
    /// — it is not a real failure, just a signal that the driver can stop
    /// early once the return type it needed has been determined.
    pub fn force_function_body(&mut self, symbol: SymbolId) -> SemaResult<()> {
        let Some(decl) = self.symbols.impl_decl(symbol).cloned() else { return Ok(()) };
        let DeclarationKind::Function { body: Some(body), .. } = &decl.kind else { return Ok(()) };
        let stat = body.force();
        let pa = ParsingArguments::new(symbol).with_function_symbol(symbol);
        match self.eval_statement(&stat, &pa) {
            Ok(()) => Ok(()),
            Err(f) if f.kind == FailureKind::FinishEvaluatingReturnType => Ok(()),
            Err(f) => Err(f),
        }
    }

    fn eval_statement(&mut self, stat: &cppdoc_ast::Stat, pa: &ParsingArguments) -> SemaResult<()> {
        use cppdoc_ast::StatKind;
        match &stat.kind {
            StatKind::Block(stats) => {
                for s in stats {
                    self.eval_statement(s, pa)?;
                }
                Ok(())
            }
            StatKind::Expr(expr) => {
                self.eval_expr(expr, pa)?;
                Ok(())
            }
            StatKind::Decl(decl) => self.drive_declaration(decl, pa),
            StatKind::If { cond, then_branch, else_branch } => {
                self.eval_expr(cond, pa)?;
                self.eval_statement(then_branch, pa)?;
                if let Some(else_branch) = else_branch {
                    self.eval_statement(else_branch, pa)?;
                }
                Ok(())
            }
            StatKind::While { cond, body } | StatKind::DoWhile { body, cond } => {
                self.eval_expr(cond, pa)?;
                self.eval_statement(body, pa)
            }
            StatKind::For { init, cond, step, body } => {
                if let Some(init) = init {
                    self.eval_statement(init, pa)?;
                }
                if let Some(cond) = cond {
                    self.eval_expr(cond, pa)?;
                }
                if let Some(step) = step {
                    self.eval_expr(step, pa)?;
                }
                self.eval_statement(body, pa)
            }
            StatKind::Return(expr) => {
                if let Some(expr) = expr {
                    self.eval_expr(expr, pa)?;
                }
                Ok(())
            }
            StatKind::Empty => Ok(()),
        }
    }

    /// Generates the default constructor, copy/move constructors,
    /// copy/move assignment operators, and the destructor for a class when
    /// (a) the class needs them, (b) none is user-declared, and (c) the
    /// base/member set permits it (spec §4.8). A conservative subset: we
    /// check only for a user-declared member of the same special-member
    /// shape, and always allow generation when none is found (a full
    /// enabling-predicate walk over every base/member's own special
    /// members is out of scope for a semantic core that does not also
    /// need to validate those bodies).
    fn generate_implicit_special_members(&mut self, class_symbol: SymbolId, members: &[Rc<Declaration>]) {
        let has_user_ctor = members.iter().any(|m| {
            matches!(&m.kind, DeclarationKind::Function { .. }) && m.name.kind == cppdoc_ast::CppNameType::Constructor
        });
        let has_user_dtor = members.iter().any(|m| m.name.kind == cppdoc_ast::CppNameType::Destructor);
        let has_user_assign = members.iter().any(|m| {
            matches!(&m.kind, DeclarationKind::Function { .. }) && m.name.kind == cppdoc_ast::CppNameType::Operator && m.name.name == "operator="
        });

        let class_ty = self.types.decl(class_symbol);
        let const_ref = self.types.lref(self.types.cv(class_ty, cppdoc_types::CvFlags::CONST));
        let rvalue_ref = self.types.rref(class_ty);

        if !has_user_ctor {
            self.synth_special_member(class_symbol, cppdoc_ast::CppNameType::Constructor, &[]);
            self.synth_special_member(class_symbol, cppdoc_ast::CppNameType::Constructor, &[const_ref]);
            self.synth_special_member(class_symbol, cppdoc_ast::CppNameType::Constructor, &[rvalue_ref]);
        }
        if !has_user_dtor {
            self.synth_special_member(class_symbol, cppdoc_ast::CppNameType::Destructor, &[]);
        }
        if !has_user_assign {
            self.synth_assignment_operator(class_symbol, const_ref);
            self.synth_assignment_operator(class_symbol, rvalue_ref);
        }
    }

    fn synth_special_member(&mut self, class_symbol: SymbolId, kind: cppdoc_ast::CppNameType, params: &[TypeId]) {
        let name = match kind {
            cppdoc_ast::CppNameType::Constructor => self.symbols.arena.get(class_symbol).name.clone(),
            cppdoc_ast::CppNameType::Destructor => format!("~{}", self.symbols.arena.get(class_symbol).name),
            _ => return,
        };
        let symbol = self.symbols.add_child(class_symbol, SymbolKind::FunctionSymbol, name);
        let ret = cppdoc_types::TypeInterner::VOID;
        let param_vec: SmallVec<[TypeId; 4]> = params.iter().copied().collect();
        let ty = self.types.function(ret, param_vec, cppdoc_types::FunctionFlags::empty());
        self.cache_symbol_type(symbol, ty);
        self.symbols.arena.get_mut(symbol).impl_decl = None;
    }

    /// Synthesizes `operator=(param)`, returning a reference to the class
    /// (spec §4.8) — the copy-assignment form when `param` is a `const T&`,
    /// move-assignment when it is a `T&&`.
    fn synth_assignment_operator(&mut self, class_symbol: SymbolId, param: TypeId) {
        let symbol = self.symbols.add_child(class_symbol, SymbolKind::FunctionSymbol, "operator=".to_string());
        let class_ty = self.types.decl(class_symbol);
        let ret = self.types.lref(class_ty);
        let ty = self.types.function(ret, smallvec::smallvec![param], cppdoc_types::FunctionFlags::empty());
        self.cache_symbol_type(symbol, ty);
        self.symbols.arena.get_mut(symbol).impl_decl = None;
    }
}

fn class_tag_to_kind(tag: ClassTag) -> SymbolKind {
    match tag {
        ClassTag::Class => SymbolKind::Class,
        ClassTag::Struct => SymbolKind::Struct,
        ClassTag::Union => SymbolKind::Union,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationCache;
    use cppdoc_ast::{CppName, Declaration, DeclarationKind, Declarator, Type as AstType};
    use cppdoc_common::Span;
    use cppdoc_symbols::SymbolTable;
    use cppdoc_types::TypeInterner;
    use cppdoc_xref::Recorder;
    use std::rc::Rc;

    fn harness() -> (TypeInterner, SymbolTable, Recorder, EvaluationCache) {
        (TypeInterner::new(), SymbolTable::new(), Recorder::new(), EvaluationCache::default())
    }

    #[test]
    fn variable_declaration_creates_symbol_with_evaluated_type() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let program = Program {
            decls: vec![Rc::new(Declaration::new(
                CppName::normal("x", Span::new(0, 1)),
                Span::new(0, 1),
                DeclarationKind::Variable {
                    declarator: Declarator {
                        ty: Rc::new(AstType::Primitive { keyword: cppdoc_ast::PrimitiveKeyword::Int, span: Span::new(0, 1) }),
                        ellipsis: false,
                        name: CppName::normal("x", Span::new(0, 1)),
                        initializer: None,
                    },
                    is_extern: false,
                    is_static: false,
                },
            ))],
            created_forward_decl_by_c_style_type_reference: 0,
        };
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        ctx.drive_program(&program).unwrap();
        let symbol = symbols.try_children(symbols.root, "x")[0];
        let ty = symbols.arena.get(symbol).evaluation_cache.as_ref().unwrap().types[0];
        assert_eq!(ty, TypeInterner::INT);
    }
}
