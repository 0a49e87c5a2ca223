//! C7 — the Template Engine.
//!
//! Inductive unification of a syntactic pattern (the parameter's
//! `cppdoc_ast::Type`, as written in the template's own declaration)
//! against an actual, canonical `TypeId` (the call-site argument or
//! explicit template argument). This is deliberately asymmetric: the
//! pattern side stays syntactic rather than canonical, because an
//! uninstantiated template parameter has no canonical type of its own to
//! unify against — only a placeholder symbol that `InferTemplateArgument`
//! is trying to bind in the first place (spec §4.7).
//!
//! Grounded on the teacher's `tsz-solver::infer` module: a recursive
//! pattern-match function threaded through a mutable bindings map, plus a
//! `GenericFunction` partial-application type for the "not all arguments
//! supplied yet" case.

use crate::context::SemaContext;
use crate::ParsingArguments;
use cppdoc_ast::{DeclarationKind, GenericArgNode, Type};
use cppdoc_common::{SemaResult, SymbolId};
use cppdoc_symbols::SymbolKind;
use cppdoc_types::{FunctionFlags, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// `pattern`'s free template-parameter symbols bound to `actual`'s
/// corresponding structure, or `None` if the shapes cannot unify at all
/// (spec §4.7: "a structural mismatch fails deduction for this candidate,
/// not the whole overload resolution").
pub type Bindings = FxHashMap<SymbolId, TypeId>;

impl<'a> SemaContext<'a> {
    /// The ordered set of `owner`'s own template-parameter symbols
    /// (`GenericTypeArgument`/`GenericValueArgument` children), the "free
    /// variables" that `infer_template_argument` is allowed to bind.
    pub fn collect_free_symbols(&self, owner: SymbolId) -> SmallVec<[SymbolId; 4]> {
        self.symbols
            .arena
            .get(owner)
            .children_in_order()
            .filter(|&child| {
                matches!(
                    self.symbols.arena.get(child).kind,
                    SymbolKind::GenericTypeArgument | SymbolKind::GenericValueArgument
                )
            })
            .collect()
    }

    /// Attempts to unify one syntactic parameter pattern against one
    /// canonical actual type, recording any free-symbol bindings it
    /// discovers into `bindings`. Returns `false` on a structural
    /// mismatch; an actual of `Any` always succeeds without binding
    /// anything (spec §4.7: dependent/unresolvable actuals defer rather
    /// than fail deduction).
    pub fn infer_template_argument(
        &mut self,
        pattern: &Type,
        actual: TypeId,
        free: &FxHashSet<SymbolId>,
        bindings: &mut Bindings,
        pa: &ParsingArguments,
    ) -> bool {
        if self.types.is_unknown(actual) {
            return true;
        }
        match pattern {
            Type::Id { name, .. } => {
                let hits = self.lookup(pa.scope, name, crate::resolver::LookupPolicy::AccessibleInScope);
                if let Some(&sym) = hits.first() {
                    if free.contains(&sym) {
                        return self.set_inferred_result(bindings, sym, actual);
                    }
                }
                match self.eval_type(pattern, pa) {
                    Ok(concrete) => self.types.entity_of(concrete) == self.types.entity_of(actual),
                    Err(_) => false,
                }
            }
            Type::Decorated { inner, .. } => {
                let decomposed = self.types.decompose(actual);
                self.infer_template_argument(inner, decomposed.entity, free, bindings, pa)
            }
            Type::Ptr { inner, .. } => match self.types.is_ptr(self.types.entity_of(actual)) {
                true => {
                    let elem = self.types.element_of(self.types.entity_of(actual)).expect("ptr has element");
                    self.infer_template_argument(inner, elem, free, bindings, pa)
                }
                false => false,
            },
            Type::LRef { inner, .. } | Type::RRef { inner, .. } => {
                let decomposed = self.types.decompose(actual);
                self.infer_template_argument(inner, decomposed.entity, free, bindings, pa)
            }
            Type::Array { inner, .. } => match self.types.array_parts(self.types.entity_of(actual)) {
                Some((elem, _)) => self.infer_template_argument(inner, elem, free, bindings, pa),
                None => false,
            },
            Type::Member { owner, inner, .. } => match self.types.member_parts(self.types.entity_of(actual)) {
                Some((owner_ty, inner_ty)) => {
                    self.infer_template_argument(owner, owner_ty, free, bindings, pa)
                        && self.infer_template_argument(inner, inner_ty, free, bindings, pa)
                }
                None => false,
            },
            Type::Function { ret, params, .. } => {
                let entity = self.types.entity_of(actual);
                if !self.types.is_function(entity) {
                    return false;
                }
                let actual_ret = self.types.return_type(entity);
                if !self.infer_template_argument(ret, actual_ret, free, bindings, pa) {
                    return false;
                }
                self.infer_param_list(params, entity, free, bindings, pa)
            }
            Type::Generic { base, args, .. } => {
                let actual_entity = self.types.entity_of(actual);
                let Ok(Some(base_symbol)) = self.resolve_template_base(base, pa) else { return false };
                if let Some((actual_symbol, _, actual_args)) = self.types.decl_instant_parts(actual_entity) {
                    if base_symbol == actual_symbol {
                        return self.infer_generic_arg_list(args, &actual_args, free, bindings, pa);
                    }
                }
                // Match-base-class: the parameter expects an instantiation of
                // `base_symbol`, the argument instantiates something else.
                // Walk the argument's base-class chain for an ancestor that
                // does instantiate `base_symbol`, and retry against each in
                // turn — the only place this engine backtracks (spec §4.7).
                for candidate in self.base_class_instantiations(actual_entity, base_symbol) {
                    let mut trial = bindings.clone();
                    if self.infer_template_argument(pattern, candidate, free, &mut trial, pa) {
                        *bindings = trial;
                        return true;
                    }
                }
                false
            }
            Type::Child { .. } | Type::Decltype { .. } => match self.eval_type(pattern, pa) {
                Ok(concrete) => self.types.entity_of(concrete) == self.types.entity_of(actual),
                Err(_) => false,
            },
            Type::Primitive { .. } => match self.eval_type(pattern, pa) {
                Ok(concrete) => concrete == self.types.entity_of(actual),
                Err(_) => false,
            },
        }
    }

    fn infer_param_list(
        &mut self,
        params: &[cppdoc_ast::VariadicItem<std::rc::Rc<Type>>],
        function_entity: TypeId,
        free: &FxHashSet<SymbolId>,
        bindings: &mut Bindings,
        pa: &ParsingArguments,
    ) -> bool {
        let actual_count = self.types.param_count(function_entity);
        for (i, item) in params.iter().enumerate() {
            if item.is_variadic {
                let rest: SmallVec<[TypeId; 4]> =
                    (i..actual_count).map(|j| self.types.param(function_entity, j)).collect();
                return self.infer_pack(&item.item, rest, free, bindings, pa);
            }
            if i >= actual_count {
                return false;
            }
            let actual_param = self.types.param(function_entity, i);
            if !self.infer_template_argument(&item.item, actual_param, free, bindings, pa) {
                return false;
            }
        }
        params.len() == actual_count
    }

    /// Binds a variadic pack's pattern against the remaining actual
    /// arguments as a single `Init` bundle (spec §4.7: "variadic pack
    /// expansion represents the tail as an `Init` type"), recursing once
    /// per element so every element independently constrains the free
    /// symbol it mentions.
    fn infer_pack(
        &mut self,
        pattern: &Type,
        rest: SmallVec<[TypeId; 4]>,
        free: &FxHashSet<SymbolId>,
        bindings: &mut Bindings,
        pa: &ParsingArguments,
    ) -> bool {
        for &actual in &rest {
            if !self.infer_template_argument(pattern, actual, free, bindings, pa) {
                return false;
            }
        }
        let bundle = self
            .types
            .init(rest.iter().map(|&ty| (ty, cppdoc_types::ValueCategory::PRValue)));
        if let Type::Id { name, .. } = pattern {
            let hits = self.lookup(pa.scope, name, crate::resolver::LookupPolicy::AccessibleInScope);
            if let Some(&sym) = hits.first() {
                if free.contains(&sym) {
                    bindings.entry(sym).or_insert(bundle);
                }
            }
        }
        true
    }

    fn infer_generic_arg_list(
        &mut self,
        pattern_args: &[cppdoc_ast::VariadicItem<GenericArgNode>],
        actual_args: &[TypeId],
        free: &FxHashSet<SymbolId>,
        bindings: &mut Bindings,
        pa: &ParsingArguments,
    ) -> bool {
        if pattern_args.len() != actual_args.len() {
            return false;
        }
        for (item, &actual) in pattern_args.iter().zip(actual_args.iter()) {
            let matched = match &item.item {
                GenericArgNode::Type(ty) => self.infer_template_argument(ty, actual, free, bindings, pa),
                GenericArgNode::Value(_) => true,
            };
            if !matched {
                return false;
            }
        }
        true
    }

    /// Every base-class instantiation of `actual_entity` that instantiates
    /// `target_class`, found by a derived-to-base BFS that stops walking a
    /// branch once it matches (mirrors the original's `CreateMbcr`: once a
    /// base in the chain instantiates the target template, its own bases
    /// are not searched for a second, more-derived-still match).
    fn base_class_instantiations(&mut self, actual_entity: TypeId, target_class: SymbolId) -> Vec<TypeId> {
        let mut results = Vec::new();
        let Some(start_symbol) = self.types.as_decl_symbol(actual_entity) else { return results };
        if start_symbol == target_class {
            return results;
        }
        self.ensure_class_member_cache(start_symbol);
        let mut frontier: Vec<TypeId> = self
            .symbols
            .arena
            .get(start_symbol)
            .class_member_cache
            .as_ref()
            .map(|c| c.base_classes.clone())
            .unwrap_or_default();
        let mut seen = FxHashSet::default();
        let mut expansions = 0usize;
        while let Some(base_ty) = frontier.pop() {
            expansions += 1;
            if expansions > cppdoc_common::limits::MAX_MBC_GRID_EXPANSIONS {
                break;
            }
            if !seen.insert(base_ty) {
                continue;
            }
            let base_entity = self.types.entity_of(base_ty);
            let Some(base_symbol) = self.types.as_decl_symbol(base_entity) else { continue };
            if base_symbol == target_class {
                results.push(base_ty);
                continue;
            }
            self.ensure_class_member_cache(base_symbol);
            if let Some(cache) = &self.symbols.arena.get(base_symbol).class_member_cache {
                frontier.extend(cache.base_classes.iter().copied());
            }
        }
        results
    }

    fn resolve_template_base(&mut self, base: &Type, pa: &ParsingArguments) -> SemaResult<Option<SymbolId>> {
        match base {
            Type::Id { name, .. } => {
                let hits = self.lookup(pa.scope, name, crate::resolver::LookupPolicy::AccessibleInScope);
                Ok(hits.first().copied())
            }
            _ => match self.eval_type(base, pa) {
                Ok(ty) => Ok(self.types.as_decl_symbol(self.types.entity_of(ty))),
                Err(e) => Err(e),
            },
        }
    }

    /// Binds `symbol` to `ty`, or checks consistency with an existing
    /// binding (spec §4.7 `SetInferredResult`): a template parameter
    /// deduced from two different call-site positions must agree, or
    /// deduction fails for this candidate.
    fn set_inferred_result(&mut self, bindings: &mut Bindings, symbol: SymbolId, ty: TypeId) -> bool {
        match bindings.get(&symbol) {
            Some(&existing) => existing == ty,
            None => {
                bindings.insert(symbol, ty);
                true
            }
        }
    }

    /// Infers and substitutes a call to a function template: unifies each
    /// declared parameter pattern against the corresponding call argument,
    /// applies explicit template arguments first, falls back to each
    /// parameter's default where deduction left it unbound, and returns
    /// the fully substituted function type together with the
    /// `ArgumentContext` that produced it. `Ok(None)` signals deduction
    /// failure (not every free symbol could be bound) rather than an
    /// ill-formed program.
    pub fn instantiate_function_template(
        &mut self,
        function_symbol: SymbolId,
        explicit_type_args: &[TypeId],
        call_arg_types: &[TypeId],
        pa: &ParsingArguments,
    ) -> SemaResult<Option<(TypeId, crate::context::ArgumentContext)>> {
        let free_list = self.collect_free_symbols(function_symbol);
        let free: FxHashSet<SymbolId> = free_list.iter().copied().collect();
        let mut bindings = Bindings::default();
        for (&sym, &ty) in free_list.iter().zip(explicit_type_args.iter()) {
            if !self.set_inferred_result(&mut bindings, sym, ty) {
                return Ok(None);
            }
        }

        let decl = self
            .symbols
            .impl_decl(function_symbol)
            .cloned()
            .or_else(|| self.symbols.arena.get(function_symbol).forward_decls.first().cloned());
        let Some(decl) = decl else { return Ok(None) };
        let DeclarationKind::Function { declarator, .. } = &decl.kind else { return Ok(None) };
        let Type::Function { params, .. } = declarator.ty.as_ref() else { return Ok(None) };

        let fn_pa = pa.with_scope(function_symbol);
        for (item, &actual) in params.iter().zip(call_arg_types.iter()) {
            if item.is_variadic {
                let rest: SmallVec<[TypeId; 4]> = call_arg_types[..].to_vec().into();
                if !self.infer_pack(&item.item, rest, &free, &mut bindings, &fn_pa) {
                    return Ok(None);
                }
                break;
            }
            if !self.infer_template_argument(&item.item, actual, &free, &mut bindings, &fn_pa) {
                return Ok(None);
            }
        }

        for &sym in &free_list {
            if bindings.contains_key(&sym) {
                continue;
            }
            let Some(default_ty) = self.default_for_template_param(sym, &fn_pa)? else {
                return Ok(None);
            };
            bindings.insert(sym, default_ty);
        }

        let ctx = self.fresh_argument_context(bindings);
        let substituted_pa = fn_pa.with_argument_context(ctx.clone());
        let substituted_ty = self.eval_type(declarator.ty.as_ref(), &substituted_pa)?;
        Ok(Some((substituted_ty, ctx)))
    }

    fn default_for_template_param(&mut self, sym: SymbolId, pa: &ParsingArguments) -> SemaResult<Option<TypeId>> {
        let Some(decl) = self.symbols.impl_decl(sym).cloned() else { return Ok(None) };
        match &decl.kind {
            DeclarationKind::TemplateTypeParameter { default_type: Some(ty), .. } => {
                Ok(Some(self.eval_type(ty, pa)?))
            }
            DeclarationKind::TemplateValueParameter { default_value: Some(expr), .. } => {
                let candidates = self.eval_expr(expr, pa)?;
                Ok(candidates.first().map(|c| c.ty))
            }
            _ => Ok(None),
        }
    }

    /// Evaluates a function template's declared shape under `pa`'s active
    /// argument context without running call-argument deduction, for a
    /// template-id expression (`M<bool>`) that names a template with
    /// explicit arguments but has not (yet) been called. Yields a concrete
    /// `Function` once every free symbol is bound, otherwise a
    /// `GenericFunction` that still carries the unbound positions as bare
    /// `GenericArg`s (spec §4.7 "partial application").
    pub fn partial_function_template_type(
        &mut self,
        function_symbol: SymbolId,
        pa: &ParsingArguments,
        still_generic: bool,
    ) -> SemaResult<TypeId> {
        let decl = self
            .symbols
            .impl_decl(function_symbol)
            .cloned()
            .or_else(|| self.symbols.arena.get(function_symbol).forward_decls.first().cloned());
        let Some(decl) = decl else { return Ok(cppdoc_types::TypeInterner::ANY) };
        let DeclarationKind::Function { declarator, .. } = &decl.kind else {
            return Ok(cppdoc_types::TypeInterner::ANY);
        };
        let Type::Function { ret, params, is_const, is_volatile, ref_qualifier, .. } = declarator.ty.as_ref() else {
            return Ok(cppdoc_types::TypeInterner::ANY);
        };
        let ret_ty = self.eval_type(ret, pa)?;
        let mut param_tys: SmallVec<[TypeId; 4]> = SmallVec::new();
        for item in params {
            param_tys.push(self.eval_type(&item.item, pa)?);
        }
        let flags = crate::type_eval::function_flags_for(*is_const, *is_volatile, *ref_qualifier);
        if still_generic {
            Ok(self.types.generic_function(ret_ty, param_tys, flags))
        } else {
            Ok(self.types.function(ret_ty, param_tys, flags))
        }
    }

    /// Builds the still-generic `GenericFunction` type for a template that
    /// has not yet received any arguments — the result of referring to a
    /// function template by name without calling it (spec §4.7: "partial
    /// application yielding `GenericFunction`").
    pub fn generic_function_type(&mut self, function_symbol: SymbolId, pa: &ParsingArguments) -> SemaResult<TypeId> {
        let ty = self.symbol_type(function_symbol, pa)?;
        let entity = self.types.entity_of(ty);
        if let Some(flags) = self.types.function_flags(entity) {
            let ret = self.types.return_type(entity);
            let param_count = self.types.param_count(entity);
            let params: SmallVec<[TypeId; 4]> = (0..param_count).map(|i| self.types.param(entity, i)).collect();
            return Ok(self.types.generic_function(ret, params, flags | FunctionFlags::empty()));
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationCache;
    use cppdoc_ast::{CppName, Declaration, Declarator, Program};
    use cppdoc_common::Span;
    use cppdoc_symbols::{SymbolKind, SymbolTable};
    use cppdoc_types::TypeInterner;
    use cppdoc_xref::Recorder;
    use std::rc::Rc;

    fn harness() -> (TypeInterner, SymbolTable, Recorder, EvaluationCache) {
        (TypeInterner::new(), SymbolTable::new(), Recorder::new(), EvaluationCache::default())
    }

    /// `template <typename T> T identity(T x);` called with an `int`
    /// argument deduces `T = int` and substitutes the return type.
    #[test]
    fn simple_deduction_binds_template_parameter_from_argument() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);

        let root = ctx.symbols.root;
        let param_ty = Rc::new(Type::Id { name: "T".to_string(), span: Span::new(0, 1) });
        let function = Rc::new(Declaration::new(
            CppName::normal("identity", Span::new(0, 1)),
            Span::new(0, 1),
            DeclarationKind::Function {
                declarator: Declarator {
                    ty: Rc::new(Type::Function {
                        ret: param_ty.clone(),
                        params: vec![cppdoc_ast::VariadicItem::new(param_ty.clone())],
                        is_const: false,
                        is_volatile: false,
                        ref_qualifier: None,
                        span: Span::new(0, 1),
                    }),
                    ellipsis: false,
                    name: CppName::normal("identity", Span::new(0, 1)),
                    initializer: None,
                },
                is_static: false,
                is_virtual: false,
                params: vec![],
                body: None,
            },
        ));
        let type_param = Rc::new(Declaration::new(
            CppName::normal("T", Span::new(0, 1)),
            Span::new(0, 1),
            DeclarationKind::TemplateTypeParameter { default_type: None, is_pack: false },
        ));

        let program = Program { decls: vec![function.clone()], created_forward_decl_by_c_style_type_reference: 0 };
        ctx.drive_program(&program).unwrap();
        let fn_symbol = ctx.symbols.try_children(root, "identity")[0];
        // Attach the template parameter under the function's own scope,
        // the way `drive_declaration` would for a `TemplateTypeParameter`.
        let type_param_symbol = ctx.symbols.add_child(fn_symbol, SymbolKind::GenericTypeArgument, "T");
        type_param.attach_symbol(type_param_symbol);
        ctx.symbols.set_impl_decl(type_param_symbol, type_param.clone());

        let pa = crate::ParsingArguments::new(root);
        let result = ctx.instantiate_function_template(fn_symbol, &[], &[TypeInterner::INT], &pa).unwrap();
        let (substituted, _) = result.expect("deduction should succeed");
        assert_eq!(ctx.types.return_type(substituted), TypeInterner::INT);
    }

    /// `Base<T>` unified against a `Derived` argument (where `Derived :
    /// Base<int>`) backtracks through the base-class chain and binds
    /// `T = int`, rather than failing outright on the symbol mismatch.
    #[test]
    fn match_base_class_backtracks_through_inheritance() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);

        let root = ctx.symbols.root;
        let base_symbol = ctx.symbols.add_child(root, SymbolKind::Class, "Base");
        let derived_symbol = ctx.symbols.add_child(root, SymbolKind::Class, "Derived");
        let template_param = ctx.symbols.add_child(root, SymbolKind::GenericTypeArgument, "T");

        let base_instant = ctx.types.decl_instant(base_symbol, None, smallvec::smallvec![TypeInterner::INT]);
        ctx.symbols.arena.get_mut(derived_symbol).class_member_cache =
            Some(cppdoc_symbols::ClassMemberCache { base_classes: vec![base_instant], this_type: None });

        let derived_ty = ctx.types.decl(derived_symbol);
        let pattern = Type::Generic {
            base: Rc::new(Type::Id { name: "Base".to_string(), span: Span::new(0, 1) }),
            args: vec![cppdoc_ast::VariadicItem::new(GenericArgNode::Type(Rc::new(Type::Id {
                name: "T".to_string(),
                span: Span::new(0, 1),
            })))],
            span: Span::new(0, 1),
        };

        let free: FxHashSet<SymbolId> = std::iter::once(template_param).collect();
        let mut bindings = Bindings::default();
        let pa = crate::ParsingArguments::new(root);
        assert!(ctx.infer_template_argument(&pattern, derived_ty, &free, &mut bindings, &pa));
        assert_eq!(bindings.get(&template_param), Some(&TypeInterner::INT));
    }
}
