//! C5 — the Expression Evaluator.
//!
//! Maps every syntactic expression node to an **expression-type set**: a
//! list of `(symbol?, value-category, type)` triples (spec §4.5),
//! preserving overload ambiguity until a caller collapses it — usually a
//! `Call` running C6, or `decltype` (C4) taking the first candidate.
//!
//! Grounded on the teacher's `tsz-checker::expr_eval` dispatch: one big
//! match over the expression variant, each arm delegating to a small
//! focused helper, extending the shared `SemaContext<'a>` the way the rest
//! of this crate does.

use crate::context::SemaContext;
use crate::overload::{Candidate, OverloadOutcome};
use crate::resolver::LookupPolicy;
use crate::ParsingArguments;
use cppdoc_ast::{BinaryOp, CharPrefix, Expr, FloatSuffix, GenericArgument, IntegerSuffix, Literal, MemberAccessOp, UnaryOp};
use cppdoc_common::{Failure, SemaResult, Span, SymbolId};
use cppdoc_symbols::SymbolKind;
use cppdoc_types::{CvFlags, PrimitiveKind, RefKind, TypeId, ValueCategory};
use cppdoc_xref::ResolutionKind;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

/// One candidate an expression could evaluate to, prior to overload
/// resolution collapsing the set (spec §4.5: "a list of `(symbol?,
/// value-category, type)` triples").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExprCandidate {
    pub symbol: Option<SymbolId>,
    pub category: ValueCategory,
    pub ty: TypeId,
}

impl ExprCandidate {
    fn prvalue(ty: TypeId) -> Self {
        ExprCandidate { symbol: None, category: ValueCategory::PRValue, ty }
    }

    fn lvalue(ty: TypeId) -> Self {
        ExprCandidate { symbol: None, category: ValueCategory::LValue, ty }
    }

    fn of_symbol(symbol: SymbolId, category: ValueCategory, ty: TypeId) -> Self {
        ExprCandidate { symbol: Some(symbol), category, ty }
    }
}

/// The list a single expression evaluates to. A list, not a single value,
/// precisely so overload ambiguity survives until something (an enclosing
/// `Call`, or `decltype` picking the first entry) collapses it.
pub type ExprTypeSet = SmallVec<[ExprCandidate; 1]>;

fn one(c: ExprCandidate) -> ExprTypeSet {
    smallvec![c]
}

impl<'a> SemaContext<'a> {
    /// Top-level dispatch: maps one syntactic expression to its
    /// expression-type set (spec §4.5).
    pub fn eval_expr(&mut self, expr: &Expr, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        match expr {
            Expr::Literal { value, span } => Ok(self.eval_literal(value, *span)),
            Expr::This { span } => self.eval_this(*span, pa),
            Expr::Id { name, span } => self.eval_id(name, *span, pa),
            Expr::QualifiedId { path, span } => self.eval_qualified_id(path, *span, pa),
            Expr::Generic { base, args, span } => self.eval_generic_expr(base, args, *span, pa),
            Expr::Paren { inner, .. } => self.eval_paren(inner, pa),
            Expr::Cast { target, operand, span } => self.eval_cast(target, operand, *span, pa),
            Expr::Typeid { operand, span } => self.eval_typeid(operand, *span, pa),
            Expr::ArrayAccess { base, index, span } => self.eval_array_access(base, index, *span, pa),
            Expr::Unary { op, operand, span } => self.eval_unary(*op, operand, *span, pa),
            Expr::Binary { op, left, right, span } => self.eval_binary(*op, left, right, *span, pa),
            Expr::Conditional { cond, then_branch, else_branch, span } => {
                self.eval_conditional(cond, then_branch, else_branch, *span, pa)
            }
            Expr::Member { op, base, member, span } => self.eval_member(*op, base, member, *span, pa),
            Expr::Call { callee, arguments, span } => self.eval_call(callee, arguments, *span, pa),
            Expr::Throw { operand, span } => self.eval_throw(operand.as_deref(), *span, pa),
        }
    }

    // ---- literals ---------------------------------------------------

    fn eval_literal(&mut self, lit: &Literal, span: Span) -> ExprTypeSet {
        match lit {
            Literal::Integer { digits, suffix } => one(ExprCandidate::prvalue(self.eval_integer_literal(digits, *suffix))),
            Literal::Float { digits, suffix } => {
                let _ = digits;
                let width = match suffix {
                    FloatSuffix::None => 64,
                    FloatSuffix::F => 32,
                };
                one(ExprCandidate::prvalue(self.types.primitive(PrimitiveKind::Float, width)))
            }
            Literal::String { value, prefix } => {
                let char_ty = self.char_type_for_prefix(*prefix);
                let len = value.chars().count() as u64 + 1; // + trailing NUL
                let qualified = self.types.cv(char_ty, CvFlags::CONST);
                let array = self.types.array(qualified, len);
                // spec §4.5: "string: CV-const array-of-char lref" — the
                // literal names an lvalue of that array type.
                one(ExprCandidate::lvalue(array))
            }
            Literal::Char { prefix, .. } => one(ExprCandidate::prvalue(self.char_type_for_prefix(*prefix))),
            Literal::Bool(_) => one(ExprCandidate::prvalue(cppdoc_types::TypeInterner::BOOL)),
            Literal::Nullptr => {
                let _ = span;
                one(ExprCandidate::prvalue(cppdoc_types::TypeInterner::NULLPTR))
            }
        }
    }

    fn char_type_for_prefix(&mut self, prefix: CharPrefix) -> TypeId {
        match prefix {
            CharPrefix::None => self.types.primitive(PrimitiveKind::SignedChar, 8),
            CharPrefix::Wide => self.types.primitive(PrimitiveKind::UnsignedWideChar, 16),
            CharPrefix::Utf8 => self.types.primitive(PrimitiveKind::UnsignedChar, 8),
            // char16_t/char32_t have no dedicated primitive kind in this
            // type universe (spec §3 lists exactly eight); the closest fit
            // is an unsigned integer of the matching width.
            CharPrefix::Char16 => self.types.primitive(PrimitiveKind::UnsignedInt, 16),
            CharPrefix::Char32 => self.types.primitive(PrimitiveKind::UnsignedInt, 32),
        }
    }

    /// Integer suffix → width/signedness table (spec §4.5, §9 Open
    /// Question ii): a single `L` stays 32-bit, only `LL` widens to 64;
    /// an unsuffixed literal picks the smallest of
    /// signed-32/unsigned-32/signed-64/unsigned-64 that fits its
    /// magnitude, except an all-zero literal is always `signed-int-32`
    /// regardless of how many zero digits it has.
    fn eval_integer_literal(&mut self, digits: &str, suffix: IntegerSuffix) -> TypeId {
        let value = parse_integer_digits(digits);
        let fits = |bits: u32, signed: bool| -> bool {
            if signed {
                value <= (1u128 << (bits - 1)) - 1
            } else {
                value <= (1u128 << bits) - 1
            }
        };
        match suffix {
            IntegerSuffix::None => {
                if value == 0 || fits(32, true) {
                    self.types.primitive(PrimitiveKind::SignedInt, 32)
                } else if fits(32, false) {
                    self.types.primitive(PrimitiveKind::UnsignedInt, 32)
                } else if fits(64, true) {
                    self.types.primitive(PrimitiveKind::SignedInt, 64)
                } else {
                    self.types.primitive(PrimitiveKind::UnsignedInt, 64)
                }
            }
            IntegerSuffix::U => {
                if fits(32, false) {
                    self.types.primitive(PrimitiveKind::UnsignedInt, 32)
                } else {
                    self.types.primitive(PrimitiveKind::UnsignedInt, 64)
                }
            }
            IntegerSuffix::L => self.types.primitive(PrimitiveKind::SignedInt, 32),
            IntegerSuffix::Ul => self.types.primitive(PrimitiveKind::UnsignedInt, 32),
            IntegerSuffix::Ll => self.types.primitive(PrimitiveKind::SignedInt, 64),
            IntegerSuffix::Ull => self.types.primitive(PrimitiveKind::UnsignedInt, 64),
        }
    }

    // ---- this ---------------------------------------------------------

    fn eval_this(&mut self, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let Some(function_symbol) = pa.function_symbol else {
            return Err(Failure::illegal_expression(span));
        };
        let mut current = self.symbols.arena.get(function_symbol).parent;
        let class_symbol = loop {
            match current {
                Some(id) if self.symbols.arena.get(id).kind.is_class_like() => break Some(id),
                Some(id) => current = self.symbols.arena.get(id).parent,
                None => break None,
            }
        };
        let Some(class_symbol) = class_symbol else {
            return Err(Failure::illegal_expression(span));
        };
        self.ensure_class_member_cache(class_symbol);
        let this_ty = self
            .symbols
            .arena
            .get(class_symbol)
            .class_member_cache
            .as_ref()
            .and_then(|c| c.this_type);
        match this_ty {
            Some(ty) => Ok(one(ExprCandidate::prvalue(ty))),
            None => Err(Failure::illegal_expression(span)),
        }
    }

    // ---- names ----------------------------------------------------------

    fn eval_id(&mut self, name: &str, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let hits = self.lookup(pa.scope, name, LookupPolicy::AccessibleInScope);
        if hits.is_empty() {
            return Ok(SmallVec::new());
        }
        self.recorder.record(ResolutionKind::Resolved, span, &hits);
        self.candidates_for_symbols(&hits, span, pa)
    }

    fn eval_qualified_id(&mut self, path: &[String], span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let Some((last, prefix)) = path.split_last() else {
            return Err(Failure::illegal_expression(span));
        };
        let mut scope = pa.scope;
        let mut resolved_prefix = true;
        for (i, segment) in prefix.iter().enumerate() {
            let policy = if i == 0 { LookupPolicy::AccessibleInScope } else { LookupPolicy::ChildSymbolFromOutside };
            let hits = self.lookup(scope, segment, policy);
            let Some(&first) = hits.first() else {
                resolved_prefix = false;
                break;
            };
            scope = first;
        }
        if !resolved_prefix {
            return Ok(SmallVec::new());
        }
        let policy = if prefix.is_empty() { LookupPolicy::AccessibleInScope } else { LookupPolicy::ChildSymbolFromOutside };
        let hits = self.lookup(scope, last, policy);
        if hits.is_empty() {
            return Ok(SmallVec::new());
        }
        self.recorder.record(ResolutionKind::Resolved, span, &hits);
        self.candidates_for_symbols(&hits, span, pa)
    }

    /// Resolves a name expression down to a single symbol, for contexts
    /// that need the symbol itself (a `Generic` expression's base) rather
    /// than its expression-type-set.
    fn resolve_expr_symbol(&mut self, expr: &Expr, pa: &ParsingArguments) -> SemaResult<Option<SymbolId>> {
        match expr {
            Expr::Id { name, span } => {
                let hits = self.lookup(pa.scope, name, LookupPolicy::AccessibleInScope);
                if !hits.is_empty() {
                    self.recorder.record(ResolutionKind::Resolved, *span, &hits);
                }
                Ok(hits.first().copied())
            }
            Expr::QualifiedId { path, .. } => {
                let set = self.eval_qualified_id(path, expr.span(), pa)?;
                Ok(set.first().and_then(|c| c.symbol))
            }
            _ => Ok(None),
        }
    }

    /// Turns a resolved overload/redeclaration set into candidates,
    /// applying spec §4.2's kind-dependent category and recording a
    /// `NeedValueButType` mismatch (not an error — a recoverable
    /// diagnostic, spec §4.9) for any symbol that names a type rather than
    /// a value.
    fn candidates_for_symbols(&mut self, hits: &[SymbolId], span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let mut out = ExprTypeSet::new();
        let mut type_like: SmallVec<[SymbolId; 1]> = SmallVec::new();
        for &sym in hits {
            let kind = self.symbols.arena.get(sym).kind;
            match kind {
                SymbolKind::Variable | SymbolKind::GenericValueArgument => {
                    let ty = self.symbol_type(sym, pa)?;
                    out.push(ExprCandidate::of_symbol(sym, ValueCategory::LValue, ty));
                }
                SymbolKind::EnumItem | SymbolKind::ValueAlias => {
                    let ty = self.symbol_type(sym, pa)?;
                    out.push(ExprCandidate::of_symbol(sym, ValueCategory::PRValue, ty));
                }
                SymbolKind::FunctionSymbol => {
                    let free = self.collect_free_symbols(sym);
                    let ty = if free.is_empty() { self.symbol_type(sym, pa)? } else { self.generic_function_type(sym, pa)? };
                    out.push(ExprCandidate::of_symbol(sym, ValueCategory::LValue, ty));
                }
                SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Union
                | SymbolKind::Enum
                | SymbolKind::TypeAlias
                | SymbolKind::GenericTypeArgument
                | SymbolKind::Namespace
                | SymbolKind::Root => {
                    type_like.push(sym);
                }
            }
        }
        if !type_like.is_empty() {
            self.recorder.record(ResolutionKind::NeedValueButType, span, &type_like);
        }
        Ok(out)
    }

    fn eval_generic_expr(
        &mut self,
        base: &Expr,
        args: &[GenericArgument],
        span: Span,
        pa: &ParsingArguments,
    ) -> SemaResult<ExprTypeSet> {
        let Some(sym) = self.resolve_expr_symbol(base, pa)? else { return Ok(SmallVec::new()) };
        if self.symbols.arena.get(sym).kind != SymbolKind::FunctionSymbol {
            return self.candidates_for_symbols(&[sym], span, pa);
        }
        let free_list = self.collect_free_symbols(sym);
        let mut bindings: FxHashMap<SymbolId, TypeId> = FxHashMap::default();
        for (slot, arg) in free_list.iter().zip(args.iter()) {
            let ty = match (&arg.ty, &arg.expr) {
                (Some(t), _) => self.eval_type(t, pa)?,
                (None, Some(e)) => self.eval_expr(e, pa)?.first().map(|c| c.ty).unwrap_or(cppdoc_types::TypeInterner::ANY),
                (None, None) => cppdoc_types::TypeInterner::ANY,
            };
            bindings.insert(*slot, ty);
        }
        let still_generic = args.len() < free_list.len();
        let ctx = self.fresh_argument_context(bindings);
        let sub_pa = pa.with_scope(sym).with_argument_context(ctx);
        let ty = self.partial_function_template_type(sym, &sub_pa, still_generic)?;
        Ok(one(ExprCandidate::of_symbol(sym, ValueCategory::PRValue, ty)))
    }

    // ---- parenthesis / cast / typeid ------------------------------------

    fn eval_paren(&mut self, inner: &Expr, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let inner_set = self.eval_expr(inner, pa)?;
        Ok(inner_set
            .into_iter()
            .map(|c| {
                let ty = if c.category == ValueCategory::LValue { self.types.lref(c.ty) } else { c.ty };
                ExprCandidate { ty, ..c }
            })
            .collect())
    }

    fn eval_cast(&mut self, target: &cppdoc_ast::Type, operand: &Expr, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let _ = self.eval_expr(operand, pa)?;
        let _ = span;
        let target_ty = self.eval_type(target, pa)?;
        let decomposed = self.types.decompose(target_ty);
        let qualified = self.types.cv(decomposed.entity, decomposed.cv);
        let candidate = match decomposed.ref_kind {
            Some(RefKind::LRef) => ExprCandidate::lvalue(qualified),
            Some(RefKind::RRef) => ExprCandidate { symbol: None, category: ValueCategory::XValue, ty: qualified },
            None => ExprCandidate::prvalue(target_ty),
        };
        Ok(one(candidate))
    }

    fn eval_typeid(&mut self, operand: &Expr, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let _ = self.eval_expr(operand, pa)?;
        let path = ["std".to_string(), "type_info".to_string()];
        let set = self.eval_qualified_id(&path, span, pa)?;
        Ok(match set.first() {
            Some(c) => {
                let entity = self.types.entity_of(c.ty);
                one(ExprCandidate::lvalue(entity))
            }
            None => SmallVec::new(),
        })
    }

    // ---- array access ----------------------------------------------------

    fn eval_array_access(&mut self, base: &Expr, index: &Expr, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let base_set = self.eval_expr(base, pa)?;
        let index_set = self.eval_expr(index, pa)?;
        let Some(base_c) = base_set.first() else { return Ok(SmallVec::new()) };
        let index_ty = index_set.first().map(|c| c.ty).unwrap_or(cppdoc_types::TypeInterner::ANY);
        let entity = self.types.entity_of(base_c.ty);
        if let Some(elem) = self.types.element_of(entity) {
            if self.types.is_ptr(entity) || self.types.array_parts(entity).is_some() {
                let decomposed = self.types.decompose(elem);
                let qualified = self.types.cv(decomposed.entity, decomposed.cv);
                return Ok(one(ExprCandidate::lvalue(qualified)));
            }
        }
        if let Some(class_symbol) = self.types.as_decl_symbol(entity) {
            self.ensure_class_member_cache(class_symbol);
            let candidates = self.lookup_operator_candidates("operator[]", &[base_c.ty], pa);
            return self.resolve_and_record(&candidates, &[base_c.ty, index_ty], span);
        }
        Ok(SmallVec::new())
    }

    // ---- unary -------------------------------------------------------

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let operand_set = self.eval_expr(operand, pa)?;
        let Some(oc) = operand_set.first().copied() else { return Ok(SmallVec::new()) };

        if op == UnaryOp::AddressOf {
            return Ok(one(self.eval_address_of(operand, oc, pa)?));
        }

        let entity = self.types.entity_of(oc.ty);
        if self.types.as_decl_symbol(entity).is_some() {
            let op_name = unary_operator_name(op);
            let extra_arg: &[TypeId] = if matches!(op, UnaryOp::PostInc | UnaryOp::PostDec) {
                &[cppdoc_types::TypeInterner::INT]
            } else {
                &[]
            };
            let mut args = vec![oc.ty];
            args.extend_from_slice(extra_arg);
            let candidates = self.lookup_operator_candidates(op_name, &[oc.ty], pa);
            if !candidates.is_empty() {
                return self.resolve_and_record(&candidates, &args, span);
            }
        }

        Ok(one(self.builtin_unary(op, oc, span)?))
    }

    fn eval_address_of(&mut self, operand_expr: &Expr, oc: ExprCandidate, pa: &ParsingArguments) -> SemaResult<ExprCandidate> {
        // Branch (a): `&T::member_function` — a pointer to a non-static
        // member function (spec §4.5.2).
        if let Some(sym) = oc.symbol {
            if self.symbols.arena.get(sym).kind == SymbolKind::FunctionSymbol {
                if let Some(owner) = self.symbols.arena.get(sym).parent {
                    if self.symbols.arena.get(owner).kind.is_class_like()
                        && matches!(operand_expr, Expr::QualifiedId { .. } | Expr::Member { .. })
                    {
                        let owner_ty = self.types.decl(owner);
                        let member_ty = self.types.member(owner_ty, oc.ty);
                        return Ok(ExprCandidate::prvalue(member_ty));
                    }
                }
            }
        }
        // Branch (b): an lvalue operand yields a pointer to the pointee
        // stripped of reference only, cv preserved. Branch (c): otherwise,
        // a plain pointer to the type.
        let decomposed = self.types.decompose(oc.ty);
        let pointee = self.types.cv(decomposed.entity, decomposed.cv);
        Ok(ExprCandidate::prvalue(self.types.ptr(pointee)))
    }

    fn builtin_unary(&mut self, op: UnaryOp, oc: ExprCandidate, span: Span) -> SemaResult<ExprCandidate> {
        let entity = self.types.entity_of(oc.ty);
        match op {
            UnaryOp::Deref => match self.types.element_of(entity) {
                Some(elem) if self.types.is_ptr(entity) => {
                    let decomposed = self.types.decompose(elem);
                    let qualified = self.types.cv(decomposed.entity, decomposed.cv);
                    Ok(ExprCandidate::lvalue(qualified))
                }
                _ => Err(Failure::illegal_expression(span)),
            },
            UnaryOp::Not => Ok(ExprCandidate::prvalue(cppdoc_types::TypeInterner::BOOL)),
            UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => {
                let promoted = self.promote_arithmetic(entity);
                Ok(ExprCandidate::prvalue(promoted))
            }
            UnaryOp::PreInc | UnaryOp::PreDec => Ok(ExprCandidate::lvalue(entity)),
            UnaryOp::PostInc | UnaryOp::PostDec => Ok(ExprCandidate::prvalue(entity)),
            UnaryOp::AddressOf => unreachable!("handled in eval_address_of"),
        }
    }

    /// Integral-promotion-only widening for a unary arithmetic operand:
    /// anything smaller than `int` (or `bool`) promotes to `int`; wider
    /// types and floats pass through unchanged.
    fn promote_arithmetic(&mut self, entity: TypeId) -> TypeId {
        if let Some((kind, width)) = self.types.primitive_parts(entity) {
            if matches!(kind, PrimitiveKind::Bool | PrimitiveKind::SignedChar | PrimitiveKind::UnsignedChar) || width < 32 {
                return self.types.primitive(PrimitiveKind::SignedInt, 32);
            }
        }
        entity
    }

    // ---- binary ------------------------------------------------------

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let left_set = self.eval_expr(left, pa)?;

        if op == BinaryOp::Comma {
            return self.eval_expr(right, pa);
        }

        let right_set = self.eval_expr(right, pa)?;
        let mut out = ExprTypeSet::new();
        for &lc in left_set.iter().take(4) {
            for &rc in right_set.iter().take(4) {
                out.push(self.eval_binary_pair(op, lc, rc, span, pa)?);
            }
        }
        Ok(out)
    }

    fn eval_binary_pair(&mut self, op: BinaryOp, lc: ExprCandidate, rc: ExprCandidate, span: Span, pa: &ParsingArguments) -> SemaResult<ExprCandidate> {
        let left_entity = self.types.entity_of(lc.ty);
        if self.types.as_decl_symbol(left_entity).is_some() || self.types.as_decl_symbol(self.types.entity_of(rc.ty)).is_some() {
            let op_name = binary_operator_name(op);
            let candidates = self.lookup_operator_candidates(op_name, &[lc.ty, rc.ty], pa);
            if !candidates.is_empty() {
                let set = self.resolve_and_record(&candidates, &[lc.ty, rc.ty], span)?;
                if let Some(c) = set.first() {
                    return Ok(*c);
                }
            }
        }
        self.builtin_binary(op, lc, rc, span)
    }

    fn builtin_binary(&mut self, op: BinaryOp, lc: ExprCandidate, rc: ExprCandidate, span: Span) -> SemaResult<ExprCandidate> {
        let left_entity = self.types.entity_of(lc.ty);
        let right_entity = self.types.entity_of(rc.ty);
        match op {
            BinaryOp::Assign => {
                let qualified = self.types.cv(left_entity, CvFlags::empty());
                Ok(ExprCandidate::lvalue(qualified))
            }
            BinaryOp::LogAnd | BinaryOp::LogOr | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                Ok(ExprCandidate::prvalue(cppdoc_types::TypeInterner::BOOL))
            }
            BinaryOp::Add | BinaryOp::Sub => {
                if self.types.is_ptr(left_entity) && self.types.primitive_parts(right_entity).is_some() {
                    return Ok(ExprCandidate::prvalue(left_entity));
                }
                if op == BinaryOp::Sub && self.types.is_ptr(left_entity) && self.types.is_ptr(right_entity) {
                    return Ok(ExprCandidate::prvalue(cppdoc_types::TypeInterner::INT_PTR));
                }
                self.builtin_arithmetic(left_entity, right_entity, span)
            }
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                self.builtin_arithmetic(left_entity, right_entity, span)
            }
            BinaryOp::Comma => unreachable!("handled before pairing"),
        }
    }

    fn builtin_arithmetic(&mut self, left: TypeId, right: TypeId, span: Span) -> SemaResult<ExprCandidate> {
        if self.types.primitive_parts(left).is_some() && self.types.primitive_parts(right).is_some() {
            Ok(ExprCandidate::prvalue(self.arithmetic_conversion(left, right)))
        } else {
            Err(Failure::not_convertable(span))
        }
    }

    /// The usual-arithmetic-conversions result type for two primitives:
    /// float beats integer (wider float wins among two floats);
    /// otherwise the wider integer width wins, with unsigned winning ties,
    /// promoted to at least 32 bits (spec §4.5.2 step 4 built-in table).
    fn arithmetic_conversion(&mut self, a: TypeId, b: TypeId) -> TypeId {
        let (ak, aw) = self.types.primitive_parts(a).expect("primitive");
        let (bk, bw) = self.types.primitive_parts(b).expect("primitive");
        if ak == PrimitiveKind::Float || bk == PrimitiveKind::Float {
            let width = if ak == PrimitiveKind::Float && bk == PrimitiveKind::Float { aw.max(bw) } else if ak == PrimitiveKind::Float { aw } else { bw };
            return self.types.primitive(PrimitiveKind::Float, width);
        }
        let width = aw.max(bw).max(32);
        let unsigned = (ak == PrimitiveKind::UnsignedInt && aw >= bw) || (bk == PrimitiveKind::UnsignedInt && bw >= aw);
        let kind = if unsigned { PrimitiveKind::UnsignedInt } else { PrimitiveKind::SignedInt };
        self.types.primitive(kind, width)
    }

    // ---- conditional ---------------------------------------------------

    fn eval_conditional(&mut self, cond: &Expr, then_branch: &Expr, else_branch: &Expr, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let _ = self.eval_expr(cond, pa)?;
        let then_set = self.eval_expr(then_branch, pa)?;
        let else_set = self.eval_expr(else_branch, pa)?;
        let (Some(a), Some(b)) = (then_set.first().copied(), else_set.first().copied()) else {
            return Ok(SmallVec::new());
        };

        let la = self.apply_value_category(a.ty, a.category);
        let lb = self.apply_value_category(b.ty, b.category);
        if la == lb {
            return Ok(one(self.candidate_from_lifted(la)));
        }

        let da = self.types.decompose(la);
        let db = self.types.decompose(lb);
        if da.entity == db.entity {
            let merged_cv = da.cv | db.cv;
            let merged_ref = if da.ref_kind == db.ref_kind { da.ref_kind } else { None };
            let qualified = self.types.cv(da.entity, merged_cv);
            let result = match merged_ref {
                Some(RefKind::LRef) => self.types.lref(qualified),
                Some(RefKind::RRef) => self.types.rref(qualified),
                None => qualified,
            };
            return Ok(one(self.candidate_from_lifted(result)));
        }

        let rank_a_to_b = self.rank_argument(db.entity, da.entity);
        let rank_b_to_a = self.rank_argument(da.entity, db.entity);
        if rank_a_to_b < rank_b_to_a {
            return Ok(one(ExprCandidate::prvalue(db.entity)));
        }
        if rank_b_to_a < rank_a_to_b {
            return Ok(one(ExprCandidate::prvalue(da.entity)));
        }

        if self.types.primitive_parts(da.entity).is_some() && self.types.primitive_parts(db.entity).is_some() {
            let merged = self.arithmetic_conversion(da.entity, db.entity);
            return Ok(one(ExprCandidate::prvalue(merged)));
        }
        if (self.types.is_zero(da.entity) || self.types.is_nullptr(da.entity)) && self.types.is_ptr(db.entity) {
            return Ok(one(ExprCandidate::prvalue(db.entity)));
        }
        if (self.types.is_zero(db.entity) || self.types.is_nullptr(db.entity)) && self.types.is_ptr(da.entity) {
            return Ok(one(ExprCandidate::prvalue(da.entity)));
        }

        let _ = span;
        // Neither conversion dominates and neither side is primitive: the
        // result is genuinely ambiguous (spec §4.5.3, §9 Open Question
        // iii) — surface both operand types rather than picking one.
        Ok(smallvec![ExprCandidate::prvalue(da.entity), ExprCandidate::prvalue(db.entity)])
    }

    fn candidate_from_lifted(&mut self, lifted: TypeId) -> ExprCandidate {
        let d = self.types.decompose(lifted);
        match d.ref_kind {
            Some(RefKind::LRef) => ExprCandidate::lvalue(self.types.cv(d.entity, d.cv)),
            Some(RefKind::RRef) => ExprCandidate { symbol: None, category: ValueCategory::XValue, ty: self.types.cv(d.entity, d.cv) },
            None => ExprCandidate::prvalue(lifted),
        }
    }

    // ---- member access -------------------------------------------------

    fn eval_member(&mut self, op: MemberAccessOp, base: &Expr, member: &str, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let base_set = self.eval_expr(base, pa)?;
        let Some(bc) = base_set.first().copied() else { return Ok(SmallVec::new()) };

        let via_arrow = op == MemberAccessOp::Arrow;
        let field_source = if via_arrow {
            let ptr_entity = self.types.entity_of(bc.ty);
            match self.types.element_of(ptr_entity) {
                Some(elem) if self.types.is_ptr(ptr_entity) => elem,
                _ => return Err(Failure::illegal_expression(span)),
            }
        } else {
            bc.ty
        };
        let decomposed = self.types.decompose(field_source);
        let Some(class_symbol) = self.types.as_decl_symbol(decomposed.entity) else {
            return Ok(SmallVec::new());
        };
        self.ensure_class_member_cache(class_symbol);
        let hits = self.lookup_member(class_symbol, member);
        if hits.is_empty() {
            return Ok(SmallVec::new());
        }
        self.recorder.record(ResolutionKind::Resolved, span, &hits);

        let mut out = ExprTypeSet::new();
        for sym in hits {
            let kind = self.symbols.arena.get(sym).kind;
            let raw = self.symbol_type(sym, pa)?;
            match kind {
                SymbolKind::EnumItem => out.push(ExprCandidate::of_symbol(sym, ValueCategory::PRValue, raw)),
                SymbolKind::FunctionSymbol => out.push(ExprCandidate::of_symbol(sym, ValueCategory::LValue, raw)),
                SymbolKind::Variable if self.is_static_member(sym) => {
                    out.push(ExprCandidate::of_symbol(sym, ValueCategory::LValue, raw));
                }
                SymbolKind::Variable => {
                    let (category, ty) = self.propagate_field_type(raw, decomposed.cv, decomposed.ref_kind, via_arrow, bc.category);
                    out.push(ExprCandidate::of_symbol(sym, category, ty));
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// spec §4.5.1 field-type propagation: `(entity, cv, ref)` is the
    /// decomposition of the access base (already deref'd for `->`); `F` is
    /// the field's own declared type.
    fn propagate_field_type(&mut self, field_raw: TypeId, base_cv: CvFlags, base_ref: Option<RefKind>, via_arrow: bool, base_category: ValueCategory) -> (ValueCategory, TypeId) {
        let qualified = self.types.cv(field_raw, base_cv);
        match base_ref {
            Some(RefKind::LRef) => (ValueCategory::LValue, qualified),
            Some(RefKind::RRef) => {
                if base_category == ValueCategory::LValue {
                    (ValueCategory::LValue, qualified)
                } else {
                    (ValueCategory::XValue, self.types.rref(qualified))
                }
            }
            None if via_arrow => (ValueCategory::LValue, qualified),
            None => (base_category, qualified),
        }
    }

    fn is_static_member(&self, symbol: SymbolId) -> bool {
        let decl = self.symbols.impl_decl(symbol).or_else(|| self.symbols.arena.get(symbol).forward_decls.first());
        match decl.map(|d| &d.kind) {
            Some(cppdoc_ast::DeclarationKind::Variable { is_static, .. }) => *is_static,
            _ => false,
        }
    }

    // ---- calls ----------------------------------------------------------

    fn eval_call(&mut self, callee: &Expr, arguments: &[std::rc::Rc<Expr>], span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let callee_set = self.eval_expr(callee, pa)?;
        let mut arg_types: SmallVec<[TypeId; 4]> = SmallVec::new();
        for arg in arguments {
            let set = self.eval_expr(arg, pa)?;
            arg_types.push(set.first().map(|c| c.ty).unwrap_or(cppdoc_types::TypeInterner::ANY));
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        for c in &callee_set {
            if self.types.is_generic_function(self.types.entity_of(c.ty)) {
                if let Some(sym) = c.symbol {
                    if let Some((ty, _ctx)) = self.instantiate_function_template(sym, &[], &arg_types, pa)? {
                        candidates.push(Candidate { symbol: Some(sym), function_ty: self.types.entity_of(ty) });
                    }
                    continue;
                }
            }
            let entity = self.types.entity_of(c.ty);
            if self.types.is_function(entity) {
                candidates.push(Candidate { symbol: c.symbol, function_ty: entity });
            } else if let Some(class_symbol) = self.types.as_decl_symbol(entity) {
                // Functor call: consider `operator()` members (spec §4.6).
                self.ensure_class_member_cache(class_symbol);
                let call_candidates = self.lookup_operator_candidates("operator()", &[c.ty], pa);
                candidates.extend(call_candidates);
            }
        }

        if candidates.is_empty() {
            return Ok(SmallVec::new());
        }
        self.resolve_and_record(&candidates, &arg_types, span)
    }

    fn resolve_and_record(&mut self, candidates: &[Candidate], args: &[TypeId], span: Span) -> SemaResult<ExprTypeSet> {
        let outcome = self.resolve_overload(candidates, args);
        match outcome {
            OverloadOutcome::Unique(c) => {
                if let Some(sym) = c.symbol {
                    self.recorder.record(ResolutionKind::OverloadedResolution, span, &[sym]);
                }
                Ok(one(self.candidate_from_function_return(c)))
            }
            OverloadOutcome::Ambiguous(list) => {
                let syms: SmallVec<[SymbolId; 4]> = list.iter().filter_map(|c| c.symbol).collect();
                if !syms.is_empty() {
                    self.recorder.record(ResolutionKind::OverloadedResolution, span, &syms);
                }
                Ok(list.iter().map(|c| self.candidate_from_function_return(*c)).collect())
            }
            OverloadOutcome::NoViable => Ok(SmallVec::new()),
        }
    }

    fn candidate_from_function_return(&mut self, c: Candidate) -> ExprCandidate {
        let ret = self.types.return_type(c.function_ty);
        let decomposed = self.types.decompose(ret);
        let qualified = self.types.cv(decomposed.entity, decomposed.cv);
        let category = match decomposed.ref_kind {
            Some(RefKind::LRef) => ValueCategory::LValue,
            Some(RefKind::RRef) => ValueCategory::XValue,
            None => ValueCategory::PRValue,
        };
        ExprCandidate { symbol: c.symbol, category, ty: qualified }
    }

    /// spec §4.5.2 operator lookup steps 1-2: child lookup for a member
    /// operator on the left operand's class, unioned with free-function
    /// scope lookup plus ADL over every operand's associated
    /// namespaces/classes.
    fn lookup_operator_candidates(&mut self, op_name: &str, operand_types: &[TypeId], pa: &ParsingArguments) -> Vec<Candidate> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut candidates = Vec::new();
        let mut push = |ctx: &mut Self, sym: SymbolId, seen: &mut rustc_hash::FxHashSet<SymbolId>, candidates: &mut Vec<Candidate>| {
            if ctx.symbols.arena.get(sym).kind != SymbolKind::FunctionSymbol || !seen.insert(sym) {
                return;
            }
            if let Ok(ty) = ctx.symbol_type(sym, pa) {
                candidates.push(Candidate { symbol: Some(sym), function_ty: self_entity(ctx, ty) });
            }
        };

        if let Some(&first) = operand_types.first() {
            let entity = self.types.entity_of(first);
            if let Some(class_symbol) = self.types.as_decl_symbol(entity) {
                self.ensure_class_member_cache(class_symbol);
                let hits = self.lookup(class_symbol, op_name, LookupPolicy::ChildSymbolFromOutside);
                for sym in hits {
                    push(self, sym, &mut seen, &mut candidates);
                }
            }
        }

        let free_hits = self.lookup(pa.scope, op_name, LookupPolicy::AccessibleInScope);
        for sym in free_hits {
            push(self, sym, &mut seen, &mut candidates);
        }

        let adl_scopes = self.adl_associated_scopes(operand_types);
        for scope in adl_scopes {
            let hits = self.lookup(scope, op_name, LookupPolicy::ChildSymbolFromOutside);
            for sym in hits {
                push(self, sym, &mut seen, &mut candidates);
            }
        }
        candidates
    }

    fn eval_throw(&mut self, operand: Option<&Expr>, span: Span, pa: &ParsingArguments) -> SemaResult<ExprTypeSet> {
        let _ = span;
        if let Some(operand) = operand {
            let _ = self.eval_expr(operand, pa)?;
        }
        Ok(one(ExprCandidate::prvalue(cppdoc_types::TypeInterner::VOID)))
    }
}

fn self_entity(ctx: &mut SemaContext<'_>, ty: TypeId) -> TypeId {
    ctx.types.entity_of(ty)
}

fn unary_operator_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "operator+",
        UnaryOp::Minus => "operator-",
        UnaryOp::Not => "operator!",
        UnaryOp::BitNot => "operator~",
        UnaryOp::Deref => "operator*",
        UnaryOp::AddressOf => "operator&",
        UnaryOp::PreInc | UnaryOp::PostInc => "operator++",
        UnaryOp::PreDec | UnaryOp::PostDec => "operator--",
    }
}

fn binary_operator_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "operator+",
        BinaryOp::Sub => "operator-",
        BinaryOp::Mul => "operator*",
        BinaryOp::Div => "operator/",
        BinaryOp::Mod => "operator%",
        BinaryOp::Shl => "operator<<",
        BinaryOp::Shr => "operator>>",
        BinaryOp::BitAnd => "operator&",
        BinaryOp::BitOr => "operator|",
        BinaryOp::BitXor => "operator^",
        BinaryOp::LogAnd => "operator&&",
        BinaryOp::LogOr => "operator||",
        BinaryOp::Eq => "operator==",
        BinaryOp::Ne => "operator!=",
        BinaryOp::Lt => "operator<",
        BinaryOp::Le => "operator<=",
        BinaryOp::Gt => "operator>",
        BinaryOp::Ge => "operator>=",
        BinaryOp::Assign => "operator=",
        BinaryOp::Comma => "operator,",
    }
}

/// Parses an integer literal's digits, recognizing `0x`/`0X` hex, `0b`/`0B`
/// binary, a bare leading `0` as octal, and decimal otherwise. Unparsable
/// digits (should not occur for a lexer-produced literal) fall back to 0.
fn parse_integer_digits(digits: &str) -> u128 {
    let cleaned: String = digits.chars().filter(|&c| c != '\'').collect();
    if let Some(rest) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return u128::from_str_radix(rest, 16).unwrap_or(0);
    }
    if let Some(rest) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return u128::from_str_radix(rest, 2).unwrap_or(0);
    }
    if cleaned.len() > 1 && cleaned.starts_with('0') {
        return u128::from_str_radix(&cleaned[1..], 8).unwrap_or(0);
    }
    cleaned.parse().unwrap_or(0)
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
    fn unsuffixed_zero_is_signed_int() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let pa = ParsingArguments::new(ctx.symbols.root);
        let expr = Expr::Literal { value: Literal::Integer { digits: "0".into(), suffix: IntegerSuffix::None }, span: Span::new(0, 1) };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        assert_eq!(set[0].ty, TypeInterner::INT);
        assert_eq!(set[0].category, ValueCategory::PRValue);
    }

    #[test]
    fn single_l_suffix_stays_32_bit() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let pa = ParsingArguments::new(ctx.symbols.root);
        let expr = Expr::Literal { value: Literal::Integer { digits: "1".into(), suffix: IntegerSuffix::L }, span: Span::new(0, 1) };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        assert_eq!(set[0].ty, TypeInterner::INT);
    }

    #[test]
    fn double_l_suffix_widens_to_64_bit() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let pa = ParsingArguments::new(ctx.symbols.root);
        let expr = Expr::Literal { value: Literal::Integer { digits: "1".into(), suffix: IntegerSuffix::Ll }, span: Span::new(0, 1) };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        let (kind, width) = ctx.types.primitive_parts(set[0].ty).unwrap();
        assert_eq!(kind, PrimitiveKind::SignedInt);
        assert_eq!(width, 64);
    }

    #[test]
    fn bool_literals_are_bool_prvalues() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let pa = ParsingArguments::new(ctx.symbols.root);
        let expr = Expr::Literal { value: Literal::Bool(true), span: Span::new(0, 1) };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        assert_eq!(set[0].ty, TypeInterner::BOOL);
        assert_eq!(set[0].category, ValueCategory::PRValue);
    }

    #[test]
    fn unresolved_identifier_yields_empty_set_not_an_error() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let pa = ParsingArguments::new(ctx.symbols.root);
        let expr = Expr::Id { name: "nonexistent".into(), span: Span::new(0, 1) };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn variable_id_resolves_to_lvalue_of_declared_type() {
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let root = symbols.root;
        let var = symbols.add_child(root, SymbolKind::Variable, "x");
        symbols.arena.get_mut(var).evaluation_cache = Some(cppdoc_symbols::EvaluationCache { types: smallvec![TypeInterner::INT] });
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let pa = ParsingArguments::new(root);
        let expr = Expr::Id { name: "x".into(), span: Span::new(0, 1) };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].category, ValueCategory::LValue);
        assert_eq!(set[0].ty, TypeInterner::INT);
    }

    #[test]
    fn conditional_merges_cv_when_ref_diverges() {
        // const int& a; volatile int& b; true ? a : b  ==>  const volatile int (prvalue)
        let (mut types, mut symbols, mut recorder, mut cache) = harness();
        let root = symbols.root;
        let a = symbols.add_child(root, SymbolKind::Variable, "a");
        let b = symbols.add_child(root, SymbolKind::Variable, "b");
        let mut ctx = SemaContext::new(&mut types, &mut symbols, &mut recorder, &mut cache);
        let const_int_ref = {
            let c = ctx.types.cv(TypeInterner::INT, CvFlags::CONST);
            ctx.types.lref(c)
        };
        let volatile_int_ref = {
            let v = ctx.types.cv(TypeInterner::INT, CvFlags::VOLATILE);
            ctx.types.lref(v)
        };
        ctx.symbols.arena.get_mut(a).evaluation_cache = Some(cppdoc_symbols::EvaluationCache { types: smallvec![const_int_ref] });
        ctx.symbols.arena.get_mut(b).evaluation_cache = Some(cppdoc_symbols::EvaluationCache { types: smallvec![volatile_int_ref] });

        let pa = ParsingArguments::new(root);
        let cond = Expr::Literal { value: Literal::Bool(true), span: Span::new(0, 1) };
        let then_branch = Expr::Id { name: "a".into(), span: Span::new(0, 1) };
        let else_branch = Expr::Id { name: "b".into(), span: Span::new(0, 1) };
        let expr = Expr::Conditional {
            cond: std::rc::Rc::new(cond),
            then_branch: std::rc::Rc::new(then_branch),
            else_branch: std::rc::Rc::new(else_branch),
            span: Span::new(0, 1),
        };
        let set = ctx.eval_expr(&expr, &pa).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].category, ValueCategory::PRValue);
        let decomposed = ctx.types.decompose(set[0].ty);
        assert_eq!(decomposed.entity, TypeInterner::INT);
        assert_eq!(decomposed.cv, CvFlags::CONST | CvFlags::VOLATILE);
    }
}
