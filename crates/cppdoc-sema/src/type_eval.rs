//! C4 — the Type Evaluator.
//!
//! Maps a syntactic [`cppdoc_ast::Type`] to its canonical, interned
//! [`TypeId`] (spec §4.4). `const`/`volatile` merge into the nearest `Cv`
//! node via `TypeInterner::cv`; a reference-to-reference collapses per
//! reference-collapsing rules via `TypeInterner::lref`/`rref`; arrays of
//! arrays decay by rank via `TypeInterner::array`. None of that
//! canonicalization happens here — it is delegated to the type universe,
//! which is the only place allowed to build a `TypeKey`.

use crate::context::SemaContext;
use crate::resolver::LookupPolicy;
use cppdoc_ast::{CvQualifiers, GenericArgNode, PrimitiveKeyword, RefQualifier, Type};
use cppdoc_common::{Failure, SemaResult, SymbolId};
use cppdoc_symbols::SymbolKind;
use cppdoc_types::{CvFlags, FunctionFlags, PrimitiveKind, TypeId};
use cppdoc_xref::ResolutionKind;
use smallvec::SmallVec;

use crate::ParsingArguments;

impl<'a> SemaContext<'a> {
    /// Evaluates a syntactic type node to its canonical form. A construct
    /// that refers to an unresolvable or dependent name produces `Any`
    /// (spec §4.4 failure modes); a structurally ill-formed construct
    /// (e.g. a reference to `void`) signals `TypeCheckerFailure`.
    pub fn eval_type(&mut self, ty: &Type, pa: &ParsingArguments) -> SemaResult<TypeId> {
        match ty {
            Type::Primitive { keyword, .. } => Ok(self.eval_primitive_keyword(*keyword)),
            Type::Decorated { cv, inner, .. } => {
                let inner_ty = self.eval_type(inner, pa)?;
                Ok(self.types.cv(inner_ty, cv_flags(*cv)))
            }
            Type::Ptr { inner, .. } => {
                let inner_ty = self.eval_type(inner, pa)?;
                Ok(self.types.ptr(inner_ty))
            }
            Type::LRef { inner, span } => {
                let inner_ty = self.eval_type(inner, pa)?;
                if self.types.is_void(self.types.entity_of(inner_ty)) {
                    return Err(Failure::type_checker_failure(*span));
                }
                Ok(self.types.lref(inner_ty))
            }
            Type::RRef { inner, span } => {
                let inner_ty = self.eval_type(inner, pa)?;
                if self.types.is_void(self.types.entity_of(inner_ty)) {
                    return Err(Failure::type_checker_failure(*span));
                }
                Ok(self.types.rref(inner_ty))
            }
            Type::Array { inner, rank_expr, .. } => {
                let inner_ty = self.eval_type(inner, pa)?;
                let rank = match rank_expr {
                    None => 1,
                    Some(expr) => match const_fold_rank(expr) {
                        Some(n) => n,
                        None => return Ok(cppdoc_types::TypeInterner::ANY),
                    },
                };
                Ok(self.types.array(inner_ty, rank))
            }
            Type::Member { owner, inner, .. } => {
                let owner_ty = self.eval_type(owner, pa)?;
                let inner_ty = self.eval_type(inner, pa)?;
                Ok(self.types.member(owner_ty, inner_ty))
            }
            Type::Function { ret, params, is_const, is_volatile, ref_qualifier, .. } => {
                let ret_ty = self.eval_type(ret, pa)?;
                let mut param_tys: SmallVec<[TypeId; 4]> = SmallVec::new();
                for item in params {
                    param_tys.push(self.eval_type(&item.item, pa)?);
                }
                let mut flags = function_flags_for(*is_const, *is_volatile, *ref_qualifier);
                flags |= cc_flags(pa.options.cc);
                Ok(self.types.function(ret_ty, param_tys, flags))
            }
            Type::Id { name, span } => self.eval_id_type(name, *span, pa),
            Type::Child { owner, member, span } => {
                let owner_symbol = self.resolve_type_symbol(owner, pa)?;
                let Some(owner_symbol) = owner_symbol else {
                    return Ok(cppdoc_types::TypeInterner::ANY);
                };
                self.ensure_class_member_cache(owner_symbol);
                let hits = self.lookup(owner_symbol, member, LookupPolicy::ChildSymbolFromOutside);
                if hits.is_empty() {
                    return Ok(cppdoc_types::TypeInterner::ANY);
                }
                self.recorder.record(ResolutionKind::Resolved, *span, &hits);
                self.symbol_to_type(hits[0], None, pa)
            }
            Type::Generic { base, args, .. } => {
                let Some(base_symbol) = self.resolve_type_symbol(base, pa)? else {
                    return Ok(cppdoc_types::TypeInterner::ANY);
                };
                let arg_tys = self.eval_generic_args(args, pa)?;
                Ok(self.types.decl_instant(base_symbol, None, arg_tys))
            }
            Type::Decltype { expr, .. } => self.eval_decltype(expr, pa),
        }
    }

    fn eval_generic_args(&mut self, args: &[cppdoc_ast::VariadicItem<GenericArgNode>], pa: &ParsingArguments) -> SemaResult<SmallVec<[TypeId; 4]>> {
        let mut out = SmallVec::new();
        for item in args {
            let ty = match &item.item {
                GenericArgNode::Type(ty) => self.eval_type(ty, pa)?,
                GenericArgNode::Value(expr) => {
                    let candidates = self.eval_expr(expr, pa)?;
                    candidates.first().map(|c| c.ty).unwrap_or(cppdoc_types::TypeInterner::ANY)
                }
            };
            out.push(ty);
        }
        Ok(out)
    }

    /// Resolves the *symbol* a base type of a `Child`/`Generic` node names,
    /// without lifting it to a `Decl`/`DeclInstant` type. Used when the
    /// outer construct needs the symbol to do further child lookup or
    /// argument binding rather than a finished type.
    fn resolve_type_symbol(&mut self, ty: &Type, pa: &ParsingArguments) -> SemaResult<Option<SymbolId>> {
        match ty {
            Type::Id { name, span } => {
                let hits = self.lookup(pa.scope, name, LookupPolicy::AccessibleInScope);
                if hits.is_empty() {
                    return Ok(None);
                }
                self.recorder.record(ResolutionKind::Resolved, *span, &hits);
                Ok(Some(hits[0]))
            }
            Type::Child { owner, member, span } => {
                let Some(owner_symbol) = self.resolve_type_symbol(owner, pa)? else {
                    return Ok(None);
                };
                self.ensure_class_member_cache(owner_symbol);
                let hits = self.lookup(owner_symbol, member, LookupPolicy::ChildSymbolFromOutside);
                if hits.is_empty() {
                    return Ok(None);
                }
                self.recorder.record(ResolutionKind::Resolved, *span, &hits);
                Ok(Some(hits[0]))
            }
            Type::Generic { base, .. } => self.resolve_type_symbol(base, pa),
            _ => Ok(None),
        }
    }

    fn eval_id_type(&mut self, name: &str, span: cppdoc_common::Span, pa: &ParsingArguments) -> SemaResult<TypeId> {
        let hits = self.lookup(pa.scope, name, LookupPolicy::AccessibleInScope);
        if hits.is_empty() {
            return Ok(cppdoc_types::TypeInterner::ANY);
        }
        self.recorder.record(ResolutionKind::Resolved, span, &hits);
        self.symbol_to_type(hits[0], None, pa)
    }

    /// Turns a resolved symbol into a type: a template-parameter
    /// placeholder becomes its bound type if the active argument context
    /// has one, otherwise a bare `GenericArg`; anything else becomes
    /// `Decl(sym)`.
    fn symbol_to_type(&mut self, sym: SymbolId, parent: Option<TypeId>, pa: &ParsingArguments) -> SemaResult<TypeId> {
        let kind = self.symbols.arena.get(sym).kind;
        if matches!(kind, SymbolKind::GenericTypeArgument | SymbolKind::GenericValueArgument) {
            if let Some(bound) = pa.argument_context.get(sym) {
                return Ok(bound);
            }
            let owner = self.symbols.arena.get(sym).parent.unwrap_or(sym);
            let index = self.generic_param_index(owner, sym);
            return Ok(self.types.generic_arg(owner, index, sym));
        }
        let _ = parent;
        Ok(self.types.decl(sym))
    }

    /// Position of `target` among `owner`'s `GenericTypeArgument`/
    /// `GenericValueArgument` children, in declaration order. Used to give
    /// a stable `arg_index` to a `GenericArg` placeholder type.
    fn generic_param_index(&self, owner: SymbolId, target: SymbolId) -> u32 {
        let mut index = 0u32;
        for child in self.symbols.arena.get(owner).children_in_order() {
            let kind = self.symbols.arena.get(child).kind;
            if !matches!(kind, SymbolKind::GenericTypeArgument | SymbolKind::GenericValueArgument) {
                continue;
            }
            if child == target {
                return index;
            }
            index += 1;
        }
        index
    }

    /// Lazily populates `symbol`'s class-member cache (base-class list and
    /// `this`-type) by evaluating its base-specifier types, the way
    /// `direct_base_symbols` expects it to already have been done before
    /// base-class name lookup can walk through it.
    pub fn ensure_class_member_cache(&mut self, symbol: SymbolId) {
        if self.symbols.arena.get(symbol).class_member_cache.is_some() {
            return;
        }
        let Some(decl) = self.symbols.impl_decl(symbol).cloned() else {
            self.symbols.arena.get_mut(symbol).class_member_cache =
                Some(cppdoc_symbols::ClassMemberCache::default());
            return;
        };
        let cppdoc_ast::DeclarationKind::Class { bases, .. } = &decl.kind else {
            self.symbols.arena.get_mut(symbol).class_member_cache =
                Some(cppdoc_symbols::ClassMemberCache::default());
            return;
        };
        let pa = ParsingArguments::new(symbol);
        let mut base_types = Vec::new();
        for base in bases {
            if let Ok(ty) = self.eval_type(&base.ty, &pa) {
                base_types.push(ty);
            }
        }
        let this_type = {
            let ptr = self.types.decl(symbol);
            self.types.ptr(ptr)
        };
        self.symbols.arena.get_mut(symbol).class_member_cache =
            Some(cppdoc_symbols::ClassMemberCache { base_classes: base_types, this_type: Some(this_type) });
    }

    fn eval_primitive_keyword(&mut self, keyword: PrimitiveKeyword) -> TypeId {
        use PrimitiveKeyword as K;
        match keyword {
            K::Void => self.types.primitive(PrimitiveKind::Void, 0),
            K::Bool => self.types.primitive(PrimitiveKind::Bool, 1),
            K::Char => self.types.primitive(PrimitiveKind::SignedChar, 8),
            K::SignedChar => self.types.primitive(PrimitiveKind::SignedChar, 8),
            K::UnsignedChar => self.types.primitive(PrimitiveKind::UnsignedChar, 8),
            K::WChar => self.types.primitive(PrimitiveKind::UnsignedWideChar, 16),
            K::Short => self.types.primitive(PrimitiveKind::SignedInt, 16),
            K::Int => self.types.primitive(PrimitiveKind::SignedInt, 32),
            K::Long => self.types.primitive(PrimitiveKind::SignedInt, 32),
            K::LongLong => self.types.primitive(PrimitiveKind::SignedInt, 64),
            K::UnsignedShort => self.types.primitive(PrimitiveKind::UnsignedInt, 16),
            K::UnsignedInt => self.types.primitive(PrimitiveKind::UnsignedInt, 32),
            K::UnsignedLong => self.types.primitive(PrimitiveKind::UnsignedInt, 32),
            K::UnsignedLongLong => self.types.primitive(PrimitiveKind::UnsignedInt, 64),
            K::Float => self.types.primitive(PrimitiveKind::Float, 32),
            K::Double => self.types.primitive(PrimitiveKind::Float, 64),
        }
    }

    fn eval_decltype(&mut self, expr: &cppdoc_ast::Expr, pa: &ParsingArguments) -> SemaResult<TypeId> {
        let candidates = self.eval_expr(expr, pa)?;
        let Some(candidate) = candidates.first() else {
            return Ok(cppdoc_types::TypeInterner::ANY);
        };
        Ok(self.apply_value_category(candidate.ty, candidate.category))
    }

    /// Preserves an expression's value category as an outer reference, the
    /// way `decltype` does (spec §4.4): lvalue → lref, xvalue → rref,
    /// prvalue → no added reference.
    pub fn apply_value_category(&mut self, ty: TypeId, category: cppdoc_types::ValueCategory) -> TypeId {
        match category {
            cppdoc_types::ValueCategory::LValue => self.types.lref(ty),
            cppdoc_types::ValueCategory::XValue => self.types.rref(ty),
            cppdoc_types::ValueCategory::PRValue => ty,
        }
    }
}

fn cv_flags(cv: CvQualifiers) -> CvFlags {
    let mut flags = CvFlags::empty();
    if cv.is_const {
        flags |= CvFlags::CONST;
    }
    if cv.is_volatile {
        flags |= CvFlags::VOLATILE;
    }
    flags
}

pub(crate) fn function_flags_for(is_const: bool, is_volatile: bool, ref_qualifier: Option<RefQualifier>) -> FunctionFlags {
    let mut flags = FunctionFlags::empty();
    if is_const {
        flags |= FunctionFlags::CONST;
    }
    if is_volatile {
        flags |= FunctionFlags::VOLATILE;
    }
    match ref_qualifier {
        Some(RefQualifier::LValue) => flags |= FunctionFlags::REF_LVALUE,
        Some(RefQualifier::RValue) => flags |= FunctionFlags::REF_RVALUE,
        None => {}
    }
    flags
}

fn cc_flags(cc: cppdoc_common::CallingConvention) -> FunctionFlags {
    use cppdoc_common::CallingConvention as CC;
    match cc {
        CC::None => FunctionFlags::empty(),
        CC::Cdecl => FunctionFlags::CC_CDECL,
        CC::Stdcall => FunctionFlags::CC_STDCALL,
        CC::Fastcall => FunctionFlags::CC_FASTCALL,
        CC::Thiscall => FunctionFlags::CC_THISCALL,
    }
}

/// Folds a constant array-rank expression, recognizing only an integer
/// literal (possibly parenthesized). Anything else is a dependent array
/// bound, which the caller maps to `Any` rather than failing (spec §4.4).
fn const_fold_rank(expr: &cppdoc_ast::Expr) -> Option<u64> {
    match expr {
        cppdoc_ast::Expr::Literal { value: cppdoc_ast::Literal::Integer { digits, .. }, .. } => digits.parse().ok(),
        cppdoc_ast::Expr::Paren { inner, .. } => const_fold_rank(inner),
        _ => None,
    }
}
