//! The binding pass: one walk over one member's syntax.
//!
//! A pass owns its diagnostic queue. Passes never share a queue; the
//! compilation merges them in declaration order once every member is bound.
//! Expression, statement and type binding live in their own modules as
//! further `impl BindingPass` blocks.

use crate::binder::Binder;
use crate::bound::{BoundBlock, BoundExpression, BoundStatement};
use crate::cast::CastKind;
use crate::constant::BoundConstant;
use crate::context::{BindingContext, Evaluated};
use crate::conversions::Conversions;
use sable_core::ConsList;
use sable_diagnostics::{messages, DiagnosticMessage, DiagnosticQueue};
use sable_symbols::{ConstantValue, PrimitiveType, SymbolId, SymbolTable, TypeRef};
use sable_syntax::{NodeId, SyntaxKind, SyntaxTree};
use std::sync::Arc;

pub struct BindingPass<'a> {
    pub(crate) context: &'a BindingContext,
    pub(crate) diagnostics: DiagnosticQueue,
    /// Set when the bound code referenced a constant that is bad or not yet
    /// evaluated. Its value is then unknown, and the root cause has been
    /// reported elsewhere.
    pub(crate) saw_bad_constant: bool,
}

impl<'a> BindingPass<'a> {
    pub fn new(context: &'a BindingContext) -> Self {
        Self {
            context,
            diagnostics: DiagnosticQueue::new(),
            saw_bad_constant: false,
        }
    }

    #[inline]
    pub(crate) fn symbols(&self) -> &'a SymbolTable {
        self.context.symbols()
    }

    #[inline]
    pub(crate) fn tree(&self) -> &'a SyntaxTree {
        self.context.tree()
    }

    pub fn diagnostics(&self) -> &DiagnosticQueue {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> DiagnosticQueue {
        self.diagnostics
    }

    pub fn saw_bad_constant(&self) -> bool {
        self.saw_bad_constant
    }

    pub(crate) fn mark_bad_constant(&mut self) {
        self.saw_bad_constant = true;
    }

    pub(crate) fn report(&mut self, node: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.push(self.context.diagnostic(node, message, args));
    }

    pub(crate) fn display(&self, ty: &TypeRef) -> String {
        ty.display(self.symbols())
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Convert `expression` to `target` where only implicit conversions are
    /// allowed.
    pub fn convert(&mut self, expression: BoundExpression, target: &TypeRef, node: NodeId) -> BoundExpression {
        self.convert_with(expression, target, node, false)
    }

    /// Convert `expression` to `target`, reporting when the conversion does
    /// not exist or, unless `explicit`, is not implicit.
    pub(crate) fn convert_with(
        &mut self,
        expression: BoundExpression,
        target: &TypeRef,
        node: NodeId,
        explicit: bool,
    ) -> BoundExpression {
        if expression.is_error() || target.is_error() {
            return expression;
        }
        let cast = Conversions::new(self.symbols()).classify(&expression.ty, target);
        if !cast.exists() {
            let (source, target) = (self.display(&expression.ty), self.display(target));
            self.report(node, &messages::CANNOT_CONVERT, &[&source, &target]);
            return BoundExpression::error(expression.syntax);
        }
        if !explicit && !cast.is_implicit() {
            let (source, target) = (self.display(&expression.ty), self.display(target));
            self.report(node, &messages::CANNOT_CONVERT_IMPLICITLY, &[&source, &target]);
            return BoundExpression::error(expression.syntax);
        }
        let constant = fold_conversion(expression.constant.as_ref(), target, cast);
        BoundExpression::cast(expression, target.clone(), cast).with_constant(constant)
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// The declared type of a variable, rejecting `void`.
    pub(crate) fn bind_variable_type(&mut self, binder: &Arc<Binder>, syntax: NodeId, name: &str) -> TypeRef {
        let ty = self.bind_type(binder, syntax);
        if ty.is_void() {
            self.report(syntax, &messages::VOID_VARIABLE, &[name]);
            return TypeRef::error();
        }
        ty
    }

    /// The type of a field referenced from code bound under `binder`.
    pub(crate) fn field_type(&mut self, binder: &Binder, field: SymbolId) -> TypeRef {
        self.context.field_type(field, &binder.fields_being_bound()).value.clone()
    }

    /// The constant value of a field referenced under `binder`, or `None`
    /// when it is not (yet) known.
    pub(crate) fn constant_field_value(&mut self, binder: &Binder, field: SymbolId) -> Option<BoundConstant> {
        let tracker = binder.constant_fields_in_progress();
        let value = self
            .context
            .field_constant(field, &tracker)
            .and_then(|evaluated| evaluated.value.constant().cloned());
        if value.is_none() {
            self.mark_bad_constant();
        }
        value
    }
}

/// The constant a conversion produces from `constant`, if it can be
/// computed at compile time.
pub(crate) fn fold_conversion(constant: Option<&BoundConstant>, target: &TypeRef, cast: CastKind) -> Option<BoundConstant> {
    let constant = constant?;
    let Some(value) = &constant.value else {
        // `null` stays `null` in any nullable type.
        return target.nullable.then(BoundConstant::null);
    };
    if cast.involves_any() {
        return None;
    }
    let target = target.as_primitive()?;
    let folded = match (value, target) {
        (ConstantValue::Int(v), PrimitiveType::Decimal) => ConstantValue::Decimal(*v as f64),
        (ConstantValue::Decimal(v), PrimitiveType::Int) => {
            if !v.is_finite() || v.trunc() < i64::MIN as f64 || v.trunc() > i64::MAX as f64 {
                return None;
            }
            ConstantValue::Int(v.trunc() as i64)
        }
        (ConstantValue::Int(v), PrimitiveType::String) => ConstantValue::String(v.to_string().into()),
        (ConstantValue::Decimal(v), PrimitiveType::String) => ConstantValue::String(v.to_string().into()),
        (ConstantValue::String(s), PrimitiveType::Int) => ConstantValue::Int(s.trim().parse().ok()?),
        (ConstantValue::String(s), PrimitiveType::Decimal) => ConstantValue::Decimal(s.trim().parse().ok()?),
        (value, target) if value.primitive_type() == target => value.clone(),
        _ => return None,
    };
    Some(BoundConstant::new(folded))
}

// ============================================================================
// Member entry points
// ============================================================================

impl BindingContext {
    /// Bind the body of `method`. The synthesized entry method binds the
    /// global statements.
    pub fn bind_method_body(&self, method: SymbolId) -> Option<Evaluated<BoundBlock>> {
        let binder = self.factory().method_body_binder(method)?;
        let mut pass = BindingPass::new(self);
        let is_entry = self
            .symbols()
            .as_method(method)
            .is_some_and(|data| data.is_synthesized_entry);
        let block = if is_entry {
            pass.bind_global_statements(&binder)
        } else {
            let body = self.symbols().as_method(method).and_then(|data| data.body)?;
            pass.bind_block(&binder, body)
        };
        tracing::debug!(
            method = %self.symbols().qualified_name(method),
            diagnostics = pass.diagnostics().len(),
            "bound method body"
        );
        Some(Evaluated::new(block, pass.into_diagnostics()))
    }

    /// Bind the initializer of a non-constant field, converted to the
    /// field's type.
    pub fn bind_field_initializer(&self, field: SymbolId) -> Option<Evaluated<BoundExpression>> {
        let binder = self.factory().field_initializer_binder(field)?;
        let initializer = self.symbols().as_field(field)?.initializer?;
        let target = self.field_type(field, &ConsList::empty()).value.clone();
        let mut pass = BindingPass::new(self);
        let value = pass.bind_value(&binder, initializer);
        let value = pass.convert(value, &target, initializer);
        Some(Evaluated::new(value, pass.into_diagnostics()))
    }
}

impl BindingPass<'_> {
    /// The global statements of the compilation unit as one block.
    pub(crate) fn bind_global_statements(&mut self, region: &Arc<Binder>) -> BoundBlock {
        let tree = self.tree();
        let root = tree.root();
        let binder = region.get_binder(root).unwrap_or_else(|| region.clone());
        let statements: Vec<BoundStatement> = tree
            .members()
            .iter()
            .filter_map(|&member| match tree.kind(member) {
                SyntaxKind::GlobalStatement { statement } => Some(*statement),
                _ => None,
            })
            .map(|statement| self.bind_statement(&binder, statement))
            .collect();
        BoundBlock {
            statements,
            locals: binder.declared_locals_for_scope(),
        }
    }
}
