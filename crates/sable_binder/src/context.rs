//! Per-compilation binding state shared by every pass.
//!
//! Everything here is computed on demand and published once: method
//! signatures, inferred field types, parameter default values and field
//! constants. Racing computations are allowed; the first published value
//! wins and later ones are dropped.

use crate::binder::Binder;
use crate::bound::BoundExpression;
use crate::factory::BinderFactory;
use crate::field_constants::FieldConstant;
use crate::flags::BinderFlags;
use crate::module::SourceModule;
use crate::pass::BindingPass;
use dashmap::{DashMap, DashSet};
use sable_core::ConsList;
use sable_diagnostics::{messages, Diagnostic, DiagnosticMessage, DiagnosticQueue};
use sable_symbols::{SymbolId, SymbolTable, TypeRef};
use sable_syntax::{NodeId, SyntaxTree};
use std::sync::Arc;

/// A published value together with the diagnostics its computation
/// reported.
#[derive(Debug)]
pub struct Evaluated<T> {
    pub value: T,
    pub diagnostics: DiagnosticQueue,
}

impl<T> Evaluated<T> {
    pub fn new(value: T, diagnostics: DiagnosticQueue) -> Self {
        Self { value, diagnostics }
    }
}

/// The bound parameter and return types of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

pub struct BindingContext {
    module: Arc<SourceModule>,
    factory: BinderFactory,
    pub(crate) constants: DashMap<SymbolId, Arc<Evaluated<FieldConstant>>>,
    field_types: DashMap<SymbolId, Arc<Evaluated<TypeRef>>>,
    signatures: DashMap<SymbolId, Arc<Evaluated<MethodSignature>>>,
    signatures_in_progress: DashSet<SymbolId>,
    defaults: DashMap<SymbolId, Arc<Evaluated<Option<BoundExpression>>>>,
}

impl BindingContext {
    pub fn new(module: Arc<SourceModule>, flags: BinderFlags) -> Self {
        Self {
            factory: BinderFactory::new(module.clone(), flags),
            module,
            constants: DashMap::new(),
            field_types: DashMap::new(),
            signatures: DashMap::new(),
            signatures_in_progress: DashSet::new(),
            defaults: DashMap::new(),
        }
    }

    #[inline]
    pub fn module(&self) -> &Arc<SourceModule> {
        &self.module
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        self.module.symbols()
    }

    #[inline]
    pub fn tree(&self) -> &SyntaxTree {
        self.module.tree()
    }

    #[inline]
    pub fn factory(&self) -> &BinderFactory {
        &self.factory
    }

    pub(crate) fn diagnostic(&self, node: NodeId, message: &DiagnosticMessage, args: &[&str]) -> Diagnostic {
        Diagnostic::with_location(self.tree().file_name(), self.tree().span(node), message, args)
    }

    fn declaration_or_root(&self, symbol: SymbolId) -> NodeId {
        self.symbols().get(symbol).declaration.unwrap_or_else(|| self.tree().root())
    }

    // ========================================================================
    // Method signatures
    // ========================================================================

    pub fn method_signature(&self, method: SymbolId) -> Arc<Evaluated<MethodSignature>> {
        if let Some(signature) = self.signatures.get(&method) {
            return signature.value().clone();
        }
        // A signature whose types need the signature itself (through a
        // constant template argument) sees error types.
        if !self.signatures_in_progress.insert(method) {
            let parameters = vec![TypeRef::error(); self.symbols().parameters(method).len()];
            return Arc::new(Evaluated::new(
                MethodSignature {
                    parameters,
                    return_type: TypeRef::error(),
                },
                DiagnosticQueue::new(),
            ));
        }
        let evaluated = self.bind_method_signature(method);
        self.signatures_in_progress.remove(&method);
        self.signatures
            .entry(method)
            .or_insert(Arc::new(evaluated))
            .value()
            .clone()
    }

    fn bind_method_signature(&self, method: SymbolId) -> Evaluated<MethodSignature> {
        let symbols = self.symbols();
        let binder = self.factory.method_signature_binder(method);
        let mut pass = BindingPass::new(self);
        let parameters = symbols
            .parameters(method)
            .iter()
            .map(|&parameter| match symbols.as_parameter(parameter) {
                Some(data) => pass.bind_variable_type(&binder, data.type_syntax, symbols.name(parameter)),
                None => TypeRef::error(),
            })
            .collect();
        let return_type = match symbols.as_method(method).and_then(|data| data.return_type) {
            Some(syntax) => pass.bind_type(&binder, syntax),
            None => TypeRef::void(),
        };
        tracing::trace!(method = %symbols.qualified_name(method), "bound method signature");
        Evaluated::new(MethodSignature { parameters, return_type }, pass.into_diagnostics())
    }

    // ========================================================================
    // Parameter defaults
    // ========================================================================

    /// The default value of `parameter`, binding and publishing it on first
    /// request.
    pub fn parameter_default(&self, parameter: SymbolId) -> Arc<Evaluated<Option<BoundExpression>>> {
        if let Some(default) = self.defaults.get(&parameter) {
            return default.value().clone();
        }
        let evaluated = self.bind_parameter_default(parameter);
        self.defaults
            .entry(parameter)
            .or_insert(Arc::new(evaluated))
            .value()
            .clone()
    }

    /// The default value of `parameter` if it has been published. Overload
    /// resolution reads defaults through this so that binding a default
    /// never recurses into other defaults.
    pub fn published_default(&self, parameter: SymbolId) -> Option<BoundExpression> {
        self.defaults
            .get(&parameter)
            .and_then(|default| default.value().value.clone())
    }

    fn bind_parameter_default(&self, parameter: SymbolId) -> Evaluated<Option<BoundExpression>> {
        let symbols = self.symbols();
        let (Some(binder), Some(data)) = (
            self.factory.parameter_default_binder(parameter),
            symbols.as_parameter(parameter),
        ) else {
            return Evaluated::new(None, DiagnosticQueue::new());
        };
        let Some(syntax) = data.default_value else {
            return Evaluated::new(None, DiagnosticQueue::new());
        };
        let target = symbols
            .get(parameter)
            .containing
            .and_then(|method| {
                self.method_signature(method)
                    .value
                    .parameters
                    .get(data.ordinal as usize)
                    .cloned()
            })
            .unwrap_or_else(TypeRef::error);

        let mut pass = BindingPass::new(self);
        let value = pass.bind_value(&binder, syntax);
        let value = pass.convert(value, &target, syntax);
        if value.constant.is_none() && !value.is_error() {
            pass.report(syntax, &messages::NOT_CONSTANT_EXPRESSION, &[symbols.name(parameter)]);
        }
        Evaluated::new(Some(value), pass.into_diagnostics())
    }

    // ========================================================================
    // Field types
    // ========================================================================

    /// The type of `field`. Implicitly typed fields take the type of their
    /// initializer; `being_bound` lists the fields whose types are already
    /// being inferred further up.
    pub fn field_type(&self, field: SymbolId, being_bound: &ConsList<SymbolId>) -> Arc<Evaluated<TypeRef>> {
        if let Some(ty) = self.field_types.get(&field) {
            return ty.value().clone();
        }
        let evaluated = if being_bound.contains(&field) {
            let mut diagnostics = DiagnosticQueue::new();
            diagnostics.push(self.diagnostic(
                self.declaration_or_root(field),
                &messages::CIRCULAR_FIELD_TYPE,
                &[self.symbols().name(field)],
            ));
            Evaluated::new(TypeRef::error(), diagnostics)
        } else {
            self.bind_field_type(field, being_bound)
        };
        self.field_types
            .entry(field)
            .or_insert(Arc::new(evaluated))
            .value()
            .clone()
    }

    fn bind_field_type(&self, field: SymbolId, being_bound: &ConsList<SymbolId>) -> Evaluated<TypeRef> {
        let symbols = self.symbols();
        let name = symbols.name(field);
        let Some(data) = symbols.as_field(field) else {
            return Evaluated::new(TypeRef::error(), DiagnosticQueue::new());
        };
        let mut pass = BindingPass::new(self);
        if let Some(syntax) = data.type_syntax {
            let binder = self.factory.field_binder(field);
            let ty = pass.bind_variable_type(&binder, syntax, name);
            return Evaluated::new(ty, pass.into_diagnostics());
        }

        let declaration = self.declaration_or_root(field);
        let Some(binder) = self.factory.field_initializer_binder(field) else {
            pass.report(declaration, &messages::NO_INIT_ON_IMPLICIT, &[name]);
            return Evaluated::new(TypeRef::error(), pass.into_diagnostics());
        };
        let initializer = data.initializer.unwrap_or(declaration);
        let binder = Binder::with_fields_being_bound(&binder, being_bound.prepend(field));

        // The initializer is bound again with full diagnostics later; only
        // its type matters here.
        let mut inference = BindingPass::new(self);
        let ty = inference.bind_value(&binder, initializer).ty;
        if ty.is_null() {
            pass.report(initializer, &messages::NULL_ASSIGN_ON_IMPLICIT, &[name]);
            return Evaluated::new(TypeRef::error(), pass.into_diagnostics());
        }
        Evaluated::new(ty, pass.into_diagnostics())
    }
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext")
            .field("factory", &self.factory)
            .field("constants", &self.constants.len())
            .field("field_types", &self.field_types.len())
            .field("signatures", &self.signatures.len())
            .finish()
    }
}
