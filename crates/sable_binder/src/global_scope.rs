//! The result of binding one compilation unit.

use crate::bound::{BoundBlock, BoundExpression, BoundStatement};
use crate::module::SourceModule;
use sable_core::FxIndexMap;
use sable_diagnostics::DiagnosticQueue;
use sable_symbols::SymbolId;
use std::sync::Arc;

/// Everything binding produced for a compilation unit. Immutable once
/// built; a script submission links to the scope it continues.
#[derive(Debug)]
pub struct BoundGlobalScope {
    previous: Option<Arc<BoundGlobalScope>>,
    module: Arc<SourceModule>,
    diagnostics: DiagnosticQueue,
    entry_point: Option<SymbolId>,
    methods: Vec<SymbolId>,
    variables: Vec<SymbolId>,
    types: Vec<SymbolId>,
    method_bodies: FxIndexMap<SymbolId, BoundBlock>,
    field_initializers: FxIndexMap<SymbolId, BoundExpression>,
    statements: Vec<BoundStatement>,
    library_types: FxIndexMap<String, SymbolId>,
}

/// The parts a `BoundGlobalScope` is assembled from.
#[derive(Debug, Default)]
pub struct GlobalScopeParts {
    pub entry_point: Option<SymbolId>,
    pub methods: Vec<SymbolId>,
    pub variables: Vec<SymbolId>,
    pub types: Vec<SymbolId>,
    pub method_bodies: FxIndexMap<SymbolId, BoundBlock>,
    pub field_initializers: FxIndexMap<SymbolId, BoundExpression>,
    pub statements: Vec<BoundStatement>,
    pub library_types: FxIndexMap<String, SymbolId>,
}

impl BoundGlobalScope {
    /// Assemble a scope. The diagnostics are moved out of `diagnostics`
    /// into a queue owned by the scope.
    pub fn new(
        previous: Option<Arc<BoundGlobalScope>>,
        module: Arc<SourceModule>,
        diagnostics: &mut DiagnosticQueue,
        parts: GlobalScopeParts,
    ) -> Self {
        let mut owned = DiagnosticQueue::new();
        owned.move_from(diagnostics);
        Self {
            previous,
            module,
            diagnostics: owned,
            entry_point: parts.entry_point,
            methods: parts.methods,
            variables: parts.variables,
            types: parts.types,
            method_bodies: parts.method_bodies,
            field_initializers: parts.field_initializers,
            statements: parts.statements,
            library_types: parts.library_types,
        }
    }

    pub fn previous(&self) -> Option<&Arc<BoundGlobalScope>> {
        self.previous.as_ref()
    }

    /// This scope followed by every earlier one, newest first.
    pub fn history(&self) -> impl Iterator<Item = &BoundGlobalScope> {
        std::iter::successors(Some(self), |scope| scope.previous.as_deref())
    }

    pub fn module(&self) -> &Arc<SourceModule> {
        &self.module
    }

    pub fn diagnostics(&self) -> &DiagnosticQueue {
        &self.diagnostics
    }

    pub fn entry_point(&self) -> Option<SymbolId> {
        self.entry_point
    }

    pub fn methods(&self) -> &[SymbolId] {
        &self.methods
    }

    pub fn variables(&self) -> &[SymbolId] {
        &self.variables
    }

    pub fn types(&self) -> &[SymbolId] {
        &self.types
    }

    pub fn method_bodies(&self) -> &FxIndexMap<SymbolId, BoundBlock> {
        &self.method_bodies
    }

    pub fn method_body(&self, method: SymbolId) -> Option<&BoundBlock> {
        self.method_bodies.get(&method)
    }

    pub fn field_initializers(&self) -> &FxIndexMap<SymbolId, BoundExpression> {
        &self.field_initializers
    }

    /// The global statements, in script mode.
    pub fn statements(&self) -> &[BoundStatement] {
        &self.statements
    }

    pub fn library_types(&self) -> &FxIndexMap<String, SymbolId> {
        &self.library_types
    }

    pub fn library_type(&self, name: &str) -> Option<SymbolId> {
        self.library_types.get(name).copied()
    }
}
