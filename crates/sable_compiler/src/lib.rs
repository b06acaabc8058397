//! sable_compiler: Compilation orchestration.
//!
//! A `Compilation` declares the symbols of one syntax tree, drives the
//! binder over every member and assembles the `BoundGlobalScope`. Method
//! bodies are bound in parallel; their diagnostics are merged back in
//! declaration order so the output is the same on every run.

use rayon::prelude::*;
use sable_binder::{
    BinderFlags, BindingContext, BoundBlock, BoundExpression, BoundGlobalScope, ConstantFieldsInProgress, Evaluated,
    GlobalScopeParts, SourceModule,
};
use sable_core::{ConsList, FxIndexMap};
use sable_diagnostics::{messages, Diagnostic, DiagnosticMessage, DiagnosticQueue};
use sable_options::CompilationOptions;
use sable_symbols::{declare_symbols, SymbolId, SymbolKind, SymbolTable};
use sable_syntax::{NodeId, SyntaxTree};
use std::sync::{Arc, OnceLock};

/// One compilation unit, optionally continuing a previous script
/// submission.
pub struct Compilation {
    options: CompilationOptions,
    context: BindingContext,
    declaration_diagnostics: DiagnosticQueue,
    library_types: FxIndexMap<String, SymbolId>,
    previous: Option<Arc<BoundGlobalScope>>,
    global_scope: OnceLock<Arc<BoundGlobalScope>>,
}

/// A member whose executable code is bound in the parallel phase.
#[derive(Clone, Copy)]
enum BodyWork {
    Method(SymbolId),
    FieldInitializer(SymbolId),
}

enum BoundBody {
    Method(SymbolId, Evaluated<BoundBlock>),
    FieldInitializer(SymbolId, Evaluated<BoundExpression>),
}

impl Compilation {
    /// Declare the symbols of `tree`. Library types are entered first so
    /// source declarations with the same name are reported as duplicates.
    pub fn new(tree: SyntaxTree, options: CompilationOptions, previous: Option<Arc<BoundGlobalScope>>) -> Self {
        let mut symbols = SymbolTable::new();
        let mut declaration_diagnostics = DiagnosticQueue::new();
        let library_types = options
            .library_types()
            .iter()
            .map(|name| (name.clone(), symbols.add_library_type(name)))
            .collect();
        declare_symbols(&tree, &mut symbols, &mut declaration_diagnostics);
        tracing::debug!(
            file = tree.file_name(),
            symbols = symbols.len(),
            diagnostics = declaration_diagnostics.len(),
            "declared symbols"
        );

        let module = Arc::new(SourceModule::new(tree, symbols));
        let context = BindingContext::new(module, binder_flags(&options));
        Self {
            options,
            context,
            declaration_diagnostics,
            library_types,
            previous,
            global_scope: OnceLock::new(),
        }
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    pub fn module(&self) -> &Arc<SourceModule> {
        self.context.module()
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.context.symbols()
    }

    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    /// The scope of the submission this one continues.
    pub fn previous_scope(&self) -> Option<&Arc<BoundGlobalScope>> {
        self.previous.as_ref()
    }

    /// Bind everything, once. Later calls return the same scope.
    pub fn bind_global_scope(&self) -> Arc<BoundGlobalScope> {
        self.global_scope.get_or_init(|| Arc::new(self.bind())).clone()
    }

    fn bind(&self) -> BoundGlobalScope {
        let _span = tracing::debug_span!("bind_global_scope", file = self.module().file_name()).entered();
        let mut diagnostics = self.declaration_diagnostics.clone();

        self.bind_declarations(&mut diagnostics);
        self.evaluate_constants(&mut diagnostics);

        let mut parts = GlobalScopeParts::default();
        for bound in self.bind_bodies() {
            match bound {
                BoundBody::Method(method, evaluated) => {
                    diagnostics.extend(evaluated.diagnostics);
                    parts.method_bodies.insert(method, evaluated.value);
                }
                BoundBody::FieldInitializer(field, evaluated) => {
                    diagnostics.extend(evaluated.diagnostics);
                    parts.field_initializers.insert(field, evaluated.value);
                }
            }
        }

        let symbols = self.symbols();
        let synthesized = symbols.synthesized_entry();
        if let Some(entry) = synthesized {
            if let Some(evaluated) = self.context.bind_method_body(entry) {
                diagnostics.extend(evaluated.diagnostics);
                if self.options.is_script() {
                    parts.statements = evaluated.value.statements;
                } else {
                    parts.method_bodies.insert(entry, evaluated.value);
                }
            }
        }

        parts.entry_point = self.select_entry_point(synthesized, &mut diagnostics);
        for &member in symbols.members(symbols.global()) {
            let symbol = symbols.get(member);
            match &symbol.kind {
                SymbolKind::Method(data) if !data.is_synthesized_entry => parts.methods.push(member),
                SymbolKind::Field(_) => parts.variables.push(member),
                SymbolKind::NamedType(data) if !data.is_library => parts.types.push(member),
                _ => {}
            }
        }
        parts.library_types = self.library_types.clone();

        tracing::debug!(
            methods = parts.methods.len(),
            bodies = parts.method_bodies.len(),
            errors = diagnostics.error_count(),
            "bound global scope"
        );
        BoundGlobalScope::new(self.previous.clone(), self.module().clone(), &mut diagnostics, parts)
    }

    /// Template parameters, method signatures, field types and parameter
    /// defaults, in declaration order.
    fn bind_declarations(&self, diagnostics: &mut DiagnosticQueue) {
        let context = &self.context;
        for symbol in self.symbols().iter() {
            match &symbol.kind {
                SymbolKind::NamedType(data) if !data.is_library => {
                    diagnostics.extend(context.bind_template_parameters(symbol.id).diagnostics);
                }
                SymbolKind::Method(_) => {
                    diagnostics.extend_from(&context.method_signature(symbol.id).diagnostics);
                }
                SymbolKind::Field(_) => {
                    diagnostics.extend_from(&context.field_type(symbol.id, &ConsList::empty()).diagnostics);
                }
                SymbolKind::Parameter(data) if data.default_value.is_some() => {
                    diagnostics.extend_from(&context.parameter_default(symbol.id).diagnostics);
                }
                _ => {}
            }
        }
    }

    /// Every constant field, dependencies before dependents. Each field's
    /// diagnostics land at its own position in declaration order.
    fn evaluate_constants(&self, diagnostics: &mut DiagnosticQueue) {
        for field in self.symbols().constant_fields() {
            if let Some(evaluated) = self.context.field_constant(field, &ConstantFieldsInProgress::EMPTY) {
                diagnostics.extend_from(&evaluated.diagnostics);
            }
        }
    }

    /// Method bodies and non-constant field initializers, bound in
    /// parallel and returned in declaration order.
    fn bind_bodies(&self) -> Vec<BoundBody> {
        let work: Vec<BodyWork> = self
            .symbols()
            .iter()
            .filter_map(|symbol| match &symbol.kind {
                SymbolKind::Method(data) if data.body.is_some() => Some(BodyWork::Method(symbol.id)),
                SymbolKind::Field(data) if !data.is_constant && data.initializer.is_some() => {
                    Some(BodyWork::FieldInitializer(symbol.id))
                }
                _ => None,
            })
            .collect();
        tracing::debug!(count = work.len(), "binding bodies");

        work.par_iter()
            .filter_map(|&item| match item {
                BodyWork::Method(method) => self
                    .context
                    .bind_method_body(method)
                    .map(|evaluated| BoundBody::Method(method, evaluated)),
                BodyWork::FieldInitializer(field) => self
                    .context
                    .bind_field_initializer(field)
                    .map(|evaluated| BoundBody::FieldInitializer(field, evaluated)),
            })
            .collect()
    }

    /// Script submissions always run their global statements. Otherwise a
    /// global method with the entry point name wins, and global statements
    /// next to it are an error.
    fn select_entry_point(&self, synthesized: Option<SymbolId>, diagnostics: &mut DiagnosticQueue) -> Option<SymbolId> {
        if self.options.is_script() {
            return synthesized;
        }
        let symbols = self.symbols();
        let name = self.options.entry_point_name();
        let candidates = symbols.entry_point_candidates(name);
        let Some(&first) = candidates.first() else {
            return synthesized;
        };

        let mut parameterless = None;
        for &candidate in &candidates {
            if symbols.parameters(candidate).is_empty() {
                parameterless = parameterless.or(Some(candidate));
            } else {
                diagnostics.push(self.diagnostic_at(candidate, &messages::INVALID_MAIN, name));
            }
        }
        let main = parameterless.unwrap_or(first);
        if synthesized.is_some() {
            diagnostics.push(self.diagnostic_at(main, &messages::MAIN_AND_GLOBALS, name));
        }
        tracing::debug!(entry_point = %symbols.qualified_name(main), "selected entry point");
        Some(main)
    }

    fn diagnostic_at(&self, symbol: SymbolId, message: &DiagnosticMessage, name: &str) -> Diagnostic {
        let tree = self.context.tree();
        let node: NodeId = self.symbols().get(symbol).declaration.unwrap_or_else(|| tree.root());
        Diagnostic::with_location(tree.file_name(), tree.span(node), message, &[name])
    }
}

impl std::fmt::Debug for Compilation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compilation")
            .field("file", &self.module().file_name())
            .field("options", &self.options)
            .field("has_previous", &self.previous.is_some())
            .field("bound", &self.global_scope.get().is_some())
            .finish()
    }
}

/// Flags every binder chain of the compilation starts from.
pub fn binder_flags(options: &CompilationOptions) -> BinderFlags {
    let mut flags = BinderFlags::NONE;
    if options.ignore_accessibility() {
        flags |= BinderFlags::IGNORE_ACCESSIBILITY;
    }
    if options.allow_low_level() {
        flags |= BinderFlags::UNSAFE_REGION;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binder_flags_follow_options() {
        assert_eq!(binder_flags(&CompilationOptions::default()), BinderFlags::NONE);
        let options = CompilationOptions {
            ignore_accessibility: Some(true),
            allow_low_level: Some(true),
            ..CompilationOptions::default()
        };
        assert_eq!(
            binder_flags(&options),
            BinderFlags::IGNORE_ACCESSIBILITY | BinderFlags::UNSAFE_REGION
        );
    }
}
