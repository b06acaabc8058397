//! Declaration pass: creates the top-level symbols of a syntax tree.

use crate::symbol::{
    Accessibility, FieldData, MethodData, NamedTypeData, ParameterData, SymbolId, SymbolKind,
    TemplateParameterData,
};
use crate::table::{SymbolTable, SYNTHESIZED_ENTRY_NAME};
use sable_diagnostics::{messages, Diagnostic, DiagnosticMessage, DiagnosticQueue};
use sable_syntax::{ModifierFlags, NodeId, SyntaxKind, SyntaxTree};
use tracing::debug;

struct Declarer<'a> {
    tree: &'a SyntaxTree,
    table: &'a mut SymbolTable,
    diagnostics: &'a mut DiagnosticQueue,
    declared_types: Vec<SymbolId>,
}

/// Declare every type, method and field of `tree` in `table`.
///
/// Global statements are gathered into a synthesized entry method named
/// `<Main>` whose declaration is the compilation unit.
pub fn declare_symbols(tree: &SyntaxTree, table: &mut SymbolTable, diagnostics: &mut DiagnosticQueue) {
    let mut declarer = Declarer {
        tree,
        table,
        diagnostics,
        declared_types: Vec::new(),
    };
    let global = declarer.table.global();
    let mut has_global_statements = false;

    for &member in tree.members() {
        if matches!(tree.kind(member), SyntaxKind::GlobalStatement { .. }) {
            has_global_statements = true;
        } else {
            declarer.declare_member(member, global);
        }
    }

    if has_global_statements {
        let data = MethodData {
            is_static: true,
            is_synthesized_entry: true,
            ..MethodData::default()
        };
        declarer.table.add(
            SYNTHESIZED_ENTRY_NAME,
            SymbolKind::Method(data),
            Accessibility::Public,
            global,
            Some(tree.root()),
        );
    }

    declarer.resolve_base_types();
    debug!(
        symbols = declarer.table.len(),
        global_statements = has_global_statements,
        "declared symbols"
    );
}

impl<'a> Declarer<'a> {
    fn error(&mut self, node: NodeId, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.push(Diagnostic::with_location(
            self.tree.file_name(),
            self.tree.span(node),
            message,
            args,
        ));
    }

    fn declare_member(&mut self, node: NodeId, container: SymbolId) {
        match self.tree.kind(node).clone() {
            SyntaxKind::ClassDeclaration {
                name,
                modifiers,
                template_parameters,
                base,
                members,
            } => {
                self.check_duplicate(node, &name, container, false);
                let data = NamedTypeData {
                    base_syntax: base,
                    ..NamedTypeData::default()
                };
                let ty = self.table.add(
                    &name,
                    SymbolKind::NamedType(data),
                    Accessibility::from_modifiers(modifiers),
                    container,
                    Some(node),
                );
                self.declared_types.push(ty);

                for (ordinal, &parameter) in template_parameters.iter().enumerate() {
                    let SyntaxKind::TemplateParameter { name, constant_type } = self.tree.kind(parameter).clone() else {
                        continue;
                    };
                    let kind = SymbolKind::TemplateParameter(TemplateParameterData {
                        constant_type,
                        ordinal: ordinal as u32,
                    });
                    let id = self.table.add(&name, kind, Accessibility::Public, ty, Some(parameter));
                    if let SymbolKind::NamedType(data) = &mut self.table.get_mut(ty).kind {
                        data.template_parameters.push(id);
                    }
                }

                for member in members {
                    self.declare_member(member, ty);
                }
            }
            SyntaxKind::MethodDeclaration {
                name,
                modifiers,
                return_type,
                parameters,
                body,
            } => {
                self.check_duplicate(node, &name, container, true);
                let data = MethodData {
                    return_type,
                    body: Some(body),
                    is_static: modifiers.contains(ModifierFlags::STATIC) || container == self.table.global(),
                    is_low_level: modifiers.contains(ModifierFlags::LOW_LEVEL),
                    ..MethodData::default()
                };
                let method = self.table.add(
                    &name,
                    SymbolKind::Method(data),
                    Accessibility::from_modifiers(modifiers),
                    container,
                    Some(node),
                );
                self.declare_parameters(method, &parameters);
            }
            SyntaxKind::FieldDeclaration {
                name,
                modifiers,
                ty,
                initializer,
            } => {
                self.check_duplicate(node, &name, container, false);
                let data = FieldData {
                    type_syntax: ty,
                    initializer,
                    is_constant: modifiers.contains(ModifierFlags::CONST),
                    is_static: modifiers.contains(ModifierFlags::STATIC) || container == self.table.global(),
                };
                self.table.add(
                    &name,
                    SymbolKind::Field(data),
                    Accessibility::from_modifiers(modifiers),
                    container,
                    Some(node),
                );
            }
            other => debug!(kind = other.label(), "skipping non-declaration member"),
        }
    }

    fn declare_parameters(&mut self, method: SymbolId, parameters: &[NodeId]) {
        let mut seen: Vec<String> = Vec::new();
        for (ordinal, &parameter) in parameters.iter().enumerate() {
            let SyntaxKind::Parameter { name, ty, default_value } = self.tree.kind(parameter).clone() else {
                continue;
            };
            if seen.contains(&name) {
                self.error(parameter, &messages::PARAMETER_ALREADY_DECLARED, &[&name]);
            }
            seen.push(name.clone());
            let kind = SymbolKind::Parameter(ParameterData {
                type_syntax: ty,
                default_value,
                ordinal: ordinal as u32,
            });
            let id = self.table.add(&name, kind, Accessibility::Public, method, Some(parameter));
            if let SymbolKind::Method(data) = &mut self.table.get_mut(method).kind {
                data.parameters.push(id);
            }
        }
    }

    /// Methods may overload each other; any other pair of members with the
    /// same name in one container is a duplicate.
    fn check_duplicate(&mut self, node: NodeId, name: &str, container: SymbolId, is_method: bool) {
        let clashes = self
            .table
            .lookup_member(container, name)
            .iter()
            .any(|&existing| !(is_method && self.table.get(existing).is_method()));
        if clashes {
            let container_name = self.table.name(container).to_string();
            self.error(node, &messages::DUPLICATE_DECLARATION, &[name, &container_name]);
        }
    }

    fn resolve_base_types(&mut self) {
        let tree = self.tree;
        for ty in std::mem::take(&mut self.declared_types) {
            let Some(base_syntax) = self.table.as_named_type(ty).and_then(|data| data.base_syntax) else {
                continue;
            };
            let SyntaxKind::TypeName { name, .. } = tree.kind(base_syntax) else {
                self.error(base_syntax, &messages::UNKNOWN_TYPE, &[&tree.text_of(base_syntax)]);
                continue;
            };
            let container = self.table.get(ty).containing.unwrap_or(self.table.global());
            let found = self
                .table
                .lookup_member(container, name)
                .iter()
                .chain(self.table.lookup_member(self.table.global(), name))
                .copied()
                .find(|&candidate| self.table.get(candidate).is_type());
            let Some(base) = found else {
                self.error(base_syntax, &messages::UNKNOWN_TYPE, &[name.as_str()]);
                continue;
            };
            if self.table.is_derived_from(base, ty) {
                let names = [self.table.name(ty).to_string(), self.table.name(base).to_string()];
                self.error(base_syntax, &messages::CIRCULAR_BASE, &[&names[0], &names[1]]);
                continue;
            }
            if let SymbolKind::NamedType(data) = &mut self.table.get_mut(ty).kind {
                data.base = Some(base);
            }
        }
    }
}
