//! Statement binding.

use crate::binder::{Binder, LookupResult, Member};
use crate::bound::{BoundBlock, BoundExpression, BoundStatement};
use crate::flags::{BindValueKind, BinderFlags};
use crate::locals::LocalFunctionSymbol;
use crate::pass::BindingPass;
use sable_core::collections::FxHashSet;
use sable_diagnostics::messages;
use sable_symbols::{PrimitiveType, TypeRef};
use sable_syntax::{NodeId, SyntaxKind};
use std::sync::Arc;

impl BindingPass<'_> {
    /// Bind `block`, or a single statement standing in for one.
    pub fn bind_block(&mut self, binder: &Arc<Binder>, block: NodeId) -> BoundBlock {
        let tree = self.tree();
        let SyntaxKind::Block { statements } = tree.kind(block) else {
            let locals = binder
                .get_binder(block)
                .and_then(|scope| scope.scope_declarations().map(|declarations| declarations.locals.clone()))
                .unwrap_or_default();
            return BoundBlock {
                statements: vec![self.bind_statement(binder, block)],
                locals,
            };
        };
        let binder = binder.get_binder(block).unwrap_or_else(|| binder.clone());
        let statements = statements
            .iter()
            .map(|&statement| self.bind_statement(&binder, statement))
            .collect();
        BoundBlock {
            statements,
            locals: binder.declared_locals_for_scope(),
        }
    }

    pub fn bind_statement(&mut self, binder: &Arc<Binder>, node: NodeId) -> BoundStatement {
        let binder = binder.get_binder(node).unwrap_or_else(|| binder.clone());
        let tree = self.tree();
        match tree.kind(node) {
            SyntaxKind::Block { .. } => BoundStatement::Block(self.bind_block(&binder, node)),
            SyntaxKind::LocalDeclaration {
                name,
                ty,
                is_constant,
                initializer,
            } => self.bind_local_declaration(&binder, name, *ty, *is_constant, *initializer, node),
            SyntaxKind::LocalFunction { .. } => self.bind_local_function(&binder, node),
            SyntaxKind::ExpressionStatement { expression } => {
                BoundStatement::Expression(self.bind_expression(&binder, *expression, BindValueKind::INSIGNIFICANT))
            }
            SyntaxKind::If {
                condition,
                then_statement,
                else_statement,
            } => {
                let condition = self.bind_condition(&binder, *condition);
                let then_statement = Box::new(self.bind_statement(&binder, *then_statement));
                let else_statement = else_statement.map(|statement| Box::new(self.bind_statement(&binder, statement)));
                BoundStatement::If {
                    condition,
                    then_statement,
                    else_statement,
                }
            }
            SyntaxKind::While { condition, body } => {
                let (Some(break_label), Some(continue_label)) = (binder.break_label(), binder.continue_label()) else {
                    unreachable!("while statement without a loop frame");
                };
                let condition = self.bind_condition(&binder, *condition);
                let body = Box::new(self.bind_statement(&binder, *body));
                BoundStatement::While {
                    condition,
                    body,
                    break_label,
                    continue_label,
                }
            }
            SyntaxKind::Break => match binder.break_label() {
                Some(label) => BoundStatement::Break(label),
                None => {
                    self.report(node, &messages::INVALID_BREAK_OR_CONTINUE, &["break"]);
                    BoundStatement::Error(node)
                }
            },
            SyntaxKind::Continue => match binder.continue_label() {
                Some(label) => BoundStatement::Continue(label),
                None => {
                    self.report(node, &messages::INVALID_BREAK_OR_CONTINUE, &["continue"]);
                    BoundStatement::Error(node)
                }
            },
            SyntaxKind::Return { expression } => self.bind_return(&binder, *expression, node),
            SyntaxKind::Try {
                body,
                catch_body,
                finally_body,
            } => {
                let body = Box::new(self.bind_statement(&binder, *body));
                let catch_body = catch_body.map(|statement| Box::new(self.bind_statement(&binder, statement)));
                let finally_body = finally_body.map(|statement| Box::new(self.bind_statement(&binder, statement)));
                BoundStatement::Try {
                    body,
                    catch_body,
                    finally_body,
                }
            }
            SyntaxKind::Labeled { label, statement } => {
                let Some(symbol) = binder.label_declared_at(node) else {
                    unreachable!("label without a declaring scope");
                };
                if binder.lookup_label(label).is_some_and(|found| found.declaration != node) {
                    self.report(node, &messages::DUPLICATE_LABEL, &[label]);
                }
                let statement = Box::new(self.bind_statement(&binder, *statement));
                BoundStatement::Label {
                    label: symbol,
                    statement,
                }
            }
            SyntaxKind::Goto { label } => match binder.lookup_label(label) {
                Some(symbol) => BoundStatement::Goto(symbol),
                None => {
                    self.report(node, &messages::UNDEFINED_LABEL, &[label]);
                    BoundStatement::Error(node)
                }
            },
            kind if kind.is_expression() => {
                tracing::debug!(node = node.0, kind = kind.label(), "expression in statement position");
                BoundStatement::Expression(self.bind_expression(&binder, node, BindValueKind::INSIGNIFICANT))
            }
            kind => {
                self.report(node, &messages::INVALID_STATEMENT, &[kind.label()]);
                BoundStatement::Error(node)
            }
        }
    }

    /// A condition converted to `bool`.
    fn bind_condition(&mut self, binder: &Arc<Binder>, condition: NodeId) -> BoundExpression {
        let value = self.bind_value(binder, condition);
        self.convert(value, &TypeRef::primitive(PrimitiveType::Bool), condition)
    }

    fn bind_local_declaration(
        &mut self,
        binder: &Arc<Binder>,
        name: &str,
        type_syntax: Option<NodeId>,
        is_constant: bool,
        initializer: Option<NodeId>,
        node: NodeId,
    ) -> BoundStatement {
        let Some(local) = binder.local_declared_at(node) else {
            unreachable!("local declaration without a declaring scope");
        };
        if let LookupResult::Local(existing) = binder.lookup_symbols(name, node) {
            if existing.declaration != node {
                self.report(node, &messages::VARIABLE_ALREADY_DECLARED, &[name]);
            }
        }

        let declared_type = type_syntax.map(|syntax| self.bind_variable_type(binder, syntax, name));
        // Only this initializer decides whether the local is constant.
        let saw_bad_constant = std::mem::replace(&mut self.saw_bad_constant, false);
        let initializer = initializer.map(|syntax| {
            let in_progress = Binder::with_local_in_progress(binder, local.clone());
            let value = self.bind_value(&in_progress, syntax);
            match &declared_type {
                Some(ty) => self.convert(value, ty, syntax),
                None => value,
            }
        });
        let initializer_saw_bad_constant = self.saw_bad_constant;
        self.saw_bad_constant |= saw_bad_constant;

        let ty = match (declared_type, &initializer) {
            (Some(ty), _) => ty,
            (None, Some(value)) if value.ty.is_null() => {
                self.report(node, &messages::NULL_ASSIGN_ON_IMPLICIT, &[name]);
                TypeRef::error()
            }
            (None, Some(value)) => value.ty.clone(),
            (None, None) => {
                self.report(node, &messages::NO_INIT_ON_IMPLICIT, &[name]);
                TypeRef::error()
            }
        };
        local.set_type(ty);

        if is_constant {
            let constant = match &initializer {
                None => {
                    self.report(node, &messages::CONSTANT_NEEDS_INITIALIZER, &[name]);
                    None
                }
                Some(value) => {
                    if value.constant.is_none() && !value.is_error() && !initializer_saw_bad_constant {
                        self.report(value.syntax, &messages::NOT_CONSTANT_EXPRESSION, &[name]);
                    }
                    value.constant.clone()
                }
            };
            local.set_constant(constant);
        }
        BoundStatement::LocalDeclaration { local, initializer }
    }

    fn bind_local_function(&mut self, binder: &Arc<Binder>, node: NodeId) -> BoundStatement {
        let Some(function) = binder.local_function_declared_at(node) else {
            unreachable!("local function without a declaring scope");
        };
        let mut seen = FxHashSet::default();
        for parameter in &function.parameters {
            if !seen.insert(parameter.name.as_str()) {
                self.report(parameter.declaration, &messages::PARAMETER_ALREADY_DECLARED, &[&parameter.name]);
            }
        }

        let signature = self.bind_local_function_signature(binder, &function);
        let signature = function.set_signature(signature).clone();
        let defaults = self.bind_local_function_defaults(binder, &function, &signature.parameters);
        function.set_defaults(defaults);

        let body = self.bind_block(binder, function.body);
        BoundStatement::LocalFunction { function, body }
    }

    fn bind_local_function_defaults(
        &mut self,
        binder: &Arc<Binder>,
        function: &LocalFunctionSymbol,
        types: &[TypeRef],
    ) -> Vec<Option<BoundExpression>> {
        let tree = self.tree();
        function
            .parameters
            .iter()
            .zip(types)
            .map(|(parameter, ty)| {
                let SyntaxKind::Parameter {
                    default_value: Some(syntax),
                    ..
                } = tree.kind(parameter.declaration)
                else {
                    return None;
                };
                let frame = binder.get_binder(parameter.declaration).unwrap_or_else(|| binder.clone());
                let frame = Binder::with_additional_flags(&frame, BinderFlags::PARAMETER_DEFAULT_VALUE);
                let value = self.bind_value(&frame, *syntax);
                let value = self.convert(value, ty, *syntax);
                if value.constant.is_none() && !value.is_error() {
                    self.report(*syntax, &messages::NOT_CONSTANT_EXPRESSION, &[&parameter.name]);
                }
                Some(value)
            })
            .collect()
    }

    fn bind_return(&mut self, binder: &Arc<Binder>, expression: Option<NodeId>, node: NodeId) -> BoundStatement {
        if binder.flags().contains(BinderFlags::IN_FINALLY_BLOCK) {
            self.report(node, &messages::RETURN_IN_FINALLY, &[]);
        }
        let symbols = self.symbols();
        let (name, return_type) = match binder.in_method() {
            Some(Member::Symbol(method)) => (
                symbols.name(method).to_string(),
                self.context.method_signature(method).value.return_type.clone(),
            ),
            Some(Member::LocalFunction(function)) => (
                function.name.clone(),
                function
                    .signature()
                    .map_or_else(TypeRef::error, |signature| signature.return_type.clone()),
            ),
            None => (String::new(), TypeRef::error()),
        };

        let Some(expression) = expression else {
            if !return_type.is_void() && !return_type.is_error() {
                let ty = self.display(&return_type);
                self.report(node, &messages::MISSING_RETURN_VALUE, &[&name, &ty]);
            }
            return BoundStatement::Return(None);
        };
        if return_type.is_void() {
            // Bound for its diagnostics; the value itself is dropped.
            self.bind_expression(binder, expression, BindValueKind::INSIGNIFICANT);
            self.report(expression, &messages::UNEXPECTED_RETURN_VALUE, &[&name]);
            return BoundStatement::Return(None);
        }
        let value = self.bind_value(binder, expression);
        let value = self.convert(value, &return_type, expression);
        BoundStatement::Return(Some(value))
    }
}
