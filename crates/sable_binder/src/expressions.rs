//! Expression binding.

use crate::binder::{Binder, LookupResult};
use crate::bound::{BoundExpression, BoundExpressionKind};
use crate::constant::BoundConstant;
use crate::conversions::Conversions;
use crate::flags::{BindValueKind, BinderFlags};
use crate::locals::{LocalFunctionSignature, LocalFunctionSymbol, LocalSymbol};
use crate::overload::{Candidate, CandidateParameter, OverloadResolution, PreboundArgument};
use crate::pass::BindingPass;
use sable_diagnostics::messages;
use sable_symbols::{ConstantValue, PrimitiveType, SymbolId, SymbolKind, TypeKind, TypeRef};
use sable_syntax::{BinaryOperator, LiteralValue, NodeId, SyntaxKind, UnaryOperator};
use std::sync::Arc;

/// Operand and result types of a primitive binary operator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BinarySignature {
    pub left: TypeRef,
    pub right: TypeRef,
    pub result: TypeRef,
}

impl BindingPass<'_> {
    /// Bind an expression whose value is read.
    pub fn bind_value(&mut self, binder: &Arc<Binder>, node: NodeId) -> BoundExpression {
        self.bind_expression(binder, node, BindValueKind::RVALUE)
    }

    pub fn bind_expression(&mut self, binder: &Arc<Binder>, node: NodeId, value_kind: BindValueKind) -> BoundExpression {
        let expression = self.bind_expression_internal(binder, node, value_kind);
        self.check_value_kind(expression, value_kind)
    }

    fn bind_expression_internal(
        &mut self,
        binder: &Arc<Binder>,
        node: NodeId,
        value_kind: BindValueKind,
    ) -> BoundExpression {
        let tree = self.tree();
        match tree.kind(node) {
            SyntaxKind::Literal { value } => bind_literal(value, node),
            SyntaxKind::Name { name } => self.bind_name(binder, name, node),
            SyntaxKind::MemberAccess { receiver, name } => {
                let receiver = self.bind_expression(binder, *receiver, BindValueKind::INSIGNIFICANT);
                self.bind_member_access(binder, receiver, name, node)
            }
            SyntaxKind::ConditionalAccess { receiver, access } => {
                self.bind_conditional_access(binder, *receiver, *access, node, value_kind)
            }
            SyntaxKind::MemberBinding { name } => match binder.conditional_receiver_expression() {
                Some(receiver) => self.bind_member_access(binder, receiver, name, node),
                None => {
                    self.report(node, &messages::MEMBER_BINDING_OUTSIDE_CONDITIONAL_ACCESS, &[name]);
                    BoundExpression::error(node)
                }
            },
            SyntaxKind::Call { callee, arguments } => self.bind_call(binder, *callee, arguments, node),
            SyntaxKind::Argument { expression, .. } => self.bind_expression_internal(binder, *expression, value_kind),
            SyntaxKind::Assignment { operator, left, right } => {
                self.bind_assignment(binder, *operator, *left, *right, node)
            }
            SyntaxKind::Binary { operator, left, right } => self.bind_binary(binder, *operator, *left, *right, node),
            SyntaxKind::Unary { operator, operand } => self.bind_unary(binder, *operator, *operand, node),
            SyntaxKind::Cast { ty, expression } => {
                let target = self.bind_type(binder, *ty);
                let operand = self.bind_value(binder, *expression);
                self.convert_with(operand, &target, node, true)
            }
            SyntaxKind::TypeOf { ty } => {
                let inner = Binder::with_unbound_type_allowed(binder);
                let bound = self.bind_type(&inner, *ty);
                if bound.is_error() {
                    return BoundExpression::error(node);
                }
                BoundExpression::new(
                    BoundExpressionKind::TypeOf(bound),
                    TypeRef::primitive(PrimitiveType::Type),
                    node,
                )
            }
            kind if kind.is_type_syntax() => {
                let ty = self.bind_type(binder, node);
                if ty.is_error() {
                    return BoundExpression::error(node);
                }
                BoundExpression::new(BoundExpressionKind::Type, ty, node)
            }
            kind => {
                tracing::debug!(node = node.0, kind = kind.label(), "statement in expression position");
                BoundExpression::error(node)
            }
        }
    }

    /// Check `expression` against what its position requires.
    pub(crate) fn check_value_kind(&mut self, expression: BoundExpression, value_kind: BindValueKind) -> BoundExpression {
        if expression.is_error() {
            return expression;
        }
        if value_kind.requires_assignable() {
            return self.check_assignable(expression);
        }
        if !value_kind.requires_value() {
            return expression;
        }
        let has_no_value = match &expression.kind {
            BoundExpressionKind::MethodGroup { .. } | BoundExpressionKind::LocalFunctionGroup(_) => {
                !value_kind.allows_method_group()
            }
            BoundExpressionKind::Type => true,
            _ => expression.ty.is_void(),
        };
        if has_no_value {
            self.report(expression.syntax, &messages::NO_VALUE, &[]);
            return BoundExpression::error(expression.syntax);
        }
        expression
    }

    fn check_assignable(&mut self, expression: BoundExpression) -> BoundExpression {
        let symbols = self.symbols();
        let constant_name = match &expression.kind {
            BoundExpressionKind::Local(local) if local.is_constant => Some(local.name.clone()),
            BoundExpressionKind::Local(_) | BoundExpressionKind::Parameter(_) => return expression,
            BoundExpressionKind::Field { field, .. } => match symbols.as_field(*field) {
                Some(data) if data.is_constant => Some(symbols.name(*field).to_string()),
                _ => return expression,
            },
            _ => None,
        };
        match constant_name {
            Some(name) => self.report(expression.syntax, &messages::CONSTANT_ASSIGNMENT, &[&name]),
            None => self.report(expression.syntax, &messages::CANNOT_ASSIGN, &[]),
        }
        BoundExpression::error(expression.syntax)
    }

    // ========================================================================
    // Names and members
    // ========================================================================

    pub(crate) fn bind_name(&mut self, binder: &Arc<Binder>, name: &str, node: NodeId) -> BoundExpression {
        match binder.lookup_symbols(name, node) {
            LookupResult::Local(local) => self.bind_local(binder, local, node),
            LookupResult::DeclaredLater(_) => {
                self.report(node, &messages::LOCAL_USED_BEFORE_DECLARATION, &[name]);
                BoundExpression::error(node)
            }
            LookupResult::LocalFunction(function) => BoundExpression::new(
                BoundExpressionKind::LocalFunctionGroup(function),
                TypeRef::void(),
                node,
            ),
            LookupResult::Parameter(parameter) => {
                let ty = self.parameter_type(parameter);
                BoundExpression::new(BoundExpressionKind::Parameter(parameter), ty, node)
            }
            LookupResult::TemplateParameter(parameter) => match self.constant_template_parameter_type(parameter) {
                Some(ty) => BoundExpression::new(BoundExpressionKind::TemplateParameterValue(parameter), ty, node),
                None => BoundExpression::new(
                    BoundExpressionKind::Type,
                    TypeRef::new(TypeKind::TemplateParameter(parameter), false),
                    node,
                ),
            },
            LookupResult::Symbols(found) => self.bind_member_symbols(binder, None, &found, name, node),
            LookupResult::Empty => match PrimitiveType::from_name(name) {
                Some(primitive) => BoundExpression::new(BoundExpressionKind::Type, TypeRef::primitive(primitive), node),
                None => {
                    self.report(node, &messages::UNDEFINED_SYMBOL, &[name]);
                    BoundExpression::error(node)
                }
            },
        }
    }

    fn bind_local(&mut self, binder: &Binder, local: Arc<LocalSymbol>, node: NodeId) -> BoundExpression {
        if binder.local_in_progress().is_some_and(|in_progress| in_progress == local) {
            self.report(node, &messages::LOCAL_USED_IN_OWN_INITIALIZER, &[&local.name]);
            return BoundExpression::error(node);
        }
        let ty = local.ty().cloned().unwrap_or_else(TypeRef::error);
        let constant = if local.is_constant {
            local.constant().cloned()
        } else {
            None
        };
        BoundExpression::new(BoundExpressionKind::Local(local), ty, node).with_constant(constant)
    }

    fn parameter_type(&self, parameter: SymbolId) -> TypeRef {
        let symbols = self.symbols();
        let (Some(method), Some(data)) = (symbols.get(parameter).containing, symbols.as_parameter(parameter)) else {
            return TypeRef::error();
        };
        self.context
            .method_signature(method)
            .value
            .parameters
            .get(data.ordinal as usize)
            .cloned()
            .unwrap_or_else(TypeRef::error)
    }

    /// Bind symbols found by a member lookup. `receiver` is `None` for
    /// simple names and static access.
    fn bind_member_symbols(
        &mut self,
        binder: &Arc<Binder>,
        receiver: Option<Box<BoundExpression>>,
        found: &[SymbolId],
        name: &str,
        node: NodeId,
    ) -> BoundExpression {
        let symbols = self.symbols();
        let accessible: Vec<SymbolId> = found
            .iter()
            .copied()
            .filter(|&symbol| binder.is_symbol_accessible(symbol))
            .collect();
        let Some(&first) = accessible.first() else {
            self.report(node, &messages::MEMBER_INACCESSIBLE, &[name]);
            return BoundExpression::error(node);
        };
        match &symbols.get(first).kind {
            SymbolKind::Method(_) => {
                let methods = accessible
                    .into_iter()
                    .filter(|&symbol| symbols.get(symbol).is_method())
                    .collect();
                BoundExpression::new(
                    BoundExpressionKind::MethodGroup { receiver, methods },
                    TypeRef::void(),
                    node,
                )
            }
            SymbolKind::Field(data) => {
                let ty = self.field_type(binder, first);
                // Inferring a field type never needs constant values.
                let constant = if data.is_constant && binder.fields_being_bound().is_empty() {
                    self.constant_field_value(binder, first)
                } else {
                    None
                };
                BoundExpression::new(BoundExpressionKind::Field { receiver, field: first }, ty, node)
                    .with_constant(constant)
            }
            SymbolKind::NamedType(_) => BoundExpression::new(BoundExpressionKind::Type, TypeRef::named(first), node),
            _ => {
                self.report(node, &messages::UNDEFINED_SYMBOL, &[name]);
                BoundExpression::error(node)
            }
        }
    }

    fn bind_member_access(
        &mut self,
        binder: &Arc<Binder>,
        receiver: BoundExpression,
        name: &str,
        node: NodeId,
    ) -> BoundExpression {
        if receiver.is_error() {
            return BoundExpression::error(node);
        }
        let symbols = self.symbols();
        let found = receiver
            .ty
            .definition()
            .map(|container| symbols.lookup_member_in_hierarchy(container, name))
            .unwrap_or_default();
        if found.is_empty() {
            let ty = self.display(&receiver.ty);
            self.report(node, &messages::NO_SUCH_MEMBER, &[&ty, name]);
            return BoundExpression::error(node);
        }
        let receiver = match receiver.kind {
            BoundExpressionKind::Type => None,
            _ => Some(Box::new(receiver)),
        };
        self.bind_member_symbols(binder, receiver, found, name, node)
    }

    fn bind_conditional_access(
        &mut self,
        binder: &Arc<Binder>,
        receiver: NodeId,
        access: NodeId,
        node: NodeId,
        value_kind: BindValueKind,
    ) -> BoundExpression {
        let receiver = self.bind_value(binder, receiver);
        if receiver.is_error() {
            return BoundExpression::error(node);
        }
        let placeholder = BoundExpression::new(
            BoundExpressionKind::ConditionalReceiver,
            receiver.ty.as_non_nullable(),
            receiver.syntax,
        );
        let inner = Binder::with_conditional_receiver(binder, placeholder);
        let access = self.bind_expression(&inner, access, value_kind);
        if access.is_error() {
            return BoundExpression::error(node);
        }
        let ty = if access.ty.is_void() {
            access.ty.clone()
        } else {
            access.ty.as_nullable()
        };
        BoundExpression::new(
            BoundExpressionKind::ConditionalAccess {
                receiver: Box::new(receiver),
                access: Box::new(access),
            },
            ty,
            node,
        )
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn bind_call(&mut self, binder: &Arc<Binder>, callee: NodeId, arguments: &[NodeId], node: NodeId) -> BoundExpression {
        let callee_expression = self.bind_expression(binder, callee, BindValueKind::RVALUE_OR_METHOD_GROUP);
        let arguments = self.bind_arguments(binder, arguments);
        if callee_expression.is_error() {
            return BoundExpression::error(node);
        }
        match callee_expression.kind {
            BoundExpressionKind::MethodGroup { receiver, methods } => {
                self.bind_method_call(binder, receiver, &methods, &arguments, node)
            }
            BoundExpressionKind::LocalFunctionGroup(function) => {
                self.bind_local_function_call(binder, function, &arguments, node)
            }
            _ => {
                let text = self.tree().text_of(callee);
                self.report(callee, &messages::CANNOT_CALL_NON_METHOD, &[&text]);
                BoundExpression::error(node)
            }
        }
    }

    fn bind_arguments(&mut self, binder: &Arc<Binder>, arguments: &[NodeId]) -> Vec<PreboundArgument> {
        let tree = self.tree();
        arguments
            .iter()
            .map(|&argument| {
                let (name, expression) = match tree.kind(argument) {
                    SyntaxKind::Argument { name, expression } => (name.clone(), *expression),
                    _ => (None, argument),
                };
                PreboundArgument {
                    name,
                    expression: self.bind_value(binder, expression),
                    syntax: argument,
                }
            })
            .collect()
    }

    fn bind_method_call(
        &mut self,
        binder: &Binder,
        receiver: Option<Box<BoundExpression>>,
        methods: &[SymbolId],
        arguments: &[PreboundArgument],
        node: NodeId,
    ) -> BoundExpression {
        let symbols = self.symbols();
        let candidates: Vec<Candidate<SymbolId>> = methods
            .iter()
            .map(|&method| {
                let signature = self.context.method_signature(method);
                let parameters = symbols
                    .parameters(method)
                    .iter()
                    .zip(&signature.value.parameters)
                    .map(|(&parameter, ty)| CandidateParameter {
                        name: symbols.name(parameter).to_string(),
                        ty: ty.clone(),
                        default: self.candidate_default(parameter),
                    })
                    .collect();
                Candidate {
                    overload: method,
                    name: symbols.name(method).to_string(),
                    parameters,
                }
            })
            .collect();

        let resolution = OverloadResolution::new(symbols, self.tree());
        let result = resolution.resolve_method_invocation(&candidates, arguments, node, &mut self.diagnostics);
        let (Some(method), arguments) = result.into_parts() else {
            return BoundExpression::error(node);
        };
        if symbols.as_method(method).is_some_and(|data| data.is_low_level)
            && !binder.flags().contains(BinderFlags::UNSAFE_REGION)
        {
            self.report(node, &messages::LOW_LEVEL_REQUIRED, &[symbols.name(method)]);
        }
        let return_type = self.context.method_signature(method).value.return_type.clone();
        BoundExpression::new(
            BoundExpressionKind::Call {
                receiver,
                method,
                arguments,
            },
            return_type,
            node,
        )
    }

    /// The default of `parameter` as overload resolution sees it. A default
    /// that has not been published yet makes the parameter optional with an
    /// error placeholder.
    fn candidate_default(&self, parameter: SymbolId) -> Option<BoundExpression> {
        let syntax = self.symbols().as_parameter(parameter)?.default_value?;
        Some(
            self.context
                .published_default(parameter)
                .unwrap_or_else(|| BoundExpression::error(syntax)),
        )
    }

    fn bind_local_function_call(
        &mut self,
        binder: &Arc<Binder>,
        function: Arc<LocalFunctionSymbol>,
        arguments: &[PreboundArgument],
        node: NodeId,
    ) -> BoundExpression {
        let signature = match function.signature() {
            Some(signature) => signature.clone(),
            None => {
                // Called before its declaration was bound: resolve the
                // signature now. The declaration reports its own diagnostics.
                let scope = self.enclosing_binder(binder, function.declaration);
                let mut scratch = BindingPass::new(self.context);
                let signature = scratch.bind_local_function_signature(&scope, &function);
                function.set_signature(signature).clone()
            }
        };
        let defaults = function.defaults();
        let parameters = function
            .parameters
            .iter()
            .zip(&signature.parameters)
            .enumerate()
            .map(|(index, (parameter, ty))| CandidateParameter {
                name: parameter.name.clone(),
                ty: ty.clone(),
                default: defaults.and_then(|defaults| defaults.get(index).cloned().flatten()),
            })
            .collect();
        let candidate = Candidate {
            overload: function.clone(),
            name: function.name.clone(),
            parameters,
        };
        let resolution = OverloadResolution::new(self.symbols(), self.tree());
        let result = resolution.resolve_method_invocation(
            std::slice::from_ref(&candidate),
            arguments,
            node,
            &mut self.diagnostics,
        );
        let (Some(function), arguments) = result.into_parts() else {
            return BoundExpression::error(node);
        };
        BoundExpression::new(
            BoundExpressionKind::LocalFunctionCall { function, arguments },
            signature.return_type,
            node,
        )
    }

    pub(crate) fn bind_local_function_signature(
        &mut self,
        binder: &Arc<Binder>,
        function: &LocalFunctionSymbol,
    ) -> LocalFunctionSignature {
        let parameters = function
            .parameters
            .iter()
            .map(|parameter| match parameter.type_syntax {
                Some(syntax) => self.bind_variable_type(binder, syntax, &parameter.name),
                None => TypeRef::error(),
            })
            .collect();
        let return_type = match function.return_type_syntax {
            Some(syntax) => self.bind_type(binder, syntax),
            None => TypeRef::void(),
        };
        LocalFunctionSignature {
            parameters,
            return_type,
        }
    }

    /// The innermost mapped binder enclosing `node`.
    pub(crate) fn enclosing_binder(&self, binder: &Arc<Binder>, node: NodeId) -> Arc<Binder> {
        self.tree()
            .ancestors_and_self(node)
            .find_map(|ancestor| binder.get_binder(ancestor))
            .unwrap_or_else(|| binder.clone())
    }

    // ========================================================================
    // Assignment and operators
    // ========================================================================

    fn bind_assignment(
        &mut self,
        binder: &Arc<Binder>,
        operator: Option<BinaryOperator>,
        left: NodeId,
        right: NodeId,
        node: NodeId,
    ) -> BoundExpression {
        let value_kind = if operator.is_some() {
            BindValueKind::COMPOUND_ASSIGNMENT
        } else {
            BindValueKind::ASSIGNABLE
        };
        let left = self.bind_expression(binder, left, value_kind);
        let right_expression = self.bind_value(binder, right);
        if left.is_error() || right_expression.is_error() {
            return BoundExpression::error(node);
        }

        let right_expression = match operator {
            None => self.convert(right_expression, &left.ty, right),
            Some(operator) => {
                let Some(signature) = binary_signature(operator, &left.ty, &right_expression.ty) else {
                    let (left_type, right_type) = (self.display(&left.ty), self.display(&right_expression.ty));
                    self.report(
                        node,
                        &messages::INVALID_BINARY_OPERATOR_USE,
                        &[operator.text(), &left_type, &right_type],
                    );
                    return BoundExpression::error(node);
                };
                // The result is stored back into the left side.
                let cast = Conversions::new(self.symbols()).classify(&signature.result, &left.ty);
                if !cast.is_implicit() {
                    let message = if cast.exists() {
                        &messages::CANNOT_CONVERT_IMPLICITLY
                    } else {
                        &messages::CANNOT_CONVERT
                    };
                    let (result_type, left_type) = (self.display(&signature.result), self.display(&left.ty));
                    self.report(node, message, &[&result_type, &left_type]);
                    return BoundExpression::error(node);
                }
                self.convert(right_expression, &signature.right, right)
            }
        };
        if right_expression.is_error() {
            return BoundExpression::error(node);
        }
        let ty = left.ty.clone();
        BoundExpression::new(
            BoundExpressionKind::Assignment {
                operator,
                left: Box::new(left),
                right: Box::new(right_expression),
            },
            ty,
            node,
        )
    }

    fn bind_binary(
        &mut self,
        binder: &Arc<Binder>,
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
        node: NodeId,
    ) -> BoundExpression {
        let left_expression = self.bind_value(binder, left);
        let right_expression = self.bind_value(binder, right);
        if left_expression.is_error() || right_expression.is_error() {
            return BoundExpression::error(node);
        }
        let Some(signature) = binary_signature(operator, &left_expression.ty, &right_expression.ty) else {
            let (left_type, right_type) = (self.display(&left_expression.ty), self.display(&right_expression.ty));
            self.report(
                node,
                &messages::INVALID_BINARY_OPERATOR_USE,
                &[operator.text(), &left_type, &right_type],
            );
            return BoundExpression::error(node);
        };
        let left_expression = self.convert(left_expression, &signature.left, left);
        let right_expression = self.convert(right_expression, &signature.right, right);

        let is_null_comparison = is_relational(operator)
            && (BoundConstant::is_null(left_expression.constant.as_ref())
                || BoundConstant::is_null(right_expression.constant.as_ref()));
        let (ty, constant) = if is_null_comparison {
            self.report(node, &messages::ALWAYS_VALUE, &["null"]);
            (signature.result.as_nullable(), Some(BoundConstant::null()))
        } else {
            let constant = match (&left_expression.constant, &right_expression.constant) {
                (Some(left), Some(right)) => fold_binary(operator, left, right),
                _ => None,
            };
            (signature.result, constant)
        };
        BoundExpression::new(
            BoundExpressionKind::Binary {
                operator,
                left: Box::new(left_expression),
                right: Box::new(right_expression),
            },
            ty,
            node,
        )
        .with_constant(constant)
    }

    fn bind_unary(
        &mut self,
        binder: &Arc<Binder>,
        operator: UnaryOperator,
        operand: NodeId,
        node: NodeId,
    ) -> BoundExpression {
        let value_kind = if operator.is_increment_or_decrement() {
            BindValueKind::INCREMENT_DECREMENT
        } else {
            BindValueKind::RVALUE
        };
        let operand = self.bind_expression(binder, operand, value_kind);
        if operand.is_error() {
            return BoundExpression::error(node);
        }
        let valid = match operator {
            UnaryOperator::LogicalNot => operand.ty.is_primitive(PrimitiveType::Bool),
            UnaryOperator::Negate
            | UnaryOperator::Plus
            | UnaryOperator::PrefixIncrement
            | UnaryOperator::PrefixDecrement => operand.ty.is_numeric(),
        };
        if !valid {
            let ty = self.display(&operand.ty);
            self.report(node, &messages::INVALID_UNARY_OPERATOR_USE, &[operator.text(), &ty]);
            return BoundExpression::error(node);
        }
        let constant = operand
            .constant
            .as_ref()
            .and_then(|constant| fold_unary(operator, constant));
        let ty = operand.ty.clone();
        BoundExpression::new(
            BoundExpressionKind::Unary {
                operator,
                operand: Box::new(operand),
            },
            ty,
            node,
        )
        .with_constant(constant)
    }
}

fn bind_literal(value: &LiteralValue, node: NodeId) -> BoundExpression {
    let constant = match value {
        LiteralValue::Null => {
            return BoundExpression::new(BoundExpressionKind::Literal, TypeRef::null(), node)
                .with_constant(Some(BoundConstant::null()));
        }
        LiteralValue::Bool(value) => ConstantValue::Bool(*value),
        LiteralValue::Int(value) => ConstantValue::Int(*value),
        LiteralValue::Decimal(value) => ConstantValue::Decimal(*value),
        LiteralValue::Char(value) => ConstantValue::Char(*value),
        LiteralValue::String(value) => ConstantValue::String(value.as_str().into()),
    };
    let ty = TypeRef::primitive(constant.primitive_type());
    BoundExpression::new(BoundExpressionKind::Literal, ty, node).with_constant(Some(BoundConstant::new(constant)))
}

fn is_relational(operator: BinaryOperator) -> bool {
    matches!(
        operator,
        BinaryOperator::Less | BinaryOperator::LessEqual | BinaryOperator::Greater | BinaryOperator::GreaterEqual
    )
}

/// The operand and result types of `left operator right`, or `None` when
/// the operator is not defined for those types. Nullable operands lift the
/// result of arithmetic.
pub(crate) fn binary_signature(operator: BinaryOperator, left: &TypeRef, right: &TypeRef) -> Option<BinarySignature> {
    let bool_type = TypeRef::primitive(PrimitiveType::Bool);
    if matches!(operator, BinaryOperator::Equal | BinaryOperator::NotEqual) {
        let operand = match (left.is_null(), right.is_null()) {
            (true, true) => TypeRef::null(),
            (true, false) if right.nullable => right.clone(),
            (false, true) if left.nullable => left.clone(),
            (false, false) if left.same_kind(right) => left.with_nullability(left.nullable || right.nullable),
            (false, false) if left.is_numeric() && right.is_numeric() => {
                TypeRef::primitive(PrimitiveType::Decimal).with_nullability(left.nullable || right.nullable)
            }
            _ => return None,
        };
        return Some(BinarySignature {
            left: operand.clone(),
            right: operand,
            result: bool_type,
        });
    }

    let (left_primitive, right_primitive) = (left.as_primitive()?, right.as_primitive()?);
    let lifted = left.nullable || right.nullable;
    let numeric = || {
        if !(left_primitive.is_numeric() && right_primitive.is_numeric()) {
            return None;
        }
        let primitive = if left_primitive == PrimitiveType::Int && right_primitive == PrimitiveType::Int {
            PrimitiveType::Int
        } else {
            PrimitiveType::Decimal
        };
        Some(TypeRef::primitive(primitive).with_nullability(lifted))
    };

    match operator {
        BinaryOperator::Add if left_primitive == PrimitiveType::String || right_primitive == PrimitiveType::String => {
            let concatenable = |primitive: PrimitiveType| {
                !matches!(primitive, PrimitiveType::Any | PrimitiveType::Type | PrimitiveType::Void)
            };
            if !(concatenable(left_primitive) && concatenable(right_primitive)) {
                return None;
            }
            Some(BinarySignature {
                left: left.clone(),
                right: right.clone(),
                result: TypeRef::primitive(PrimitiveType::String).with_nullability(lifted),
            })
        }
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => {
            let operand = numeric()?;
            Some(BinarySignature {
                left: operand.clone(),
                right: operand.clone(),
                result: operand,
            })
        }
        BinaryOperator::Less | BinaryOperator::LessEqual | BinaryOperator::Greater | BinaryOperator::GreaterEqual => {
            let operand = numeric()?;
            Some(BinarySignature {
                left: operand.clone(),
                right: operand,
                result: bool_type,
            })
        }
        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => {
            if left_primitive != PrimitiveType::Bool || right_primitive != PrimitiveType::Bool {
                return None;
            }
            let operand = bool_type.with_nullability(lifted);
            Some(BinarySignature {
                left: operand.clone(),
                right: operand.clone(),
                result: operand,
            })
        }
        BinaryOperator::Equal | BinaryOperator::NotEqual => None,
    }
}

/// Fold `left operator right` for constant operands. Overflow and division
/// by zero are left to run time.
pub(crate) fn fold_binary(operator: BinaryOperator, left: &BoundConstant, right: &BoundConstant) -> Option<BoundConstant> {
    use BinaryOperator::*;
    use ConstantValue::{Bool, Decimal, Int, String as Text};

    let (Some(l), Some(r)) = (&left.value, &right.value) else {
        return match operator {
            Equal => Some(BoundConstant::new(Bool(left == right))),
            NotEqual => Some(BoundConstant::new(Bool(left != right))),
            _ => None,
        };
    };
    let value = match (operator, l, r) {
        (Add, Text(_), _) | (Add, _, Text(_)) => Text(format!("{}{}", l, r).into()),
        (Add, Int(a), Int(b)) => Int(a.checked_add(*b)?),
        (Subtract, Int(a), Int(b)) => Int(a.checked_sub(*b)?),
        (Multiply, Int(a), Int(b)) => Int(a.checked_mul(*b)?),
        (Divide, Int(a), Int(b)) => Int(a.checked_div(*b)?),
        (Modulo, Int(a), Int(b)) => Int(a.checked_rem(*b)?),
        (Add, Decimal(a), Decimal(b)) => Decimal(a + b),
        (Subtract, Decimal(a), Decimal(b)) => Decimal(a - b),
        (Multiply, Decimal(a), Decimal(b)) => Decimal(a * b),
        (Divide | Modulo, Decimal(_), Decimal(b)) if *b == 0.0 => return None,
        (Divide, Decimal(a), Decimal(b)) => Decimal(a / b),
        (Modulo, Decimal(a), Decimal(b)) => Decimal(a % b),
        (Less, Int(a), Int(b)) => Bool(a < b),
        (LessEqual, Int(a), Int(b)) => Bool(a <= b),
        (Greater, Int(a), Int(b)) => Bool(a > b),
        (GreaterEqual, Int(a), Int(b)) => Bool(a >= b),
        (Less, Decimal(a), Decimal(b)) => Bool(a < b),
        (LessEqual, Decimal(a), Decimal(b)) => Bool(a <= b),
        (Greater, Decimal(a), Decimal(b)) => Bool(a > b),
        (GreaterEqual, Decimal(a), Decimal(b)) => Bool(a >= b),
        (LogicalAnd, Bool(a), Bool(b)) => Bool(*a && *b),
        (LogicalOr, Bool(a), Bool(b)) => Bool(*a || *b),
        (Equal, a, b) => Bool(a == b),
        (NotEqual, a, b) => Bool(a != b),
        _ => return None,
    };
    Some(BoundConstant::new(value))
}

pub(crate) fn fold_unary(operator: UnaryOperator, operand: &BoundConstant) -> Option<BoundConstant> {
    let value = operand.value.as_ref()?;
    let folded = match (operator, value) {
        (UnaryOperator::Negate, ConstantValue::Int(v)) => ConstantValue::Int(v.checked_neg()?),
        (UnaryOperator::Negate, ConstantValue::Decimal(v)) => ConstantValue::Decimal(-v),
        (UnaryOperator::Plus, ConstantValue::Int(_) | ConstantValue::Decimal(_)) => value.clone(),
        (UnaryOperator::LogicalNot, ConstantValue::Bool(v)) => ConstantValue::Bool(!v),
        _ => return None,
    };
    Some(BoundConstant::new(folded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeRef {
        TypeRef::primitive(PrimitiveType::Int)
    }

    fn decimal() -> TypeRef {
        TypeRef::primitive(PrimitiveType::Decimal)
    }

    fn constant(value: ConstantValue) -> BoundConstant {
        BoundConstant::new(value)
    }

    #[test]
    fn test_mixed_arithmetic_widens_to_decimal() {
        let signature = binary_signature(BinaryOperator::Add, &int(), &decimal()).unwrap();
        assert_eq!(signature.left, decimal());
        assert_eq!(signature.result, decimal());
        let signature = binary_signature(BinaryOperator::Multiply, &int(), &int()).unwrap();
        assert_eq!(signature.result, int());
    }

    #[test]
    fn test_nullable_operand_lifts_arithmetic() {
        let signature = binary_signature(BinaryOperator::Subtract, &int().as_nullable(), &int()).unwrap();
        assert_eq!(signature.result, int().as_nullable());
        let signature = binary_signature(BinaryOperator::Less, &int().as_nullable(), &int()).unwrap();
        assert_eq!(signature.result, TypeRef::primitive(PrimitiveType::Bool));
    }

    #[test]
    fn test_string_concatenation() {
        let string = TypeRef::primitive(PrimitiveType::String);
        let signature = binary_signature(BinaryOperator::Add, &string, &int()).unwrap();
        assert_eq!(signature.right, int());
        assert_eq!(signature.result, string);
        assert!(binary_signature(BinaryOperator::Subtract, &string, &int()).is_none());
    }

    #[test]
    fn test_invalid_operands() {
        let boolean = TypeRef::primitive(PrimitiveType::Bool);
        assert!(binary_signature(BinaryOperator::Add, &boolean, &int()).is_none());
        assert!(binary_signature(BinaryOperator::LogicalAnd, &int(), &int()).is_none());
        assert!(binary_signature(BinaryOperator::Equal, &TypeRef::null(), &int()).is_none());
        assert!(binary_signature(BinaryOperator::Equal, &TypeRef::null(), &int().as_nullable()).is_some());
    }

    #[test]
    fn test_fold_integer_arithmetic() {
        let (six, four) = (constant(ConstantValue::Int(6)), constant(ConstantValue::Int(4)));
        assert_eq!(
            fold_binary(BinaryOperator::Subtract, &six, &four),
            Some(constant(ConstantValue::Int(2)))
        );
        assert_eq!(
            fold_binary(BinaryOperator::Greater, &six, &four),
            Some(constant(ConstantValue::Bool(true)))
        );
    }

    #[test]
    fn test_no_fold_on_overflow_or_division_by_zero() {
        let max = constant(ConstantValue::Int(i64::MAX));
        let one = constant(ConstantValue::Int(1));
        let zero = constant(ConstantValue::Int(0));
        assert_eq!(fold_binary(BinaryOperator::Add, &max, &one), None);
        assert_eq!(fold_binary(BinaryOperator::Divide, &one, &zero), None);
        let zero = constant(ConstantValue::Decimal(0.0));
        assert_eq!(
            fold_binary(BinaryOperator::Divide, &constant(ConstantValue::Decimal(1.0)), &zero),
            None
        );
    }

    #[test]
    fn test_fold_concatenation_and_null_equality() {
        let a = constant(ConstantValue::String("a".into()));
        let one = constant(ConstantValue::Int(1));
        assert_eq!(
            fold_binary(BinaryOperator::Add, &a, &one),
            Some(constant(ConstantValue::String("a1".into())))
        );
        let null = BoundConstant::null();
        assert_eq!(
            fold_binary(BinaryOperator::Equal, &null, &null),
            Some(constant(ConstantValue::Bool(true)))
        );
        assert_eq!(
            fold_binary(BinaryOperator::NotEqual, &null, &one),
            Some(constant(ConstantValue::Bool(true)))
        );
    }

    #[test]
    fn test_fold_unary() {
        assert_eq!(
            fold_unary(UnaryOperator::Negate, &constant(ConstantValue::Int(3))),
            Some(constant(ConstantValue::Int(-3)))
        );
        assert_eq!(
            fold_unary(UnaryOperator::Negate, &constant(ConstantValue::Int(i64::MIN))),
            None
        );
        assert_eq!(
            fold_unary(UnaryOperator::LogicalNot, &constant(ConstantValue::Bool(true))),
            Some(constant(ConstantValue::Bool(false)))
        );
        assert_eq!(fold_unary(UnaryOperator::Negate, &BoundConstant::null()), None);
    }
}
