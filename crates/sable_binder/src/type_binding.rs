//! Type syntax and template arguments.

use crate::binder::{Binder, LookupResult};
use crate::bound::BoundExpression;
use crate::constant::BoundTypeOrConstant;
use crate::context::{BindingContext, Evaluated};
use crate::flags::BindValueKind;
use crate::pass::BindingPass;
use sable_diagnostics::messages;
use sable_symbols::{PrimitiveType, SymbolId, TemplateArgument, TypeKind, TypeRef};
use sable_syntax::{NodeId, SyntaxKind};
use std::sync::Arc;

impl BindingPass<'_> {
    /// Bind type syntax. Reports and returns the error type when the
    /// syntax does not name a type visible from `binder`.
    pub fn bind_type(&mut self, binder: &Arc<Binder>, node: NodeId) -> TypeRef {
        let tree = self.tree();
        match tree.kind(node) {
            SyntaxKind::NullableType { element } => {
                let element = self.bind_type(binder, *element);
                if element.is_error() || element.is_void() {
                    return element;
                }
                element.as_nullable()
            }
            SyntaxKind::TypeName {
                name,
                template_arguments,
                is_unbound,
            } => self.bind_type_name(binder, name, template_arguments, *is_unbound, node),
            _ => {
                let text = tree.text_of(node);
                self.report(node, &messages::UNKNOWN_TYPE, &[&text]);
                TypeRef::error()
            }
        }
    }

    fn bind_type_name(
        &mut self,
        binder: &Arc<Binder>,
        name: &str,
        template_arguments: &[NodeId],
        is_unbound: bool,
        node: NodeId,
    ) -> TypeRef {
        let symbols = self.symbols();
        if template_arguments.is_empty() && !is_unbound {
            if let Some(primitive) = PrimitiveType::from_name(name) {
                return TypeRef::primitive(primitive);
            }
            if let Some(parameter) = binder.lookup_template_parameter(name) {
                return TypeRef::new(TypeKind::TemplateParameter(parameter), false);
            }
        }

        let definition = match binder.lookup_symbols(name, node) {
            LookupResult::Symbols(found) => found.into_iter().find(|&symbol| symbols.get(symbol).is_type()),
            _ => None,
        };
        let Some(definition) = definition else {
            self.report(node, &messages::UNKNOWN_TYPE, &[name]);
            return TypeRef::error();
        };
        if !binder.is_symbol_accessible(definition) {
            self.report(node, &messages::MEMBER_INACCESSIBLE, &[name]);
            return TypeRef::error();
        }

        let parameters = symbols.template_parameters(definition);
        if is_unbound {
            if !binder.is_unbound_type_allowed() {
                self.report(node, &messages::UNBOUND_TEMPLATE_NOT_ALLOWED, &[name]);
                return TypeRef::error();
            }
            return TypeRef::named(definition);
        }
        if template_arguments.len() != parameters.len() {
            let (expected, got) = (parameters.len().to_string(), template_arguments.len().to_string());
            self.report(
                node,
                &messages::INCORRECT_TEMPLATE_ARGUMENT_COUNT,
                &[name, &expected, &got],
            );
            return TypeRef::error();
        }
        if parameters.is_empty() {
            return TypeRef::named(definition);
        }

        let mut arguments = Vec::with_capacity(parameters.len());
        for (&parameter, &argument) in parameters.iter().zip(template_arguments) {
            let bound = self.bind_template_argument(binder, parameter, argument);
            if bound.ty().is_error() {
                return TypeRef::error();
            }
            arguments.push(bound.to_template_argument());
        }
        TypeRef::new(
            TypeKind::Constructed {
                definition,
                arguments: arguments.into_iter().collect::<Arc<[TemplateArgument]>>(),
            },
            false,
        )
    }

    /// Bind `argument` for the template parameter `parameter`: a type, or a
    /// compile-time constant when the parameter is a constant parameter.
    pub fn bind_template_argument(
        &mut self,
        binder: &Arc<Binder>,
        parameter: SymbolId,
        argument: NodeId,
    ) -> BoundTypeOrConstant {
        let Some(ty) = self.constant_template_parameter_type(parameter) else {
            return BoundTypeOrConstant::Type(self.bind_type(binder, argument));
        };
        let value = self.bind_template_constant(binder, parameter, argument);
        let value = self.convert(value, &ty, argument);
        match value.constant {
            Some(constant) => BoundTypeOrConstant::Constant {
                constant,
                ty,
                syntax: argument,
            },
            None => {
                if !value.is_error() {
                    let name = self.symbols().name(parameter);
                    self.report(argument, &messages::TEMPLATE_MUST_BE_CONSTANT, &[name]);
                }
                BoundTypeOrConstant::Type(TypeRef::error())
            }
        }
    }

    /// Constant arguments arrive as type syntax when they are plain names.
    fn bind_template_constant(&mut self, binder: &Arc<Binder>, parameter: SymbolId, argument: NodeId) -> BoundExpression {
        let tree = self.tree();
        match tree.kind(argument) {
            SyntaxKind::TypeName {
                name,
                template_arguments,
                is_unbound: false,
            } if template_arguments.is_empty() => {
                let expression = self.bind_name(binder, name, argument);
                self.check_value_kind(expression, BindValueKind::RVALUE)
            }
            kind if kind.is_type_syntax() => {
                let name = self.symbols().name(parameter);
                self.report(argument, &messages::TEMPLATE_MUST_BE_CONSTANT, &[name]);
                BoundExpression::error(argument)
            }
            _ => self.bind_value(binder, argument),
        }
    }

    /// The value type of a constant template parameter, or `None` for a
    /// type parameter.
    pub(crate) fn constant_template_parameter_type(&self, parameter: SymbolId) -> Option<TypeRef> {
        let symbols = self.symbols();
        let syntax = symbols.as_template_parameter(parameter)?.constant_type?;
        let owner = symbols.get(parameter).containing?;
        let binder = self.context.factory().container_binder(owner);
        // Problems with the parameter's own type are reported by
        // `BindingContext::bind_template_parameters`.
        let mut scratch = BindingPass::new(self.context);
        Some(scratch.bind_type(&binder, syntax))
    }
}

impl BindingContext {
    /// Bind the value types of the constant template parameters of `ty`,
    /// reporting problems with them. Type parameters yield `None`.
    pub fn bind_template_parameters(&self, ty: SymbolId) -> Evaluated<Vec<Option<TypeRef>>> {
        let symbols = self.symbols();
        let binder = self.factory().container_binder(ty);
        let mut pass = BindingPass::new(self);
        let types = symbols
            .template_parameters(ty)
            .iter()
            .map(|&parameter| {
                let syntax = symbols.as_template_parameter(parameter)?.constant_type?;
                let name = symbols.name(parameter);
                Some(pass.bind_variable_type(&binder, syntax, name))
            })
            .collect();
        Evaluated::new(types, pass.into_diagnostics())
    }
}
