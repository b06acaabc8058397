//! Programmatic tree construction.
//!
//! Nodes must be created in source order with children before their
//! parents, which is what a recursive-descent parser naturally produces:
//!
//! ```
//! use sable_syntax::SyntaxTreeBuilder;
//!
//! let mut b = SyntaxTreeBuilder::new("main.sb");
//! let one = b.int(1);
//! let x = b.local("x", None, Some(one));
//! let stmt = b.global_statement(x);
//! let tree = b.finish(vec![stmt]);
//! assert_eq!(tree.members().len(), 1);
//! ```

use crate::kinds::{BinaryOperator, LiteralValue, ModifierFlags, SyntaxKind, UnaryOperator};
use crate::tree::{NodeId, SyntaxTree, TreeDocument};

pub struct SyntaxTreeBuilder {
    file_name: String,
    nodes: Vec<SyntaxKind>,
}

impl SyntaxTreeBuilder {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: SyntaxKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    /// Append the compilation unit and link the tree.
    ///
    /// Panics if the nodes do not form a tree, which is a bug in the caller.
    pub fn finish(mut self, members: Vec<NodeId>) -> SyntaxTree {
        self.push(SyntaxKind::CompilationUnit { members });
        let document = TreeDocument {
            file_name: self.file_name,
            nodes: self.nodes,
        };
        match SyntaxTree::from_document(document) {
            Ok(tree) => tree,
            Err(err) => panic!("builder produced a malformed tree: {err}"),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.push(SyntaxKind::Literal { value })
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.literal(LiteralValue::Int(value))
    }

    pub fn decimal(&mut self, value: f64) -> NodeId {
        self.literal(LiteralValue::Decimal(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.literal(LiteralValue::String(value.to_string()))
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.literal(LiteralValue::Bool(value))
    }

    pub fn null(&mut self) -> NodeId {
        self.literal(LiteralValue::Null)
    }

    pub fn name(&mut self, name: &str) -> NodeId {
        self.push(SyntaxKind::Name { name: name.to_string() })
    }

    pub fn argument(&mut self, expression: NodeId) -> NodeId {
        self.push(SyntaxKind::Argument { name: None, expression })
    }

    pub fn named_argument(&mut self, name: &str, expression: NodeId) -> NodeId {
        self.push(SyntaxKind::Argument {
            name: Some(name.to_string()),
            expression,
        })
    }

    /// `callee(arguments)`; every argument must be an `Argument` node.
    pub fn call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.push(SyntaxKind::Call { callee, arguments })
    }

    pub fn member_access(&mut self, receiver: NodeId, name: &str) -> NodeId {
        self.push(SyntaxKind::MemberAccess {
            receiver,
            name: name.to_string(),
        })
    }

    pub fn member_binding(&mut self, name: &str) -> NodeId {
        self.push(SyntaxKind::MemberBinding { name: name.to_string() })
    }

    pub fn conditional_access(&mut self, receiver: NodeId, access: NodeId) -> NodeId {
        self.push(SyntaxKind::ConditionalAccess { receiver, access })
    }

    pub fn assign(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(SyntaxKind::Assignment { operator: None, left, right })
    }

    pub fn compound_assign(&mut self, operator: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.push(SyntaxKind::Assignment {
            operator: Some(operator),
            left,
            right,
        })
    }

    pub fn binary(&mut self, operator: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.push(SyntaxKind::Binary { operator, left, right })
    }

    pub fn unary(&mut self, operator: UnaryOperator, operand: NodeId) -> NodeId {
        self.push(SyntaxKind::Unary { operator, operand })
    }

    pub fn cast(&mut self, ty: NodeId, expression: NodeId) -> NodeId {
        self.push(SyntaxKind::Cast { ty, expression })
    }

    pub fn type_of(&mut self, ty: NodeId) -> NodeId {
        self.push(SyntaxKind::TypeOf { ty })
    }

    // ========================================================================
    // Types
    // ========================================================================

    pub fn type_name(&mut self, name: &str) -> NodeId {
        self.generic_type(name, Vec::new())
    }

    pub fn generic_type(&mut self, name: &str, template_arguments: Vec<NodeId>) -> NodeId {
        self.push(SyntaxKind::TypeName {
            name: name.to_string(),
            template_arguments,
            is_unbound: false,
        })
    }

    pub fn unbound_type(&mut self, name: &str) -> NodeId {
        self.push(SyntaxKind::TypeName {
            name: name.to_string(),
            template_arguments: Vec::new(),
            is_unbound: true,
        })
    }

    pub fn nullable(&mut self, element: NodeId) -> NodeId {
        self.push(SyntaxKind::NullableType { element })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn local(&mut self, name: &str, ty: Option<NodeId>, initializer: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::LocalDeclaration {
            name: name.to_string(),
            ty,
            is_constant: false,
            initializer,
        })
    }

    pub fn constant_local(&mut self, name: &str, ty: Option<NodeId>, initializer: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::LocalDeclaration {
            name: name.to_string(),
            ty,
            is_constant: true,
            initializer,
        })
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.push(SyntaxKind::ExpressionStatement { expression })
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.push(SyntaxKind::Block { statements })
    }

    pub fn if_statement(&mut self, condition: NodeId, then_statement: NodeId, else_statement: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::If {
            condition,
            then_statement,
            else_statement,
        })
    }

    pub fn while_statement(&mut self, condition: NodeId, body: NodeId) -> NodeId {
        self.push(SyntaxKind::While { condition, body })
    }

    pub fn break_statement(&mut self) -> NodeId {
        self.push(SyntaxKind::Break)
    }

    pub fn continue_statement(&mut self) -> NodeId {
        self.push(SyntaxKind::Continue)
    }

    pub fn return_statement(&mut self, expression: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::Return { expression })
    }

    pub fn try_statement(&mut self, body: NodeId, catch_body: Option<NodeId>, finally_body: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::Try {
            body,
            catch_body,
            finally_body,
        })
    }

    pub fn labeled(&mut self, label: &str, statement: NodeId) -> NodeId {
        self.push(SyntaxKind::Labeled {
            label: label.to_string(),
            statement,
        })
    }

    pub fn goto(&mut self, label: &str) -> NodeId {
        self.push(SyntaxKind::Goto { label: label.to_string() })
    }

    pub fn local_function(
        &mut self,
        name: &str,
        return_type: Option<NodeId>,
        parameters: Vec<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.push(SyntaxKind::LocalFunction {
            name: name.to_string(),
            return_type,
            parameters,
            body,
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub fn parameter(&mut self, name: &str, ty: NodeId, default_value: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::Parameter {
            name: name.to_string(),
            ty,
            default_value,
        })
    }

    pub fn method(&mut self, name: &str, return_type: Option<NodeId>, parameters: Vec<NodeId>, body: NodeId) -> NodeId {
        self.method_with(ModifierFlags::NONE, name, return_type, parameters, body)
    }

    pub fn method_with(
        &mut self,
        modifiers: ModifierFlags,
        name: &str,
        return_type: Option<NodeId>,
        parameters: Vec<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.push(SyntaxKind::MethodDeclaration {
            name: name.to_string(),
            modifiers,
            return_type,
            parameters,
            body,
        })
    }

    pub fn field(&mut self, name: &str, ty: Option<NodeId>, initializer: Option<NodeId>) -> NodeId {
        self.field_with(ModifierFlags::NONE, name, ty, initializer)
    }

    pub fn constant_field(&mut self, name: &str, ty: Option<NodeId>, initializer: Option<NodeId>) -> NodeId {
        self.field_with(ModifierFlags::CONST, name, ty, initializer)
    }

    pub fn field_with(
        &mut self,
        modifiers: ModifierFlags,
        name: &str,
        ty: Option<NodeId>,
        initializer: Option<NodeId>,
    ) -> NodeId {
        self.push(SyntaxKind::FieldDeclaration {
            name: name.to_string(),
            modifiers,
            ty,
            initializer,
        })
    }

    pub fn template_parameter(&mut self, name: &str, constant_type: Option<NodeId>) -> NodeId {
        self.push(SyntaxKind::TemplateParameter {
            name: name.to_string(),
            constant_type,
        })
    }

    pub fn class(
        &mut self,
        name: &str,
        template_parameters: Vec<NodeId>,
        base: Option<NodeId>,
        members: Vec<NodeId>,
    ) -> NodeId {
        self.push(SyntaxKind::ClassDeclaration {
            name: name.to_string(),
            modifiers: ModifierFlags::NONE,
            template_parameters,
            base,
            members,
        })
    }

    pub fn global_statement(&mut self, statement: NodeId) -> NodeId {
        self.push(SyntaxKind::GlobalStatement { statement })
    }
}
