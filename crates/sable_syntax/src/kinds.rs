//! Node kinds, modifiers, literals and operators.

use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags::bitflags! {
    /// Declaration modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ModifierFlags: u32 {
        const NONE      = 0;
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        const STATIC    = 1 << 3;
        const CONST     = 1 << 4;
        const LOW_LEVEL = 1 << 5;

        const ACCESSIBILITY = Self::PUBLIC.bits() | Self::PRIVATE.bits() | Self::PROTECTED.bits();
    }
}

/// A literal token value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Char(char),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOperator {
    pub fn text(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOperator {
    Negate,
    Plus,
    LogicalNot,
    PrefixIncrement,
    PrefixDecrement,
}

impl UnaryOperator {
    pub fn text(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::PrefixIncrement => "++",
            UnaryOperator::PrefixDecrement => "--",
        }
    }

    /// Whether the operator writes back to its operand.
    pub fn is_increment_or_decrement(self) -> bool {
        matches!(self, UnaryOperator::PrefixIncrement | UnaryOperator::PrefixDecrement)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// The kind of a syntax node together with its children.
///
/// Child references always point at nodes with a smaller `NodeId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyntaxKind {
    // ========================================================================
    // Declarations
    // ========================================================================
    CompilationUnit {
        members: Vec<NodeId>,
    },
    ClassDeclaration {
        name: String,
        #[serde(default)]
        modifiers: ModifierFlags,
        #[serde(default)]
        template_parameters: Vec<NodeId>,
        #[serde(default)]
        base: Option<NodeId>,
        members: Vec<NodeId>,
    },
    TemplateParameter {
        name: String,
        /// Set for constant template parameters, e.g. `int N`.
        #[serde(default)]
        constant_type: Option<NodeId>,
    },
    MethodDeclaration {
        name: String,
        #[serde(default)]
        modifiers: ModifierFlags,
        /// `None` means `void`.
        #[serde(default)]
        return_type: Option<NodeId>,
        parameters: Vec<NodeId>,
        body: NodeId,
    },
    Parameter {
        name: String,
        ty: NodeId,
        #[serde(default)]
        default_value: Option<NodeId>,
    },
    FieldDeclaration {
        name: String,
        #[serde(default)]
        modifiers: ModifierFlags,
        /// `None` means the type is inferred from the initializer.
        #[serde(default)]
        ty: Option<NodeId>,
        #[serde(default)]
        initializer: Option<NodeId>,
    },
    GlobalStatement {
        statement: NodeId,
    },

    // ========================================================================
    // Types
    // ========================================================================
    TypeName {
        name: String,
        #[serde(default)]
        template_arguments: Vec<NodeId>,
        /// `List<>`: a template named without its arguments.
        #[serde(default)]
        is_unbound: bool,
    },
    NullableType {
        element: NodeId,
    },

    // ========================================================================
    // Statements
    // ========================================================================
    Block {
        statements: Vec<NodeId>,
    },
    LocalDeclaration {
        name: String,
        #[serde(default)]
        ty: Option<NodeId>,
        #[serde(default)]
        is_constant: bool,
        #[serde(default)]
        initializer: Option<NodeId>,
    },
    LocalFunction {
        name: String,
        #[serde(default)]
        return_type: Option<NodeId>,
        parameters: Vec<NodeId>,
        body: NodeId,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    If {
        condition: NodeId,
        then_statement: NodeId,
        #[serde(default)]
        else_statement: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    Break,
    Continue,
    Return {
        #[serde(default)]
        expression: Option<NodeId>,
    },
    Try {
        body: NodeId,
        #[serde(default)]
        catch_body: Option<NodeId>,
        #[serde(default)]
        finally_body: Option<NodeId>,
    },
    Labeled {
        label: String,
        statement: NodeId,
    },
    Goto {
        label: String,
    },

    // ========================================================================
    // Expressions
    // ========================================================================
    Literal {
        value: LiteralValue,
    },
    Name {
        name: String,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    Argument {
        #[serde(default)]
        name: Option<String>,
        expression: NodeId,
    },
    MemberAccess {
        receiver: NodeId,
        name: String,
    },
    ConditionalAccess {
        receiver: NodeId,
        access: NodeId,
    },
    MemberBinding {
        name: String,
    },
    Assignment {
        /// Set for compound assignments such as `+=`.
        #[serde(default)]
        operator: Option<BinaryOperator>,
        left: NodeId,
        right: NodeId,
    },
    Binary {
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
    },
    Unary {
        operator: UnaryOperator,
        operand: NodeId,
    },
    Cast {
        ty: NodeId,
        expression: NodeId,
    },
    TypeOf {
        ty: NodeId,
    },
}

impl SyntaxKind {
    /// Child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        use SyntaxKind::*;
        match self {
            CompilationUnit { members } => members.clone(),
            ClassDeclaration { template_parameters, base, members, .. } => template_parameters
                .iter()
                .copied()
                .chain(*base)
                .chain(members.iter().copied())
                .collect(),
            TemplateParameter { constant_type, .. } => constant_type.iter().copied().collect(),
            MethodDeclaration { return_type, parameters, body, .. } => return_type
                .iter()
                .copied()
                .chain(parameters.iter().copied())
                .chain(std::iter::once(*body))
                .collect(),
            Parameter { ty, default_value, .. } => std::iter::once(*ty).chain(*default_value).collect(),
            FieldDeclaration { ty, initializer, .. } => ty.iter().copied().chain(*initializer).collect(),
            GlobalStatement { statement } => vec![*statement],
            TypeName { template_arguments, .. } => template_arguments.clone(),
            NullableType { element } => vec![*element],
            Block { statements } => statements.clone(),
            LocalDeclaration { ty, initializer, .. } => ty.iter().copied().chain(*initializer).collect(),
            LocalFunction { return_type, parameters, body, .. } => return_type
                .iter()
                .copied()
                .chain(parameters.iter().copied())
                .chain(std::iter::once(*body))
                .collect(),
            ExpressionStatement { expression } => vec![*expression],
            If { condition, then_statement, else_statement } => {
                vec![*condition, *then_statement].into_iter().chain(*else_statement).collect()
            }
            While { condition, body } => vec![*condition, *body],
            Break | Continue | Goto { .. } | Literal { .. } | Name { .. } | MemberBinding { .. } => Vec::new(),
            Return { expression } => expression.iter().copied().collect(),
            Try { body, catch_body, finally_body } => std::iter::once(*body)
                .chain(*catch_body)
                .chain(*finally_body)
                .collect(),
            Labeled { statement, .. } => vec![*statement],
            Call { callee, arguments } => std::iter::once(*callee).chain(arguments.iter().copied()).collect(),
            Argument { expression, .. } => vec![*expression],
            MemberAccess { receiver, .. } => vec![*receiver],
            ConditionalAccess { receiver, access } => vec![*receiver, *access],
            Assignment { left, right, .. } | Binary { left, right, .. } => vec![*left, *right],
            Unary { operand, .. } => vec![*operand],
            Cast { ty, expression } => vec![*ty, *expression],
            TypeOf { ty } => vec![*ty],
        }
    }

    /// The name this node declares, if it is a declaration.
    pub fn declared_name(&self) -> Option<&str> {
        use SyntaxKind::*;
        match self {
            ClassDeclaration { name, .. }
            | TemplateParameter { name, .. }
            | MethodDeclaration { name, .. }
            | Parameter { name, .. }
            | FieldDeclaration { name, .. }
            | LocalDeclaration { name, .. }
            | LocalFunction { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_type_syntax(&self) -> bool {
        matches!(self, SyntaxKind::TypeName { .. } | SyntaxKind::NullableType { .. })
    }

    pub fn is_statement(&self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            Block { .. }
                | LocalDeclaration { .. }
                | LocalFunction { .. }
                | ExpressionStatement { .. }
                | If { .. }
                | While { .. }
                | Break
                | Continue
                | Return { .. }
                | Try { .. }
                | Labeled { .. }
                | Goto { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        use SyntaxKind::*;
        matches!(
            self,
            Literal { .. }
                | Name { .. }
                | Call { .. }
                | MemberAccess { .. }
                | ConditionalAccess { .. }
                | MemberBinding { .. }
                | Assignment { .. }
                | Binary { .. }
                | Unary { .. }
                | Cast { .. }
                | TypeOf { .. }
        )
    }

    /// A short human readable name for the node kind, used in traces.
    pub fn label(&self) -> &'static str {
        use SyntaxKind::*;
        match self {
            CompilationUnit { .. } => "compilation unit",
            ClassDeclaration { .. } => "class declaration",
            TemplateParameter { .. } => "template parameter",
            MethodDeclaration { .. } => "method declaration",
            Parameter { .. } => "parameter",
            FieldDeclaration { .. } => "field declaration",
            GlobalStatement { .. } => "global statement",
            TypeName { .. } => "type name",
            NullableType { .. } => "nullable type",
            Block { .. } => "block",
            LocalDeclaration { .. } => "local declaration",
            LocalFunction { .. } => "local function",
            ExpressionStatement { .. } => "expression statement",
            If { .. } => "if statement",
            While { .. } => "while statement",
            Break => "break statement",
            Continue => "continue statement",
            Return { .. } => "return statement",
            Try { .. } => "try statement",
            Labeled { .. } => "labeled statement",
            Goto { .. } => "goto statement",
            Literal { .. } => "literal",
            Name { .. } => "name",
            Call { .. } => "call",
            Argument { .. } => "argument",
            MemberAccess { .. } => "member access",
            ConditionalAccess { .. } => "conditional access",
            MemberBinding { .. } => "member binding",
            Assignment { .. } => "assignment",
            Binary { .. } => "binary expression",
            Unary { .. } => "unary expression",
            Cast { .. } => "cast",
            TypeOf { .. } => "typeof",
        }
    }
}
