//! The bound tree.

use crate::cast::CastKind;
use crate::constant::BoundConstant;
use crate::locals::{LabelSymbol, LocalFunctionSymbol, LocalSymbol};
use sable_symbols::{SymbolId, TypeRef};
use sable_syntax::{BinaryOperator, NodeId, UnaryOperator};
use std::sync::Arc;

/// A bound expression: what it is, its type and its constant value.
#[derive(Debug, Clone)]
pub struct BoundExpression {
    pub kind: BoundExpressionKind,
    pub ty: TypeRef,
    pub constant: Option<BoundConstant>,
    pub syntax: NodeId,
}

#[derive(Debug, Clone)]
pub enum BoundExpressionKind {
    Literal,
    Local(Arc<LocalSymbol>),
    Parameter(SymbolId),
    Field {
        receiver: Option<Box<BoundExpression>>,
        field: SymbolId,
    },
    MethodGroup {
        receiver: Option<Box<BoundExpression>>,
        methods: Vec<SymbolId>,
    },
    LocalFunctionGroup(Arc<LocalFunctionSymbol>),
    /// A type used as an expression, e.g. the receiver of a static access.
    Type,
    Call {
        receiver: Option<Box<BoundExpression>>,
        method: SymbolId,
        arguments: Vec<BoundExpression>,
    },
    LocalFunctionCall {
        function: Arc<LocalFunctionSymbol>,
        arguments: Vec<BoundExpression>,
    },
    Cast {
        operand: Box<BoundExpression>,
        cast: CastKind,
    },
    Assignment {
        /// Set for compound assignments.
        operator: Option<BinaryOperator>,
        left: Box<BoundExpression>,
        right: Box<BoundExpression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<BoundExpression>,
        right: Box<BoundExpression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<BoundExpression>,
    },
    /// `receiver?.access`; `access` refers to the receiver through a
    /// `ConditionalReceiver` placeholder.
    ConditionalAccess {
        receiver: Box<BoundExpression>,
        access: Box<BoundExpression>,
    },
    ConditionalReceiver,
    TypeOf(TypeRef),
    /// The value of a constant template parameter.
    TemplateParameterValue(SymbolId),
    Error,
}

impl BoundExpression {
    pub fn new(kind: BoundExpressionKind, ty: TypeRef, syntax: NodeId) -> Self {
        Self {
            kind,
            ty,
            constant: None,
            syntax,
        }
    }

    pub fn with_constant(mut self, constant: Option<BoundConstant>) -> Self {
        self.constant = constant;
        self
    }

    /// An expression that already produced a diagnostic.
    pub fn error(syntax: NodeId) -> Self {
        Self::new(BoundExpressionKind::Error, TypeRef::error(), syntax)
    }

    /// Wrap `operand` in a conversion to `target`. Identity conversions are
    /// not materialized. The operand's constant is carried over unchanged.
    pub fn cast(operand: BoundExpression, target: TypeRef, cast: CastKind) -> Self {
        if cast == CastKind::Identity && operand.ty == target {
            return operand;
        }
        let syntax = operand.syntax;
        let constant = operand.constant.clone();
        Self::new(
            BoundExpressionKind::Cast {
                operand: Box::new(operand),
                cast,
            },
            target,
            syntax,
        )
        .with_constant(constant)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, BoundExpressionKind::Error) || self.ty.is_error()
    }

    pub fn is_method_group(&self) -> bool {
        matches!(
            self.kind,
            BoundExpressionKind::MethodGroup { .. } | BoundExpressionKind::LocalFunctionGroup(_)
        )
    }
}

/// A block together with the locals its scope declares.
#[derive(Debug, Clone, Default)]
pub struct BoundBlock {
    pub statements: Vec<BoundStatement>,
    pub locals: Vec<Arc<LocalSymbol>>,
}

#[derive(Debug, Clone)]
pub enum BoundStatement {
    Block(BoundBlock),
    LocalDeclaration {
        local: Arc<LocalSymbol>,
        initializer: Option<BoundExpression>,
    },
    LocalFunction {
        function: Arc<LocalFunctionSymbol>,
        body: BoundBlock,
    },
    Expression(BoundExpression),
    If {
        condition: BoundExpression,
        then_statement: Box<BoundStatement>,
        else_statement: Option<Box<BoundStatement>>,
    },
    While {
        condition: BoundExpression,
        body: Box<BoundStatement>,
        break_label: Arc<LabelSymbol>,
        continue_label: Arc<LabelSymbol>,
    },
    Break(Arc<LabelSymbol>),
    Continue(Arc<LabelSymbol>),
    Return(Option<BoundExpression>),
    Try {
        body: Box<BoundStatement>,
        catch_body: Option<Box<BoundStatement>>,
        finally_body: Option<Box<BoundStatement>>,
    },
    Label {
        label: Arc<LabelSymbol>,
        statement: Box<BoundStatement>,
    },
    Goto(Arc<LabelSymbol>),
    /// A statement that could not be bound; a diagnostic was reported.
    Error(NodeId),
}
