//! Type references and compile-time constant values.

use crate::symbol::{SymbolId, SymbolKind};
use crate::table::SymbolTable;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Built-in types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Any,
    String,
    Bool,
    Char,
    Int,
    Decimal,
    Type,
    Void,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Any,
        PrimitiveType::String,
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Decimal,
        PrimitiveType::Type,
        PrimitiveType::Void,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Any => "any",
            PrimitiveType::String => "string",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Decimal => "decimal",
            PrimitiveType::Type => "type",
            PrimitiveType::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        PrimitiveType::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, PrimitiveType::Int | PrimitiveType::Decimal)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value known at compile time. `null` is represented by the absence of a
/// `ConstantValue`, see `BoundConstant` in the binder.
#[derive(Debug, Clone)]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Char(char),
    String(Arc<str>),
}

impl ConstantValue {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            ConstantValue::Bool(_) => PrimitiveType::Bool,
            ConstantValue::Int(_) => PrimitiveType::Int,
            ConstantValue::Decimal(_) => PrimitiveType::Decimal,
            ConstantValue::Char(_) => PrimitiveType::Char,
            ConstantValue::String(_) => PrimitiveType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstantValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            ConstantValue::Int(value) => Some(*value as f64),
            ConstantValue::Decimal(value) => Some(*value),
            _ => None,
        }
    }
}

// Decimals compare by bit pattern so that constants can be hashed and used
// as template arguments.
impl PartialEq for ConstantValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConstantValue::Bool(a), ConstantValue::Bool(b)) => a == b,
            (ConstantValue::Int(a), ConstantValue::Int(b)) => a == b,
            (ConstantValue::Decimal(a), ConstantValue::Decimal(b)) => a.to_bits() == b.to_bits(),
            (ConstantValue::Char(a), ConstantValue::Char(b)) => a == b,
            (ConstantValue::String(a), ConstantValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConstantValue {}

impl Hash for ConstantValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConstantValue::Bool(value) => value.hash(state),
            ConstantValue::Int(value) => value.hash(state),
            ConstantValue::Decimal(value) => value.to_bits().hash(state),
            ConstantValue::Char(value) => value.hash(state),
            ConstantValue::String(value) => value.hash(state),
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Bool(value) => write!(f, "{}", value),
            ConstantValue::Int(value) => write!(f, "{}", value),
            ConstantValue::Decimal(value) => write!(f, "{}", value),
            ConstantValue::Char(value) => write!(f, "{}", value),
            ConstantValue::String(value) => write!(f, "{}", value),
        }
    }
}

/// An argument of a constructed template type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateArgument {
    Type(TypeRef),
    /// A constant argument; `None` is a `null` constant.
    Constant(Option<ConstantValue>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    Named(SymbolId),
    Constructed {
        definition: SymbolId,
        arguments: Arc<[TemplateArgument]>,
    },
    TemplateParameter(SymbolId),
    /// The type of the `null` literal.
    Null,
    /// Produced after an error has been reported; converts to and from
    /// everything so that one mistake does not cascade.
    Error,
}

/// A bound type: a type kind plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub kind: TypeKind,
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(kind: TypeKind, nullable: bool) -> Self {
        Self { kind, nullable }
    }

    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::new(TypeKind::Primitive(primitive), false)
    }

    pub fn named(symbol: SymbolId) -> Self {
        Self::new(TypeKind::Named(symbol), false)
    }

    pub fn null() -> Self {
        Self::new(TypeKind::Null, true)
    }

    pub fn error() -> Self {
        Self::new(TypeKind::Error, false)
    }

    pub fn void() -> Self {
        Self::primitive(PrimitiveType::Void)
    }

    pub fn with_nullability(&self, nullable: bool) -> Self {
        Self::new(self.kind.clone(), nullable)
    }

    pub fn as_nullable(&self) -> Self {
        self.with_nullability(true)
    }

    pub fn as_non_nullable(&self) -> Self {
        self.with_nullability(false)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, TypeKind::Null)
    }

    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Primitive(PrimitiveType::Void)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self.kind {
            TypeKind::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    pub fn is_primitive(&self, primitive: PrimitiveType) -> bool {
        self.as_primitive() == Some(primitive)
    }

    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(PrimitiveType::is_numeric)
    }

    /// The named type symbol behind a named or constructed type.
    pub fn definition(&self) -> Option<SymbolId> {
        match self.kind {
            TypeKind::Named(symbol) | TypeKind::Constructed { definition: symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    /// Whether two types are the same ignoring nullability.
    pub fn same_kind(&self, other: &TypeRef) -> bool {
        self.kind == other.kind
    }

    pub fn display(&self, table: &SymbolTable) -> String {
        let base = match &self.kind {
            TypeKind::Primitive(primitive) => primitive.name().to_string(),
            TypeKind::Named(symbol) | TypeKind::TemplateParameter(symbol) => table.name(*symbol).to_string(),
            TypeKind::Constructed { definition, arguments } => {
                let args: Vec<String> = arguments
                    .iter()
                    .map(|arg| match arg {
                        TemplateArgument::Type(ty) => ty.display(table),
                        TemplateArgument::Constant(Some(value)) => value.to_string(),
                        TemplateArgument::Constant(None) => "null".to_string(),
                    })
                    .collect();
                format!("{}<{}>", table.name(*definition), args.join(", "))
            }
            TypeKind::Null => return "null".to_string(),
            TypeKind::Error => return "?".to_string(),
        };
        if self.nullable {
            format!("{}?", base)
        } else {
            base
        }
    }

    /// Whether a value of this type is an instance of a named type symbol
    /// (as opposed to a primitive or template parameter).
    pub fn is_named_type(&self, table: &SymbolTable) -> bool {
        self.definition()
            .is_some_and(|symbol| matches!(table.get(symbol).kind, SymbolKind::NamedType(_)))
    }
}
