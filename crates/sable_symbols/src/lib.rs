//! sable_symbols: The symbol table consumed by the binder.
//!
//! Top-level symbols (types, methods, fields, parameters and template
//! parameters) are created once by `declare_symbols` and never mutated by
//! binding. Symbol identity is the `SymbolId`; two symbols with the same
//! name are still different symbols.

pub mod access;
pub mod declare;
pub mod symbol;
pub mod table;
pub mod types;

pub use access::is_symbol_accessible;
pub use declare::declare_symbols;
pub use symbol::{
    Accessibility, FieldData, MethodData, NamedTypeData, ParameterData, Symbol, SymbolId, SymbolKind,
    TemplateParameterData,
};
pub use table::SymbolTable;
pub use types::{ConstantValue, PrimitiveType, TemplateArgument, TypeKind, TypeRef};
