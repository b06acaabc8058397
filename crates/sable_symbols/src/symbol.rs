//! Symbol definitions.

use sable_core::intern::Name;
use sable_syntax::{ModifierFlags, NodeId};
use std::fmt;

/// Symbol ID for referencing symbols by index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const INVALID: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

impl Accessibility {
    /// Members without an accessibility modifier are public.
    pub fn from_modifiers(modifiers: ModifierFlags) -> Self {
        if modifiers.contains(ModifierFlags::PRIVATE) {
            Accessibility::Private
        } else if modifiers.contains(ModifierFlags::PROTECTED) {
            Accessibility::Protected
        } else {
            Accessibility::Public
        }
    }
}

/// A named entity declared in source or supplied by a library.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: Name,
    pub name_text: String,
    pub kind: SymbolKind,
    pub accessibility: Accessibility,
    /// The type, method or global container this symbol is declared in.
    pub containing: Option<SymbolId>,
    /// The declaring node. Library types have none.
    pub declaration: Option<NodeId>,
}

impl Symbol {
    pub fn is_type(&self) -> bool {
        matches!(self.kind, SymbolKind::NamedType(_))
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, SymbolKind::Method(_))
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, SymbolKind::Field(_))
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            SymbolKind::Global { .. } => "namespace",
            SymbolKind::NamedType(_) => "type",
            SymbolKind::Method(_) => "method",
            SymbolKind::Field(_) => "field",
            SymbolKind::Parameter(_) => "parameter",
            SymbolKind::TemplateParameter(_) => "template parameter",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// The unnamed container of every top-level declaration.
    Global { members: Vec<SymbolId> },
    NamedType(NamedTypeData),
    Method(MethodData),
    Field(FieldData),
    Parameter(ParameterData),
    TemplateParameter(TemplateParameterData),
}

#[derive(Debug, Clone, Default)]
pub struct NamedTypeData {
    pub template_parameters: Vec<SymbolId>,
    pub base_syntax: Option<NodeId>,
    pub base: Option<SymbolId>,
    pub members: Vec<SymbolId>,
    pub is_library: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MethodData {
    pub parameters: Vec<SymbolId>,
    /// `None` means `void`.
    pub return_type: Option<NodeId>,
    /// `None` for the synthesized entry point, whose body is the global
    /// statements of the compilation unit.
    pub body: Option<NodeId>,
    pub is_static: bool,
    pub is_low_level: bool,
    pub is_synthesized_entry: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FieldData {
    /// `None` means the type is inferred from the initializer.
    pub type_syntax: Option<NodeId>,
    pub initializer: Option<NodeId>,
    pub is_constant: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct ParameterData {
    pub type_syntax: NodeId,
    pub default_value: Option<NodeId>,
    pub ordinal: u32,
}

#[derive(Debug, Clone)]
pub struct TemplateParameterData {
    /// Set for constant template parameters.
    pub constant_type: Option<NodeId>,
    pub ordinal: u32,
}
