//! The symbol table.

use crate::symbol::{
    Accessibility, FieldData, MethodData, NamedTypeData, ParameterData, Symbol, SymbolId, SymbolKind,
    TemplateParameterData,
};
use sable_core::intern::{Name, NameTable};
use sable_syntax::NodeId;
use rustc_hash::FxHashMap;

/// Name of the method synthesized for global statements.
pub const SYNTHESIZED_ENTRY_NAME: &str = "<Main>";

/// Append-only arena of symbols with name-keyed member lookup.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    names: NameTable,
    symbols: Vec<Symbol>,
    global: SymbolId,
    members_by_name: FxHashMap<(SymbolId, Name), Vec<SymbolId>>,
    by_declaration: FxHashMap<NodeId, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let names = NameTable::new();
        let global = Symbol {
            id: SymbolId(0),
            name: names.intern("<global>"),
            name_text: "<global>".to_string(),
            kind: SymbolKind::Global { members: Vec::new() },
            accessibility: Accessibility::Public,
            containing: None,
            declaration: None,
        };
        Self {
            names,
            symbols: vec![global],
            global: SymbolId(0),
            members_by_name: FxHashMap::default(),
            by_declaration: FxHashMap::default(),
        }
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn global(&self) -> SymbolId {
        self.global
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.symbols[id.index()].name_text
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    /// Create a symbol. Types, methods and fields become members of
    /// `containing`; parameters and template parameters are attached by the
    /// caller.
    pub fn add(
        &mut self,
        name: &str,
        kind: SymbolKind,
        accessibility: Accessibility,
        containing: SymbolId,
        declaration: Option<NodeId>,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        let interned = self.names.intern(name);
        let is_member = matches!(
            kind,
            SymbolKind::NamedType(_) | SymbolKind::Method(_) | SymbolKind::Field(_)
        );
        self.symbols.push(Symbol {
            id,
            name: interned,
            name_text: name.to_string(),
            kind,
            accessibility,
            containing: Some(containing),
            declaration,
        });
        if let Some(node) = declaration {
            self.by_declaration.entry(node).or_insert(id);
        }
        if is_member {
            self.members_by_name.entry((containing, interned)).or_default().push(id);
            match &mut self.get_mut(containing).kind {
                SymbolKind::Global { members } => members.push(id),
                SymbolKind::NamedType(data) => data.members.push(id),
                _ => unreachable!("members can only be declared in types or the global container"),
            }
        }
        id
    }

    /// Register a type supplied by a referenced library.
    pub fn add_library_type(&mut self, name: &str) -> SymbolId {
        let data = NamedTypeData {
            is_library: true,
            ..NamedTypeData::default()
        };
        let global = self.global;
        self.add(name, SymbolKind::NamedType(data), Accessibility::Public, global, None)
    }

    /// Members of `container` (not its base types) named `name`, in
    /// declaration order.
    pub fn lookup_member(&self, container: SymbolId, name: &str) -> &[SymbolId] {
        self.names
            .get(name)
            .and_then(|name| self.members_by_name.get(&(container, name)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Members named `name` of `ty` or, failing that, of its nearest base
    /// type that declares the name.
    pub fn lookup_member_in_hierarchy(&self, ty: SymbolId, name: &str) -> &[SymbolId] {
        let mut current = Some(ty);
        while let Some(candidate) = current {
            let found = self.lookup_member(candidate, name);
            if !found.is_empty() {
                return found;
            }
            current = self.base_type(candidate);
        }
        &[]
    }

    pub fn members(&self, container: SymbolId) -> &[SymbolId] {
        match &self.get(container).kind {
            SymbolKind::Global { members } => members,
            SymbolKind::NamedType(data) => &data.members,
            _ => &[],
        }
    }

    pub fn symbol_declared_at(&self, node: NodeId) -> Option<SymbolId> {
        self.by_declaration.get(&node).copied()
    }

    /// The nearest enclosing named type of `id`, or `id` itself if it is one.
    pub fn containing_type(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = Some(id);
        while let Some(candidate) = current {
            let symbol = self.get(candidate);
            if symbol.is_type() {
                return Some(candidate);
            }
            current = symbol.containing;
        }
        None
    }

    pub fn base_type(&self, ty: SymbolId) -> Option<SymbolId> {
        self.as_named_type(ty).and_then(|data| data.base)
    }

    /// Whether `ty` is `ancestor` or derives from it.
    pub fn is_derived_from(&self, ty: SymbolId, ancestor: SymbolId) -> bool {
        let mut current = Some(ty);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.base_type(candidate);
        }
        false
    }

    pub fn entry_point_candidates(&self, name: &str) -> Vec<SymbolId> {
        self.lookup_member(self.global, name)
            .iter()
            .copied()
            .filter(|&id| self.get(id).is_method())
            .collect()
    }

    /// The method synthesized for global statements, if any.
    pub fn synthesized_entry(&self) -> Option<SymbolId> {
        self.lookup_member(self.global, SYNTHESIZED_ENTRY_NAME).first().copied()
    }

    // ========================================================================
    // Kind accessors
    // ========================================================================

    pub fn as_named_type(&self, id: SymbolId) -> Option<&NamedTypeData> {
        match &self.get(id).kind {
            SymbolKind::NamedType(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_method(&self, id: SymbolId) -> Option<&MethodData> {
        match &self.get(id).kind {
            SymbolKind::Method(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_field(&self, id: SymbolId) -> Option<&FieldData> {
        match &self.get(id).kind {
            SymbolKind::Field(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_parameter(&self, id: SymbolId) -> Option<&ParameterData> {
        match &self.get(id).kind {
            SymbolKind::Parameter(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_template_parameter(&self, id: SymbolId) -> Option<&TemplateParameterData> {
        match &self.get(id).kind {
            SymbolKind::TemplateParameter(data) => Some(data),
            _ => None,
        }
    }

    pub fn parameters(&self, method: SymbolId) -> &[SymbolId] {
        self.as_method(method).map(|data| data.parameters.as_slice()).unwrap_or(&[])
    }

    pub fn template_parameters(&self, ty: SymbolId) -> &[SymbolId] {
        self.as_named_type(ty)
            .map(|data| data.template_parameters.as_slice())
            .unwrap_or(&[])
    }

    /// Every constant field in declaration order.
    pub fn constant_fields(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols
            .iter()
            .filter(|symbol| matches!(&symbol.kind, SymbolKind::Field(data) if data.is_constant))
            .map(|symbol| symbol.id)
    }

    /// `Type.member`, or just `member` for globals.
    pub fn qualified_name(&self, id: SymbolId) -> String {
        let symbol = self.get(id);
        match symbol.containing {
            Some(container) if container != self.global && self.get(container).is_type() => {
                format!("{}.{}", self.qualified_name(container), symbol.name_text)
            }
            _ => symbol.name_text.clone(),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
