//! The binder factory: region chains cached per (node, usage).
//!
//! A region is the part of the tree one chain serves: a method signature,
//! a method body, a parameter default, a field initializer, a class body
//! or base list, the global statements. `get_binder` finds the region that
//! owns a node and then refines the answer through the region's binder map.

use crate::binder::{Binder, BinderKind, Member};
use crate::flags::{BinderFlags, NodeUsage};
use crate::module::SourceModule;
use dashmap::DashMap;
use sable_symbols::{SymbolId, SymbolKind};
use sable_syntax::{NodeId, SyntaxKind};
use std::sync::Arc;

/// A cache key. Usage tags are only meaningful for the kind of construct
/// `node` is, so equal nodes never see tags of two categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinderCacheKey {
    pub node: NodeId,
    pub usage: NodeUsage,
}

impl BinderCacheKey {
    pub fn new(node: NodeId, usage: NodeUsage) -> Self {
        Self { node, usage }
    }
}

pub struct BinderFactory {
    module: Arc<SourceModule>,
    end: Arc<Binder>,
    cache: DashMap<BinderCacheKey, Arc<Binder>>,
}

impl BinderFactory {
    /// A factory whose chains all end in a frame carrying `flags`.
    pub fn new(module: Arc<SourceModule>, flags: BinderFlags) -> Self {
        Self {
            end: Binder::end(module.clone(), flags),
            module,
            cache: DashMap::new(),
        }
    }

    pub fn module(&self) -> &Arc<SourceModule> {
        &self.module
    }

    /// Number of cached region chains.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cached_binder(&self, key: BinderCacheKey) -> Option<Arc<Binder>> {
        self.cache.get(&key).map(|entry| entry.value().clone())
    }

    /// Look up `key`, building and publishing on a miss. The first
    /// published chain wins; a racing builder's chain is dropped.
    fn cached(&self, key: BinderCacheKey, build: impl FnOnce() -> Arc<Binder>) -> Arc<Binder> {
        if let Some(entry) = self.cache.get(&key) {
            return entry.value().clone();
        }
        let binder = build();
        tracing::trace!(node = key.node.0, usage = key.usage.bits(), "cached region binder");
        self.cache.entry(key).or_insert(binder).value().clone()
    }

    fn declaration(&self, symbol: SymbolId) -> Option<NodeId> {
        self.module.symbols().get(symbol).declaration
    }

    // ========================================================================
    // Region chains
    // ========================================================================

    /// Member lookup in the global container.
    pub fn global_binder(&self) -> Arc<Binder> {
        let root = self.module.tree().root();
        self.cached(BinderCacheKey::new(root, NodeUsage::NORMAL), || {
            let global = self.module.symbols().global();
            Binder::push(&self.end, BinderKind::InContainer(global), BinderFlags::NONE)
        })
    }

    /// Lookup inside the body of `container`: its template parameters, its
    /// members and those of its bases, then the enclosing containers.
    pub fn container_binder(&self, container: SymbolId) -> Arc<Binder> {
        let symbols = self.module.symbols();
        if !symbols.get(container).is_type() {
            return self.global_binder();
        }
        let build = || {
            let outer = self.outer_binder(container);
            let members = Binder::push(&outer, BinderKind::InContainer(container), BinderFlags::NONE);
            Binder::push(&members, BinderKind::TemplateParameters(container), BinderFlags::NONE)
        };
        match self.declaration(container) {
            Some(declaration) => self.cached(
                BinderCacheKey::new(declaration, NodeUsage::NAMED_TYPE_BODY_OR_TEMPLATE_PARAMETERS),
                build,
            ),
            // Library types have no node to key on.
            None => build(),
        }
    }

    fn outer_binder(&self, symbol: SymbolId) -> Arc<Binder> {
        match self.module.symbols().get(symbol).containing {
            Some(outer) => self.container_binder(outer),
            None => self.global_binder(),
        }
    }

    /// The base list of `ty` sees its template parameters but not its
    /// members.
    pub fn base_binder(&self, ty: SymbolId) -> Arc<Binder> {
        let build = || {
            let outer = self.outer_binder(ty);
            Binder::push(&outer, BinderKind::TemplateParameters(ty), BinderFlags::NONE)
        };
        match self.declaration(ty) {
            Some(declaration) => self.cached(BinderCacheKey::new(declaration, NodeUsage::NAMED_TYPE_BASE), build),
            None => build(),
        }
    }

    /// Return and parameter types of `method`.
    pub fn method_signature_binder(&self, method: SymbolId) -> Arc<Binder> {
        let build = || {
            let outer = self.outer_binder(method);
            Binder::push(
                &outer,
                BinderKind::ContainingMember(Member::Symbol(method)),
                BinderFlags::NONE,
            )
        };
        match self.declaration(method) {
            Some(declaration) => self.cached(BinderCacheKey::new(declaration, NodeUsage::METHOD_SIGNATURE), build),
            None => build(),
        }
    }

    /// The body of `method`, or `None` when it has no body of its own.
    pub fn method_body_binder(&self, method: SymbolId) -> Option<Arc<Binder>> {
        let data = self.module.symbols().as_method(method)?;
        if data.is_synthesized_entry {
            return self.script_binder();
        }
        let body = data.body?;
        let declaration = self.declaration(method)?;
        let flags = if data.is_low_level {
            BinderFlags::UNSAFE_REGION
        } else {
            BinderFlags::NONE
        };
        Some(self.cached(BinderCacheKey::new(declaration, NodeUsage::METHOD_BODY), || {
            let signature = self.method_signature_binder(method);
            let in_method = Binder::push(&signature, BinderKind::InMethod(Member::Symbol(method)), flags);
            Binder::executable_code(&in_method, body, Member::Symbol(method), BinderFlags::NONE)
        }))
    }

    /// The global statements, bound as the body of the synthesized entry
    /// method. `None` when there are no global statements.
    pub fn script_binder(&self) -> Option<Arc<Binder>> {
        let entry = self.module.symbols().synthesized_entry()?;
        let root = self.module.tree().root();
        Some(self.cached(BinderCacheKey::new(root, NodeUsage::COMPILATION_UNIT_SCRIPT), || {
            let signature = self.method_signature_binder(entry);
            let in_method = Binder::push(&signature, BinderKind::InMethod(Member::Symbol(entry)), BinderFlags::NONE);
            Binder::executable_code(&in_method, root, Member::Symbol(entry), BinderFlags::NONE)
        }))
    }

    /// The default value of `parameter`, or `None` when it has none.
    pub fn parameter_default_binder(&self, parameter: SymbolId) -> Option<Arc<Binder>> {
        let symbols = self.module.symbols();
        let default_value = symbols.as_parameter(parameter)?.default_value?;
        let method = symbols.get(parameter).containing?;
        let declaration = self.declaration(parameter)?;
        Some(self.cached(
            BinderCacheKey::new(declaration, NodeUsage::PARAMETER_DEFAULT_VALUE),
            || {
                let signature = self.method_signature_binder(method);
                let defaults = Binder::with_additional_flags(&signature, BinderFlags::PARAMETER_DEFAULT_VALUE);
                Binder::executable_code(&defaults, default_value, Member::Symbol(method), BinderFlags::NONE)
            },
        ))
    }

    /// The declared type of `field`.
    pub fn field_binder(&self, field: SymbolId) -> Arc<Binder> {
        let build = || {
            let outer = self.outer_binder(field);
            Binder::push(&outer, BinderKind::ContainingMember(Member::Symbol(field)), BinderFlags::NONE)
        };
        match self.declaration(field) {
            Some(declaration) => self.cached(BinderCacheKey::new(declaration, NodeUsage::NORMAL), build),
            None => build(),
        }
    }

    /// The initializer of `field`, or `None` when it has none.
    pub fn field_initializer_binder(&self, field: SymbolId) -> Option<Arc<Binder>> {
        let initializer = self.module.symbols().as_field(field)?.initializer?;
        let declaration = self.declaration(field)?;
        Some(self.cached(BinderCacheKey::new(declaration, NodeUsage::FIELD_INITIALIZER), || {
            let field_binder = self.field_binder(field);
            Binder::executable_code(
                &field_binder,
                initializer,
                Member::Symbol(field),
                BinderFlags::FIELD_INITIALIZER,
            )
        }))
    }

    // ========================================================================
    // Node lookup
    // ========================================================================

    /// The region chain that owns `node`.
    pub fn region_binder(&self, node: NodeId) -> Arc<Binder> {
        let tree = self.module.tree();
        let symbols = self.module.symbols();
        let mut child = None;
        for ancestor in tree.ancestors_and_self(node) {
            let region = match tree.kind(ancestor) {
                SyntaxKind::FieldDeclaration { initializer, .. } => symbols.symbol_declared_at(ancestor).map(|field| {
                    match child {
                        Some(child) if Some(child) == *initializer => self
                            .field_initializer_binder(field)
                            .unwrap_or_else(|| self.field_binder(field)),
                        _ => self.field_binder(field),
                    }
                }),
                SyntaxKind::Parameter { default_value, .. } => match child {
                    Some(child) if Some(child) == *default_value => symbols
                        .symbol_declared_at(ancestor)
                        .and_then(|parameter| self.parameter_default_binder(parameter)),
                    _ => None,
                },
                SyntaxKind::MethodDeclaration { body, .. } => {
                    symbols.symbol_declared_at(ancestor).map(|method| match child {
                        Some(child) if child == *body => self
                            .method_body_binder(method)
                            .unwrap_or_else(|| self.method_signature_binder(method)),
                        _ => self.method_signature_binder(method),
                    })
                }
                SyntaxKind::ClassDeclaration { base, .. } => symbols.symbol_declared_at(ancestor).map(|ty| match child {
                    Some(child) if Some(child) == *base => self.base_binder(ty),
                    _ => self.container_binder(ty),
                }),
                SyntaxKind::GlobalStatement { .. } => self.script_binder(),
                SyntaxKind::CompilationUnit { .. } => Some(self.global_binder()),
                _ => None,
            };
            if let Some(region) = region {
                return region;
            }
            child = Some(ancestor);
        }
        self.global_binder()
    }

    /// The binder valid at `node`: the innermost scope of its region that
    /// encloses it.
    pub fn get_binder(&self, node: NodeId) -> Arc<Binder> {
        let region = self.region_binder(node);
        self.module
            .tree()
            .ancestors_and_self(node)
            .find_map(|ancestor| region.get_binder(ancestor))
            .unwrap_or(region)
    }

    /// Whether `symbol` is a method whose body can be bound.
    pub fn has_body(&self, symbol: SymbolId) -> bool {
        matches!(&self.module.symbols().get(symbol).kind, SymbolKind::Method(data) if data.body.is_some() || data.is_synthesized_entry)
    }
}

impl std::fmt::Debug for BinderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderFactory")
            .field("file", &self.module.file_name())
            .field("cached", &self.cache.len())
            .finish()
    }
}
