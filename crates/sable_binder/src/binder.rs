//! The binder chain.
//!
//! A binder is a frame in a linked chain of scopes. Each frame answers the
//! questions its kind knows about (locals of a block, parameters of a method,
//! members of a type, the labels of a loop) and delegates everything else to
//! the next frame. The chain ends in an `End` frame whose accessors return
//! nothing and whose lookups always fail.
//!
//! Frames are immutable once built. The only lazily computed state is
//! published through `OnceLock`: the declarations of a local scope and the
//! binder map of an executable code region.

use crate::bound::BoundExpression;
use crate::constant::ConstantFieldsInProgress;
use crate::flags::BinderFlags;
use crate::local_binder_factory::LocalBinderFactory;
use crate::locals::{LabelSymbol, LocalFunctionSymbol, LocalSymbol, ScopeDeclarations};
use crate::module::SourceModule;
use sable_core::collections::FxHashMap;
use sable_core::ConsList;
use sable_symbols::{SymbolId, SymbolKind};
use sable_syntax::NodeId;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

/// The member whose code is being bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Symbol(SymbolId),
    LocalFunction(Arc<LocalFunctionSymbol>),
}

impl Member {
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Member::Symbol(symbol) => Some(*symbol),
            Member::LocalFunction(_) => None,
        }
    }
}

/// The result of looking up a simple name.
#[derive(Debug, Clone)]
pub enum LookupResult {
    Empty,
    Local(Arc<LocalSymbol>),
    /// A local of an enclosing scope that is declared after the reference.
    /// It hides any outer symbol of the same name.
    DeclaredLater(Arc<LocalSymbol>),
    LocalFunction(Arc<LocalFunctionSymbol>),
    Parameter(SymbolId),
    TemplateParameter(SymbolId),
    /// Members of a type or of the global container; several when a method
    /// is overloaded.
    Symbols(Vec<SymbolId>),
}

impl LookupResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, LookupResult::Empty)
    }
}

pub enum BinderKind {
    End,
    /// Adds flags only.
    Plain,
    ContainingMember(Member),
    /// Member lookup in a type (and its bases) or in the global container.
    InContainer(SymbolId),
    TemplateParameters(SymbolId),
    /// The parameters of a method or local function.
    InMethod(Member),
    LocalScope {
        designator: NodeId,
        declarations: OnceLock<ScopeDeclarations>,
    },
    Loop {
        node: NodeId,
        break_label: Arc<LabelSymbol>,
        continue_label: Arc<LabelSymbol>,
    },
    /// The root of a region of statements or expressions. Owns the binder
    /// map for every scope inside `root`.
    ExecutableCode {
        root: NodeId,
        member: Member,
        map: OnceLock<FxHashMap<NodeId, Arc<Binder>>>,
    },
    ConstantFieldsInProgress(ConstantFieldsInProgress),
    /// Fields whose inferred types are being computed, newest first.
    FieldsBeingBound(ConsList<SymbolId>),
    LocalInProgress(Arc<LocalSymbol>),
    ConditionalReceiver(BoundExpression),
    UnboundTypeAllowed,
}

impl BinderKind {
    pub fn label(&self) -> &'static str {
        match self {
            BinderKind::End => "end",
            BinderKind::Plain => "plain",
            BinderKind::ContainingMember(_) => "containing member",
            BinderKind::InContainer(_) => "in container",
            BinderKind::TemplateParameters(_) => "template parameters",
            BinderKind::InMethod(_) => "in method",
            BinderKind::LocalScope { .. } => "local scope",
            BinderKind::Loop { .. } => "loop",
            BinderKind::ExecutableCode { .. } => "executable code",
            BinderKind::ConstantFieldsInProgress(_) => "constant fields in progress",
            BinderKind::FieldsBeingBound(_) => "fields being bound",
            BinderKind::LocalInProgress(_) => "local in progress",
            BinderKind::ConditionalReceiver(_) => "conditional receiver",
            BinderKind::UnboundTypeAllowed => "unbound type allowed",
        }
    }
}

enum Next {
    None,
    Frame(Arc<Binder>),
    /// Frames stored in a region's binder map point back at the region
    /// weakly; the region owns the map.
    Region(Weak<Binder>),
}

pub struct Binder {
    next: Next,
    flags: BinderFlags,
    kind: BinderKind,
    module: Arc<SourceModule>,
}

impl Binder {
    /// The terminal frame of every chain.
    pub fn end(module: Arc<SourceModule>, flags: BinderFlags) -> Arc<Binder> {
        Arc::new(Binder {
            next: Next::None,
            flags,
            kind: BinderKind::End,
            module,
        })
    }

    fn effective_flags(parent: BinderFlags, kind: &BinderKind, additional: BinderFlags) -> BinderFlags {
        match kind {
            BinderKind::InMethod(_) | BinderKind::ExecutableCode { .. } => {
                BinderFlags::enter_executable_code(parent, additional)
            }
            BinderKind::ConstantFieldsInProgress(_) => parent | additional | BinderFlags::FIELD_INITIALIZER,
            _ => parent | additional,
        }
    }

    /// Push a frame of `kind` on top of `next`.
    pub fn push(next: &Arc<Binder>, kind: BinderKind, additional: BinderFlags) -> Arc<Binder> {
        Arc::new(Binder {
            flags: Self::effective_flags(next.flags, &kind, additional),
            kind,
            module: next.module.clone(),
            next: Next::Frame(next.clone()),
        })
    }

    /// Push a frame that lives in the binder map of `region`.
    pub(crate) fn push_in_region(region: &Arc<Binder>, kind: BinderKind, additional: BinderFlags) -> Arc<Binder> {
        Arc::new(Binder {
            flags: Self::effective_flags(region.flags, &kind, additional),
            kind,
            module: region.module.clone(),
            next: Next::Region(Arc::downgrade(region)),
        })
    }

    // ========================================================================
    // Frame constructors
    // ========================================================================

    pub fn with_additional_flags(next: &Arc<Binder>, flags: BinderFlags) -> Arc<Binder> {
        Self::push(next, BinderKind::Plain, flags)
    }

    pub fn executable_code(next: &Arc<Binder>, root: NodeId, member: Member, flags: BinderFlags) -> Arc<Binder> {
        Self::push(
            next,
            BinderKind::ExecutableCode {
                root,
                member,
                map: OnceLock::new(),
            },
            flags,
        )
    }

    pub fn with_constant_fields_in_progress(next: &Arc<Binder>, tracker: ConstantFieldsInProgress) -> Arc<Binder> {
        Self::push(next, BinderKind::ConstantFieldsInProgress(tracker), BinderFlags::NONE)
    }

    pub fn with_fields_being_bound(next: &Arc<Binder>, fields: ConsList<SymbolId>) -> Arc<Binder> {
        Self::push(next, BinderKind::FieldsBeingBound(fields), BinderFlags::NONE)
    }

    pub fn with_local_in_progress(next: &Arc<Binder>, local: Arc<LocalSymbol>) -> Arc<Binder> {
        Self::push(next, BinderKind::LocalInProgress(local), BinderFlags::NONE)
    }

    pub fn with_conditional_receiver(next: &Arc<Binder>, receiver: BoundExpression) -> Arc<Binder> {
        Self::push(next, BinderKind::ConditionalReceiver(receiver), BinderFlags::NONE)
    }

    pub fn with_unbound_type_allowed(next: &Arc<Binder>) -> Arc<Binder> {
        Self::push(next, BinderKind::UnboundTypeAllowed, BinderFlags::NONE)
    }

    pub fn local_scope_kind(designator: NodeId) -> BinderKind {
        BinderKind::LocalScope {
            designator,
            declarations: OnceLock::new(),
        }
    }

    pub fn loop_kind(node: NodeId) -> BinderKind {
        let (break_label, continue_label) = LabelSymbol::loop_labels(node);
        BinderKind::Loop {
            node,
            break_label: Arc::new(break_label),
            continue_label: Arc::new(continue_label),
        }
    }

    // ========================================================================
    // Frame data
    // ========================================================================

    #[inline]
    pub fn flags(&self) -> BinderFlags {
        self.flags
    }

    #[inline]
    pub fn kind(&self) -> &BinderKind {
        &self.kind
    }

    #[inline]
    pub fn module(&self) -> &Arc<SourceModule> {
        &self.module
    }

    /// The next frame out, or `None` for the end frame.
    ///
    /// # Panics
    ///
    /// Panics if this frame belongs to the binder map of a region that has
    /// been dropped.
    pub fn next(&self) -> Option<Arc<Binder>> {
        match &self.next {
            Next::None => None,
            Next::Frame(next) => Some(next.clone()),
            Next::Region(region) => match region.upgrade() {
                Some(region) => Some(region),
                None => panic!("binder map frame outlived its executable code region"),
            },
        }
    }

    /// Declarations of this frame, if it is a local scope.
    pub fn scope_declarations(&self) -> Option<&ScopeDeclarations> {
        match &self.kind {
            BinderKind::LocalScope {
                designator,
                declarations,
            } => Some(declarations.get_or_init(|| ScopeDeclarations::collect(self.module.tree(), *designator))),
            _ => None,
        }
    }

    // ========================================================================
    // Context accessors
    // ========================================================================

    pub fn containing_member(&self) -> Option<Member> {
        match &self.kind {
            BinderKind::ContainingMember(member)
            | BinderKind::InMethod(member)
            | BinderKind::ExecutableCode { member, .. } => Some(member.clone()),
            BinderKind::End => None,
            _ => self.next()?.containing_member(),
        }
    }

    /// The nearest method or local function whose parameters are in scope.
    pub fn in_method(&self) -> Option<Member> {
        match &self.kind {
            BinderKind::InMethod(member) => Some(member.clone()),
            BinderKind::End => None,
            _ => self.next()?.in_method(),
        }
    }

    /// The innermost type enclosing the code being bound.
    pub fn containing_type(&self) -> Option<SymbolId> {
        let symbols = self.module.symbols();
        match &self.kind {
            BinderKind::InContainer(container) => symbols.containing_type(*container),
            BinderKind::ContainingMember(Member::Symbol(symbol)) | BinderKind::InMethod(Member::Symbol(symbol)) => symbols
                .get(*symbol)
                .containing
                .and_then(|container| symbols.containing_type(container)),
            BinderKind::End => None,
            _ => self.next()?.containing_type(),
        }
    }

    pub fn fields_being_bound(&self) -> ConsList<SymbolId> {
        match &self.kind {
            BinderKind::FieldsBeingBound(fields) => fields.clone(),
            _ => self
                .next()
                .map_or_else(ConsList::empty, |next| next.fields_being_bound()),
        }
    }

    pub fn local_in_progress(&self) -> Option<Arc<LocalSymbol>> {
        match &self.kind {
            BinderKind::LocalInProgress(local) => Some(local.clone()),
            BinderKind::End => None,
            _ => self.next()?.local_in_progress(),
        }
    }

    /// Labels never cross into a local function.
    pub fn break_label(&self) -> Option<Arc<LabelSymbol>> {
        match &self.kind {
            BinderKind::Loop { break_label, .. } => Some(break_label.clone()),
            BinderKind::InMethod(_) | BinderKind::End => None,
            _ => self.next()?.break_label(),
        }
    }

    pub fn continue_label(&self) -> Option<Arc<LabelSymbol>> {
        match &self.kind {
            BinderKind::Loop { continue_label, .. } => Some(continue_label.clone()),
            BinderKind::InMethod(_) | BinderKind::End => None,
            _ => self.next()?.continue_label(),
        }
    }

    pub fn conditional_receiver_expression(&self) -> Option<BoundExpression> {
        match &self.kind {
            BinderKind::ConditionalReceiver(receiver) => Some(receiver.clone()),
            BinderKind::End => None,
            _ => self.next()?.conditional_receiver_expression(),
        }
    }

    pub fn constant_fields_in_progress(&self) -> ConstantFieldsInProgress {
        match &self.kind {
            BinderKind::ConstantFieldsInProgress(tracker) => tracker.clone(),
            _ => self
                .next()
                .map_or(ConstantFieldsInProgress::EMPTY, |next| next.constant_fields_in_progress()),
        }
    }

    pub fn is_unbound_type_allowed(&self) -> bool {
        match &self.kind {
            BinderKind::UnboundTypeAllowed => true,
            BinderKind::End => false,
            _ => self.next().is_some_and(|next| next.is_unbound_type_allowed()),
        }
    }

    /// Locals declared by the nearest local scope.
    ///
    /// # Panics
    ///
    /// Panics when no frame of the chain is a local scope.
    pub fn declared_locals_for_scope(&self) -> Vec<Arc<LocalSymbol>> {
        if let Some(declarations) = self.scope_declarations() {
            return declarations.locals.clone();
        }
        match self.next() {
            Some(next) => next.declared_locals_for_scope(),
            None => unreachable!("declared_locals_for_scope asked of a chain without a local scope"),
        }
    }

    // ========================================================================
    // Binder map
    // ========================================================================

    /// The binder for the scope `node` designates, from the binder map of
    /// the nearest executable code region.
    pub fn get_binder(self: &Arc<Self>, node: NodeId) -> Option<Arc<Binder>> {
        match &self.kind {
            BinderKind::ExecutableCode { .. } => match self.binder_map().get(&node) {
                Some(binder) => Some(binder.clone()),
                None => self.next()?.get_binder(node),
            },
            BinderKind::End => None,
            _ => self.next()?.get_binder(node),
        }
    }

    fn binder_map(self: &Arc<Self>) -> &FxHashMap<NodeId, Arc<Binder>> {
        match &self.kind {
            BinderKind::ExecutableCode { root, map, .. } => map.get_or_init(|| LocalBinderFactory::build_map(self, *root)),
            _ => unreachable!("only executable code frames own a binder map"),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Whether `declaration` precedes the reference at `at`.
    fn is_declared_before(&self, declaration: NodeId, at: NodeId) -> bool {
        let tree = self.module.tree();
        tree.span(declaration).start <= tree.span(at).start
    }

    /// Look up a simple name referenced at `at`, innermost frame first.
    ///
    /// Locals follow declare-before-use: a local declared after `at` is not
    /// visible, and because its scope declares the name the search stops
    /// there instead of falling back to an outer symbol.
    pub fn lookup_symbols(&self, name: &str, at: NodeId) -> LookupResult {
        let symbols = self.module.symbols();
        match &self.kind {
            BinderKind::End => return LookupResult::Empty,
            BinderKind::LocalScope { .. } => {
                if let Some(declarations) = self.scope_declarations() {
                    if let Some(local) = declarations.local(name) {
                        return if self.is_declared_before(local.declaration, at) {
                            LookupResult::Local(local.clone())
                        } else {
                            LookupResult::DeclaredLater(local.clone())
                        };
                    }
                    if let Some(function) = declarations.function(name) {
                        return LookupResult::LocalFunction(function.clone());
                    }
                }
            }
            BinderKind::InMethod(Member::Symbol(method)) => {
                if let Some(&parameter) = symbols.parameters(*method).iter().find(|&&p| symbols.name(p) == name) {
                    return LookupResult::Parameter(parameter);
                }
            }
            BinderKind::InMethod(Member::LocalFunction(function)) => {
                if let Some(parameter) = function.parameters.iter().find(|p| p.name == name) {
                    return LookupResult::Local(parameter.clone());
                }
            }
            BinderKind::TemplateParameters(ty) => {
                if let Some(&parameter) = symbols.template_parameters(*ty).iter().find(|&&p| symbols.name(p) == name) {
                    return LookupResult::TemplateParameter(parameter);
                }
            }
            BinderKind::InContainer(container) => {
                let found = if symbols.get(*container).is_type() {
                    symbols.lookup_member_in_hierarchy(*container, name)
                } else {
                    symbols.lookup_member(*container, name)
                };
                if !found.is_empty() {
                    return LookupResult::Symbols(found.to_vec());
                }
            }
            _ => {}
        }
        match self.next() {
            Some(next) => next.lookup_symbols(name, at),
            None => LookupResult::Empty,
        }
    }

    /// The local named `name` visible at `at`, if any.
    pub fn lookup_local(&self, name: &str, at: NodeId) -> Option<Arc<LocalSymbol>> {
        match self.lookup_symbols(name, at) {
            LookupResult::Local(local) => Some(local),
            _ => None,
        }
    }

    /// Local functions are visible throughout their block.
    pub fn lookup_local_function(&self, name: &str) -> Option<Arc<LocalFunctionSymbol>> {
        if let Some(function) = self.scope_declarations().and_then(|d| d.function(name)) {
            return Some(function.clone());
        }
        match self.kind {
            BinderKind::End => None,
            _ => self.next()?.lookup_local_function(name),
        }
    }

    /// Labels are visible throughout their block and enclosing blocks of the
    /// same method, but never across a local function boundary.
    pub fn lookup_label(&self, name: &str) -> Option<Arc<LabelSymbol>> {
        if let Some(label) = self.scope_declarations().and_then(|d| d.label(name)) {
            return Some(label.clone());
        }
        match self.kind {
            BinderKind::InMethod(_) | BinderKind::End => None,
            _ => self.next()?.lookup_label(name),
        }
    }

    pub fn lookup_template_parameter(&self, name: &str) -> Option<SymbolId> {
        let symbols = self.module.symbols();
        match &self.kind {
            BinderKind::TemplateParameters(ty) => {
                if let Some(&parameter) = symbols.template_parameters(*ty).iter().find(|&&p| symbols.name(p) == name) {
                    return Some(parameter);
                }
                self.next()?.lookup_template_parameter(name)
            }
            BinderKind::End => None,
            _ => self.next()?.lookup_template_parameter(name),
        }
    }

    /// The local declared by `declaration`, searched in this scope and the
    /// enclosing ones.
    pub fn local_declared_at(&self, declaration: NodeId) -> Option<Arc<LocalSymbol>> {
        if let Some(local) = self.scope_declarations().and_then(|d| d.local_declared_at(declaration)) {
            return Some(local.clone());
        }
        self.next()?.local_declared_at(declaration)
    }

    pub fn local_function_declared_at(&self, declaration: NodeId) -> Option<Arc<LocalFunctionSymbol>> {
        if let Some(function) = self.scope_declarations().and_then(|d| d.function_declared_at(declaration)) {
            return Some(function.clone());
        }
        self.next()?.local_function_declared_at(declaration)
    }

    pub fn label_declared_at(&self, declaration: NodeId) -> Option<Arc<LabelSymbol>> {
        if let Some(label) = self.scope_declarations().and_then(|d| d.label_declared_at(declaration)) {
            return Some(label.clone());
        }
        self.next()?.label_declared_at(declaration)
    }

    /// Whether `symbol` may be referenced here. Always true when the chain
    /// ignores accessibility.
    pub fn is_symbol_accessible(&self, symbol: SymbolId) -> bool {
        if self.flags.contains(BinderFlags::IGNORE_ACCESSIBILITY) {
            return true;
        }
        sable_symbols::is_symbol_accessible(self.module.symbols(), symbol, self.containing_type())
    }

    /// Whether `symbol` is a constant field.
    pub fn is_constant_field(&self, symbol: SymbolId) -> bool {
        matches!(&self.module.symbols().get(symbol).kind, SymbolKind::Field(data) if data.is_constant)
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chain = Vec::new();
        let mut current = Some(self.kind.label());
        let mut next = self.next();
        while let Some(label) = current {
            chain.push(label);
            current = next.as_ref().map(|frame| frame.kind.label());
            next = next.and_then(|frame| frame.next());
        }
        f.debug_struct("Binder")
            .field("flags", &self.flags)
            .field("chain", &chain)
            .finish()
    }
}
