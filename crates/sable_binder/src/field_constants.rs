//! Constant field evaluation.
//!
//! A constant is evaluated only after every constant it references has
//! been. Requesting a constant from outside any constant evaluation
//! collects the dependency graph of the unevaluated constants it reaches,
//! orders it so that dependencies come first, and evaluates in that order.
//! When only cycles remain, the earliest declared constant on a cycle is
//! evaluated first and reported as circular; the rest of the cycle then
//! sees a bad constant and becomes bad without further diagnostics.
//!
//! Requesting a constant while another is being evaluated never recurses:
//! the request is recorded in the active `ConstantFieldsInProgress` and
//! answered with "not yet known".

use crate::binder::Binder;
use crate::constant::{BoundConstant, ConstantFieldsInProgress};
use crate::context::{BindingContext, Evaluated};
use crate::pass::BindingPass;
use sable_core::collections::{FxHashSet, FxIndexMap};
use sable_core::ConsList;
use sable_diagnostics::{messages, DiagnosticQueue};
use sable_symbols::SymbolId;
use std::sync::Arc;

/// The published value of a constant field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldConstant {
    Value(BoundConstant),
    /// The initializer is not constant, is circular, or depends on a bad
    /// constant. A diagnostic has been reported for the root cause.
    Bad,
}

impl FieldConstant {
    pub fn constant(&self) -> Option<&BoundConstant> {
        match self {
            FieldConstant::Value(constant) => Some(constant),
            FieldConstant::Bad => None,
        }
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, FieldConstant::Bad)
    }
}

#[derive(Debug, Default)]
struct Node {
    dependencies: Vec<SymbolId>,
    remaining: usize,
    depended_on_by: Vec<SymbolId>,
}

impl BindingContext {
    /// The value of the constant `field` as seen by an evaluation tracked by
    /// `in_progress`.
    ///
    /// Returns `None` when `in_progress` is active and `field` has not been
    /// evaluated yet; the dependency is recorded instead.
    pub fn field_constant(
        &self,
        field: SymbolId,
        in_progress: &ConstantFieldsInProgress,
    ) -> Option<Arc<Evaluated<FieldConstant>>> {
        if let Some(published) = self.constants.get(&field) {
            return Some(published.value().clone());
        }
        if !in_progress.is_empty() {
            in_progress.add_dependency(field);
            return None;
        }
        for (field, starts_cycle) in self.order_all_dependencies(field) {
            self.bind_constant_if_necessary(field, starts_cycle);
        }
        self.constants.get(&field).map(|published| published.value().clone())
    }

    pub fn published_constant(&self, field: SymbolId) -> Option<Arc<Evaluated<FieldConstant>>> {
        self.constants.get(&field).map(|published| published.value().clone())
    }

    fn publish_constant(&self, field: SymbolId, evaluated: Evaluated<FieldConstant>) {
        self.constants.entry(field).or_insert(Arc::new(evaluated));
    }

    fn bind_constant_if_necessary(&self, field: SymbolId, starts_cycle: bool) {
        if self.constants.contains_key(&field) {
            return;
        }
        let (evaluated, _) = self.bind_constant(field, starts_cycle);
        self.publish_constant(field, evaluated);
    }

    /// Bind the initializer of `field` under a fresh dependency ledger.
    /// Returns the value and the unevaluated constants it referenced.
    fn bind_constant(&self, field: SymbolId, starts_cycle: bool) -> (Evaluated<FieldConstant>, Vec<SymbolId>) {
        let symbols = self.symbols();
        let name = symbols.name(field);
        let declaration = symbols.get(field).declaration.unwrap_or_else(|| self.tree().root());
        let mut pass = BindingPass::new(self);

        let (Some(binder), Some(initializer)) = (
            self.factory().field_initializer_binder(field),
            symbols.as_field(field).and_then(|data| data.initializer),
        ) else {
            pass.report(declaration, &messages::CONSTANT_NEEDS_INITIALIZER, &[name]);
            return (Evaluated::new(FieldConstant::Bad, pass.into_diagnostics()), Vec::new());
        };

        let tracker = ConstantFieldsInProgress::new(field);
        let binder = Binder::with_constant_fields_in_progress(&binder, tracker.clone());
        let value = pass.bind_value(&binder, initializer);
        let target = self.field_type(field, &ConsList::empty()).value.clone();
        let value = pass.convert(value, &target, initializer);
        let dependencies = tracker.dependencies();

        let result = if starts_cycle {
            pass.report(declaration, &messages::CIRCULAR_CONSTANT, &[name]);
            FieldConstant::Bad
        } else if let Some(constant) = value.constant.clone() {
            FieldConstant::Value(constant)
        } else {
            if !pass.saw_bad_constant() && !value.is_error() {
                pass.report(initializer, &messages::NOT_CONSTANT_EXPRESSION, &[name]);
            }
            FieldConstant::Bad
        };
        tracing::trace!(field = %symbols.qualified_name(field), starts_cycle, bad = result.is_bad(), "bound constant");
        (Evaluated::new(result, pass.into_diagnostics()), dependencies)
    }

    /// The unevaluated constants `field` references. A constant with none
    /// is published right away.
    fn dependencies_of(&self, field: SymbolId) -> Vec<SymbolId> {
        if self.constants.contains_key(&field) {
            return Vec::new();
        }
        let (evaluated, dependencies) = self.bind_constant(field, false);
        if dependencies.is_empty() {
            self.publish_constant(field, evaluated);
        }
        dependencies
    }

    /// `field` and every unevaluated constant it reaches, dependencies
    /// first. The flag marks the constant chosen to break a cycle.
    fn order_all_dependencies(&self, field: SymbolId) -> Vec<(SymbolId, bool)> {
        let mut graph: FxIndexMap<SymbolId, Node> = FxIndexMap::default();
        let mut pending = vec![field];
        while let Some(current) = pending.pop() {
            if graph.contains_key(&current) {
                continue;
            }
            let dependencies = self.dependencies_of(current);
            pending.extend(dependencies.iter().copied());
            graph.insert(
                current,
                Node {
                    dependencies,
                    ..Node::default()
                },
            );
        }
        order_graph(graph)
    }
}

fn order_graph(mut graph: FxIndexMap<SymbolId, Node>) -> Vec<(SymbolId, bool)> {
    let edges: Vec<(SymbolId, SymbolId)> = graph
        .iter()
        .flat_map(|(&field, node)| node.dependencies.iter().map(move |&dependency| (field, dependency)))
        .collect();
    for (field, dependency) in edges {
        if let Some(node) = graph.get_mut(&dependency) {
            node.depended_on_by.push(field);
        }
        if let Some(node) = graph.get_mut(&field) {
            node.remaining += 1;
        }
    }

    let mut order = Vec::with_capacity(graph.len());
    let mut done: FxHashSet<SymbolId> = FxHashSet::default();
    while done.len() < graph.len() {
        let mut ready: Vec<SymbolId> = graph
            .iter()
            .filter(|(field, node)| node.remaining == 0 && !done.contains(*field))
            .map(|(&field, _)| field)
            .collect();
        let starts_cycle = ready.is_empty();
        if starts_cycle {
            let start = graph
                .keys()
                .copied()
                .filter(|field| !done.contains(field))
                .filter(|&field| is_part_of_cycle(&graph, field))
                .min();
            match start {
                Some(start) => ready.push(start),
                None => unreachable!("constant graph has no ready node and no cycle"),
            }
        }
        ready.sort_unstable();
        for field in ready {
            done.insert(field);
            order.push((field, starts_cycle));
            let dependents = graph.get(&field).map(|node| node.depended_on_by.clone()).unwrap_or_default();
            for dependent in dependents {
                if let Some(node) = graph.get_mut(&dependent) {
                    node.remaining = node.remaining.saturating_sub(1);
                }
            }
        }
    }
    order
}

/// Whether following dependencies from `field` leads back to it.
fn is_part_of_cycle(graph: &FxIndexMap<SymbolId, Node>, field: SymbolId) -> bool {
    let mut visited: FxHashSet<SymbolId> = FxHashSet::default();
    let mut stack: Vec<SymbolId> = graph
        .get(&field)
        .map(|node| node.dependencies.clone())
        .unwrap_or_default();
    while let Some(current) = stack.pop() {
        if current == field {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(node) = graph.get(&current) {
            stack.extend(node.dependencies.iter().copied());
        }
    }
    false
}
