//! Builds the binder map of an executable code region.
//!
//! One walk over the region's syntax creates a frame for every construct
//! that opens a scope or changes the ambient flags: blocks, loops, try
//! clauses, local functions and embedded statements that declare
//! something. Frames created directly on the region link back to it
//! weakly; deeper frames link to their parent frame.

use crate::binder::{Binder, BinderKind, Member};
use crate::flags::BinderFlags;
use sable_core::collections::FxHashMap;
use sable_syntax::{NodeId, SyntaxKind, SyntaxTree};
use std::sync::Arc;

pub(crate) struct LocalBinderFactory<'a> {
    region: &'a Arc<Binder>,
    tree: &'a SyntaxTree,
    map: FxHashMap<NodeId, Arc<Binder>>,
}

impl<'a> LocalBinderFactory<'a> {
    /// The binder map for the region rooted at `root`.
    pub(crate) fn build_map(region: &'a Arc<Binder>, root: NodeId) -> FxHashMap<NodeId, Arc<Binder>> {
        let tree = region.module().tree();
        let mut factory = LocalBinderFactory {
            region,
            tree,
            map: FxHashMap::default(),
        };
        match tree.kind(root) {
            SyntaxKind::CompilationUnit { members } => {
                let scope = factory.push(region, Binder::local_scope_kind(root), BinderFlags::NONE);
                factory.map.insert(root, scope.clone());
                for &member in members {
                    if let SyntaxKind::GlobalStatement { statement } = tree.kind(member) {
                        factory.visit_statement(&scope, *statement);
                    }
                }
            }
            SyntaxKind::Block { .. } => factory.visit_block(region, root),
            // A body that is a single statement.
            kind if kind.is_statement() => factory.visit_child(region, root),
            // Expression roots (initializers, default values) open no scopes.
            _ => {}
        }
        tracing::trace!(root = root.0, binders = factory.map.len(), "built binder map");
        factory.map
    }

    fn push(&self, enclosing: &Arc<Binder>, kind: BinderKind, flags: BinderFlags) -> Arc<Binder> {
        if Arc::ptr_eq(enclosing, self.region) {
            Binder::push_in_region(enclosing, kind, flags)
        } else {
            Binder::push(enclosing, kind, flags)
        }
    }

    fn visit_block(&mut self, enclosing: &Arc<Binder>, block: NodeId) {
        let scope = self.push(enclosing, Binder::local_scope_kind(block), BinderFlags::NONE);
        self.map.insert(block, scope.clone());
        let tree = self.tree;
        if let SyntaxKind::Block { statements } = tree.kind(block) {
            for &statement in statements {
                self.visit_statement(&scope, statement);
            }
        }
    }

    /// A statement in a position that is not a block's statement list, such
    /// as the branch of an `if`. Declarations there get a scope of their own.
    fn visit_embedded(&mut self, enclosing: &Arc<Binder>, statement: NodeId) {
        let tree = self.tree;
        match tree.kind(statement) {
            SyntaxKind::LocalDeclaration { .. } | SyntaxKind::LocalFunction { .. } | SyntaxKind::Labeled { .. } => {
                let scope = self.push(enclosing, Binder::local_scope_kind(statement), BinderFlags::NONE);
                self.map.insert(statement, scope.clone());
                self.visit_statement(&scope, statement);
            }
            _ => self.visit_statement(enclosing, statement),
        }
    }

    /// Visit `statement` under `frame`, and make sure `statement` resolves to
    /// `frame` when it opens no scope of its own.
    fn visit_child(&mut self, frame: &Arc<Binder>, statement: NodeId) {
        self.visit_embedded(frame, statement);
        self.map.entry(statement).or_insert_with(|| frame.clone());
    }

    fn visit_statement(&mut self, enclosing: &Arc<Binder>, statement: NodeId) {
        let tree = self.tree;
        match tree.kind(statement) {
            SyntaxKind::Block { .. } => self.visit_block(enclosing, statement),
            SyntaxKind::LocalFunction { parameters, body, .. } => {
                let Some(function) = enclosing.local_function_declared_at(statement) else {
                    tracing::debug!(node = statement.0, "local function without a declaring scope");
                    return;
                };
                let frame = self.push(
                    enclosing,
                    BinderKind::InMethod(Member::LocalFunction(function)),
                    BinderFlags::NONE,
                );
                for &parameter in parameters {
                    self.map.insert(parameter, frame.clone());
                }
                self.visit_child(&frame, *body);
            }
            SyntaxKind::While { body, .. } => {
                let body = *body;
                let frame = self.push(enclosing, Binder::loop_kind(statement), BinderFlags::NONE);
                self.map.insert(statement, frame.clone());
                self.visit_child(&frame, body);
            }
            SyntaxKind::If {
                then_statement,
                else_statement,
                ..
            } => {
                let (then_statement, else_statement) = (*then_statement, *else_statement);
                self.visit_embedded(enclosing, then_statement);
                if let Some(else_statement) = else_statement {
                    self.visit_embedded(enclosing, else_statement);
                }
            }
            SyntaxKind::Try {
                body,
                catch_body,
                finally_body,
            } => {
                let (body, catch_body, finally_body) = (*body, *catch_body, *finally_body);
                let frame = self.push(enclosing, BinderKind::Plain, BinderFlags::IN_TRY_BLOCK);
                self.visit_child(&frame, body);
                if let Some(catch_body) = catch_body {
                    let frame = self.push(enclosing, BinderKind::Plain, BinderFlags::IN_CATCH_BLOCK);
                    self.visit_child(&frame, catch_body);
                }
                if let Some(finally_body) = finally_body {
                    let mut flags = BinderFlags::IN_FINALLY_BLOCK;
                    if enclosing.flags().contains(BinderFlags::IN_FINALLY_BLOCK) {
                        flags |= BinderFlags::IN_NESTED_FINALLY_BLOCK;
                    }
                    let frame = self.push(enclosing, BinderKind::Plain, flags);
                    self.visit_child(&frame, finally_body);
                }
            }
            SyntaxKind::Labeled { statement: inner, .. } => {
                let inner = *inner;
                self.visit_statement(enclosing, inner);
            }
            _ => {}
        }
    }
}
