//! Syntax tree integration tests.
//!
//! Covers linking, span computation and validation of external documents.

use sable_syntax::{NodeId, SyntaxKind, SyntaxTree, SyntaxTreeBuilder, TreeError};

/// Helper: `void M() { x = 1; int x = 2; }`
fn method_with_late_local() -> (SyntaxTree, NodeId, NodeId, NodeId) {
    let mut b = SyntaxTreeBuilder::new("late.sb");
    let x_ref = b.name("x");
    let one = b.int(1);
    let assign = b.assign(x_ref, one);
    let stmt = b.expression_statement(assign);
    let int_ty = b.type_name("int");
    let two = b.int(2);
    let decl = b.local("x", Some(int_ty), Some(two));
    let body = b.block(vec![stmt, decl]);
    let method = b.method("M", None, vec![], body);
    let tree = b.finish(vec![method]);
    (tree, x_ref, decl, body)
}

// ============================================================================
// Linking
// ============================================================================

#[test]
fn test_parent_links() {
    let (tree, x_ref, decl, body) = method_with_late_local();
    assert_eq!(tree.parent(decl), Some(body));
    assert!(tree.parent(tree.root()).is_none());
    let chain: Vec<_> = tree.ancestors_and_self(x_ref).collect();
    assert_eq!(chain.first(), Some(&x_ref));
    assert_eq!(chain.last(), Some(&tree.root()));
    assert!(chain.contains(&body));
}

#[test]
fn test_spans_follow_source_order() {
    let (tree, x_ref, decl, body) = method_with_late_local();
    assert!(tree.span(x_ref).end() <= tree.span(decl).start);
    assert!(tree.is_within(decl, body));
    assert!(tree.is_within(x_ref, body));
    assert!(!tree.is_within(x_ref, decl));
    assert_eq!(tree.span(tree.root()).start, 0);
    assert_eq!(tree.span(tree.root()).end() as usize, tree.len());
}

#[test]
fn test_text_of_type_names() {
    let mut b = SyntaxTreeBuilder::new("types.sb");
    let int_ty = b.type_name("int");
    let list = b.generic_type("List", vec![int_ty]);
    let nullable = b.nullable(list);
    let unbound = b.unbound_type("Map");
    let f1 = b.field("a", Some(nullable), None);
    let inner = b.type_of(unbound);
    let f2 = b.field("b", None, Some(inner));
    let tree = b.finish(vec![f1, f2]);
    assert_eq!(tree.text_of(nullable), "List<int>?");
    assert_eq!(tree.text_of(unbound), "Map<>");
    assert_eq!(tree.members(), &[f1, f2]);
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_json_document_is_accepted() {
    let json = r#"{
        "fileName": "doc.sb",
        "nodes": [
            { "kind": "literal", "value": { "type": "int", "value": 3 } },
            { "kind": "name", "name": "f" },
            { "kind": "argument", "expression": 0 },
            { "kind": "call", "callee": 1, "arguments": [2] },
            { "kind": "expressionStatement", "expression": 3 },
            { "kind": "globalStatement", "statement": 4 },
            { "kind": "compilationUnit", "members": [5] }
        ]
    }"#;
    let tree = SyntaxTree::from_json(json).unwrap();
    assert_eq!(tree.file_name(), "doc.sb");
    assert_eq!(tree.len(), 7);
    assert!(matches!(tree.kind(NodeId(3)), SyntaxKind::Call { .. }));
    assert_eq!(tree.parent(NodeId(1)), Some(NodeId(3)));
}

#[test]
fn test_document_round_trip_preserves_kinds() {
    let (tree, ..) = method_with_late_local();
    let json = serde_json::to_string(&tree.to_document()).unwrap();
    let reloaded = SyntaxTree::from_json(&json).unwrap();
    assert_eq!(reloaded.len(), tree.len());
    assert_eq!(reloaded.kind(reloaded.root()), tree.kind(tree.root()));
}

#[test]
fn test_child_after_parent_is_rejected() {
    let json = r#"{
        "fileName": "bad.sb",
        "nodes": [
            { "kind": "expressionStatement", "expression": 1 },
            { "kind": "name", "name": "x" },
            { "kind": "compilationUnit", "members": [0] }
        ]
    }"#;
    let err = SyntaxTree::from_json(json).unwrap_err();
    assert!(matches!(err, TreeError::ChildAfterParent { .. }), "got {err:?}");
}

#[test]
fn test_shared_child_is_rejected() {
    let json = r#"{
        "fileName": "bad.sb",
        "nodes": [
            { "kind": "name", "name": "x" },
            { "kind": "expressionStatement", "expression": 0 },
            { "kind": "expressionStatement", "expression": 0 },
            { "kind": "compilationUnit", "members": [] }
        ]
    }"#;
    let err = SyntaxTree::from_json(json).unwrap_err();
    assert!(matches!(err, TreeError::SharedChild { .. }), "got {err:?}");
}

#[test]
fn test_orphan_and_root_errors() {
    let orphan = r#"{
        "fileName": "bad.sb",
        "nodes": [
            { "kind": "name", "name": "x" },
            { "kind": "compilationUnit", "members": [] }
        ]
    }"#;
    assert!(matches!(SyntaxTree::from_json(orphan), Err(TreeError::OrphanNode(NodeId(0)))));

    let no_unit = r#"{ "fileName": "bad.sb", "nodes": [ { "kind": "break" } ] }"#;
    assert!(matches!(
        SyntaxTree::from_json(no_unit),
        Err(TreeError::RootNotCompilationUnit { .. })
    ));

    let empty = r#"{ "fileName": "bad.sb", "nodes": [] }"#;
    assert!(matches!(SyntaxTree::from_json(empty), Err(TreeError::Empty)));
}
