//! Declaration pass and accessibility tests.

use sable_diagnostics::{messages, DiagnosticQueue};
use sable_symbols::{declare_symbols, is_symbol_accessible, Accessibility, SymbolKind, SymbolTable};
use sable_syntax::{ModifierFlags, SyntaxTree, SyntaxTreeBuilder};

/// Helper: declare the symbols of `tree` into a fresh table.
fn declare(tree: &SyntaxTree) -> (SymbolTable, DiagnosticQueue) {
    let mut table = SymbolTable::new();
    let mut diagnostics = DiagnosticQueue::new();
    declare_symbols(tree, &mut table, &mut diagnostics);
    (table, diagnostics)
}

/// Helper: `class Base { private int secret; protected int shared; int open; }`
/// and `class Derived : Base { }` plus an unrelated `class Other { }`.
fn hierarchy() -> SyntaxTree {
    let mut b = SyntaxTreeBuilder::new("access.sb");
    let ty = b.type_name("int");
    let secret = b.field_with(ModifierFlags::PRIVATE, "secret", Some(ty), None);
    let ty = b.type_name("int");
    let shared = b.field_with(ModifierFlags::PROTECTED, "shared", Some(ty), None);
    let ty = b.type_name("int");
    let open = b.field("open", Some(ty), None);
    let base = b.class("Base", vec![], None, vec![secret, shared, open]);
    let base_ref = b.type_name("Base");
    let derived = b.class("Derived", vec![], Some(base_ref), vec![]);
    let other = b.class("Other", vec![], None, vec![]);
    b.finish(vec![base, derived, other])
}

// ============================================================================
// Declaration
// ============================================================================

#[test]
fn test_declares_types_members_and_parameters() {
    let mut b = SyntaxTreeBuilder::new("decl.sb");
    let t = b.template_parameter("T", None);
    let int_ty = b.type_name("int");
    let p = b.parameter("count", int_ty, None);
    let body = b.block(vec![]);
    let method = b.method("Fill", None, vec![p], body);
    let class = b.class("Buffer", vec![t], None, vec![method]);
    let tree = b.finish(vec![class]);

    let (table, diagnostics) = declare(&tree);
    assert!(diagnostics.is_empty());

    let buffer = table.lookup_member(table.global(), "Buffer")[0];
    assert!(table.get(buffer).is_type());
    assert_eq!(table.template_parameters(buffer).len(), 1);

    let fill = table.lookup_member(buffer, "Fill")[0];
    assert_eq!(table.get(fill).containing, Some(buffer));
    let parameters = table.parameters(fill);
    assert_eq!(parameters.len(), 1);
    assert_eq!(table.name(parameters[0]), "count");
    assert_eq!(table.qualified_name(fill), "Buffer.Fill");
    assert_eq!(table.symbol_declared_at(method), Some(fill));
}

#[test]
fn test_methods_overload_but_fields_clash() {
    let mut b = SyntaxTreeBuilder::new("dup.sb");
    let int_ty = b.type_name("int");
    let p = b.parameter("a", int_ty, None);
    let body = b.block(vec![]);
    let first = b.method("f", None, vec![p], body);
    let body = b.block(vec![]);
    let second = b.method("f", None, vec![], body);
    let int_ty = b.type_name("int");
    let x1 = b.field("x", Some(int_ty), None);
    let int_ty = b.type_name("int");
    let x2 = b.field("x", Some(int_ty), None);
    let tree = b.finish(vec![first, second, x1, x2]);

    let (table, diagnostics) = declare(&tree);
    assert_eq!(table.lookup_member(table.global(), "f").len(), 2);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.contains_code(messages::DUPLICATE_DECLARATION.code));
}

#[test]
fn test_duplicate_parameter_names() {
    let mut b = SyntaxTreeBuilder::new("params.sb");
    let int_ty = b.type_name("int");
    let p1 = b.parameter("a", int_ty, None);
    let int_ty = b.type_name("int");
    let p2 = b.parameter("a", int_ty, None);
    let body = b.block(vec![]);
    let method = b.method("f", None, vec![p1, p2], body);
    let tree = b.finish(vec![method]);

    let (_, diagnostics) = declare(&tree);
    assert!(diagnostics.contains_code(messages::PARAMETER_ALREADY_DECLARED.code));
}

#[test]
fn test_global_statements_synthesize_entry() {
    let mut b = SyntaxTreeBuilder::new("script.sb");
    let one = b.int(1);
    let stmt = b.expression_statement(one);
    let global = b.global_statement(stmt);
    let tree = b.finish(vec![global]);

    let (table, _) = declare(&tree);
    let entry = table.synthesized_entry().expect("entry should be synthesized");
    let data = table.as_method(entry).expect("entry is a method");
    assert!(data.is_synthesized_entry);
    assert!(data.is_static);
    assert_eq!(table.get(entry).declaration, Some(tree.root()));
}

#[test]
fn test_global_members_are_static() {
    let mut b = SyntaxTreeBuilder::new("static.sb");
    let int_ty = b.type_name("int");
    let field = b.field("counter", Some(int_ty), None);
    let tree = b.finish(vec![field]);

    let (table, _) = declare(&tree);
    let counter = table.lookup_member(table.global(), "counter")[0];
    assert!(table.as_field(counter).is_some_and(|data| data.is_static));
}

#[test]
fn test_base_types_resolve() {
    let tree = hierarchy();
    let (table, diagnostics) = declare(&tree);
    assert!(diagnostics.is_empty());

    let base = table.lookup_member(table.global(), "Base")[0];
    let derived = table.lookup_member(table.global(), "Derived")[0];
    assert_eq!(table.base_type(derived), Some(base));
    assert!(table.is_derived_from(derived, base));
    assert!(!table.is_derived_from(base, derived));
    assert_eq!(table.lookup_member_in_hierarchy(derived, "open").len(), 1);
}

#[test]
fn test_unknown_and_circular_base() {
    let mut b = SyntaxTreeBuilder::new("bases.sb");
    let missing = b.type_name("Missing");
    let lost = b.class("Lost", vec![], Some(missing), vec![]);
    let b_ref = b.type_name("B");
    let a = b.class("A", vec![], Some(b_ref), vec![]);
    let a_ref = b.type_name("A");
    let bb = b.class("B", vec![], Some(a_ref), vec![]);
    let tree = b.finish(vec![lost, a, bb]);

    let (table, diagnostics) = declare(&tree);
    assert!(diagnostics.contains_code(messages::UNKNOWN_TYPE.code));
    assert!(diagnostics.contains_code(messages::CIRCULAR_BASE.code));

    let a = table.lookup_member(table.global(), "A")[0];
    let b = table.lookup_member(table.global(), "B")[0];
    assert_eq!(table.base_type(a), Some(b));
    assert_eq!(table.base_type(b), None);
}

#[test]
fn test_library_types() {
    let mut table = SymbolTable::new();
    let console = table.add_library_type("Console");
    assert!(table.as_named_type(console).is_some_and(|data| data.is_library));
    assert_eq!(table.get(console).declaration, None);
    assert_eq!(table.lookup_member(table.global(), "Console"), &[console]);
}

#[test]
fn test_constant_fields_in_declaration_order() {
    let mut b = SyntaxTreeBuilder::new("consts.sb");
    let one = b.int(1);
    let a = b.constant_field("a", None, Some(one));
    let int_ty = b.type_name("int");
    let plain = b.field("p", Some(int_ty), None);
    let two = b.int(2);
    let c = b.constant_field("c", None, Some(two));
    let tree = b.finish(vec![a, plain, c]);

    let (table, _) = declare(&tree);
    let names: Vec<_> = table.constant_fields().map(|id| table.name(id).to_string()).collect();
    assert_eq!(names, vec!["a", "c"]);
}

// ============================================================================
// Accessibility
// ============================================================================

#[test]
fn test_private_visible_only_inside_owner() {
    let tree = hierarchy();
    let (table, _) = declare(&tree);
    let base = table.lookup_member(table.global(), "Base")[0];
    let derived = table.lookup_member(table.global(), "Derived")[0];
    let secret = table.lookup_member(base, "secret")[0];
    assert_eq!(table.get(secret).accessibility, Accessibility::Private);

    assert!(is_symbol_accessible(&table, secret, Some(base)));
    assert!(!is_symbol_accessible(&table, secret, Some(derived)));
    assert!(!is_symbol_accessible(&table, secret, None));
}

#[test]
fn test_protected_visible_in_derived() {
    let tree = hierarchy();
    let (table, _) = declare(&tree);
    let base = table.lookup_member(table.global(), "Base")[0];
    let derived = table.lookup_member(table.global(), "Derived")[0];
    let other = table.lookup_member(table.global(), "Other")[0];
    let shared = table.lookup_member(base, "shared")[0];

    assert!(is_symbol_accessible(&table, shared, Some(base)));
    assert!(is_symbol_accessible(&table, shared, Some(derived)));
    assert!(!is_symbol_accessible(&table, shared, Some(other)));
    assert!(!is_symbol_accessible(&table, shared, None));
}

#[test]
fn test_public_and_global_members_always_visible() {
    let tree = hierarchy();
    let (table, _) = declare(&tree);
    let base = table.lookup_member(table.global(), "Base")[0];
    let open = table.lookup_member(base, "open")[0];
    assert!(is_symbol_accessible(&table, open, None));
    assert!(is_symbol_accessible(&table, base, None));
}

#[test]
fn test_private_visible_in_nested_type() {
    let mut b = SyntaxTreeBuilder::new("nested.sb");
    let int_ty = b.type_name("int");
    let hidden = b.field_with(ModifierFlags::PRIVATE, "hidden", Some(int_ty), None);
    let inner = b.class("Inner", vec![], None, vec![]);
    let outer = b.class("Outer", vec![], None, vec![hidden, inner]);
    let tree = b.finish(vec![outer]);

    let (table, _) = declare(&tree);
    let outer = table.lookup_member(table.global(), "Outer")[0];
    let inner = table.lookup_member(outer, "Inner")[0];
    let hidden = table.lookup_member(outer, "hidden")[0];
    assert!(matches!(table.get(hidden).kind, SymbolKind::Field(_)));
    assert!(is_symbol_accessible(&table, hidden, Some(inner)));
}
