//! Binding pass tests: names, locals, statements, calls and constants.

use sable_binder::{
    BinderFlags, BindingContext, BoundBlock, BoundConstant, BoundExpressionKind, BoundStatement,
    ConstantFieldsInProgress, SourceModule,
};
use sable_diagnostics::{messages, DiagnosticQueue};
use sable_symbols::{declare_symbols, ConstantValue, PrimitiveType, SymbolId, SymbolTable, TypeRef};
use sable_syntax::{BinaryOperator, ModifierFlags, NodeId, SyntaxTree, SyntaxTreeBuilder};
use std::sync::Arc;

/// Helper: declare `tree` and wrap it in a binding context.
fn context(tree: SyntaxTree, flags: BinderFlags) -> BindingContext {
    let mut table = SymbolTable::new();
    let mut diagnostics = DiagnosticQueue::new();
    declare_symbols(&tree, &mut table, &mut diagnostics);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
    BindingContext::new(Arc::new(SourceModule::new(tree, table)), flags)
}

/// Helper: the member `name` of the global container.
fn global(context: &BindingContext, name: &str) -> SymbolId {
    let symbols = context.symbols();
    symbols.lookup_member(symbols.global(), name)[0]
}

/// Helper: a tree whose only member is `void Run() { <statements> }`.
fn run_method(mut b: SyntaxTreeBuilder, statements: Vec<NodeId>) -> SyntaxTree {
    let body = b.block(statements);
    let run = b.method("Run", None, vec![], body);
    b.finish(vec![run])
}

/// Helper: bind the body of the global method `name`.
fn bind_body(context: &BindingContext, name: &str) -> (BoundBlock, DiagnosticQueue) {
    let evaluated = context
        .bind_method_body(global(context, name))
        .expect("method should have a body");
    (evaluated.value, evaluated.diagnostics)
}

fn codes(diagnostics: &DiagnosticQueue) -> Vec<u32> {
    diagnostics.iter().map(|d| d.code).collect()
}

// ============================================================================
// Locals and lookup
// ============================================================================

#[test]
fn test_local_used_before_declaration() {
    // void Run() { int x = y; int y = 1; }
    let mut b = SyntaxTreeBuilder::new("order.sb");
    let int_ty = b.type_name("int");
    let y_ref = b.name("y");
    let x = b.local("x", Some(int_ty), Some(y_ref));
    let int_ty = b.type_name("int");
    let one = b.int(1);
    let y = b.local("y", Some(int_ty), Some(one));
    let ctx = context(run_method(b, vec![x, y]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::LOCAL_USED_BEFORE_DECLARATION.code]);
    assert_eq!(block.locals.len(), 2);
}

#[test]
fn test_later_local_hides_outer_symbol() {
    // int x = 1; void Run() { string s = x; string x = "a"; }
    let mut b = SyntaxTreeBuilder::new("hide.sb");
    let int_ty = b.type_name("int");
    let one = b.int(1);
    let field = b.field("x", Some(int_ty), Some(one));
    let string_ty = b.type_name("string");
    let x_ref = b.name("x");
    let s = b.local("s", Some(string_ty), Some(x_ref));
    let string_ty = b.type_name("string");
    let a = b.string("a");
    let x = b.local("x", Some(string_ty), Some(a));
    let body = b.block(vec![s, x]);
    let run = b.method("Run", None, vec![], body);
    let ctx = context(b.finish(vec![field, run]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert!(diagnostics.contains_code(messages::LOCAL_USED_BEFORE_DECLARATION.code));
    assert!(!diagnostics.contains_code(messages::CANNOT_CONVERT_IMPLICITLY.code));
}

#[test]
fn test_local_used_in_own_initializer() {
    // void Run() { var x = x; }
    let mut b = SyntaxTreeBuilder::new("self.sb");
    let x_ref = b.name("x");
    let x = b.local("x", None, Some(x_ref));
    let ctx = context(run_method(b, vec![x]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::LOCAL_USED_IN_OWN_INITIALIZER.code]);
}

#[test]
fn test_implicit_local_takes_initializer_type() {
    // void Run() { var d = 1.5; var n = null; var u; }
    let mut b = SyntaxTreeBuilder::new("infer.sb");
    let value = b.decimal(1.5);
    let d = b.local("d", None, Some(value));
    let null = b.null();
    let n = b.local("n", None, Some(null));
    let u = b.local("u", None, None);
    let ctx = context(run_method(b, vec![d, n, u]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(
        codes(&diagnostics),
        vec![messages::NULL_ASSIGN_ON_IMPLICIT.code, messages::NO_INIT_ON_IMPLICIT.code]
    );
    let BoundStatement::LocalDeclaration { local, .. } = &block.statements[0] else {
        panic!("expected a local declaration");
    };
    assert_eq!(local.ty(), Some(&TypeRef::primitive(PrimitiveType::Decimal)));
}

#[test]
fn test_constant_local_is_folded() {
    // void Run() { const int a = 2 * 3; int b = a; }
    let mut b = SyntaxTreeBuilder::new("const.sb");
    let int_ty = b.type_name("int");
    let two = b.int(2);
    let three = b.int(3);
    let product = b.binary(BinaryOperator::Multiply, two, three);
    let a = b.constant_local("a", Some(int_ty), Some(product));
    let int_ty = b.type_name("int");
    let a_ref = b.name("a");
    let second = b.local("b", Some(int_ty), Some(a_ref));
    let ctx = context(run_method(b, vec![a, second]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
    let BoundStatement::LocalDeclaration { local, .. } = &block.statements[0] else {
        panic!("expected a local declaration");
    };
    assert_eq!(local.constant(), Some(&BoundConstant::new(ConstantValue::Int(6))));
    let BoundStatement::LocalDeclaration {
        initializer: Some(initializer),
        ..
    } = &block.statements[1]
    else {
        panic!("expected an initialized local");
    };
    assert_eq!(initializer.constant, Some(BoundConstant::new(ConstantValue::Int(6))));
}

#[test]
fn test_constant_local_needs_constant_initializer() {
    // void Run() { int v = 1; const int c = v; c = 2; }
    let mut b = SyntaxTreeBuilder::new("notconst.sb");
    let int_ty = b.type_name("int");
    let one = b.int(1);
    let v = b.local("v", Some(int_ty), Some(one));
    let int_ty = b.type_name("int");
    let v_ref = b.name("v");
    let c = b.constant_local("c", Some(int_ty), Some(v_ref));
    let c_ref = b.name("c");
    let two = b.int(2);
    let assign = b.assign(c_ref, two);
    let statement = b.expression_statement(assign);
    let ctx = context(run_method(b, vec![v, c, statement]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(
        codes(&diagnostics),
        vec![messages::NOT_CONSTANT_EXPRESSION.code, messages::CONSTANT_ASSIGNMENT.code]
    );
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_break_outside_loop() {
    // void Run() { break; while (true) { continue; } }
    let mut b = SyntaxTreeBuilder::new("break.sb");
    let stray = b.break_statement();
    let condition = b.bool(true);
    let inner = b.continue_statement();
    let body = b.block(vec![inner]);
    let loop_statement = b.while_statement(condition, body);
    let ctx = context(run_method(b, vec![stray, loop_statement]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::INVALID_BREAK_OR_CONTINUE.code]);
    assert!(matches!(block.statements[0], BoundStatement::Error(_)));
    assert!(matches!(block.statements[1], BoundStatement::While { .. }));
}

#[test]
fn test_return_checks() {
    // void Run() { return 1; }  int Get() { return; }
    let mut b = SyntaxTreeBuilder::new("return.sb");
    let one = b.int(1);
    let ret = b.return_statement(Some(one));
    let body = b.block(vec![ret]);
    let run = b.method("Run", None, vec![], body);
    let int_ty = b.type_name("int");
    let ret = b.return_statement(None);
    let body = b.block(vec![ret]);
    let get = b.method("Get", Some(int_ty), vec![], body);
    let ctx = context(b.finish(vec![run, get]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::UNEXPECTED_RETURN_VALUE.code]);
    let (_, diagnostics) = bind_body(&ctx, "Get");
    assert_eq!(codes(&diagnostics), vec![messages::MISSING_RETURN_VALUE.code]);
}

#[test]
fn test_return_in_finally() {
    // void Run() { try { } finally { return; } }
    let mut b = SyntaxTreeBuilder::new("finally.sb");
    let body = b.block(vec![]);
    let ret = b.return_statement(None);
    let finally = b.block(vec![ret]);
    let try_statement = b.try_statement(body, None, Some(finally));
    let ctx = context(run_method(b, vec![try_statement]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::RETURN_IN_FINALLY.code]);
}

#[test]
fn test_goto_and_labels() {
    // void Run() { top: goto top; goto nowhere; }
    let mut b = SyntaxTreeBuilder::new("goto.sb");
    let jump = b.goto("top");
    let labeled = b.labeled("top", jump);
    let missing = b.goto("nowhere");
    let ctx = context(run_method(b, vec![labeled, missing]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::UNDEFINED_LABEL.code]);
    assert!(matches!(&block.statements[0], BoundStatement::Label { label, .. } if label.name == "top"));
}

#[test]
fn test_implicit_conversion_required() {
    // void Run() { int i = 1.5; decimal d = 1; }
    let mut b = SyntaxTreeBuilder::new("convert.sb");
    let int_ty = b.type_name("int");
    let value = b.decimal(1.5);
    let i = b.local("i", Some(int_ty), Some(value));
    let decimal_ty = b.type_name("decimal");
    let one = b.int(1);
    let d = b.local("d", Some(decimal_ty), Some(one));
    let ctx = context(run_method(b, vec![i, d]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::CANNOT_CONVERT_IMPLICITLY.code]);
    let BoundStatement::LocalDeclaration {
        initializer: Some(initializer),
        ..
    } = &block.statements[1]
    else {
        panic!("expected an initialized local");
    };
    assert!(matches!(initializer.kind, BoundExpressionKind::Cast { .. }));
    assert_eq!(initializer.constant, Some(BoundConstant::new(ConstantValue::Decimal(1.0))));
}

// ============================================================================
// Calls
// ============================================================================

/// Helper: `int Twice(int v) { return v * 2; }` and
/// `void Run() { int r = Twice(<argument>); }`.
fn call_twice(argument: impl FnOnce(&mut SyntaxTreeBuilder) -> NodeId) -> BindingContext {
    let mut b = SyntaxTreeBuilder::new("call.sb");
    let int_ty = b.type_name("int");
    let parameter_ty = b.type_name("int");
    let parameter = b.parameter("v", parameter_ty, None);
    let v = b.name("v");
    let two = b.int(2);
    let product = b.binary(BinaryOperator::Multiply, v, two);
    let ret = b.return_statement(Some(product));
    let body = b.block(vec![ret]);
    let twice = b.method("Twice", Some(int_ty), vec![parameter], body);

    let int_ty = b.type_name("int");
    let callee = b.name("Twice");
    let argument = argument(&mut b);
    let call = b.call(callee, vec![argument]);
    let r = b.local("r", Some(int_ty), Some(call));
    let body = b.block(vec![r]);
    let run = b.method("Run", None, vec![], body);
    context(b.finish(vec![twice, run]), BinderFlags::NONE)
}

#[test]
fn test_call_resolves_method() {
    let ctx = call_twice(|b| b.int(3));
    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
    let BoundStatement::LocalDeclaration {
        initializer: Some(initializer),
        ..
    } = &block.statements[0]
    else {
        panic!("expected an initialized local");
    };
    let BoundExpressionKind::Call { method, arguments, .. } = &initializer.kind else {
        panic!("expected a call, got {:?}", initializer.kind);
    };
    assert_eq!(*method, global(&ctx, "Twice"));
    assert_eq!(arguments.len(), 1);

    let (_, diagnostics) = bind_body(&ctx, "Twice");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
}

#[test]
fn test_named_argument_must_match_parameter() {
    let ctx = call_twice(|b| {
        let value = b.int(3);
        b.named_argument("w", value)
    });
    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::NO_SUCH_PARAMETER.code]);
}

#[test]
fn test_ambiguous_overloads() {
    // void Pick(int a, decimal b) { }  void Pick(decimal a, int b) { }
    // void Run() { Pick(1, 1); }
    let mut b = SyntaxTreeBuilder::new("ambiguous.sb");
    let overload = |b: &mut SyntaxTreeBuilder, first: &str, second: &str| {
        let first = b.type_name(first);
        let a = b.parameter("a", first, None);
        let second = b.type_name(second);
        let p = b.parameter("b", second, None);
        let body = b.block(vec![]);
        b.method("Pick", None, vec![a, p], body)
    };
    let left = overload(&mut b, "int", "decimal");
    let right = overload(&mut b, "decimal", "int");
    let callee = b.name("Pick");
    let one = b.int(1);
    let other = b.int(1);
    let call = b.call(callee, vec![one, other]);
    let statement = b.expression_statement(call);
    let body = b.block(vec![statement]);
    let run = b.method("Run", None, vec![], body);
    let ctx = context(b.finish(vec![left, right, run]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::AMBIGUOUS_OVERLOAD.code]);
}

#[test]
fn test_low_level_call_requires_unsafe_region() {
    // lowlevel void Raw() { }  void Run() { Raw(); }
    let mut b = SyntaxTreeBuilder::new("lowlevel.sb");
    let body = b.block(vec![]);
    let raw = b.method_with(ModifierFlags::LOW_LEVEL, "Raw", None, vec![], body);
    let callee = b.name("Raw");
    let call = b.call(callee, vec![]);
    let statement = b.expression_statement(call);
    let body = b.block(vec![statement]);
    let run = b.method("Run", None, vec![], body);
    let tree = b.finish(vec![raw, run]);

    let ctx = context(tree.clone(), BinderFlags::NONE);
    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::LOW_LEVEL_REQUIRED.code]);

    let ctx = context(tree, BinderFlags::UNSAFE_REGION);
    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert!(diagnostics.is_empty());
}

#[test]
fn test_local_function_callable_before_declaration() {
    // void Run() { int r = Inc(1); int Inc(int v) { return v + 1; } }
    let mut b = SyntaxTreeBuilder::new("local_function.sb");
    let int_ty = b.type_name("int");
    let callee = b.name("Inc");
    let one = b.int(1);
    let call = b.call(callee, vec![one]);
    let r = b.local("r", Some(int_ty), Some(call));
    let return_ty = b.type_name("int");
    let parameter_ty = b.type_name("int");
    let parameter = b.parameter("v", parameter_ty, None);
    let v = b.name("v");
    let one = b.int(1);
    let sum = b.binary(BinaryOperator::Add, v, one);
    let ret = b.return_statement(Some(sum));
    let body = b.block(vec![ret]);
    let inc = b.local_function("Inc", Some(return_ty), vec![parameter], body);
    let ctx = context(run_method(b, vec![r, inc]), BinderFlags::NONE);

    let (block, diagnostics) = bind_body(&ctx, "Run");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
    let BoundStatement::LocalDeclaration {
        initializer: Some(initializer),
        ..
    } = &block.statements[0]
    else {
        panic!("expected an initialized local");
    };
    assert!(matches!(initializer.kind, BoundExpressionKind::LocalFunctionCall { .. }));
    assert!(matches!(block.statements[1], BoundStatement::LocalFunction { .. }));
}

// ============================================================================
// Members
// ============================================================================

#[test]
fn test_private_member_access() {
    // class Vault { private int secret = 1; }  void Run() { int v = Vault.secret; }
    let mut b = SyntaxTreeBuilder::new("access.sb");
    let int_ty = b.type_name("int");
    let one = b.int(1);
    let secret = b.field_with(ModifierFlags::PRIVATE, "secret", Some(int_ty), Some(one));
    let vault = b.class("Vault", vec![], None, vec![secret]);
    let int_ty = b.type_name("int");
    let receiver = b.name("Vault");
    let access = b.member_access(receiver, "secret");
    let v = b.local("v", Some(int_ty), Some(access));
    let body = b.block(vec![v]);
    let run = b.method("Run", None, vec![], body);
    let tree = b.finish(vec![vault, run]);

    let ctx = context(tree.clone(), BinderFlags::NONE);
    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(codes(&diagnostics), vec![messages::MEMBER_INACCESSIBLE.code]);

    let ctx = context(tree, BinderFlags::IGNORE_ACCESSIBILITY);
    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.as_slice());
}

#[test]
fn test_unknown_member_and_symbol() {
    // void Run() { var a = missing; var b = "s".Length; }
    let mut b = SyntaxTreeBuilder::new("unknown.sb");
    let missing = b.name("missing");
    let a = b.local("a", None, Some(missing));
    let text = b.string("s");
    let length = b.member_access(text, "Length");
    let second = b.local("b", None, Some(length));
    let ctx = context(run_method(b, vec![a, second]), BinderFlags::NONE);

    let (_, diagnostics) = bind_body(&ctx, "Run");
    assert_eq!(
        codes(&diagnostics),
        vec![messages::UNDEFINED_SYMBOL.code, messages::NO_SUCH_MEMBER.code]
    );
}

// ============================================================================
// Field constants
// ============================================================================

/// Helper: `class Consts { const int A = B + 1; const int B = 2;
/// const int C = D; const int D = C; }`.
fn constants() -> (BindingContext, SymbolId) {
    let mut b = SyntaxTreeBuilder::new("constants.sb");
    let int_ty = b.type_name("int");
    let b_ref = b.name("B");
    let one = b.int(1);
    let sum = b.binary(BinaryOperator::Add, b_ref, one);
    let a = b.constant_field("A", Some(int_ty), Some(sum));
    let int_ty = b.type_name("int");
    let two = b.int(2);
    let second = b.constant_field("B", Some(int_ty), Some(two));
    let int_ty = b.type_name("int");
    let d_ref = b.name("D");
    let c = b.constant_field("C", Some(int_ty), Some(d_ref));
    let int_ty = b.type_name("int");
    let c_ref = b.name("C");
    let d = b.constant_field("D", Some(int_ty), Some(c_ref));
    let class = b.class("Consts", vec![], None, vec![a, second, c, d]);
    let ctx = context(b.finish(vec![class]), BinderFlags::NONE);
    let class = global(&ctx, "Consts");
    (ctx, class)
}

#[test]
fn test_constant_dependencies_evaluate_first() {
    let (ctx, class) = constants();
    let a = ctx.symbols().lookup_member(class, "A")[0];
    let b = ctx.symbols().lookup_member(class, "B")[0];

    let value = ctx.field_constant(a, &ConstantFieldsInProgress::EMPTY).unwrap();
    assert_eq!(value.value.constant(), Some(&BoundConstant::new(ConstantValue::Int(3))));
    assert!(value.diagnostics.is_empty());
    let dependency = ctx.published_constant(b).unwrap();
    assert_eq!(dependency.value.constant(), Some(&BoundConstant::new(ConstantValue::Int(2))));
}

#[test]
fn test_constant_cycle_reported_once() {
    let (ctx, class) = constants();
    let c = ctx.symbols().lookup_member(class, "C")[0];
    let d = ctx.symbols().lookup_member(class, "D")[0];

    // Asking for the later member still blames the earlier one.
    let late = ctx.field_constant(d, &ConstantFieldsInProgress::EMPTY).unwrap();
    let early = ctx.published_constant(c).unwrap();
    assert!(late.value.is_bad());
    assert!(early.value.is_bad());
    assert_eq!(codes(&early.diagnostics), vec![messages::CIRCULAR_CONSTANT.code]);
    assert!(late.diagnostics.is_empty());
}

#[test]
fn test_in_progress_request_is_recorded_not_evaluated() {
    let (ctx, class) = constants();
    let a = ctx.symbols().lookup_member(class, "A")[0];
    let b = ctx.symbols().lookup_member(class, "B")[0];

    let tracker = ConstantFieldsInProgress::new(a);
    assert!(ctx.field_constant(b, &tracker).is_none());
    assert_eq!(tracker.dependencies(), vec![b]);
    assert!(ctx.published_constant(b).is_none());
}
