//! Benchmark harness for sable binding.
//!
//! Uses criterion for reliable benchmarking.
//! Run with: cargo bench -p sable_compiler

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sable_compiler::Compilation;
use sable_options::CompilationOptions;
use sable_syntax::{BinaryOperator, NodeId, SyntaxTree, SyntaxTreeBuilder};

/// `classes` classes, each with a constant chain and a few methods that
/// call each other:
///
/// ```text
/// class C0 {
///     const int K0 = 1;
///     const int K1 = K0 + 1;
///     int Step(int v) { return v + K1; }
///     int Run() { int total = 0; while (total < 100) { total = Step(total); } return total; }
/// }
/// ```
fn generated_tree(classes: usize) -> SyntaxTree {
    let mut b = SyntaxTreeBuilder::new("bench.sb");
    let members: Vec<NodeId> = (0..classes).map(|index| class(&mut b, index)).collect();
    b.finish(members)
}

fn class(b: &mut SyntaxTreeBuilder, index: usize) -> NodeId {
    let int_ty = b.type_name("int");
    let one = b.int(1);
    let k0 = b.constant_field("K0", Some(int_ty), Some(one));
    let int_ty = b.type_name("int");
    let k0_ref = b.name("K0");
    let one = b.int(1);
    let sum = b.binary(BinaryOperator::Add, k0_ref, one);
    let k1 = b.constant_field("K1", Some(int_ty), Some(sum));

    let int_ty = b.type_name("int");
    let parameter_ty = b.type_name("int");
    let parameter = b.parameter("v", parameter_ty, None);
    let v = b.name("v");
    let k1_ref = b.name("K1");
    let sum = b.binary(BinaryOperator::Add, v, k1_ref);
    let ret = b.return_statement(Some(sum));
    let body = b.block(vec![ret]);
    let step = b.method("Step", Some(int_ty), vec![parameter], body);

    let int_ty = b.type_name("int");
    let local_ty = b.type_name("int");
    let zero = b.int(0);
    let total = b.local("total", Some(local_ty), Some(zero));
    let total_ref = b.name("total");
    let limit = b.int(100);
    let condition = b.binary(BinaryOperator::Less, total_ref, limit);
    let target = b.name("total");
    let callee = b.name("Step");
    let argument = b.name("total");
    let call = b.call(callee, vec![argument]);
    let assign = b.assign(target, call);
    let statement = b.expression_statement(assign);
    let loop_body = b.block(vec![statement]);
    let loop_statement = b.while_statement(condition, loop_body);
    let result = b.name("total");
    let ret = b.return_statement(Some(result));
    let body = b.block(vec![total, loop_statement, ret]);
    let run = b.method("Run", Some(int_ty), vec![], body);

    b.class(&format!("C{index}"), vec![], None, vec![k0, k1, step, run])
}

// ============================================================================
// Binding Benchmarks
// ============================================================================

fn bench_bind_global_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_global_scope");

    for classes in [10, 100, 1000] {
        let tree = generated_tree(classes);
        group.bench_with_input(BenchmarkId::from_parameter(classes), &tree, |b, tree| {
            b.iter(|| {
                let compilation = Compilation::new(tree.clone(), CompilationOptions::default(), None);
                black_box(compilation.bind_global_scope());
            });
        });
    }

    group.finish();
}

// ============================================================================
// Declaration Benchmarks
// ============================================================================

fn bench_declare(c: &mut Criterion) {
    let tree = generated_tree(1000);
    c.bench_function("declare/1000", |b| {
        b.iter(|| black_box(Compilation::new(black_box(tree.clone()), CompilationOptions::default(), None)));
    });
}

criterion_group!(benches, bench_bind_global_scope, bench_declare);
criterion_main!(benches);
