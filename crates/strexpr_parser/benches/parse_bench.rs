use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strexpr_ast::types::TypeDescriptor;
use strexpr_checker::Registry;
use strexpr_options::ParseOptions;
use strexpr_parser::{parse_lambda, Signature};
use strexpr_scanner::tokenize;

// An expression touching literals, casts, static calls, conditionals and
// object creation.
const EXPRESSION: &str = "(x, y) => (int)(Math.Pow(x, 2) + Math.Sqrt(y) + Math.PI) > 10 \
    ? new List<int>() { 1, 2, 3 }.Count + (x > y ? x : y) * 2 \
    : -1 + ~(5 + 1) << 2";

fn bench_parse_expression(c: &mut Criterion) {
    let registry = Registry::standard();
    let options = ParseOptions::with_namespaces(["System", "System.Collections.Generic"]);
    let signature = Signature::new(vec![TypeDescriptor::int(), TypeDescriptor::int()], TypeDescriptor::int());

    c.bench_function("tokenize_expression", |b| {
        b.iter(|| black_box(tokenize(black_box(EXPRESSION))));
    });

    let tokens = tokenize(EXPRESSION).unwrap();
    c.bench_function("parse_expression", |b| {
        b.iter(|| {
            let lambda = parse_lambda(black_box(&tokens), &signature, registry.as_ref(), &options);
            black_box(lambda);
        });
    });
}

criterion_group!(benches, bench_parse_expression);
criterion_main!(benches);
