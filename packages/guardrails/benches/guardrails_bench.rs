use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plinth_guardrails::evaluate;
use plinth_registry::SurfaceRegistry;
use plinth_schema::{parse_document, NodeSpec, RequestDocument};

fn wide_document(columns: usize, rows: usize) -> RequestDocument {
    RequestDocument::new(
        (0..columns)
            .map(|c| {
                NodeSpec::frame(
                    format!("column-{}", c),
                    (0..rows)
                        .map(|r| NodeSpec::text(format!("cell-{}-{}", c, r), "Lorem ipsum"))
                        .collect(),
                )
            })
            .collect(),
    )
}

fn bench_evaluate(c: &mut Criterion) {
    let registry = SurfaceRegistry::new();
    let surface = registry.default_surface();
    let document = wide_document(20, 10);
    let raw = serde_json::to_string(&document).unwrap();

    c.bench_function("evaluate_220_nodes", |b| {
        b.iter(|| evaluate(black_box(&document), black_box(raw.len()), surface))
    });

    c.bench_function("parse_and_evaluate_220_nodes", |b| {
        b.iter(|| {
            let doc = parse_document(black_box(&raw)).unwrap();
            evaluate(&doc, raw.len(), surface)
        })
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
