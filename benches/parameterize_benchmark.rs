use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pg_keen::parameterize::{NamedQuery, TemplateCache, extract};
use serde_json::json;
use std::hint::black_box;

// A report-style template: many repeated names, casts and a trailing comment.
fn build_template(predicates: usize) -> String {
    let mut sql = String::from("SELECT id, created_at::date FROM events WHERE tenant = :tenant");
    for i in 0..predicates {
        sql.push_str(&format!(
            "\n  AND (payload->>'k{i}' = :filters.k{i} OR :filters.k{i} IS NULL)"
        ));
    }
    sql.push_str("\n  -- AND deleted_at < :cutoff\nORDER BY created_at DESC");
    sql
}

fn benchmark_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    for predicates in [1usize, 10, 50] {
        let template = build_template(predicates);

        group.bench_with_input(
            BenchmarkId::new("uncached", predicates),
            &template,
            |b, template| b.iter(|| extract(black_box(template))),
        );

        let cache = TemplateCache::default();
        group.bench_with_input(
            BenchmarkId::new("cached", predicates),
            &template,
            |b, template| b.iter(|| cache.extract(black_box(template))),
        );
    }
    group.finish();
}

fn benchmark_bind(c: &mut Criterion) {
    let template = build_template(10);
    let filters: serde_json::Map<String, serde_json::Value> = (0..10)
        .map(|i| (format!("k{i}"), json!(i)))
        .collect();
    let params = json!({ "tenant": 7, "filters": filters });
    let query = NamedQuery::new(&template);

    c.bench_function("bind_prepared_template", |b| {
        b.iter(|| query.bind(black_box(&params)));
    });
}

criterion_group!(benches, benchmark_extract, benchmark_bind);
criterion_main!(benches);
