//! Benchmarks dos estágios locais do pipeline.
//!
//! Testa performance de:
//! - Parse da resposta do oráculo
//! - Deduplicação por URL
//! - Geração do relatório Markdown
//!
//! Executar: `cargo bench --bench pipeline_bench`

use ai_safety_events::dedup::remove_duplicates;
use ai_safety_events::export::{to_json, to_markdown};
use ai_safety_events::scoring::parse_batch_reply;
use ai_safety_events::types::{QueryResult, Record, ScoreLevel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HELPERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn create_reply(items: usize) -> String {
    (1..=items)
        .map(|i| {
            format!(
                "Item {}:\nScore: {}\nExplanation: Upcoming workshop on AI alignment, deadline December {}. Clear participation details.",
                i,
                [0, 6, 7, 8, 9, 10][i % 6],
                i % 28 + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn create_groups(queries: usize, per_query: usize, distinct_urls: usize) -> Vec<QueryResult> {
    (0..queries)
        .map(|q| {
            let results = (0..per_query)
                .map(|i| {
                    let id = (q * per_query + i) % distinct_urls;
                    let mut record = Record::new(
                        format!("AI Safety Event {} <{}>", id, q),
                        format!("https://events{}.org/page/{}", id % 10, id),
                        "Workshop & training on alignment, interpretability and \"evals\"...",
                    );
                    record.apply_score(ScoreLevel::ALL[id % ScoreLevel::ALL.len()], "Clear dates.");
                    record
                })
                .collect();
            QueryResult::new(format!("query {}", q), results)
        })
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Parse da resposta
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_parse_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_batch_reply");

    for items in [1, 10, 50] {
        let reply = create_reply(items);
        group.throughput(Throughput::Bytes(reply.len() as u64));
        group.bench_with_input(BenchmarkId::new("well_formed", items), &reply, |b, reply| {
            b.iter(|| black_box(parse_batch_reply(reply, items)))
        });
    }

    let garbled = create_reply(10).replace("Score: 8", "Score: eight");
    group.bench_function("partially_garbled_10", |b| {
        b.iter(|| black_box(parse_batch_reply(&garbled, 10)))
    });

    group.finish();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Deduplicação
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_duplicates");

    for (queries, per_query) in [(15, 10), (50, 20)] {
        let groups = create_groups(queries, per_query, queries * per_query / 2);
        group.throughput(Throughput::Elements((queries * per_query) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", queries, per_query)),
            &groups,
            |b, groups| b.iter(|| black_box(remove_duplicates(groups.clone()))),
        );
    }

    group.finish();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Export
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let groups = create_groups(15, 10, 150);

    group.bench_function("to_markdown_150", |b| b.iter(|| black_box(to_markdown(&groups))));
    group.bench_function("to_json_150", |b| b.iter(|| black_box(to_json(&groups))));

    group.finish();
}

criterion_group!(benches, bench_parse_reply, bench_dedup, bench_export);
criterion_main!(benches);
