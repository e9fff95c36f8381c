//! FILENAME: core/crosstab-engine/benches/pivot_calculations.rs
//! Assembly throughput on synthetic lead data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crosstab_engine::{
    assemble_json, AggregationType, FlatInputRow, Normalizer, PivotAssembler, PivotConfiguration,
    ValueLayout,
};
use serde_json::{json, Value};

const COMMUNITIES: usize = 200;
const SOURCES: [&str; 6] = ["web", "app", "referral", "walk_in", "phone", "agent"];

fn build_rows(rows: usize) -> Vec<FlatInputRow> {
    (0..rows)
        .map(|i| {
            let year = 2022 + (i % 3);
            let quarter = 1 + (i / 3) % 4;
            FlatInputRow::new()
                .with("community", format!("community-{:03}", i % COMMUNITIES))
                .with("source", SOURCES[i % SOURCES.len()])
                .with("year", year.to_string())
                .with("quarter", format!("Q{}", quarter))
                .with("created_at", format!("{}-{:02}-{:02}T10:00:00Z", year, 1 + i % 12, 1 + i % 28))
                .with("id_count", (i % 17) as f64)
                .with("budget_sum", (i % 1000) as f64 * 12.5)
        })
        .collect()
}

fn build_payload(rows: usize) -> Value {
    let result: Vec<Value> = (0..rows)
        .map(|i| {
            json!({
                "community": format!("community-{:03}", i % COMMUNITIES),
                "source": SOURCES[i % SOURCES.len()],
                "id_count": i % 17,
            })
        })
        .collect();
    json!({ "result": result })
}

fn two_level_config() -> PivotConfiguration {
    PivotConfiguration::new("bench")
        .with_row_fields(["community", "source"])
        .with_column_fields(["year", "quarter"])
        .with_value_field("id", AggregationType::Count)
        .with_value_field("budget", AggregationType::Sum)
}

fn bench_two_level(c: &mut Criterion) {
    let normalizer = Normalizer::default();
    let config = two_level_config();
    let separate = two_level_config().with_value_layout(ValueLayout::Separate);

    let mut group = c.benchmark_group("two_level_crosstab");
    for rows in [1_000usize, 10_000, 100_000] {
        let data = build_rows(rows);
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("merged", rows), &data, |b, data| {
            let assembler = PivotAssembler::new(&config, &normalizer);
            b.iter(|| black_box(assembler.assemble(black_box(data))))
        });
        group.bench_with_input(BenchmarkId::new("separate", rows), &data, |b, data| {
            let assembler = PivotAssembler::new(&separate, &normalizer);
            b.iter(|| black_box(assembler.assemble(black_box(data))))
        });
    }
    group.finish();
}

fn bench_temporal_rows(c: &mut Criterion) {
    let normalizer = Normalizer::default();
    let config = PivotConfiguration::new("by day")
        .with_row_fields(["created_at"])
        .with_column_fields(["source"])
        .with_value_field("id", AggregationType::Count);
    let data = build_rows(50_000);

    c.bench_function("temporal_row_keys_50k", |b| {
        let assembler = PivotAssembler::new(&config, &normalizer);
        b.iter(|| black_box(assembler.assemble(black_box(&data))))
    });
}

fn bench_from_payload(c: &mut Criterion) {
    let config = PivotConfiguration::new("payload")
        .with_row_fields(["community"])
        .with_column_fields(["source"])
        .with_value_field("id", AggregationType::Count);
    let payload = build_payload(50_000);

    c.bench_function("assemble_json_50k", |b| {
        b.iter(|| black_box(assemble_json(&config, black_box(&payload))))
    });
}

criterion_group!(benches, bench_two_level, bench_temporal_rows, bench_from_payload);
criterion_main!(benches);
