use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use remisiones_migrate::record::{transform, LegacyRecord, LegacyStatusPolicy};
use remisiones_migrate::{Document, MemoryStore, MigrationConfig, Migrator, RetryConfig};
use serde_json::{json, Map, Value};
use std::hint::black_box;

fn legacy_document(i: usize) -> Document {
    let mut fields = Map::new();
    fields.insert("estado".into(), json!("En Proceso"));
    fields.insert("cliente".into(), json!(format!("Cliente {i}")));
    fields.insert("monto".into(), Value::from(i * 100));
    for slot in 1..=(i % 20 + 1) {
        fields.insert(format!("servicio{slot}"), json!(format!("Servicio {slot}")));
    }
    for slot in 1..=(i % 10 + 1) {
        fields.insert(format!("tecnico{slot}"), json!(format!("Técnico {slot}")));
    }
    Document::new(format!("R{i:05}"), fields)
}

fn bench_transform(c: &mut Criterion) {
    let records: Vec<LegacyRecord> = (0..1_000)
        .map(|i| LegacyRecord::from_document(&legacy_document(i)))
        .collect();

    c.bench_function("transform_1000_records", |b| {
        b.iter(|| {
            for record in &records {
                black_box(transform(black_box(record), LegacyStatusPolicy::Retain));
            }
        })
    });
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");
    group.sample_size(20);

    for chunk_size in [50, 300, 500] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut config = MigrationConfig::default();
                    config.migration.chunk_size = chunk_size;
                    config.retry = RetryConfig::disabled();
                    let store =
                        MemoryStore::with_collection("remisiones", (0..2_000).map(legacy_document));
                    let migrator = Migrator::new(config, store).unwrap();
                    black_box(migrator.apply(chrono::Utc::now()).unwrap())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_transform, bench_apply);
criterion_main!(benches);
