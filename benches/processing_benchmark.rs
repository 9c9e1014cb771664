use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use disdro_l1::models::{Dtype, RawField, RawObservationBatch, SensorName, StationAttrs};
use disdro_l1::processors::{L1Processor, MatrixReshaper, RawFieldParser};
use disdro_l1::utils::logging::BatchContext;
use std::sync::Arc;

// Parsivel-like raw strings with varying counts
fn create_raw_rows(n_rows: usize, n_values: usize) -> Vec<String> {
    (0..n_rows)
        .map(|r| {
            (0..n_values)
                .map(|c| format!("{:03}", (r * 7 + c) % 250))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect()
}

fn create_batch(n_rows: usize) -> RawObservationBatch {
    let start = NaiveDate::from_ymd_opt(2018, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let time = (0..n_rows)
        .map(|i| start + chrono::Duration::seconds(30 * i as i64))
        .collect();

    RawObservationBatch::builder(time)
        .raw_column("FieldN", create_raw_rows(n_rows, 32))
        .raw_column("FieldV", create_raw_rows(n_rows, 32))
        .raw_column("RawData", create_raw_rows(n_rows, 1024))
        .build()
        .unwrap()
}

fn benchmark_raw_data_parsing(c: &mut Criterion) {
    let rows = create_raw_rows(500, 1024);
    let parser = RawFieldParser::new();

    c.bench_function("parse_raw_data_500_rows", |b| {
        b.iter(|| {
            let parsed = parser
                .parse(black_box(&rows), RawField::RawData, 1024, Dtype::Int64)
                .unwrap();
            black_box(parsed.len())
        })
    });
}

fn benchmark_reshape(c: &mut Criterion) {
    let rows = create_raw_rows(500, 1024);
    let parser = RawFieldParser::new();

    c.bench_function("parse_and_reshape_raw_data_500_rows", |b| {
        b.iter(|| {
            let parsed = parser
                .parse(&rows, RawField::RawData, 1024, Dtype::Int64)
                .unwrap();
            let reshaped = MatrixReshaper::reshape(parsed, &[32, 32], 500).unwrap();
            black_box(reshaped.shape()[0])
        })
    });
}

fn benchmark_dataset_creation_by_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_dataset_by_rows");
    let attrs = StationAttrs::new("OTT_Parsivel", 46.81, 6.94, 491.0);
    let processor = L1Processor::new();

    for &size in &[10, 100, 1000] {
        let batch = Arc::new(create_batch(size));
        group.bench_with_input(BenchmarkId::new("rows", size), &batch, |b, batch| {
            b.iter(|| {
                let ctx = BatchContext::new("bench", SensorName::OttParsivel);
                let dataset = processor
                    .create_dataset(Arc::clone(batch), &attrs, &ctx)
                    .unwrap();
                black_box(dataset.n_time())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_raw_data_parsing,
    benchmark_reshape,
    benchmark_dataset_creation_by_size
);
criterion_main!(benches);
