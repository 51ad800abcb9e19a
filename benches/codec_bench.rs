//! Codec 벤치마크
//!
//! 배치 인코딩 및 JSON 응답 디코딩 성능 측정

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use jmxquery::query::{decode_response, encode_batch, presets, MetricQuery};
use std::hint::black_box;

fn response_json(rows: usize) -> String {
    let entries: Vec<String> = (0..rows)
        .map(|i| {
            format!(
                r#"{{"metricName":"kafka_topic_bytes_in","metricLabels":{{"topic":"t{i}","broker":"1"}},"mBeanName":"kafka.server:type=BrokerTopicMetrics,name=BytesInPerSec,topic=t{i}","attribute":"Count","attributeType":"Long","value":{}}}"#,
                i * 1024
            )
        })
        .collect();
    format!("[{}]", entries.join(","))
}

fn benchmark_encode(c: &mut Criterion) {
    let jvm = presets::jvm_queries();
    let labeled: Vec<MetricQuery> = (0..100)
        .map(|i| {
            MetricQuery::new(format!("kafka.server:type=BrokerTopicMetrics,topic=t{}", i))
                .with_attribute("Count")
                .with_metric_name("kafka_topic_{attribute}")
                .with_label("topic", "{topic}")
                .with_label("cluster", "prod")
        })
        .collect();

    let mut group = c.benchmark_group("encode_batch");
    group.bench_function("jvm_preset", |b| b.iter(|| encode_batch(black_box(&jvm))));
    group.bench_function("labeled_100", |b| {
        b.iter(|| encode_batch(black_box(&labeled)))
    });
    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_response");

    for rows in [1, 100, 1000] {
        let json = response_json(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &json, |b, json| {
            b.iter(|| decode_response(black_box(json)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_encode, benchmark_decode);
criterion_main!(benches);
