//! Parse/serialize throughput against serde_json on the three payload
//! shapes that matter: small network messages, a medium API response, and
//! a large log batch.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use jsondom::{ArenaDocument, SerializeOptions};

const MESSAGE: &str =
    r#"{"type":"scan","bssid":"aa:bb:cc:dd:ee:ff","rssi":-42,"channel":36,"ssid":"Net_7"}"#;

fn medium_payload() -> String {
    let records: Vec<String> = (0..100)
        .map(|i| {
            format!(
                r#"{{"id":{i},"name":"device-{i}","seen":[{},{},{}],"score":{}.5,"active":{}}}"#,
                i * 3,
                i * 3 + 1,
                i * 3 + 2,
                i % 100,
                i % 2 == 0
            )
        })
        .collect();
    format!("{{\"records\":[{}]}}", records.join(","))
}

fn large_payload() -> String {
    let lines: Vec<String> = (0..2000)
        .map(|i| {
            format!(
                r#"{{"ts":1726000000{i:03},"level":"info","msg":"request completed with status 200 in {i} ms","path":"/api/v1/items/{i}"}}"#
            )
        })
        .collect();
    format!("[{}]", lines.join(","))
}

fn bench_parse(c: &mut Criterion) {
    let medium = medium_payload();
    let large = large_payload();
    let cases = [
        ("message_84b", MESSAGE.to_owned()),
        ("medium_10kb", medium),
        ("large_300kb", large),
    ];

    let mut group = c.benchmark_group("parse");
    for (name, input) in &cases {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(format!("jsondom/{name}"), |b| {
            b.iter(|| jsondom::parse(black_box(input)).unwrap())
        });
        group.bench_function(format!("jsondom_arena/{name}"), |b| {
            let mut doc = ArenaDocument::with_capacity(16 * 1024);
            b.iter(|| {
                doc.parse(black_box(input)).unwrap();
                let n = doc.root().len();
                doc.reset();
                n
            })
        });
        group.bench_function(format!("serde_json/{name}"), |b| {
            b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(input)).unwrap())
        });
    }
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let large = large_payload();
    let ours = jsondom::parse(&large).unwrap();
    let theirs: serde_json::Value = serde_json::from_str(&large).unwrap();

    let mut group = c.benchmark_group("serialize");
    group.throughput(Throughput::Bytes(large.len() as u64));
    group.bench_function("jsondom/compact", |b| {
        b.iter(|| jsondom::to_string(black_box(&ours), &SerializeOptions::compact()))
    });
    group.bench_function("jsondom/pretty", |b| {
        b.iter(|| black_box(&ours).dump(2))
    });
    group.bench_function("serde_json/compact", |b| {
        b.iter(|| serde_json::to_string(black_box(&theirs)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_serialize);
criterion_main!(benches);
