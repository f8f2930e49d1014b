use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;
use tinywaf::filter::NoopObserver;
use tinywaf::{BanTable, DecisionEngine, FilterRules};

// Typical scanner paths; a realistic config has a few dozen of these.
const PATTERNS: &[&str] = &[
    r"^/wp-admin/.*",
    r"^/wp-login\.php",
    r"^/xmlrpc\.php",
    r"^/\.env",
    r"^/\.git/",
    r"^/phpmyadmin",
    r"^/cgi-bin/",
    r"\.(asp|aspx|jsp)$",
];

fn engine() -> DecisionEngine {
    let rules = FilterRules::from_settings(PATTERNS, 15).unwrap();
    DecisionEngine::new(rules, Arc::new(BanTable::new()), Arc::new(NoopObserver))
}

fn decide_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");
    group.throughput(Throughput::Elements(1));

    let clean = engine();
    group.bench_function("pass", |b| {
        b.iter(|| clean.decide(black_box("198.51.100.1"), black_box("/blog/2024/01/post.html"), Instant::now()))
    });

    let banned = engine();
    banned.decide("198.51.100.2", "/wp-admin/", Instant::now());
    group.bench_function("already_banned", |b| {
        b.iter(|| banned.decide(black_box("198.51.100.2"), black_box("/"), Instant::now()))
    });

    let fresh = engine();
    let mut n = 0u64;
    group.bench_function("new_match", |b| {
        b.iter(|| {
            n += 1;
            let client = format!("10.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff);
            fresh.decide(&client, black_box("/.env"), Instant::now())
        })
    });

    group.finish();
}

criterion_group!(benches, decide_benchmark);
criterion_main!(benches);
