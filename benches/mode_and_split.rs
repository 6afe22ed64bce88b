//! Benchmarks for MODE tokenizing and outbound message splitting.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use muc_channel::mode::parse_mode_string;
use muc_channel::pending::MessageKind;
use muc_channel::send::split_for_send;

const SIMPLE_FLAGS: &str = "+im-t";
const FULL_BATCH: &str = "+ovh alice bob carol";
const LIMIT_AND_KEY: &str = "+lk 50 hunter2";
const LONG_PRIVILEGE_BATCH: &str = "+ooovvv alice bob carol dave erin frank";

fn benchmark_mode_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("MODE parsing");

    group.bench_function("simple_flags", |b| {
        b.iter(|| {
            let tokens = parse_mode_string(black_box(SIMPLE_FLAGS)).unwrap();
            black_box(tokens)
        })
    });

    group.bench_function("privilege_batch", |b| {
        b.iter(|| {
            let tokens = parse_mode_string(black_box(FULL_BATCH)).unwrap();
            black_box(tokens)
        })
    });

    group.bench_function("limit_and_key", |b| {
        b.iter(|| {
            let tokens = parse_mode_string(black_box(LIMIT_AND_KEY)).unwrap();
            black_box(tokens)
        })
    });

    group.bench_function("long_privilege_batch", |b| {
        b.iter(|| {
            let tokens = parse_mode_string(black_box(LONG_PRIVILEGE_BATCH)).unwrap();
            black_box(tokens)
        })
    });

    group.finish();
}

fn benchmark_send_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("send splitting");

    let short = "hello there";
    let long = "a".repeat(800);
    let multiline = "line one\nline two\nline three\nline four";
    let unicode = "caf\u{e9} \u{20ac}100 \u{1f44b}".repeat(20);

    let cases = [
        ("short", short),
        ("long_single_line", long.as_str()),
        ("multiline", multiline),
        ("unicode_heavy", unicode.as_str()),
    ];

    for (name, text) in cases {
        group.bench_with_input(BenchmarkId::new("normal", name), text, |b, s| {
            b.iter(|| {
                let chunks = split_for_send(MessageKind::Normal, black_box("#channel"), black_box(s), 400);
                black_box(chunks)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_mode_parsing, benchmark_send_split);
criterion_main!(benches);
