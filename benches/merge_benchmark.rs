//! Performance benchmarks for the merge engine and host file parsers
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use saptune::param::merge::{self, Constraint};
use saptune::param::{LimitBound, SemaphoreLimits};
use saptune::system::LimitsFile;

fn bench_merge_max(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_max");

    for count in [2usize, 4, 64, 4096] {
        let values: Vec<u64> = (0..count as u64).map(|i| i.wrapping_mul(2654435761) % 1_000_000).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &values, |b, values| {
            b.iter(|| merge::max(black_box(values)))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let constraints = [
        Constraint::live(4096),
        Constraint::formula(16384 * 1024 * 1024),
        Constraint::baseline(20 * 1024 * 1024 * 1024),
        Constraint::site(2048),
    ];

    c.bench_function("resolve_shmmax", |b| b.iter(|| merge::resolve(black_box(&constraints))));
}

fn bench_semaphore(c: &mut Criterion) {
    let floor = SemaphoreLimits::new(1250, 256000, 100, 8192);

    c.bench_function("semaphore_parse_raise", |b| {
        b.iter(|| {
            let live: SemaphoreLimits = black_box("250 32000 32 128").parse().unwrap();
            live.raised_to(&floor).to_string()
        })
    });
}

fn bench_limits_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("limits_conf");

    for lines in [10usize, 100, 1000] {
        let mut content = String::from("# /etc/security/limits.conf\n");
        for i in 0..lines {
            content.push_str(&format!("@group{}\tsoft\tnofile\t{}\n", i, 1024 + i));
        }
        content.push_str("@sapsys\t-\tnofile\t65536\n");

        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_get_set", lines), &content, |b, content| {
            b.iter(|| {
                let mut file = LimitsFile::parse(black_box(content));
                let soft = file.get("@sapsys", LimitBound::Soft, "nofile").unwrap_or(0);
                file.set("@sapsys", LimitBound::Soft, "nofile", soft.max(32800));
                file.to_string()
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_merge_max,
    bench_resolve,
    bench_semaphore,
    bench_limits_file
);

criterion_main!(benches);
