//! Benchmarks for checksum-walker
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

fn benchmark_checksum_reader(c: &mut Criterion) {
    use checksum_walker::content::checksum_reader;

    let data = vec![0xA5u8; 4 * 1024 * 1024];

    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("sha256_4mib", |b| {
        b.iter(|| {
            let digest = checksum_reader(black_box(&data[..])).unwrap();
            black_box(digest);
        })
    });
    group.finish();
}

fn benchmark_queue_handoff(c: &mut Criterion) {
    use checksum_walker::walker::{work_queue, EntryMeta, WorkItem};

    c.bench_function("rendezvous_handoff", |b| {
        let (tx, rx) = work_queue();
        let consumer = std::thread::spawn(move || for _ in rx.iter() {});

        b.iter(|| {
            tx.send(WorkItem::new("/test/path", EntryMeta::file(1024)))
                .unwrap();
        });

        drop(tx);
        consumer.join().unwrap();
    });
}

fn benchmark_throughput_record(c: &mut Criterion) {
    use checksum_walker::walker::ThroughputCounter;

    c.bench_function("throughput_record", |b| {
        let counter = ThroughputCounter::new();
        b.iter(|| counter.record());
        black_box(counter.rate());
    });
}

criterion_group!(
    benches,
    benchmark_checksum_reader,
    benchmark_queue_handoff,
    benchmark_throughput_record
);
criterion_main!(benches);
