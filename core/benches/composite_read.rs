use std::io::{Cursor, Read, Seek, SeekFrom};

use composite_core::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const TOTAL: usize = 4 * 1024 * 1024;

fn build(segment_size: usize) -> CompositeStream {
    let segments = (0..TOTAL / segment_size)
        .map(|i| Segment::new(Cursor::new(vec![(i % 251) as u8; segment_size])))
        .collect();
    CompositeStream::new(segments)
}

fn bench_sequential_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_read");
    group.throughput(Throughput::Bytes(TOTAL as u64));

    for segment_size in [4 * 1024, 64 * 1024, 1024 * 1024] {
        let mut stream = build(segment_size);
        let mut buf = vec![0u8; 256 * 1024];
        group.bench_with_input(BenchmarkId::from_parameter(segment_size), &segment_size, |b, _| {
            b.iter(|| {
                stream.seek(SeekFrom::Start(0)).unwrap();
                while stream.read(&mut buf).unwrap() > 0 {
                    black_box(&buf);
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sequential_read);
criterion_main!(benches);
