use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use packfile::{PackEntry, PackReader, PackWriter};
use tempfile::tempdir;

const N: usize = 5_000;
const BUF_SIZE: usize = 100;

fn entry(i: usize) -> PackEntry {
    PackEntry {
        key: format!("source phrase {}", i),
        buf: vec![0x2a; BUF_SIZE],
    }
}

fn pack_append_nosync(c: &mut Criterion) {
    c.bench_function("pack_append_nosync_5k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("table.pack");
                let w = PackWriter::create(&path, 0, false).unwrap();
                (dir, w)
            },
            |(_dir, mut w)| {
                for i in 0..N {
                    w.append(&entry(i)).unwrap();
                }
                w.finish().unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn pack_replay(c: &mut Criterion) {
    c.bench_function("pack_replay_5k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("table.pack");

                let mut w = PackWriter::create(&path, 0, false).unwrap();
                for i in 0..N {
                    w.append(&entry(i)).unwrap();
                }
                w.finish().unwrap();

                (dir, path)
            },
            |(_dir, path)| {
                let mut reader = PackReader::open(&path).unwrap();
                let mut count = 0usize;

                reader
                    .replay(|_e| {
                        count += 1;
                    })
                    .unwrap();

                assert_eq!(count, N);
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, pack_append_nosync, pack_replay);
criterion_main!(benches);
