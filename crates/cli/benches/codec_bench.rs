use criterion::{criterion_group, criterion_main, Criterion};
use record::{build_dictionary, Decoder, Encoder, RawRecord, RecordPool};

const GROUP: usize = 50;

fn group() -> Vec<RawRecord> {
    (0..GROUP)
        .map(|i| {
            RawRecord::parse_line(&format!(
                "das haus ||| the house number {} ||| 0.{} 0.25 0.125 0.5 ||| 0-0 1-1 2-{} ||| 10 4 1",
                i % 7,
                i + 1,
                i % 3
            ))
            .unwrap()
        })
        .collect()
}

fn codec_encode_group(c: &mut Criterion) {
    let records = group();
    let dict = build_dictionary(&records).unwrap();
    let enc = Encoder::new(&dict);
    c.bench_function("codec_encode_group_50", |b| {
        b.iter(|| enc.encode_group(&records).unwrap());
    });
}

fn codec_decode_pooled(c: &mut Criterion) {
    let records = group();
    let dict = build_dictionary(&records).unwrap();
    let buf = Encoder::new(&dict).encode_group(&records).unwrap();
    let dec = Decoder::new(&dict, 4, 0);
    let pool = RecordPool::new();
    c.bench_function("codec_decode_group_50_pooled", |b| {
        b.iter(|| {
            let decoded = dec.decode(&buf, &pool).unwrap();
            assert_eq!(decoded.len(), GROUP);
        });
    });
}

fn codec_decode_fresh_pool(c: &mut Criterion) {
    let records = group();
    let dict = build_dictionary(&records).unwrap();
    let buf = Encoder::new(&dict).encode_group(&records).unwrap();
    let dec = Decoder::new(&dict, 4, 0);
    c.bench_function("codec_decode_group_50_fresh_pool", |b| {
        b.iter(|| {
            let pool = RecordPool::new();
            let decoded = dec.decode(&buf, &pool).unwrap();
            assert_eq!(decoded.len(), GROUP);
        });
    });
}

criterion_group!(
    benches,
    codec_encode_group,
    codec_decode_pooled,
    codec_decode_fresh_pool,
);
criterion_main!(benches);
