//! Throughput of the keypad and scanner stream decoders.
//!
//! ```sh
//! cargo bench -p smartlock-keypad --bench stream_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use smartlock_keypad::{BarcodeCodec, KeyStreamCodec, ScanKey, ScannerFilter};
use std::hint::black_box;
use tokio_util::codec::Decoder;

/// PIN entries as the keypad listener sends them, one char per key.
fn keypad_stream(entries: usize) -> Vec<u8> {
    "12345678O".repeat(entries).into_bytes()
}

fn barcode_stream(lines: usize) -> Vec<u8> {
    "AC:3D:FF:A0\r\n".repeat(lines).into_bytes()
}

fn bench_key_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_stream");

    for entries in [1, 10, 100] {
        let input = keypad_stream(entries);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(entries), &input, |b, input| {
            b.iter(|| {
                let mut codec = KeyStreamCodec::new();
                let mut buffer = BytesMut::from(&input[..]);
                let mut keys = 0;
                while let Some(key) = codec.decode(&mut buffer).unwrap() {
                    black_box(key);
                    keys += 1;
                }
                keys
            });
        });
    }

    group.finish();
}

fn bench_barcode_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("barcode_lines");

    for lines in [1, 10, 100] {
        let input = barcode_stream(lines);
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &input, |b, input| {
            b.iter(|| {
                let mut codec = BarcodeCodec::new();
                let mut buffer = BytesMut::from(&input[..]);
                while let Some(line) = codec.decode(&mut buffer).unwrap() {
                    black_box(line);
                }
            });
        });
    }

    group.finish();
}

/// Split delivery: the serial line hands the decoder a few bytes at a time.
fn bench_barcode_fragmented(c: &mut Criterion) {
    let input = barcode_stream(50);

    c.bench_function("barcode_fragmented", |b| {
        b.iter(|| {
            let mut codec = BarcodeCodec::new();
            let mut buffer = BytesMut::new();
            for chunk in input.chunks(3) {
                buffer.extend_from_slice(chunk);
                while let Some(line) = codec.decode(&mut buffer).unwrap() {
                    black_box(line);
                }
            }
        });
    });
}

fn bench_scanner_filter(c: &mut Criterion) {
    let keys: Vec<ScanKey> = "AC:3D:FF:A0"
        .chars()
        .map(ScanKey::Char)
        .chain([ScanKey::Tab, ScanKey::Enter])
        .collect();

    c.bench_function("scanner_filter", |b| {
        b.iter(|| {
            let mut filter = ScannerFilter::new();
            let mut out = BytesMut::with_capacity(16);
            filter.feed_all(black_box(keys.iter().copied()), &mut out);
            out
        });
    });
}

criterion_group!(
    benches,
    bench_key_stream,
    bench_barcode_lines,
    bench_barcode_fragmented,
    bench_scanner_filter
);
criterion_main!(benches);
