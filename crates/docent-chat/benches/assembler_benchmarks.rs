//! Benchmarks for the streaming hot path and document fingerprinting.
//!
//! Every fragment rewrites the growing answer in the log, so the per-fragment
//! cost grows with the answer length. These benchmarks track that cost for a
//! long answer, plus the cost of hashing a document-sized buffer.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use docent_chat::{fingerprint_bytes, MessageLog, StreamAssembler, Utf8Decoder};
use docent_core::types::ExchangeId;

/// Fragments resembling a token stream: short words with the odd multi-byte char.
fn generate_fragments(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 7 {
            0 => "The ".to_string(),
            1 => "document ".to_string(),
            2 => "describes ".to_string(),
            3 => "naïve ".to_string(),
            4 => "results ".to_string(),
            5 => format!("#{i} "),
            _ => "café.\n".to_string(),
        })
        .collect()
}

fn bench_fragment_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_assembly");
    group.measurement_time(Duration::from_secs(5));

    for count in [100usize, 1000] {
        let fragments = generate_fragments(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("finalize_per_fragment", count), &fragments, |b, fragments| {
            b.iter(|| {
                let id = ExchangeId(1);
                let mut log = MessageLog::new();
                log.begin_exchange("question", "Thinking...", id);
                let mut assembler = StreamAssembler::new(id);
                for fragment in fragments {
                    let running = assembler.push_text(fragment);
                    log.finalize(running, id);
                }
                log
            });
        });
    }

    group.finish();
}

fn bench_utf8_decoding(c: &mut Criterion) {
    let text: String = generate_fragments(1000).concat();
    let bytes = text.as_bytes();

    let mut group = c.benchmark_group("utf8_decoding");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    // Odd chunk size so multi-byte characters regularly straddle a boundary.
    group.bench_function("split_every_7_bytes", |b| {
        b.iter(|| {
            let mut decoder = Utf8Decoder::new();
            let mut out = String::with_capacity(bytes.len());
            for chunk in bytes.chunks(7) {
                out.push_str(&decoder.decode(chunk).unwrap());
            }
            decoder.finish().unwrap();
            out
        });
    });

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for size in [64 * 1024usize, 4 * 1024 * 1024] {
        let document: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("sha256", size), &document, |b, document| {
            b.iter(|| fingerprint_bytes(document));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fragment_assembly,
    bench_utf8_decoding,
    bench_fingerprint
);
criterion_main!(benches);
