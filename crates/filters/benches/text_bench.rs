use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use textscrub_filters::{
    mask_pii, FilterConfig, LanguageDetector, RecordFilter, WhatlangDetector, WhitespaceTokenizer,
};

fn sample_texts() -> Vec<&'static str> {
    vec![
        "The quick brown fox jumps over the lazy dog",
        "Contact me at someone@example.com or admin@example.org for details.",
        "Server 192.168.0.12 rejected the request from 10.0.0.7 twice.",
        "Este es un texto en español que debería ser detectado correctamente.",
        "   Multiple   spaces   and   tabs\t\there   ",
        "café résumé naïve",
    ]
}

fn bench_mask_pii(c: &mut Criterion) {
    let texts = sample_texts();
    let mut group = c.benchmark_group("mask_pii");

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("mixed", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(mask_pii(text));
            }
        });
    });

    group.finish();
}

fn bench_record_filter(c: &mut Criterion) {
    let texts = sample_texts();
    let mut group = c.benchmark_group("record_filter");

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("whatlang_whitespace", |b| {
        let filter =
            RecordFilter::new(FilterConfig::default(), Box::new(WhatlangDetector::default()))
                .unwrap();
        let tokenizer = WhitespaceTokenizer;
        b.iter(|| {
            for text in &texts {
                black_box(filter.evaluate(text, &tokenizer).unwrap());
            }
        });
    });

    group.bench_function("detect_only", |b| {
        let detector = WhatlangDetector::default();
        b.iter(|| {
            for text in &texts {
                let _ = black_box(detector.detect(text));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_mask_pii, bench_record_filter);
criterion_main!(benches);
