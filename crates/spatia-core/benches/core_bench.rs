//! Criterion benchmarks for spatia-core DSP primitives
//!
//! Run with: cargo bench -p spatia-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spatia_core::{
    AllpassFilter, BiquadFilter, BiquadType, SampleDelayLine, convolution_kernel,
    crossfade_convolution_kernel, multiplication_addition_kernel,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];
const RESPONSE_LENGTHS: &[usize] = &[32, 128, 256];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("BiquadFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("highshelf", block_size),
            &block_size,
            |b, _| {
                let mut filter = BiquadFilter::new(SAMPLE_RATE);
                filter.configure(BiquadType::Highshelf, 606.5, -35.0, 0.5);
                b.iter(|| {
                    for &sample in &input {
                        black_box(filter.tick(black_box(sample)));
                    }
                });
            },
        );
    }

    // Per-block reconfiguration cost, as done by occlusion updates
    group.bench_function("configure", |b| {
        let mut filter = BiquadFilter::new(SAMPLE_RATE);
        b.iter(|| {
            filter.configure(
                BiquadType::Highshelf,
                black_box(606.5),
                black_box(-35.0),
                0.5,
            );
        });
    });

    group.finish();
}

fn bench_allpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("AllpassFilter");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("tick", block_size),
            &block_size,
            |b, _| {
                let mut ap = AllpassFilter::with_coefficient(SampleDelayLine::new(557), 0.5);
                b.iter(|| {
                    for &sample in &input {
                        black_box(ap.tick(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("nested", block_size),
            &block_size,
            |b, _| {
                let mut outer = AllpassFilter::with_coefficient(SampleDelayLine::new(557), 0.5);
                let mut inner = AllpassFilter::with_coefficient(SampleDelayLine::new(241), 0.4);
                b.iter(|| {
                    for &sample in &input {
                        let v = outer.begin_nested_tick();
                        let w = inner.tick(v);
                        black_box(outer.end_nested_tick(black_box(sample), w));
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("Kernels");

    for &block_size in BLOCK_SIZES {
        let src = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("multiplication_addition", block_size),
            &block_size,
            |b, _| {
                let mut dst = vec![0.0; block_size];
                b.iter(|| multiplication_addition_kernel(black_box(0.7), &src, &mut dst));
            },
        );
    }

    for &len in RESPONSE_LENGTHS {
        let block_size = 256;
        let input = generate_test_signal(block_size + len - 1);
        let from: Vec<f32> = (0..len).map(|i| 1.0 / (1.0 + i as f32)).collect();
        let to: Vec<f32> = from.iter().rev().copied().collect();

        group.bench_with_input(BenchmarkId::new("convolution", len), &len, |b, _| {
            let mut output = vec![0.0; block_size];
            b.iter(|| convolution_kernel(black_box(&input), &mut output, &from));
        });

        group.bench_with_input(
            BenchmarkId::new("crossfade_convolution", len),
            &len,
            |b, _| {
                let mut output = vec![0.0; block_size];
                b.iter(|| crossfade_convolution_kernel(black_box(&input), &mut output, &from, &to));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_biquad, bench_allpass, bench_kernels);
criterion_main!(benches);
