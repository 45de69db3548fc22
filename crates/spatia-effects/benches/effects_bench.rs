//! Criterion benchmarks for spatia effects
//!
//! Run with: cargo bench -p spatia-effects
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use spatia_effects::{Diffuser, ThreeBandEq};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_three_band_eq(c: &mut Criterion) {
    let mut group = c.benchmark_group("ThreeBandEq");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        for channels in [1usize, 2, 8] {
            group.bench_with_input(
                BenchmarkId::new(format!("{channels}ch"), block_size),
                &block_size,
                |b, &size| {
                    let mut eq = ThreeBandEq::new(SAMPLE_RATE, channels).unwrap();
                    eq.set_lowband_db(3.0);
                    eq.set_midband_db(-2.0);
                    eq.set_highband_db(-6.0);
                    let inputs: Vec<&[f32]> = (0..channels).map(|_| input.as_slice()).collect();
                    let mut storage = vec![vec![0.0f32; size]; channels];
                    b.iter(|| {
                        let mut outputs: Vec<&mut [f32]> =
                            storage.iter_mut().map(Vec::as_mut_slice).collect();
                        eq.process(black_box(&inputs), &mut outputs);
                        black_box(&outputs);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_diffuser(c: &mut Criterion) {
    let mut group = c.benchmark_group("Diffuser");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("stereo", block_size),
            &block_size,
            |b, _| {
                let mut diffuser = Diffuser::new(SAMPLE_RATE);
                diffuser.set_diffusion(0.7);
                diffuser.set_spread_ms(2.0);
                let mut left = input.clone();
                let mut right = input.clone();
                b.iter(|| {
                    diffuser.process_stereo(black_box(&mut left), black_box(&mut right));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_three_band_eq, bench_diffuser);
criterion_main!(benches);
