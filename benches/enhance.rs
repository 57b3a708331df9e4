//! Benchmarks for the enhancement operators and the frame codec.
//!
//! Run with: cargo bench

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use ooo_codec::codec;
use ooo_codec::enhance::{
    enhance, Denoise, LocalContrast, Operator, Saturation, Sharpen, Tone, WhiteBalance,
};
use ooo_codec::presets::PresetRegistry;
use ooo_codec::video::Frame;

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

fn noisy_frame() -> Frame {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut frame = Frame::new_black(WIDTH, HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let base = (x * 255 / WIDTH) as i32;
            let noise: i32 = rng.gen_range(-12..=12);
            let v = (base + noise).clamp(0, 255) as u8;
            frame.set_pixel(x, y, [v, (y * 255 / HEIGHT) as u8, 255 - v]);
        }
    }
    frame
}

fn benchmark_operators(criterion: &mut Criterion) {
    let frame = noisy_frame();
    let params = PresetRegistry::new().resolve("vivid").params;

    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(WhiteBalance::new()),
        Box::new(LocalContrast::new()),
        Box::new(Tone::new()),
        Box::new(Saturation::new()),
        Box::new(Sharpen::new()),
        Box::new(Denoise::new()),
    ];

    for operator in &operators {
        criterion.bench_function(&format!("{} {}x{}", operator.name(), WIDTH, HEIGHT), |bencher| {
            bencher.iter(|| operator.apply(black_box(&frame), &params).map(|out| out.width()));
        });
    }
}

fn benchmark_pipeline(criterion: &mut Criterion) {
    let frame = noisy_frame();
    let registry = PresetRegistry::new();

    for name in ["original", "standard", "crisp"] {
        let preset = registry.resolve(name);
        criterion.bench_function(&format!("pipeline {}", name), |bencher| {
            bencher.iter(|| enhance(black_box(frame.clone()), &preset));
        });
    }
}

fn benchmark_codec(criterion: &mut Criterion) {
    let frame = noisy_frame();
    let bytes = codec::encode_frame(&frame).unwrap();
    let text = codec::to_text(&bytes);

    criterion.bench_function("jpeg encode q90", |bencher| {
        bencher.iter(|| codec::encode_frame(black_box(&frame)).unwrap());
    });

    criterion.bench_function("base64 + jpeg decode", |bencher| {
        bencher.iter(|| {
            let bytes = codec::from_text(0, black_box(&text)).unwrap();
            codec::decode_frame(0, &bytes).unwrap()
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5)).sample_size(20);
    targets = benchmark_operators, benchmark_pipeline, benchmark_codec
}
criterion_main!(benches);
