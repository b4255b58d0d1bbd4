use criterion::{criterion_group, criterion_main, Criterion};
use rand::prelude::*;

use twinkly::{
    color::{NormalizeMode, Rgb},
    device::datagram::{frame_datagrams, MAX_CHUNK_SIZE},
    device::DeviceGeneration,
    frame::PixelFrame,
};

fn random_frame(width: usize, height: usize) -> PixelFrame {
    let mut rng = rand::rng();
    let mut frame = PixelFrame::new(width, height, Rgb::BLACK);

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            frame.set(x, y, Rgb::new(rng.random(), rng.random(), rng.random()));
        }
    }

    frame
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let (width, height) = (20, 21);
    let frame = random_frame(width, height);
    let token = [0u8; 8];

    c.bench_function(&format!("{}x{} rgb", width, height), |b| {
        b.iter(|| frame.to_byte_array(3))
    });

    c.bench_function(&format!("{}x{} rgbw standard", width, height), |b| {
        b.iter(|| frame.to_byte_array_normalized(4, NormalizeMode::Standard))
    });

    c.bench_function(&format!("{}x{} datagrams", width, height), |b| {
        let payload = frame.to_byte_array(3);

        b.iter(|| frame_datagrams(DeviceGeneration::V3, &token, &payload, MAX_CHUNK_SIZE))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
