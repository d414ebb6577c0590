use blobtrack_core::{Calibration, Image, Shape};
use blobtrack_detect::{detect_blocked, DetectorConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn blob_field(width: usize, height: usize, spacing: usize, sigma: f64) -> Image {
    let shape = Shape::planar(width, height).unwrap();
    let mut img = Image::zeros(shape);
    let two_s2 = 2.0 * sigma * sigma;
    for cy in (spacing / 2..height).step_by(spacing) {
        for cx in (spacing / 2..width).step_by(spacing) {
            let reach = (4.0 * sigma).ceil() as i64;
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let p = [cx as i64 + dx, cy as i64 + dy];
                    if let Some(v) = img.get(&p) {
                        let add = 100.0 * (-((dx * dx + dy * dy) as f64) / two_s2).exp();
                        img.set(&p, v + add as f32);
                    }
                }
            }
        }
    }
    img
}

fn bench_blocked(c: &mut Criterion) {
    let img = blob_field(512, 512, 24, 2.0);
    let view = img.view();
    let interval = view.interval();
    let cal = Calibration::default();
    let base = DetectorConfig::new(2.0 * 2f64.sqrt(), 10.0).with_num_threads(4);

    let mut group = c.benchmark_group("detect_blocked_512");
    group.sample_size(10);
    for nsplit in [1, 2, 4] {
        let cfg = base.with_nsplit(nsplit);
        group.bench_function(format!("nsplit_{nsplit}"), |b| {
            b.iter(|| detect_blocked(black_box(&view), &interval, &cal, &cfg).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_blocked);
criterion_main!(benches);
