use artmatch_core::GrayBuffer;
use artmatch_features::{DescriptorExtractor, KeypointDetector, match_descriptors};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Synthetic gallery-like image: smooth gradient plus a lattice of bright
/// blocks so the detector has realistic work to do.
fn benchmark_image(width: usize, height: usize) -> GrayBuffer {
    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let gradient = ((x as f32 / width as f32) * 60.0) as u8;
            img[y * width + x] = 90 + gradient + ((x + y) % 5) as u8;
        }
    }
    for cy in (10..height - 10).step_by(17) {
        for cx in (10..width - 10).step_by(17) {
            for dy in 0..3 {
                for dx in 0..3 {
                    img[(cy + dy) * width + cx + dx] = 245;
                }
            }
        }
    }
    img
}

fn bench_detect(c: &mut Criterion) {
    let detector = KeypointDetector::new(20, 31, 1000).unwrap();
    let mut group = c.benchmark_group("detect");
    for size in [128usize, 256, 512] {
        let img = benchmark_image(size, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &img, |b, img| {
            b.iter(|| detector.detect(black_box(img), size, size).unwrap());
        });
    }
    group.finish();
}

fn bench_detect_and_describe(c: &mut Criterion) {
    let detector = KeypointDetector::new(20, 31, 1000).unwrap();
    let extractor = DescriptorExtractor::new();
    let img = benchmark_image(512, 512);
    c.bench_function("detect_and_describe_512", |b| {
        b.iter(|| {
            let kps = detector.detect(black_box(&img), 512, 512).unwrap();
            extractor.describe(&img, 512, 512, &kps)
        });
    });
}

fn bench_match(c: &mut Criterion) {
    let detector = KeypointDetector::new(20, 31, 1000).unwrap();
    let extractor = DescriptorExtractor::new();
    let img = benchmark_image(512, 512);
    let kps = detector.detect(&img, 512, 512).unwrap();
    let descs = extractor.describe(&img, 512, 512, &kps);
    c.bench_function("match_descriptors_self", |b| {
        b.iter(|| match_descriptors(black_box(&descs), black_box(&descs), 0.75));
    });
}

criterion_group!(benches, bench_detect, bench_detect_and_describe, bench_match);
criterion_main!(benches);
