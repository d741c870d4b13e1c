use artmatch_core::{Descriptor, GrayBuffer, Keypoint};
use rayon::prelude::*;

const DESCRIPTOR_BITS: usize = 256;

/// Largest offset a test pair may reach from the keypoint center.
const PAIR_RADIUS: i32 = 13;

/// Seed for the pair layout. Fixed: descriptors are only comparable when
/// both sides use the same pairs.
const PAIR_SEED: u64 = 0x5EED_0F_A27;

/// Rotated BRIEF descriptor extractor: 256 intensity comparisons per
/// keypoint, steered by the keypoint orientation, sampled bilinearly.
pub struct DescriptorExtractor {
    pairs: Vec<(i32, i32, i32, i32)>,
}

impl Default for DescriptorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorExtractor {
    pub fn new() -> Self {
        Self { pairs: generate_test_pairs() }
    }

    /// Compute one descriptor per keypoint, index-aligned with the input.
    pub fn describe(
        &self,
        img: &GrayBuffer,
        w: usize,
        h: usize,
        kps: &[Keypoint],
    ) -> Vec<Descriptor> {
        kps.par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (cx, cy) = (kp.x, kp.y);
                let mut d = [0u8; 32];

                for (i, &(dx1, dy1, dx2, dy2)) in self.pairs.iter().enumerate() {
                    let (rx1, ry1) = (
                        cx + c * dx1 as f32 - s * dy1 as f32,
                        cy + s * dx1 as f32 + c * dy1 as f32,
                    );
                    let (rx2, ry2) = (
                        cx + c * dx2 as f32 - s * dy2 as f32,
                        cy + s * dx2 as f32 + c * dy2 as f32,
                    );

                    let val1 = bilinear_sample(img, w, h, rx1, ry1);
                    let val2 = bilinear_sample(img, w, h, rx2, ry2);

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect()
    }
}

/// Deterministic pseudo-random test-pair layout inside the patch disk.
fn generate_test_pairs() -> Vec<(i32, i32, i32, i32)> {
    let span = (2 * PAIR_RADIUS + 1) as u64;
    let mut state = PAIR_SEED ^ 0x9E3779B97F4A7C15;
    let mut next_offset = || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((state >> 33) % span) as i32 - PAIR_RADIUS
    };

    let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
    while pairs.len() < DESCRIPTOR_BITS {
        let p = (next_offset(), next_offset(), next_offset(), next_offset());
        // A pair comparing a pixel with itself carries no information.
        if (p.0, p.1) != (p.2, p.3) {
            pairs.push(p);
        }
    }
    pairs
}

/// Bilinear interpolation for subpixel sampling, clamped at the borders.
fn bilinear_sample(img: &GrayBuffer, w: usize, h: usize, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = x0 + 1.0;
    let y1 = y0 + 1.0;

    if x0 < 0.0 || y0 < 0.0 || x1 >= w as f32 || y1 >= h as f32 {
        let cx = x.round().clamp(0.0, (w - 1) as f32) as usize;
        let cy = y.round().clamp(0.0, (h - 1) as f32) as usize;
        return img[cy * w + cx] as f32;
    }

    let dx = x - x0;
    let dy = y - y0;

    let x0_idx = x0 as usize;
    let y0_idx = y0 as usize;
    let x1_idx = (x1 as usize).min(w - 1);
    let y1_idx = (y1 as usize).min(h - 1);

    let p00 = img[y0_idx * w + x0_idx] as f32;
    let p10 = img[y0_idx * w + x1_idx] as f32;
    let p01 = img[y1_idx * w + x0_idx] as f32;
    let p11 = img[y1_idx * w + x1_idx] as f32;

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;

    top * (1.0 - dy) + bottom * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_image(width: usize, height: usize) -> GrayBuffer {
        (0..width * height)
            .map(|i| {
                let x = i % width;
                let y = i / width;
                ((x * 37 + y * 101 + (x * y) % 29) % 256) as u8
            })
            .collect()
    }

    #[test]
    fn test_pair_layout_is_stable() {
        let a = generate_test_pairs();
        let b = generate_test_pairs();
        assert_eq!(a.len(), DESCRIPTOR_BITS);
        assert_eq!(a, b);
        for &(x1, y1, x2, y2) in &a {
            assert!(x1.abs() <= PAIR_RADIUS && y1.abs() <= PAIR_RADIUS);
            assert!(x2.abs() <= PAIR_RADIUS && y2.abs() <= PAIR_RADIUS);
            assert_ne!((x1, y1), (x2, y2));
        }
    }

    #[test]
    fn test_one_descriptor_per_keypoint() {
        let extractor = DescriptorExtractor::new();
        let img = textured_image(64, 64);
        let kps = vec![
            Keypoint { x: 20.0, y: 20.0, angle: 0.0 },
            Keypoint { x: 32.0, y: 40.0, angle: 1.2 },
            Keypoint { x: 50.0, y: 15.0, angle: -0.7 },
        ];
        let descs = extractor.describe(&img, 64, 64, &kps);
        assert_eq!(descs.len(), kps.len());
    }

    #[test]
    fn test_same_keypoint_same_descriptor() {
        let extractor = DescriptorExtractor::new();
        let img = textured_image(64, 64);
        let kp = Keypoint { x: 30.0, y: 30.0, angle: 0.4 };
        let a = extractor.describe(&img, 64, 64, &[kp]);
        let b = extractor.describe(&img, 64, 64, &[kp]);
        assert_eq!(a[0], b[0]);
    }

    #[test]
    fn test_distinct_locations_differ() {
        let extractor = DescriptorExtractor::new();
        let img = textured_image(64, 64);
        let kps = vec![
            Keypoint { x: 20.0, y: 20.0, angle: 0.0 },
            Keypoint { x: 45.0, y: 45.0, angle: 0.0 },
        ];
        let descs = extractor.describe(&img, 64, 64, &kps);
        assert_ne!(descs[0], descs[1]);
    }

    #[test]
    fn test_border_keypoint_does_not_panic() {
        let extractor = DescriptorExtractor::new();
        let img = textured_image(32, 32);
        let kps = vec![
            Keypoint { x: 0.0, y: 0.0, angle: 0.0 },
            Keypoint { x: 31.0, y: 31.0, angle: 2.0 },
        ];
        let descs = extractor.describe(&img, 32, 32, &kps);
        assert_eq!(descs.len(), 2);
    }
}
