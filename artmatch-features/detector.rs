use artmatch_core::{GrayBuffer, Keypoint};
use crate::error::{FeatureError, FeatureResult};
use rayon::prelude::*;

/// Keypoint with corner response score for NMS and feature capping
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: f32,
}

/// FAST-16 segment-test detector with intensity-centroid orientation.
///
/// Unlike a detector bound to fixed dimensions, this one takes the image
/// size per call: gallery tiles come in many sizes and the same detector
/// instance is reused across all of them.
pub struct KeypointDetector {
    threshold: u8,
    patch_size: usize,
    max_keypoints: usize,
}

/// Images smaller than this in either dimension yield no keypoints
/// (FAST needs a 3-pixel ring plus margin).
const MIN_DIM: usize = 7;

/// Minimum spacing between surviving keypoints, in pixels.
const NMS_DISTANCE: f32 = 3.0;

impl KeypointDetector {
    pub fn new(threshold: u8, patch_size: usize, max_keypoints: usize) -> FeatureResult<Self> {
        if threshold == 0 || threshold > 127 {
            return Err(FeatureError::InvalidThreshold(threshold));
        }
        if patch_size < 3 || patch_size % 2 == 0 {
            return Err(FeatureError::InvalidPatchSize(patch_size));
        }
        Ok(Self { threshold, patch_size, max_keypoints })
    }

    /// Detect up to `max_keypoints` oriented corners, strongest first.
    ///
    /// A degenerate image (too small for the segment test) produces an
    /// empty set, not an error; the caller treats it as unusable.
    pub fn detect(&self, img: &GrayBuffer, w: usize, h: usize) -> FeatureResult<Vec<Keypoint>> {
        let scored = self.detect_with_response(img, w, h)?;
        let mut suppressed = non_maximum_suppression(&scored, NMS_DISTANCE);
        suppressed.truncate(self.max_keypoints);
        Ok(suppressed.into_iter().map(|sk| sk.keypoint).collect())
    }

    /// Detect corners with their response scores, unsuppressed and uncapped.
    pub fn detect_with_response(
        &self,
        img: &GrayBuffer,
        w: usize,
        h: usize,
    ) -> FeatureResult<Vec<ScoredKeypoint>> {
        let expected_len = w * h;
        if img.len() != expected_len {
            return Err(FeatureError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        if w < MIN_DIM || h < MIN_DIM {
            return Ok(Vec::new());
        }

        // Bresenham circle of radius 3 around the candidate pixel.
        const OFF: [(i32, i32); 16] = [
            (-3, 0), (-3, 1), (-2, 2), (-1, 3),
            (0, 3), (1, 3), (2, 2), (3, 1),
            (3, 0), (3, -1), (2, -2), (1, -3),
            (0, -3), (-1, -3), (-2, -2), (-3, -1),
        ];

        let threshold = self.threshold;
        let keypoints = (3..h - 3)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut v = Vec::new();
                for x in 3..w - 3 {
                    let p = img[y * w + x];
                    let mut bri = 0;
                    let mut drk = 0;
                    let mut bri_sum = 0i32;
                    let mut drk_sum = 0i32;

                    for &(dx, dy) in &OFF {
                        let xx = (x as i32 + dx) as usize;
                        let yy = (y as i32 + dy) as usize;
                        let q = img[yy * w + xx];

                        if q >= p.saturating_add(threshold) {
                            bri += 1;
                            bri_sum += (q as i32) - (p as i32);
                        } else if q.saturating_add(threshold) <= p {
                            drk += 1;
                            drk_sum += (p as i32) - (q as i32);
                        }
                    }

                    if bri >= 12 || drk >= 12 {
                        let response = if bri >= 12 {
                            bri_sum as f32 / bri as f32
                        } else {
                            drk_sum as f32 / drk as f32
                        };
                        let angle = self.orientation(img, w, h, x, y);
                        v.push(ScoredKeypoint {
                            keypoint: Keypoint { x: x as f32, y: y as f32, angle },
                            response: response.abs(),
                        });
                    }
                }
                v
            })
            .collect();

        Ok(keypoints)
    }

    /// Intensity-centroid orientation over the configured patch. Corners too
    /// close to the border for a full patch get a zero angle.
    fn orientation(&self, img: &GrayBuffer, w: usize, h: usize, x: usize, y: usize) -> f32 {
        let half = (self.patch_size / 2) as i32;
        let (cx, cy) = (x as i32, y as i32);

        if cx - half < 0 || cy - half < 0 || cx + half >= w as i32 || cy + half >= h as i32 {
            return 0.0;
        }

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        for dy in -half..=half {
            let yy = (cy + dy) as usize;
            for dx in -half..=half {
                let xx = (cx + dx) as usize;
                let val = img[yy * w + xx] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        (m01 as f32).atan2(m10 as f32)
    }
}

/// Greedy non-maximum suppression: strongest responses claim their
/// neighbourhood first. Output stays ordered strongest-first.
fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
    if keypoints.is_empty() {
        return Vec::new();
    }

    let mut sorted = keypoints.to_vec();
    sorted.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<ScoredKeypoint> = Vec::new();
    let min_distance_sq = min_distance * min_distance;

    for candidate in sorted {
        let crowded = kept.iter().any(|accepted| {
            let dx = candidate.keypoint.x - accepted.keypoint.x;
            let dy = candidate.keypoint.y - accepted.keypoint.y;
            dx * dx + dy * dy < min_distance_sq
        });
        if !crowded {
            kept.push(candidate);
        }
    }

    kept
}
