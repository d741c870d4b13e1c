//! Projective geometric verification: homography estimation via DLT with
//! Hartley normalization, wrapped in a RANSAC loop whose inlier count is the
//! match score. Sampling is driven by a seeded deterministic generator so a
//! given correspondence set always verifies to the same score.

use nalgebra::{DMatrix, Matrix3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    TooFewPoints { needed: usize, got: usize },
    LengthMismatch { src: usize, dst: usize },
    NumericalFailure,
    NoModel,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::TooFewPoints { needed, got } => {
                write!(f, "too few correspondences: need {}, got {}", needed, got)
            }
            GeometryError::LengthMismatch { src, dst } => {
                write!(f, "point sets differ in length: {} vs {}", src, dst)
            }
            GeometryError::NumericalFailure => write!(f, "numerical failure in estimation"),
            GeometryError::NoModel => write!(f, "no consistent model found"),
        }
    }
}

impl std::error::Error for GeometryError {}

pub type GeometryResult<T> = Result<T, GeometryError>;

/// Parameters of the robust fit.
#[derive(Debug, Clone)]
pub struct RansacParams {
    pub max_iters: usize,
    /// Reprojection tolerance in pixels.
    pub inlier_threshold: f64,
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self { max_iters: 2000, inlier_threshold: 5.0, seed: 7 }
    }
}

/// Outcome of a successful robust fit.
#[derive(Debug, Clone)]
pub struct RansacFit {
    pub homography: Matrix3<f64>,
    pub inlier_mask: Vec<bool>,
    pub inlier_count: usize,
}

/// Apply a homography to a 2D point: H * [x, y, 1]^T, dehomogenized.
pub fn project(h: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let q = h * Vector3::new(p[0], p[1], 1.0);
    if q[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [q[0] / q[2], q[1] / q[2]]
}

fn reprojection_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
    let p = project(h, src);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

/// Hartley conditioning: centroid to origin, mean distance sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (t, normalized)
}

/// Estimate a homography mapping `src` onto `dst` from ≥4 correspondences
/// via the Direct Linear Transform.
pub fn estimate_homography(src: &[[f64; 2]], dst: &[[f64; 2]]) -> GeometryResult<Matrix3<f64>> {
    if src.len() != dst.len() {
        return Err(GeometryError::LengthMismatch { src: src.len(), dst: dst.len() });
    }
    let n = src.len();
    if n < 4 {
        return Err(GeometryError::TooFewPoints { needed: 4, got: n });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let [sx, sy] = src_n[i];
        let [dx, dy] = dst_n[i];

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // h is the eigenvector of A^T A with the smallest eigenvalue. Working on
    // the 9x9 normal matrix sidesteps thin-SVD dimension headaches.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);

    let mut min_idx = 0;
    let mut min_val = eig.eigenvalues[0].abs();
    for i in 1..9 {
        let v = eig.eigenvalues[i].abs();
        if v < min_val {
            min_val = v;
            min_idx = i;
        }
    }

    let h_norm = Matrix3::from_fn(|r, c| eig.eigenvectors[(r * 3 + c, min_idx)]);

    let t_dst_inv = t_dst.try_inverse().ok_or(GeometryError::NumericalFailure)?;
    let h = t_dst_inv * h_norm * t_src;

    let scale = h[(2, 2)];
    if scale.abs() < 1e-15 {
        Ok(h)
    } else {
        Ok(h / scale)
    }
}

/// Fit a homography robustly and report its inlier support. Failure to find
/// any model is a normal outcome for an unrelated point set; callers treat
/// it as "this tile contributes no score".
pub fn fit_ransac(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    params: &RansacParams,
) -> GeometryResult<RansacFit> {
    if src.len() != dst.len() {
        return Err(GeometryError::LengthMismatch { src: src.len(), dst: dst.len() });
    }
    let n = src.len();
    if n < 4 {
        return Err(GeometryError::TooFewPoints { needed: 4, got: n });
    }

    let mut best_count = 0usize;
    let mut best_mask = vec![false; n];
    let mut best_h: Option<Matrix3<f64>> = None;

    for iter in 0..params.max_iters {
        let idx = sample_unique_indices(n, 4, params.seed.wrapping_add(iter as u64 + 1));
        let s4: Vec<[f64; 2]> = idx.iter().map(|&i| src[i]).collect();
        let d4: Vec<[f64; 2]> = idx.iter().map(|&i| dst[i]).collect();

        let h = match estimate_homography(&s4, &d4) {
            Ok(h) => h,
            Err(_) => continue,
        };

        let mut mask = vec![false; n];
        let mut count = 0usize;
        for i in 0..n {
            if reprojection_error(&h, src[i], dst[i]) < params.inlier_threshold {
                mask[i] = true;
                count += 1;
            }
        }

        if count > best_count {
            best_count = count;
            best_mask = mask;
            best_h = Some(h);

            // Past 90% support more sampling cannot change the winner much.
            if count * 10 > n * 9 {
                break;
            }
        }
    }

    let best_h = best_h.ok_or(GeometryError::NoModel)?;
    if best_count < 4 {
        return Err(GeometryError::NoModel);
    }

    // Refit on the consensus set, then recount against the refined model.
    let in_src: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| src[i]).collect();
    let in_dst: Vec<[f64; 2]> = (0..n).filter(|&i| best_mask[i]).map(|i| dst[i]).collect();
    let refined = estimate_homography(&in_src, &in_dst).unwrap_or(best_h);

    let mut final_mask = vec![false; n];
    let mut final_count = 0usize;
    for i in 0..n {
        if reprojection_error(&refined, src[i], dst[i]) < params.inlier_threshold {
            final_mask[i] = true;
            final_count += 1;
        }
    }

    Ok(RansacFit {
        homography: refined,
        inlier_mask: final_mask,
        inlier_count: final_count,
    })
}

/// Draw `k` distinct indices in [0, n) from a splitmix-style generator.
fn sample_unique_indices(n: usize, k: usize, seed: u64) -> Vec<usize> {
    let mut out = Vec::with_capacity(k);
    let mut used = vec![false; n];
    let mut state = seed ^ 0x9E3779B97F4A7C15;
    while out.len() < k {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let idx = ((state >> 32) as usize) % n;
        if !used[idx] {
            used[idx] = true;
            out.push(idx);
        }
    }
    out
}
