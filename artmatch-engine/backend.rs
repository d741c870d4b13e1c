use artmatch_core::EngineConfig;
use artmatch_features::{
    Correspondence, DescriptorExtractor, FeatureResult, FeatureSet, KeypointDetector,
    match_descriptors,
};
use artmatch_geometry::{RansacParams, fit_ransac};
use image::GrayImage;

/// Capability seam between the scan logic and the concrete feature
/// algorithms. The selector only sees this trait, so the binary-descriptor
/// stack can be swapped without touching tiling or selection.
pub trait MatchBackend: Sync {
    /// Extract keypoints and descriptors, or `None` when the region is
    /// unusable (too little texture to describe).
    fn extract(&self, img: &GrayImage) -> Option<FeatureSet>;

    /// Ratio-test-filtered descriptor correspondences, query → candidate.
    fn correspondences(&self, query: &FeatureSet, candidate: &FeatureSet) -> Vec<Correspondence>;

    /// Geometric consistency score for the given correspondences, or `None`
    /// when no projective model explains them.
    fn verify(
        &self,
        query: &FeatureSet,
        candidate: &FeatureSet,
        matches: &[Correspondence],
    ) -> Option<usize>;
}

/// Default backend: FAST + rotated BRIEF + Hamming ratio matching +
/// RANSAC-fitted homography.
pub struct OrbBackend {
    detector: KeypointDetector,
    extractor: DescriptorExtractor,
    min_descriptors: usize,
    lowe_ratio: f32,
    ransac: RansacParams,
}

impl OrbBackend {
    pub fn new(cfg: &EngineConfig) -> FeatureResult<Self> {
        let detector =
            KeypointDetector::new(cfg.fast_threshold, cfg.patch_size, cfg.max_features)?;
        Ok(Self {
            detector,
            extractor: DescriptorExtractor::new(),
            min_descriptors: cfg.min_descriptors,
            lowe_ratio: cfg.lowe_ratio,
            ransac: RansacParams {
                max_iters: cfg.ransac_iters,
                inlier_threshold: cfg.reproj_threshold,
                seed: cfg.ransac_seed,
            },
        })
    }
}

impl MatchBackend for OrbBackend {
    fn extract(&self, img: &GrayImage) -> Option<FeatureSet> {
        let (w, h) = img.dimensions();
        // Buffer length always matches dimensions for a decoded image.
        let keypoints = self.detector.detect(img.as_raw(), w as usize, h as usize).ok()?;
        let descriptors = self.extractor.describe(img.as_raw(), w as usize, h as usize, &keypoints);
        if descriptors.len() < self.min_descriptors {
            return None;
        }
        Some(FeatureSet { keypoints, descriptors })
    }

    fn correspondences(&self, query: &FeatureSet, candidate: &FeatureSet) -> Vec<Correspondence> {
        match_descriptors(&query.descriptors, &candidate.descriptors, self.lowe_ratio)
    }

    fn verify(
        &self,
        query: &FeatureSet,
        candidate: &FeatureSet,
        matches: &[Correspondence],
    ) -> Option<usize> {
        let src: Vec<[f64; 2]> = matches
            .iter()
            .map(|m| {
                let kp = query.keypoints[m.query_idx];
                [kp.x as f64, kp.y as f64]
            })
            .collect();
        let dst: Vec<[f64; 2]> = matches
            .iter()
            .map(|m| {
                let kp = candidate.keypoints[m.candidate_idx];
                [kp.x as f64, kp.y as f64]
            })
            .collect();

        fit_ransac(&src, &dst, &self.ransac).ok().map(|fit| fit.inlier_count)
    }
}
