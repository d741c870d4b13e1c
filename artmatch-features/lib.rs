//! Local-feature stack for artwork identification: FAST keypoint detection,
//! rotated BRIEF binary descriptors and Hamming-distance matching with
//! Lowe's ratio test.

pub mod descriptor;
pub mod detector;
pub mod error;
pub mod matcher;

pub use descriptor::DescriptorExtractor;
pub use detector::{KeypointDetector, ScoredKeypoint};
pub use error::{FeatureError, FeatureResult};
pub use matcher::{Correspondence, hamming_distance, match_descriptors};

use artmatch_core::{Descriptor, Keypoint};

/// Keypoints and their descriptors, always produced together and always of
/// equal cardinality.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
