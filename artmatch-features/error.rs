#[derive(Debug, Clone)]
pub enum FeatureError {
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidThreshold(u8),
    InvalidPatchSize(usize),
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            FeatureError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be 1-127)", t)
            }
            FeatureError::InvalidPatchSize(p) => {
                write!(f, "Invalid patch size: {} (must be odd and > 1)", p)
            }
        }
    }
}

impl std::error::Error for FeatureError {}

pub type FeatureResult<T> = Result<T, FeatureError>;
