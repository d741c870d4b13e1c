use artmatch_core::ConfigError;
use artmatch_features::FeatureError;

/// Fatal, caller-surfaced failures. Per-file and per-tile conditions
/// (unreadable gallery entries, unusable regions, unresolved geometry) are
/// handled by skipping and never reach this type.
#[derive(Debug)]
pub enum EngineError {
    /// The query bytes could not be decoded into pixels.
    Decode(image::ImageError),
    /// The gallery directory itself could not be listed.
    Gallery(std::io::Error),
    Config(ConfigError),
    Feature(FeatureError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Decode(e) => write!(f, "Query decode error: {}", e),
            EngineError::Gallery(e) => write!(f, "Gallery directory error: {}", e),
            EngineError::Config(e) => write!(f, "Configuration error: {}", e),
            EngineError::Feature(e) => write!(f, "Feature stage error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<image::ImageError> for EngineError {
    fn from(err: image::ImageError) -> Self {
        EngineError::Decode(err)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Gallery(err)
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

impl From<FeatureError> for EngineError {
    fn from(err: FeatureError) -> Self {
        EngineError::Feature(err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
