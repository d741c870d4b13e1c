//! Shared types and configuration for the artwork identification engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale pixel buffer, paired with explicit dimensions
/// wherever it is passed.
pub type GrayBuffer = Vec<u8>;

/// Key-point ≙ FAST corner + orientation (radians)
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Grid coordinate of a gallery tile, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub row: u32,
    pub col: u32,
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Outcome of verifying one gallery tile against the query. Only the
/// highest-scoring candidate across the whole scan survives selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    /// Gallery file name (the catalog key).
    pub filename: String,
    /// Tile where the strongest match occurred. Diagnostic; most callers
    /// only need the filename.
    pub tile: TileCoord,
    /// Count of geometrically consistent correspondences.
    pub inliers: usize,
}

/// Engine configuration. Every constant of the matching pipeline lives here
/// so boundary behaviour can be exercised without touching source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Center-crop ratio applied to the query image (fraction of each
    /// dimension kept).
    pub crop_ratio: f32,
    /// Query images wider than this are downscaled before cropping.
    pub max_query_width: u32,
    /// FAST segment-test intensity threshold.
    pub fast_threshold: u8,
    /// Patch size for orientation computation (odd).
    pub patch_size: usize,
    /// Keep at most this many keypoints per image or tile.
    pub max_features: usize,
    /// Fewer descriptors than this marks an image/tile unusable.
    pub min_descriptors: usize,
    /// Fewer ratio-test survivors than this discards the tile.
    pub min_matches: usize,
    /// Lowe's ratio: keep a match iff best < ratio * second_best.
    pub lowe_ratio: f32,
    /// RANSAC reprojection tolerance in pixels.
    pub reproj_threshold: f64,
    /// Maximum RANSAC iterations per tile.
    pub ransac_iters: usize,
    /// Seed for the RANSAC sampler; fixed so identical queries give
    /// identical results.
    pub ransac_seed: u64,
    /// A scan result only counts as a match with strictly more inliers
    /// than this.
    pub score_threshold: usize,
    pub n_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crop_ratio: 0.6,
            max_query_width: 1600,
            fast_threshold: 20,
            patch_size: 31,
            max_features: 1000,
            min_descriptors: 10,
            min_matches: 10,
            lowe_ratio: 0.75,
            reproj_threshold: 5.0,
            ransac_iters: 2000,
            ransac_seed: 7,
            score_threshold: 30,
            n_threads: num_cpus::get().max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidCropRatio(f32),
    InvalidThreshold(u8),
    InvalidPatchSize(usize),
    InvalidRatio(f32),
    InvalidReprojThreshold(f64),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidCropRatio(r) => {
                write!(f, "Invalid crop ratio: {} (must be in (0, 1])", r)
            }
            ConfigError::InvalidThreshold(t) => {
                write!(f, "Invalid FAST threshold: {} (must be 1-127)", t)
            }
            ConfigError::InvalidPatchSize(p) => {
                write!(f, "Invalid patch size: {} (must be odd and > 1)", p)
            }
            ConfigError::InvalidRatio(r) => {
                write!(f, "Invalid Lowe ratio: {} (must be in (0, 1))", r)
            }
            ConfigError::InvalidReprojThreshold(t) => {
                write!(f, "Invalid reprojection threshold: {} (must be > 0)", t)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl EngineConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.crop_ratio > 0.0 && self.crop_ratio <= 1.0) {
            return Err(ConfigError::InvalidCropRatio(self.crop_ratio));
        }
        if self.fast_threshold == 0 || self.fast_threshold > 127 {
            return Err(ConfigError::InvalidThreshold(self.fast_threshold));
        }
        if self.patch_size < 3 || self.patch_size % 2 == 0 {
            return Err(ConfigError::InvalidPatchSize(self.patch_size));
        }
        if !(self.lowe_ratio > 0.0 && self.lowe_ratio < 1.0) {
            return Err(ConfigError::InvalidRatio(self.lowe_ratio));
        }
        if self.reproj_threshold <= 0.0 {
            return Err(ConfigError::InvalidReprojThreshold(self.reproj_threshold));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
