//! Artwork identification engine.
//!
//! Given a visitor photograph and a directory of reference catalog images,
//! decide which artwork the photo depicts. The pipeline is content-based
//! retrieval, not classification: normalize the query, extract binary local
//! features once, then for every gallery image split it into a grid of
//! tiles and score each tile by the number of geometrically consistent
//! descriptor correspondences. The strongest tile across the whole gallery
//! wins, provided it clears the confidence threshold.
//!
//! Tiling is what makes tightly cropped photos work: a picture of one
//! corner of a large canvas still lines up with the tile covering that
//! corner of the reference image.

pub mod backend;
pub mod error;
pub mod preprocess;
pub mod selector;
pub mod tiling;

pub use backend::{MatchBackend, OrbBackend};
pub use error::{EngineError, EngineResult};
pub use selector::select_best;

pub use artmatch_core::{self, EngineConfig, MatchCandidate, TileCoord};

use std::path::Path;
use std::sync::Once;

/// Production grid used by the original deployment.
pub const DEFAULT_GRID_ROWS: u32 = 4;
pub const DEFAULT_GRID_COLS: u32 = 4;

static POOL_INIT: Once = Once::new();

/// Build the global rayon pool on first use. Later calls (or a pool built
/// by the embedding application) leave the existing pool in place.
fn ensure_thread_pool(n_threads: usize) {
    POOL_INIT.call_once(|| {
        let _ = artmatch_core::init_thread_pool(n_threads);
    });
}

/// High-level identification engine: owns the configuration and the
/// feature backend, stateless across queries (the gallery is re-read from
/// disk on every call, never cached).
pub struct ArtworkIdentifier {
    cfg: EngineConfig,
    backend: OrbBackend,
}

impl ArtworkIdentifier {
    pub fn new(cfg: EngineConfig) -> EngineResult<Self> {
        cfg.validate()?;
        ensure_thread_pool(cfg.n_threads);
        let backend = OrbBackend::new(&cfg)?;
        Ok(Self { cfg, backend })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Identify the artwork shown in `query_bytes` against the images in
    /// `gallery_dir`.
    ///
    /// Returns `Ok(None)` when nothing clears the confidence threshold —
    /// including the case of a query too textureless to describe. Undecodable
    /// query bytes are the one fatal error; unreadable gallery files are
    /// skipped silently and the scan continues.
    pub fn identify(
        &self,
        query_bytes: &[u8],
        gallery_dir: &Path,
        rows: u32,
        cols: u32,
    ) -> EngineResult<Option<MatchCandidate>> {
        let img = preprocess::decode_gray(query_bytes)?;
        let img = preprocess::prepare_query(&img, &self.cfg);

        let Some(query) = self.backend.extract(&img) else {
            return Ok(None);
        };

        select_best(&self.backend, &self.cfg, &query, gallery_dir, rows, cols)
    }
}

/// One-shot identification with default configuration and the default
/// 4×4 gallery grid.
pub fn identify(
    query_bytes: &[u8],
    gallery_dir: &Path,
) -> EngineResult<Option<MatchCandidate>> {
    let identifier = ArtworkIdentifier::new(EngineConfig::default())?;
    identifier.identify(query_bytes, gallery_dir, DEFAULT_GRID_ROWS, DEFAULT_GRID_COLS)
}
