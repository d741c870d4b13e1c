use crate::backend::MatchBackend;
use crate::error::EngineResult;
use crate::preprocess::{decode_gray, prepare_gallery};
use crate::tiling::tile_grid;
use artmatch_core::{EngineConfig, MatchCandidate};
use artmatch_features::FeatureSet;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Scan the whole gallery (every image × every tile) and keep the candidate
/// with the strictly highest inlier count; return it only when it clears
/// `score_threshold` (strict `>`).
///
/// Filenames are sorted before iteration so the first-encountered-wins
/// tie-break is stable across filesystems; the per-file work is distributed
/// over the rayon pool and reduced without early exit, so a stronger match
/// late in the listing is never missed.
pub fn select_best<B: MatchBackend>(
    backend: &B,
    cfg: &EngineConfig,
    query: &FeatureSet,
    gallery_dir: &Path,
    rows: u32,
    cols: u32,
) -> EngineResult<Option<MatchCandidate>> {
    let mut files: Vec<PathBuf> = fs::read_dir(gallery_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let best = files
        .par_iter()
        .enumerate()
        .filter_map(|(order, path)| {
            scan_file(backend, cfg, query, path, rows, cols).map(|c| (order, c))
        })
        .reduce_with(|a, b| {
            // Higher score wins; equal scores go to the earlier filename in
            // sorted order.
            if b.1.inliers > a.1.inliers || (b.1.inliers == a.1.inliers && b.0 < a.0) {
                b
            } else {
                a
            }
        });

    Ok(best
        .map(|(_, candidate)| candidate)
        .filter(|candidate| candidate.inliers > cfg.score_threshold))
}

/// Best-scoring tile of one gallery file, or `None` when the file is
/// unreadable or no tile produces a verifiable match. Within a file, ties
/// keep the earliest tile in row-major order.
fn scan_file<B: MatchBackend>(
    backend: &B,
    cfg: &EngineConfig,
    query: &FeatureSet,
    path: &Path,
    rows: u32,
    cols: u32,
) -> Option<MatchCandidate> {
    let bytes = fs::read(path).ok()?;
    let img = decode_gray(&bytes).ok()?;
    let img = prepare_gallery(&img);

    let filename = path.file_name()?.to_string_lossy().into_owned();
    let mut best: Option<MatchCandidate> = None;

    for (coord, tile) in tile_grid(&img, rows, cols) {
        let Some(tile_features) = backend.extract(&tile) else {
            continue;
        };
        let matches = backend.correspondences(query, &tile_features);
        if matches.len() < cfg.min_matches {
            continue;
        }
        let Some(inliers) = backend.verify(query, &tile_features, &matches) else {
            continue;
        };

        if best.as_ref().is_none_or(|b| inliers > b.inliers) {
            best = Some(MatchCandidate { filename: filename.clone(), tile: coord, inliers });
        }
    }

    best
}
