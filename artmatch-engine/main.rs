use artmatch_engine::{
    ArtworkIdentifier, DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS, EngineConfig,
};
use std::path::Path;
use std::time::Instant;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: artmatch <query-image> <gallery-dir> [rows cols]");
        std::process::exit(2);
    }

    let query_path = &args[1];
    let gallery_dir = Path::new(&args[2]);
    let rows: u32 = args.get(3).map_or(DEFAULT_GRID_ROWS, |s| {
        s.parse().expect("rows must be a positive integer")
    });
    let cols: u32 = args.get(4).map_or(DEFAULT_GRID_COLS, |s| {
        s.parse().expect("cols must be a positive integer")
    });

    let query_bytes = std::fs::read(query_path).expect("Query image not found");

    let identifier =
        ArtworkIdentifier::new(EngineConfig::default()).expect("Engine construction failed");

    let t0 = Instant::now();
    let result = identifier
        .identify(&query_bytes, gallery_dir, rows, cols)
        .expect("Identification failed");
    let elapsed = t0.elapsed();

    println!("Scanned gallery {} with a {}x{} grid", gallery_dir.display(), rows, cols);
    println!("Time taken: {:.2?}", elapsed);

    match result {
        Some(candidate) => {
            println!(
                "Best match: {} at tile {} (inliers: {})",
                candidate.filename, candidate.tile, candidate.inliers
            );
        }
        None => println!("No confident match found"),
    }
}
