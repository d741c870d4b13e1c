use artmatch_core::TileCoord;
use image::{GrayImage, imageops};

/// Partition a gallery image into a `rows × cols` grid of equal,
/// non-overlapping tiles, row-major. Tile dimensions come from integer
/// division, so remainder pixels at the right and bottom edges are dropped.
/// A grid too fine for the image (tile dimension would be zero) yields no
/// tiles at all.
pub fn tile_grid(img: &GrayImage, rows: u32, cols: u32) -> Vec<(TileCoord, GrayImage)> {
    if rows == 0 || cols == 0 {
        return Vec::new();
    }
    let (w, h) = img.dimensions();
    let tile_w = w / cols;
    let tile_h = h / rows;
    if tile_w == 0 || tile_h == 0 {
        return Vec::new();
    }

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let tile =
                imageops::crop_imm(img, col * tile_w, row * tile_h, tile_w, tile_h).to_image();
            tiles.push((TileCoord { row, col }, tile));
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn indexed_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| image::Luma([((x + y * 13) % 256) as u8]))
    }

    #[test]
    fn test_grid_shape_and_order() {
        let img = indexed_image(40, 30);
        let tiles = tile_grid(&img, 3, 4);
        assert_eq!(tiles.len(), 12);
        // Row-major: coordinates enumerate columns fastest.
        let coords: Vec<(u32, u32)> = tiles.iter().map(|(c, _)| (c.row, c.col)).collect();
        assert_eq!(coords[0], (0, 0));
        assert_eq!(coords[1], (0, 1));
        assert_eq!(coords[4], (1, 0));
        for (_, tile) in &tiles {
            assert_eq!(tile.dimensions(), (10, 10));
        }
    }

    #[test]
    fn test_remainder_pixels_are_dropped() {
        let img = indexed_image(41, 31);
        let tiles = tile_grid(&img, 3, 4);
        assert_eq!(tiles.len(), 12);
        // 41/4 = 10, 31/3 = 10: one column and one row of pixels truncated.
        for (_, tile) in &tiles {
            assert_eq!(tile.dimensions(), (10, 10));
        }
    }

    #[test]
    fn test_tiles_reproduce_source_pixels() {
        let img = indexed_image(20, 20);
        for (coord, tile) in tile_grid(&img, 2, 2) {
            for y in 0..10 {
                for x in 0..10 {
                    assert_eq!(
                        tile.get_pixel(x, y),
                        img.get_pixel(coord.col * 10 + x, coord.row * 10 + y)
                    );
                }
            }
        }
    }

    #[test]
    fn test_degenerate_grids() {
        let img = indexed_image(8, 8);
        assert!(tile_grid(&img, 0, 3).is_empty());
        assert!(tile_grid(&img, 3, 0).is_empty());
        // More rows than pixels of height.
        assert!(tile_grid(&img, 9, 1).is_empty());
    }

    proptest! {
        // Coverage never exceeds the source image and boundaries are a pure
        // function of (dims, rows, cols).
        #[test]
        fn prop_tile_coverage_bounded(
            w in 1u32..120,
            h in 1u32..120,
            rows in 1u32..8,
            cols in 1u32..8,
        ) {
            let img = indexed_image(w, h);
            let tiles = tile_grid(&img, rows, cols);

            if w / cols == 0 || h / rows == 0 {
                prop_assert!(tiles.is_empty());
            } else {
                prop_assert_eq!(tiles.len() as u32, rows * cols);
                let (tw, th) = tiles[0].1.dimensions();
                prop_assert_eq!(tw, w / cols);
                prop_assert_eq!(th, h / rows);
                prop_assert!(cols * tw <= w);
                prop_assert!(rows * th <= h);

                let again = tile_grid(&img, rows, cols);
                for ((ca, ta), (cb, tb)) in tiles.iter().zip(again.iter()) {
                    prop_assert_eq!(ca, cb);
                    prop_assert_eq!(ta.as_raw(), tb.as_raw());
                }
            }
        }
    }
}
