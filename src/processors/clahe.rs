//! Contrast limited adaptive histogram equalization (CLAHE).
//!
//! The page is split into a grid of tiles, each tile gets a clipped histogram
//! equalization table, and every pixel is mapped by bilinear interpolation
//! between the tables of the four nearest tile centres. Images whose size is
//! not a multiple of the grid are extended by mirror reflection.

use image::GrayImage;

const BINS: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct Clahe {
    clip_limit: f32,
    tiles_x: u32,
    tiles_y: u32,
}

impl Clahe {
    /// Creates an equalizer with the given clip limit and tile grid (columns, rows).
    pub fn new(clip_limit: f32, tile_grid: (u32, u32)) -> Self {
        Self {
            clip_limit,
            tiles_x: tile_grid.0.max(1),
            tiles_y: tile_grid.1.max(1),
        }
    }

    pub fn apply(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return image.clone();
        }

        let tile_w = width.div_ceil(self.tiles_x) as usize;
        let tile_h = height.div_ceil(self.tiles_y) as usize;
        let tile_area = tile_w * tile_h;
        let clip = ((self.clip_limit * tile_area as f32 / BINS as f32) as usize).max(1);
        let lut_scale = (BINS - 1) as f32 / tile_area as f32;

        let tiles_x = self.tiles_x as usize;
        let tiles_y = self.tiles_y as usize;
        let mut luts = vec![[0u8; BINS]; tiles_x * tiles_y];

        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let mut hist = [0usize; BINS];
                for y in ty * tile_h..(ty + 1) * tile_h {
                    let sy = reflect_101(y, height as usize) as u32;
                    for x in tx * tile_w..(tx + 1) * tile_w {
                        let sx = reflect_101(x, width as usize) as u32;
                        hist[image.get_pixel(sx, sy)[0] as usize] += 1;
                    }
                }
                clip_histogram(&mut hist, clip);

                let lut = &mut luts[ty * tiles_x + tx];
                let mut cumulative = 0usize;
                for (value, count) in hist.iter().enumerate() {
                    cumulative += count;
                    lut[value] = (cumulative as f32 * lut_scale).round().clamp(0.0, 255.0) as u8;
                }
            }
        }

        let inv_tile_w = 1.0 / tile_w as f32;
        let inv_tile_h = 1.0 / tile_h as f32;
        let mut out = GrayImage::new(width, height);
        for y in 0..height {
            let tyf = y as f32 * inv_tile_h - 0.5;
            let ty1 = tyf.floor();
            let py = tyf - ty1;
            let ty1i = (ty1 as i64).clamp(0, tiles_y as i64 - 1) as usize;
            let ty2i = (ty1 as i64 + 1).clamp(0, tiles_y as i64 - 1) as usize;

            for x in 0..width {
                let txf = x as f32 * inv_tile_w - 0.5;
                let tx1 = txf.floor();
                let px = txf - tx1;
                let tx1i = (tx1 as i64).clamp(0, tiles_x as i64 - 1) as usize;
                let tx2i = (tx1 as i64 + 1).clamp(0, tiles_x as i64 - 1) as usize;

                let v = image.get_pixel(x, y)[0] as usize;
                let top = luts[ty1i * tiles_x + tx1i][v] as f32 * (1.0 - px)
                    + luts[ty1i * tiles_x + tx2i][v] as f32 * px;
                let bottom = luts[ty2i * tiles_x + tx1i][v] as f32 * (1.0 - px)
                    + luts[ty2i * tiles_x + tx2i][v] as f32 * px;
                let value = top * (1.0 - py) + bottom * py;
                out.put_pixel(x, y, image::Luma([value.round().clamp(0.0, 255.0) as u8]));
            }
        }
        out
    }
}

/// Clips a histogram at `clip` and spreads the excess over all bins.
fn clip_histogram(hist: &mut [usize; BINS], clip: usize) {
    let mut excess = 0usize;
    for count in hist.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }
    if excess == 0 {
        return;
    }

    let per_bin = excess / BINS;
    let mut residual = excess - per_bin * BINS;
    for count in hist.iter_mut() {
        *count += per_bin;
    }
    if residual > 0 {
        let step = (BINS / residual).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Mirror index without repeating the edge pixel (`dcb|abcd|cba`).
fn reflect_101(index: usize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = index % period;
    if i < len { i } else { period - i }
}
