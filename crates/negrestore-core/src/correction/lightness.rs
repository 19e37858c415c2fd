//! Contrast-limited adaptive histogram equalization (CLAHE) of Lab lightness.
//!
//! Off by default. When enabled it redistributes local contrast in the L
//! channel only; the chroma axes pass through untouched.
//!
//! # Algorithm
//! 1. Split the L plane into `tiles_x × tiles_y` tiles
//! 2. Per tile: histogram, clip each bin at `max(1, clip_limit × area / 256)`,
//!    spread the clipped excess evenly over all bins, map through the CDF
//! 3. Per pixel: bilinearly blend the mappings of the four nearest tile
//!    centers

use crate::color::Lab8;
use crate::histogram::BINS;
use crate::image::PixelBuffer;
use crate::transform::params::LightnessEqualization;

/// Equalize the lightness of `buffer` with CLAHE.
pub fn equalize_lightness(buffer: &PixelBuffer, params: &LightnessEqualization) -> PixelBuffer {
    if buffer.is_empty() {
        return buffer.clone();
    }
    let labs: Vec<Lab8> = buffer.pixels().iter().map(|&px| Lab8::from_rgb(px)).collect();
    let plane: Vec<u8> = labs.iter().map(|lab| lab.l as u8).collect();
    let equalized = clahe(&plane, buffer.width(), buffer.height(), params);

    let pixels = labs
        .iter()
        .zip(equalized)
        .map(|(lab, l)| Lab8 { l: l as f32, ..*lab }.to_rgb())
        .collect();
    PixelBuffer::new(buffer.width(), buffer.height(), pixels)
}

/// Tile layout covering a `width × height` plane.
#[derive(Debug, Clone, Copy)]
struct TileGrid {
    tile_w: usize,
    tile_h: usize,
    cols: usize,
    rows: usize,
}

impl TileGrid {
    fn new(width: usize, height: usize, tiles_x: u32, tiles_y: u32) -> Self {
        let tile_w = width.div_ceil((tiles_x as usize).clamp(1, width));
        let tile_h = height.div_ceil((tiles_y as usize).clamp(1, height));
        Self {
            tile_w,
            tile_h,
            cols: width.div_ceil(tile_w),
            rows: height.div_ceil(tile_h),
        }
    }
}

/// CLAHE over a single 8-bit plane.
pub fn clahe(plane: &[u8], width: u32, height: u32, params: &LightnessEqualization) -> Vec<u8> {
    let (width, height) = (width as usize, height as usize);
    debug_assert_eq!(plane.len(), width * height);
    if plane.is_empty() {
        return Vec::new();
    }

    let grid = TileGrid::new(width, height, params.tiles_x, params.tiles_y);
    let mut luts = Vec::with_capacity(grid.cols * grid.rows);
    for ty in 0..grid.rows {
        for tx in 0..grid.cols {
            let x0 = tx * grid.tile_w;
            let y0 = ty * grid.tile_h;
            let x1 = (x0 + grid.tile_w).min(width);
            let y1 = (y0 + grid.tile_h).min(height);
            luts.push(tile_lut(plane, width, (x0, y0, x1, y1), params.clip_limit));
        }
    }

    let inv_tw = 1.0 / grid.tile_w as f32;
    let inv_th = 1.0 / grid.tile_h as f32;
    let mut out = Vec::with_capacity(plane.len());
    for y in 0..height {
        let (ty1, ty2, ya) = neighbors(y, inv_th, grid.rows);
        for x in 0..width {
            let (tx1, tx2, xa) = neighbors(x, inv_tw, grid.cols);
            let v = plane[y * width + x] as usize;
            let lut = |tx: usize, ty: usize| luts[ty * grid.cols + tx][v] as f32;
            let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
            let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
            out.push((top * (1.0 - ya) + bottom * ya).round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// The two tile indices surrounding `pos` and the blend weight of the
/// second one.
fn neighbors(pos: usize, inv_tile: f32, count: usize) -> (usize, usize, f32) {
    let t = pos as f32 * inv_tile - 0.5;
    let t1 = t.floor();
    let weight = t - t1;
    let first = (t1.max(0.0) as usize).min(count - 1);
    let second = ((t1 + 1.0).max(0.0) as usize).min(count - 1);
    (first, second, weight)
}

/// Clipped-and-redistributed CDF mapping for one tile.
fn tile_lut(
    plane: &[u8],
    width: usize,
    (x0, y0, x1, y1): (usize, usize, usize, usize),
    clip_limit: f32,
) -> [u8; BINS] {
    let mut hist = [0u32; BINS];
    for y in y0..y1 {
        for &v in &plane[y * width + x0..y * width + x1] {
            hist[v as usize] += 1;
        }
    }
    let area = ((x1 - x0) * (y1 - y0)) as u32;

    let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let batch = excess / BINS as u32;
    let mut residual = excess - batch * BINS as u32;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (BINS / residual as usize).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        sum += count;
        *entry = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
