// モザイク: 矩形領域をブロック平均で塗りつぶす
//
// Pure function over a `PixelBuffer`. The input is never mutated; the caller
// gets a fresh buffer back.

use super::buffer::{CHANNELS, PixelBuffer};

/// Rectangle to pixelate, in buffer pixel coordinates.
///
/// Coordinates may be fractional (they usually come from a scaled display);
/// they are clamped with `floor` for the start and `ceil` for the end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Side length of one mosaic block. 0 is treated as 1.
    pub pixel_size: u32,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64, pixel_size: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            pixel_size,
        }
    }

    /// Normalize a drag gesture from `start` to `end` (either direction) into a
    /// region anchored at its top-left corner.
    pub fn from_drag(start: (f64, f64), end: (f64, f64), pixel_size: u32) -> Self {
        Self {
            x: start.0.min(end.0),
            y: start.1.min(end.1),
            width: (end.0 - start.0).abs(),
            height: (end.1 - start.1).abs(),
            pixel_size,
        }
    }

    /// Pixel bounds `(x0, y0, x1, y1)` (end-exclusive) after clamping to a
    /// `width × height` buffer. `None` when nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
        let coords = [self.x, self.y, self.width, self.height];
        if coords.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let x0 = self.x.floor().max(0.0);
        let y0 = self.y.floor().max(0.0);
        let x1 = (self.x + self.width).ceil().min(width as f64);
        let y1 = (self.y + self.height).ceil().min(height as f64);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

/// Pixelate `region` of `buffer` and return the result as a new buffer.
///
/// The clamped rectangle is tiled with `pixel_size` blocks starting at its
/// top-left corner; blocks on the right/bottom edge may be smaller. Every
/// pixel of a block receives the per-channel mean of the block, truncated.
pub fn apply_mosaic(buffer: &PixelBuffer, region: &Region) -> PixelBuffer {
    let mut out = buffer.clone();

    let Some((x0, y0, x1, y1)) = region.clamp_to(buffer.width(), buffer.height()) else {
        return out;
    };
    let block = region.pixel_size.max(1) as usize;
    let src = buffer.as_bytes();

    for block_y in (y0..y1).step_by(block) {
        let block_end_y = (block_y + block).min(y1);
        for block_x in (x0..x1).step_by(block) {
            let block_end_x = (block_x + block).min(x1);

            let mut sums = [0u64; CHANNELS];
            let mut count = 0u64;
            for py in block_y..block_end_y {
                for px in block_x..block_end_x {
                    let i = buffer.offset(px, py);
                    for (c, sum) in sums.iter_mut().enumerate() {
                        *sum += src[i + c] as u64;
                    }
                    count += 1;
                }
            }

            // count >= 1: block ranges are never empty inside the clamp.
            let mean: [u8; CHANNELS] = sums.map(|s| (s / count) as u8);

            let dst = out.data_mut();
            for py in block_y..block_end_y {
                for px in block_x..block_end_x {
                    let i = buffer.offset(px, py);
                    dst[i..i + CHANNELS].copy_from_slice(&mean);
                }
            }
        }
    }

    out
}
