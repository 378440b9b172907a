// RGBA画素バッファ: width × height × 4 バイト
//
// All pixel data handled by the editing pipeline goes through this type so the
// byte length invariant is checked in exactly one place.

use crate::error::MosaicError;

/// Number of bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Decoded RGBA8 pixel buffer, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// `width * height * 4` をオーバーフロー検査付きで計算する。
pub fn expected_len(width: u32, height: u32) -> crate::error::Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|wh| wh.checked_mul(CHANNELS))
        .ok_or_else(|| {
            MosaicError::image_decode(format!(
                "Overflow computing buffer size for {}x{} RGBA image",
                width, height
            ))
        })
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, rejecting data whose length disagrees with the
    /// dimensions.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> crate::error::Result<Self> {
        let expected = expected_len(width, height)?;
        if data.len() != expected {
            return Err(MosaicError::BufferDimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> crate::error::Result<Self> {
        let len = expected_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / CHANNELS {
            data.extend_from_slice(&rgba);
        }
        Self::from_raw(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x as usize, y as usize);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Byte offset of pixel `(x, y)`. Callers guarantee bounds.
    pub(crate) fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * CHANNELS
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Check that this buffer has the given dimensions.
    pub fn ensure_dimensions(&self, width: u32, height: u32) -> crate::error::Result<()> {
        if self.width != width || self.height != height {
            return Err(MosaicError::BufferDimensionMismatch {
                expected: expected_len(width, height)?,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}
