// image crate: 圧縮画像バイト列 <-> RGBA画素バッファ

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage, RgbaImage};

use super::buffer::{PixelBuffer, expected_len};
use crate::error::MosaicError;

/// JPEG quality used when the caller does not configure one.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Formats whose RGBA8 buffers can be written back by [`encode`].
const EDITABLE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

/// Guess the image format of a package part from its file extension.
///
/// Returns `None` unless the format can be both decoded and re-encoded from
/// 8-bit RGBA: vector formats (EMF, WMF, SVG) and float or GPU formats (HDR,
/// EXR, DDS) are not editable.
pub fn format_for_part(part_name: &str) -> Option<ImageFormat> {
    let format = ImageFormat::from_path(Path::new(part_name)).ok()?;
    let editable = EDITABLE_FORMATS.contains(&format)
        && format.reading_enabled()
        && format.writing_enabled();
    editable.then_some(format)
}

/// MIME type string for a format, e.g. `image/png`.
pub fn content_type(format: ImageFormat) -> &'static str {
    format.to_mime_type()
}

/// Read image dimensions without decoding the pixel data.
pub fn dimensions(bytes: &[u8], format: ImageFormat) -> crate::error::Result<(u32, u32)> {
    let reader = ImageReader::with_format(Cursor::new(bytes), format);
    Ok(reader.into_dimensions()?)
}

/// Decode compressed image bytes into an RGBA buffer.
pub fn decode(bytes: &[u8], format: ImageFormat) -> crate::error::Result<PixelBuffer> {
    let img = image::load_from_memory_with_format(bytes, format)?;
    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    PixelBuffer::from_raw(width, height, rgba.into_raw())
}

/// Encode an RGBA buffer into `format`.
///
/// JPEG drops the alpha channel and uses `jpeg_quality` (1-100). Every other
/// format is written with the image crate's default encoder settings.
pub fn encode(
    buffer: &PixelBuffer,
    format: ImageFormat,
    jpeg_quality: u8,
) -> crate::error::Result<Vec<u8>> {
    let (width, height) = (buffer.width(), buffer.height());
    let expected = expected_len(width, height)?;
    if buffer.as_bytes().len() != expected {
        return Err(MosaicError::BufferDimensionMismatch {
            expected,
            actual: buffer.as_bytes().len(),
        });
    }

    let img = RgbaImage::from_raw(width, height, buffer.as_bytes().to_vec())
        .ok_or_else(|| MosaicError::image_encode("Failed to create image from RGBA data"))?;
    let dynamic = DynamicImage::ImageRgba8(img);

    match format {
        ImageFormat::Jpeg => encode_rgb_to_jpeg(&dynamic.to_rgb8(), jpeg_quality),
        other => {
            let mut buf = Cursor::new(Vec::new());
            dynamic
                .write_to(&mut buf, other)
                .map_err(|e| MosaicError::image_encode(format!("{other:?}: {e}")))?;
            Ok(buf.into_inner())
        }
    }
}

/// Encode an already-converted RGB image to JPEG bytes.
fn encode_rgb_to_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(MosaicError::image_encode(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MosaicError::image_encode(e.to_string()))?;

    Ok(buf.into_inner())
}
