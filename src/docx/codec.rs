// 文書コーデック: 文書 <-> 埋め込み画像

use std::collections::{BTreeMap, HashMap};

use image::ImageFormat;
use tracing::debug;

use super::package::DocxPackage;
use crate::error::MosaicError;
use crate::raster::codec::{content_type, dimensions};

/// One image found in a document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// New payload for the image at some position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Reads images out of, and substitutes images into, a document container.
pub trait DocumentCodec: Send + Sync {
    /// Images of `document` with stable ordering: position `i` here is
    /// position `i` for [`DocumentCodec::rebuild_with_images`].
    fn decode_images(&self, document: &[u8]) -> crate::error::Result<Vec<EmbeddedImage>>;

    /// A new document where only the image parts at the given positions are
    /// replaced; all other content is preserved.
    fn rebuild_with_images(
        &self,
        document: &[u8],
        replacements: &BTreeMap<usize, ReplacementImage>,
    ) -> crate::error::Result<Vec<u8>>;
}

/// [`DocumentCodec`] for Office Open XML word-processing packages (`.docx`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxCodec;

impl DocumentCodec for DocxCodec {
    fn decode_images(&self, document: &[u8]) -> crate::error::Result<Vec<EmbeddedImage>> {
        let mut package = DocxPackage::open(document)?;
        let parts = package.image_parts()?;

        let mut images = Vec::with_capacity(parts.len());
        for part in parts {
            let bytes = package.read_part(&part.part_name)?.ok_or_else(|| {
                MosaicError::document_decode(format!("image part {} vanished", part.part_name))
            })?;
            let (width, height) = dimensions(&bytes, part.format).map_err(|e| {
                MosaicError::document_decode(format!("{}: {e}", part.part_name))
            })?;
            debug!(part = %part.part_name, width, height, "found image part");
            images.push(EmbeddedImage {
                bytes,
                content_type: content_type(part.format).to_string(),
                format: part.format,
                width,
                height,
            });
        }

        Ok(images)
    }

    fn rebuild_with_images(
        &self,
        document: &[u8],
        replacements: &BTreeMap<usize, ReplacementImage>,
    ) -> crate::error::Result<Vec<u8>> {
        let mut package = DocxPackage::open(document)?;
        let parts = package.image_parts()?;

        let mut by_part = HashMap::with_capacity(replacements.len());
        for (&position, replacement) in replacements {
            let part = parts.get(position).ok_or_else(|| {
                MosaicError::document_rebuild(format!(
                    "no image at position {position} (document has {})",
                    parts.len()
                ))
            })?;
            let expected = content_type(part.format);
            if replacement.content_type != expected {
                return Err(MosaicError::document_rebuild(format!(
                    "replacement for {} is {}, part requires {}",
                    part.part_name, replacement.content_type, expected
                )));
            }
            by_part.insert(part.part_name.clone(), replacement.bytes.clone());
        }

        package.rewrite(&by_part)
    }
}
