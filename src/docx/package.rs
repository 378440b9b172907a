// DOCX (OPC zip パッケージ) の読み取りと画像パーツの差し替え

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};

use image::ImageFormat;
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::markup::image_references;
use super::relationships::{
    OFFICE_DOCUMENT_SUFFIX, parse_relationships, rels_path_for, resolve_target,
};
use crate::error::MosaicError;
use crate::raster::codec::format_for_part;

/// Fallback when `_rels/.rels` does not name the main document part.
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const ROOT_RELS: &str = "_rels/.rels";
/// Upper bound on the read buffer reserved from an entry's declared size.
const MAX_PREALLOC: u64 = 1 << 20;

/// An image part referenced from the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    /// Zip entry name, e.g. `word/media/image1.png`.
    pub part_name: String,
    pub format: ImageFormat,
}

pub struct DocxPackage<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> DocxPackage<'a> {
    pub fn open(bytes: &'a [u8]) -> crate::error::Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            MosaicError::document_decode(format!("not a valid DOCX package: {e}"))
        })?;
        Ok(Self { archive })
    }

    /// Read a part by name. `None` when the package has no such entry.
    pub fn read_part(&mut self, name: &str) -> crate::error::Result<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(MosaicError::document_decode(format!(
                    "failed to open part {name}: {e}"
                )));
            }
        };
        let mut data = Vec::with_capacity(initial_capacity(entry.size()));
        entry.read_to_end(&mut data).map_err(|e| {
            MosaicError::document_decode(format!("failed to read part {name}: {e}"))
        })?;
        Ok(Some(data))
    }

    fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Name of the main document part, from the package relationships.
    pub fn main_document_part(&mut self) -> crate::error::Result<String> {
        let Some(rels_xml) = self.read_part(ROOT_RELS)? else {
            return Ok(DEFAULT_MAIN_PART.to_string());
        };
        let main = parse_relationships(&rels_xml)?
            .into_iter()
            .find(|r| !r.external && r.rel_type.ends_with(OFFICE_DOCUMENT_SUFFIX))
            .map(|r| resolve_target("", &r.target));
        Ok(main.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
    }

    /// Image parts referenced by the main document body, one per distinct
    /// part, ordered by first reference.
    ///
    /// Parts in a format the raster codec cannot decode, external targets and
    /// dangling references are skipped, so positions index only editable
    /// images. Extraction and rebuild both call this, which keeps their
    /// positions in agreement.
    pub fn image_parts(&mut self) -> crate::error::Result<Vec<ImagePart>> {
        let main = self.main_document_part()?;
        let markup = self.read_part(&main)?.ok_or_else(|| {
            MosaicError::document_decode(format!("main document part {main} is missing"))
        })?;

        let Some(rels_xml) = self.read_part(&rels_path_for(&main))? else {
            return Ok(Vec::new());
        };
        let targets: HashMap<String, String> = parse_relationships(&rels_xml)?
            .into_iter()
            .filter(|r| !r.external)
            .map(|r| (r.id, r.target))
            .collect();

        let mut seen = HashSet::new();
        let mut parts = Vec::new();
        for rel_id in image_references(&markup)? {
            let Some(target) = targets.get(&rel_id) else {
                warn!(rel_id = %rel_id, "image reference without a matching relationship");
                continue;
            };
            let part_name = resolve_target(&main, target);
            if !seen.insert(part_name.clone()) {
                continue;
            }
            let Some(format) = format_for_part(&part_name) else {
                warn!(part = %part_name, "skipping image part in unsupported format");
                continue;
            };
            if !self.has_part(&part_name) {
                warn!(part = %part_name, "image relationship points to a missing part");
                continue;
            }
            parts.push(ImagePart { part_name, format });
        }

        Ok(parts)
    }

    /// Write a new package where the named parts carry new bytes.
    ///
    /// Untouched entries are raw-copied (compressed data and headers as in the
    /// source). Replaced entries keep their name and, when stored, their
    /// compression method.
    pub fn rewrite(mut self, replacements: &HashMap<String, Vec<u8>>) -> crate::error::Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut written = HashSet::new();

        for i in 0..self.archive.len() {
            let entry = self.archive.by_index(i)?;
            let name = entry.name().to_string();

            match replacements.get(&name) {
                Some(data) => {
                    let method = match entry.compression() {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    };
                    drop(entry);
                    let options = SimpleFileOptions::default().compression_method(method);
                    writer.start_file(name.as_str(), options)?;
                    writer.write_all(data)?;
                    written.insert(name);
                }
                None => writer.raw_copy_file(entry)?,
            }
        }

        if let Some(missing) = replacements.keys().find(|k| !written.contains(*k)) {
            return Err(MosaicError::document_rebuild(format!(
                "package has no part named {missing}"
            )));
        }

        Ok(writer.finish()?.into_inner())
    }
}

/// Read buffer size for an entry. The declared size comes from the archive
/// headers and is not trusted beyond `MAX_PREALLOC`.
fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}
