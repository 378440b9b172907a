// 出力バンドル: 全出力文書を1つのzipにまとめる

use std::collections::HashSet;
use std::io::{Cursor, Write};

use serde::Serialize;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{MosaicError, RegenerationStage};

/// How an output document was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disposition {
    /// Original bytes, untouched.
    Passthrough,
    /// Rebuilt with `replaced` image parts substituted.
    Rebuilt { replaced: usize },
}

/// One output document before archiving.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    pub name: String,
    pub bytes: Vec<u8>,
    pub disposition: Disposition,
}

/// Per-entry metadata of a finished bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleEntry {
    pub name: String,
    pub disposition: Disposition,
    pub size: usize,
    /// SHA-256 of the entry bytes, lowercase hex.
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct Bundle {
    /// Zip archive bytes.
    pub bytes: Vec<u8>,
    pub entries: Vec<BundleEntry>,
}

impl Bundle {
    /// JSON report of the bundle entries.
    pub fn report_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

/// SHA-256 of `bytes` as a lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Archive `documents` into one zip, one entry per document named after it.
///
/// Document packages are already compressed, so entries are stored.
pub fn write_bundle(documents: &[OutputDocument]) -> crate::error::Result<Bundle> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut names = HashSet::new();
    let mut entries = Vec::with_capacity(documents.len());

    for doc in documents {
        let archive_err = |e: &dyn std::fmt::Display| {
            MosaicError::regeneration(&doc.name, RegenerationStage::Archive, e)
        };
        if !names.insert(doc.name.as_str()) {
            return Err(archive_err(&"duplicate entry name in bundle"));
        }
        writer
            .start_file(doc.name.as_str(), options)
            .map_err(|e| archive_err(&e))?;
        writer.write_all(&doc.bytes).map_err(|e| archive_err(&e))?;

        entries.push(BundleEntry {
            name: doc.name.clone(),
            disposition: doc.disposition,
            size: doc.bytes.len(),
            sha256: sha256_hex(&doc.bytes),
        });
    }

    let bytes = writer.finish()?.into_inner();
    Ok(Bundle { bytes, entries })
}
