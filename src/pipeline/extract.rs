// 抽出: .docx 群 -> ImageRecord 列
//
// Documents are decoded in parallel; records are assembled afterwards in input
// order so ids and positions do not depend on scheduling.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::docx::{DOCX_EXTENSION, DocumentCodec, EmbeddedImage, LOCK_FILE_PREFIX};
use crate::input::InputFile;
use crate::record::{DocumentId, ImageRecord, RecordInit, SourceDocument};

/// A document that could not be decoded. Extraction continues without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub document: String,
    pub message: String,
}

/// What the scan looked at, for "nothing found" reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Files that passed the name filter.
    pub documents_scanned: usize,
    pub failures: Vec<ExtractionFailure>,
}

#[derive(Debug)]
pub struct Extraction {
    pub records: Vec<ImageRecord>,
    pub summary: ExtractionSummary,
}

#[derive(Debug)]
pub enum ExtractionOutcome {
    Found(Extraction),
    /// No qualifying file, every file failed, or none contained images.
    NoImagesFound(ExtractionSummary),
}

impl ExtractionOutcome {
    pub fn summary(&self) -> &ExtractionSummary {
        match self {
            ExtractionOutcome::Found(e) => &e.summary,
            ExtractionOutcome::NoImagesFound(s) => s,
        }
    }
}

/// `true` for `.docx` files that are not Word lock files (`~$name.docx`).
pub fn is_candidate(file: &InputFile) -> bool {
    let name = file.base_name();
    let lower = name.to_ascii_lowercase();
    lower.ends_with(DOCX_EXTENSION) && !name.starts_with(LOCK_FILE_PREFIX)
}

/// Extract every image of every candidate document in `files`.
///
/// Record ids are `"{document name}-{n}"` where `n` is a counter running
/// across all documents in input order.
pub fn extract(files: &[InputFile], codec: &dyn DocumentCodec) -> ExtractionOutcome {
    let candidates: Vec<&InputFile> = files.iter().filter(|f| is_candidate(f)).collect();

    let decoded: Vec<(&InputFile, crate::error::Result<Vec<EmbeddedImage>>)> = candidates
        .par_iter()
        .map(|file| (*file, codec.decode_images(&file.bytes)))
        .collect();

    let mut summary = ExtractionSummary {
        documents_scanned: candidates.len(),
        failures: Vec::new(),
    };
    let mut records = Vec::new();
    let mut global_index = 0usize;

    for (doc_index, (file, result)) in decoded.into_iter().enumerate() {
        let images = match result {
            Ok(images) => images,
            Err(e) => {
                warn!(document = %file.name, error = %e, "skipping document that failed to decode");
                summary.failures.push(ExtractionFailure {
                    document: file.name.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        info!(document = %file.name, images = images.len(), "extracted images");

        let source = Arc::new(SourceDocument {
            id: DocumentId(doc_index),
            name: file.name.clone(),
            bytes: Arc::clone(&file.bytes),
        });

        for (position, image) in images.into_iter().enumerate() {
            records.push(ImageRecord::new(RecordInit {
                id: format!("{}-{}", file.name, global_index + position),
                source: Arc::clone(&source),
                position,
                original_bytes: Arc::from(image.bytes),
                width: image.width,
                height: image.height,
                format: image.format,
                content_type: image.content_type,
            }));
        }
        global_index = records.len();
    }

    if records.is_empty() {
        ExtractionOutcome::NoImagesFound(summary)
    } else {
        ExtractionOutcome::Found(Extraction { records, summary })
    }
}
