// 再生成: 編集済み画像を元文書へ書き戻し、バンドルにまとめる
//
// Records are grouped by source document. Untouched documents are passed
// through byte-for-byte; documents with edits are rebuilt by the codec with
// only the edited positions replaced. Any failure aborts the whole run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::info;

use super::bundle::{Bundle, Disposition, OutputDocument, write_bundle};
use crate::docx::{DocumentCodec, ReplacementImage};
use crate::error::{MosaicError, RegenerationStage};
use crate::raster::codec::{DEFAULT_JPEG_QUALITY, encode};
use crate::record::{DocumentId, ImageRecord, SourceDocument};

/// Shared flag a caller sets to abandon a running regeneration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RegenerateOptions {
    /// Quality for edited JPEG images (1-100).
    pub jpeg_quality: u8,
    pub cancel: Option<CancelToken>,
}

impl Default for RegenerateOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            cancel: None,
        }
    }
}

impl RegenerateOptions {
    fn check_cancelled(&self) -> crate::error::Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(MosaicError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Records of one source document, in position order.
pub struct DocumentGroup<'a> {
    pub source: &'a Arc<SourceDocument>,
    pub records: Vec<&'a ImageRecord>,
}

impl DocumentGroup<'_> {
    pub fn has_modifications(&self) -> bool {
        self.records.iter().any(|r| r.is_modified())
    }
}

/// Group records by document, documents in id order.
pub fn group_by_document(records: &[ImageRecord]) -> Vec<DocumentGroup<'_>> {
    let mut groups: BTreeMap<DocumentId, DocumentGroup<'_>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.document_id())
            .or_insert_with(|| DocumentGroup {
                source: record.source(),
                records: Vec::new(),
            })
            .records
            .push(record);
    }

    let mut groups: Vec<DocumentGroup<'_>> = groups.into_values().collect();
    for group in &mut groups {
        group.records.sort_by_key(|r| r.position());
    }
    groups
}

/// Replacement payloads for the modified records of one group, keyed by
/// position. Unmodified records are left out.
pub fn build_replacements(
    group: &DocumentGroup<'_>,
    jpeg_quality: u8,
) -> crate::error::Result<BTreeMap<usize, ReplacementImage>> {
    let mut map = BTreeMap::new();
    for record in group.records.iter().filter(|r| r.is_modified()) {
        let encode_err = |e: &dyn std::fmt::Display| {
            MosaicError::regeneration(
                &group.source.name,
                RegenerationStage::Encode,
                format!("image {}: {e}", record.position()),
            )
        };
        let buffer = record
            .current_buffer()
            .ok_or_else(|| encode_err(&"edited image has no pixel buffer"))?;
        buffer
            .ensure_dimensions(record.width(), record.height())
            .map_err(|e| encode_err(&e))?;
        let bytes = encode(buffer, record.format(), jpeg_quality).map_err(|e| encode_err(&e))?;
        map.insert(
            record.position(),
            ReplacementImage {
                bytes,
                content_type: record.content_type().to_string(),
            },
        );
    }
    Ok(map)
}

fn render_group(
    group: &DocumentGroup<'_>,
    codec: &dyn DocumentCodec,
    options: &RegenerateOptions,
) -> crate::error::Result<OutputDocument> {
    options.check_cancelled()?;
    let name = group.source.name.clone();

    if !group.has_modifications() {
        return Ok(OutputDocument {
            name,
            bytes: group.source.bytes.to_vec(),
            disposition: Disposition::Passthrough,
        });
    }

    let replacements = build_replacements(group, options.jpeg_quality)?;
    let bytes = codec
        .rebuild_with_images(&group.source.bytes, &replacements)
        .map_err(|e| MosaicError::regeneration(&name, RegenerationStage::Rebuild, e))?;

    info!(document = %name, replaced = replacements.len(), "rebuilt document");
    Ok(OutputDocument {
        name,
        bytes,
        disposition: Disposition::Rebuilt {
            replaced: replacements.len(),
        },
    })
}

/// Produce the output bundle for a set of records.
///
/// Documents are rendered in parallel; the first error (or a cancellation)
/// is returned and no bundle is produced. The records are only read.
pub fn regenerate(
    records: &[ImageRecord],
    codec: &dyn DocumentCodec,
    options: &RegenerateOptions,
) -> crate::error::Result<Bundle> {
    let groups = group_by_document(records);

    let outputs: Vec<OutputDocument> = groups
        .par_iter()
        .map(|group| render_group(group, codec, options))
        .collect::<crate::error::Result<_>>()?;

    options.check_cancelled()?;
    let bundle = write_bundle(&outputs)?;
    info!(
        documents = bundle.entries.len(),
        size = bundle.bytes.len(),
        "bundle written"
    );
    Ok(bundle)
}
