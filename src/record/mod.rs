// 画像レコード: 元バイト列・現在の画素バッファ・Undo履歴
//
// One `ImageRecord` per image embedded in a source document. Records are owned
// by an `ImageStore`, which serializes mutation per record.

pub mod store;

use std::sync::Arc;

use image::ImageFormat;

use crate::error::MosaicError;
use crate::raster::PixelBuffer;
use crate::raster::codec;

pub use store::ImageStore;

/// Index of a document in the input list. Groups records during regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub usize);

/// A source document, shared read-only by all of its records.
#[derive(Debug)]
pub struct SourceDocument {
    pub id: DocumentId,
    /// File name as given by the input collaborator (used as bundle entry name).
    pub name: String,
    pub bytes: Arc<[u8]>,
}

/// Lazy materialization state of a record's pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferState {
    Unmaterialized,
    /// Decode in flight; edits are rejected until it completes.
    Materializing,
    Ready(PixelBuffer),
}

/// Per-image editing state.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: String,
    source: Arc<SourceDocument>,
    position: usize,
    original_bytes: Arc<[u8]>,
    state: BufferState,
    history: Vec<PixelBuffer>,
    width: u32,
    height: u32,
    format: ImageFormat,
    content_type: String,
}

/// Values fixed at extraction time.
pub struct RecordInit {
    pub id: String,
    pub source: Arc<SourceDocument>,
    pub position: usize,
    pub original_bytes: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub content_type: String,
}

impl ImageRecord {
    pub fn new(init: RecordInit) -> Self {
        Self {
            id: init.id,
            source: init.source,
            position: init.position,
            original_bytes: init.original_bytes,
            state: BufferState::Unmaterialized,
            history: Vec::new(),
            width: init.width,
            height: init.height,
            format: init.format,
            content_type: init.content_type,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &Arc<SourceDocument> {
        &self.source
    }

    pub fn document_id(&self) -> DocumentId {
        self.source.id
    }

    pub fn document_name(&self) -> &str {
        &self.source.name
    }

    /// Zero-based index among this document's images.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn original_bytes(&self) -> &Arc<[u8]> {
        &self.original_bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn state(&self) -> &BufferState {
        &self.state
    }

    /// The live pixel buffer, if materialized.
    pub fn current_buffer(&self) -> Option<&PixelBuffer> {
        match &self.state {
            BufferState::Ready(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn history(&self) -> &[PixelBuffer] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// 少なくとも1回の編集が適用され、かつ全て取り消されていない場合に true。
    pub fn is_modified(&self) -> bool {
        !self.history.is_empty()
    }

    /// Decode `original_bytes` into a buffer matching the record's dimensions.
    ///
    /// Pure with respect to the record; [`ImageStore::materialize`] decides
    /// when to call it and where to put the result.
    pub fn decode_original(&self) -> crate::error::Result<PixelBuffer> {
        let buf = codec::decode(&self.original_bytes, self.format)?;
        buf.ensure_dimensions(self.width, self.height)?;
        Ok(buf)
    }

    pub(crate) fn set_state(&mut self, state: BufferState) {
        self.state = state;
    }

    /// Replace the current buffer, saving the previous one on the undo stack.
    ///
    /// The previous buffer is moved into history; `next` is a distinct
    /// allocation, so history entries never share storage with the live buffer.
    pub(crate) fn push_edit(&mut self, next: PixelBuffer) -> crate::error::Result<()> {
        next.ensure_dimensions(self.width, self.height)?;
        let previous = match std::mem::replace(&mut self.state, BufferState::Ready(next)) {
            BufferState::Ready(prev) => prev,
            other => {
                self.state = other;
                return Err(MosaicError::NotMaterialized(self.id.clone()));
            }
        };
        self.history.push(previous);
        Ok(())
    }

    /// Pop the newest snapshot back into the live buffer. `false` if history
    /// was empty.
    pub(crate) fn pop_edit(&mut self) -> bool {
        match self.history.pop() {
            Some(prev) => {
                self.state = BufferState::Ready(prev);
                true
            }
            None => false,
        }
    }
}
