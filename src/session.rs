// 編集セッション: モザイク適用と Undo
//
// `begin_edit` / `undo` operate on a single record. `EditingSession` wraps an
// `ImageStore` and runs them under the record's lock, so edits to one image
// are strictly serialized.

use tracing::debug;

use crate::error::MosaicError;
use crate::raster::{Region, apply_mosaic};
use crate::record::{BufferState, ImageRecord, ImageStore};

/// Selections narrower or shorter than this (in buffer pixels) are treated as
/// stray clicks.
pub const DEFAULT_MIN_REGION: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditPolicy {
    pub min_region: f64,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            min_region: DEFAULT_MIN_REGION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    RegionTooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The mosaic was applied; `depth` is the history length afterwards.
    Applied { depth: usize },
    /// The record was left unchanged.
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    Restored { depth: usize },
    NothingToUndo,
}

/// Apply a mosaic to the record's current buffer, saving the previous buffer
/// on the undo stack.
///
/// The buffer must be materialized. Regions below `policy.min_region` in
/// either dimension leave the record untouched.
pub fn begin_edit(
    record: &mut ImageRecord,
    region: &Region,
    policy: &EditPolicy,
) -> crate::error::Result<EditOutcome> {
    let current = match record.state() {
        BufferState::Ready(buf) => buf,
        BufferState::Materializing => {
            return Err(MosaicError::RecordBusy(record.id().to_string()));
        }
        BufferState::Unmaterialized => {
            return Err(MosaicError::NotMaterialized(record.id().to_string()));
        }
    };

    if region.width < policy.min_region || region.height < policy.min_region {
        return Ok(EditOutcome::Ignored(IgnoredReason::RegionTooSmall));
    }

    let next = apply_mosaic(current, region);
    record.push_edit(next)?;

    debug!(
        id = record.id(),
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        pixel_size = region.pixel_size,
        depth = record.history_len(),
        "applied mosaic"
    );
    Ok(EditOutcome::Applied {
        depth: record.history_len(),
    })
}

/// Restore the most recent snapshot. No-op on an empty history.
pub fn undo(record: &mut ImageRecord) -> UndoOutcome {
    if record.pop_edit() {
        UndoOutcome::Restored {
            depth: record.history_len(),
        }
    } else {
        UndoOutcome::NothingToUndo
    }
}

/// Maps positions on a scaled display of an image to buffer pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    scale_x: f64,
    scale_y: f64,
}

impl DisplayMapping {
    /// `displayed` is the on-screen size, `buffer` the pixel size.
    pub fn new(displayed: (f64, f64), buffer: (u32, u32)) -> Self {
        let ratio = |buf: u32, shown: f64| {
            if shown > 0.0 { buf as f64 / shown } else { 1.0 }
        };
        Self {
            scale_x: ratio(buffer.0, displayed.0),
            scale_y: ratio(buffer.1, displayed.1),
        }
    }

    pub fn to_buffer(&self, point: (f64, f64)) -> (f64, f64) {
        (point.0 * self.scale_x, point.1 * self.scale_y)
    }

    /// Buffer-space region for a drag between two display points.
    pub fn drag_region(&self, start: (f64, f64), end: (f64, f64), pixel_size: u32) -> Region {
        Region::from_drag(self.to_buffer(start), self.to_buffer(end), pixel_size)
    }
}

/// Owns the session's records and serializes edits per record.
pub struct EditingSession {
    store: ImageStore,
    policy: EditPolicy,
}

impl EditingSession {
    pub fn new(records: Vec<ImageRecord>, policy: EditPolicy) -> Self {
        Self {
            store: ImageStore::new(records),
            policy,
        }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn policy(&self) -> &EditPolicy {
        &self.policy
    }

    /// Decode the image at `index` if needed. Must complete before editing it.
    pub fn materialize(&self, index: usize) -> crate::error::Result<()> {
        self.store.materialize(index)
    }

    /// Apply a mosaic region to the image at `index`.
    pub fn apply(&self, index: usize, region: &Region) -> crate::error::Result<EditOutcome> {
        let policy = self.policy;
        self.store
            .with_record(index, |record| begin_edit(record, region, &policy))?
    }

    /// Undo the most recent edit of the image at `index`.
    pub fn undo(&self, index: usize) -> crate::error::Result<UndoOutcome> {
        self.store.with_record(index, undo)
    }

    /// Resolve an id to a global index.
    pub fn index_of(&self, id: &str) -> crate::error::Result<usize> {
        self.store
            .index_of(id)
            .ok_or_else(|| MosaicError::RecordNotFound(id.to_string()))
    }

    /// Resolve `(document name, position)` to a global index.
    pub fn locate(&self, document: &str, position: usize) -> crate::error::Result<usize> {
        self.store.find(document, position)?.ok_or_else(|| {
            MosaicError::RecordNotFound(format!("{document} image {position}"))
        })
    }

    pub fn modified_count(&self) -> crate::error::Result<usize> {
        self.store.modified_count()
    }

    /// Consistent copy of every record, for regeneration or display.
    pub fn snapshot(&self) -> crate::error::Result<Vec<ImageRecord>> {
        self.store.snapshot()
    }
}
