// セッション全体の画像レコード集合
//
// Records keep the global extraction order. Each record sits behind its own
// mutex: a reader always sees a consistent (buffer, history) pair, and at most
// one mutation per record runs at a time.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{BufferState, ImageRecord};
use crate::error::MosaicError;

pub struct ImageStore {
    records: Vec<Mutex<ImageRecord>>,
    by_id: HashMap<String, usize>,
}

impl ImageStore {
    pub fn new(records: Vec<ImageRecord>) -> Self {
        let by_id = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id().to_string(), i))
            .collect();
        Self {
            records: records.into_iter().map(Mutex::new).collect(),
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Global index of the record with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Global index of the image at `position` inside document `name`.
    pub fn find(&self, name: &str, position: usize) -> crate::error::Result<Option<usize>> {
        for (i, slot) in self.records.iter().enumerate() {
            let record = lock(slot)?;
            if record.document_name() == name && record.position() == position {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    fn slot(&self, index: usize) -> crate::error::Result<&Mutex<ImageRecord>> {
        self.records
            .get(index)
            .ok_or_else(|| MosaicError::RecordNotFound(format!("index {index}")))
    }

    /// Run `f` with exclusive access to one record.
    pub fn with_record<R>(
        &self,
        index: usize,
        f: impl FnOnce(&mut ImageRecord) -> R,
    ) -> crate::error::Result<R> {
        let mut guard = lock(self.slot(index)?)?;
        Ok(f(&mut guard))
    }

    /// Owned copy of one record.
    pub fn get(&self, index: usize) -> crate::error::Result<ImageRecord> {
        self.with_record(index, |r| r.clone())
    }

    /// Decode the record's original bytes if that has not happened yet.
    ///
    /// Unmaterialized -> Materializing happens under the lock, the decode runs
    /// with the lock released, then Materializing -> Ready (or back to
    /// Unmaterialized on failure). A second caller arriving while a decode is
    /// in flight gets `RecordBusy`.
    pub fn materialize(&self, index: usize) -> crate::error::Result<()> {
        let slot = self.slot(index)?;

        let pending = {
            let mut record = lock(slot)?;
            match record.state() {
                BufferState::Ready(_) => return Ok(()),
                BufferState::Materializing => {
                    return Err(MosaicError::RecordBusy(record.id().to_string()));
                }
                BufferState::Unmaterialized => {
                    record.set_state(BufferState::Materializing);
                    record.clone()
                }
            }
        };

        let decoded = pending.decode_original();

        let mut record = lock(slot)?;
        match decoded {
            Ok(buf) => {
                debug!(
                    id = record.id(),
                    width = buf.width(),
                    height = buf.height(),
                    "materialized image buffer"
                );
                record.set_state(BufferState::Ready(buf));
                Ok(())
            }
            Err(e) => {
                record.set_state(BufferState::Unmaterialized);
                Err(e)
            }
        }
    }

    /// Owned copies of every record, in global order.
    ///
    /// Each copy is taken under that record's lock, so no copy mixes an old
    /// buffer with a new history.
    pub fn snapshot(&self) -> crate::error::Result<Vec<ImageRecord>> {
        self.records
            .iter()
            .map(|slot| lock(slot).map(|r| r.clone()))
            .collect()
    }

    /// Number of records that currently carry at least one edit.
    pub fn modified_count(&self) -> crate::error::Result<usize> {
        let mut count = 0;
        for slot in &self.records {
            if lock(slot)?.is_modified() {
                count += 1;
            }
        }
        Ok(count)
    }
}

fn lock(slot: &Mutex<ImageRecord>) -> crate::error::Result<MutexGuard<'_, ImageRecord>> {
    slot.lock()
        .map_err(|_| MosaicError::session("image record lock poisoned"))
}
