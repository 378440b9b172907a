// 編集セッション: 適用・Undo・状態遷移のテスト

mod common;

use std::sync::Arc;

use docx_mosaic::error::MosaicError;
use docx_mosaic::raster::Region;
use docx_mosaic::record::{
    BufferState, DocumentId, ImageRecord, ImageStore, RecordInit, SourceDocument,
};
use docx_mosaic::session::{
    EditOutcome, EditPolicy, EditingSession, IgnoredReason, UndoOutcome, begin_edit, undo,
};
use image::ImageFormat;

fn record(doc: &Arc<SourceDocument>, position: usize, png: Vec<u8>, w: u32, h: u32) -> ImageRecord {
    ImageRecord::new(RecordInit {
        id: format!("{}-{}", doc.name, position),
        source: Arc::clone(doc),
        position,
        original_bytes: Arc::from(png),
        width: w,
        height: h,
        format: ImageFormat::Png,
        content_type: "image/png".into(),
    })
}

fn source(name: &str) -> Arc<SourceDocument> {
    Arc::new(SourceDocument {
        id: DocumentId(0),
        name: name.into(),
        bytes: Arc::from(Vec::new()),
    })
}

/// Decode a record through the store, as the session does.
fn materialized(record: ImageRecord) -> ImageRecord {
    let store = ImageStore::new(vec![record]);
    store.materialize(0).expect("decode fixture png");
    store.get(0).expect("record 0")
}

fn ready_record() -> ImageRecord {
    let doc = source("a.docx");
    materialized(record(&doc, 0, common::gradient_png(40, 30), 40, 30))
}

fn region(x: f64, y: f64, w: f64, h: f64) -> Region {
    Region::new(x, y, w, h, 4)
}

// ============================================================
// 1. begin_edit / undo (単一レコード)
// ============================================================

#[test]
fn test_edit_pushes_history_and_sets_modified() {
    let mut r = ready_record();
    assert!(!r.is_modified());
    let before = r.current_buffer().unwrap().clone();

    let outcome = begin_edit(&mut r, &region(2.0, 2.0, 20.0, 20.0), &EditPolicy::default()).unwrap();
    assert_eq!(outcome, EditOutcome::Applied { depth: 1 });
    assert!(r.is_modified());
    assert_eq!(r.history_len(), 1);
    assert_eq!(r.history()[0], before);
    assert_ne!(r.current_buffer().unwrap(), &before);
}

#[test]
fn test_n_edits_then_n_undos_restore_original() {
    let mut r = ready_record();
    let original = r.current_buffer().unwrap().clone();
    let policy = EditPolicy::default();

    let regions = [
        region(0.0, 0.0, 10.0, 10.0),
        region(5.0, 5.0, 30.0, 20.0),
        region(20.5, 1.5, 19.0, 28.0),
    ];
    for (i, reg) in regions.iter().enumerate() {
        begin_edit(&mut r, reg, &policy).unwrap();
        assert_eq!(r.history_len(), i + 1);
    }

    assert_eq!(undo(&mut r), UndoOutcome::Restored { depth: 2 });
    assert_eq!(r.history_len(), 2);
    assert!(r.is_modified());
    assert_eq!(undo(&mut r), UndoOutcome::Restored { depth: 1 });
    assert_eq!(undo(&mut r), UndoOutcome::Restored { depth: 0 });

    assert_eq!(r.current_buffer().unwrap(), &original);
    assert!(!r.is_modified());
    assert_eq!(undo(&mut r), UndoOutcome::NothingToUndo);
    assert_eq!(r.current_buffer().unwrap(), &original);
}

#[test]
fn test_undo_restores_intermediate_state() {
    let mut r = ready_record();
    let policy = EditPolicy::default();
    begin_edit(&mut r, &region(0.0, 0.0, 12.0, 12.0), &policy).unwrap();
    let after_first = r.current_buffer().unwrap().clone();
    begin_edit(&mut r, &region(10.0, 10.0, 25.0, 15.0), &policy).unwrap();
    undo(&mut r);
    assert_eq!(r.current_buffer().unwrap(), &after_first);
}

#[test]
fn test_small_region_is_ignored() {
    let mut r = ready_record();
    let before = r.current_buffer().unwrap().clone();
    let outcome = begin_edit(&mut r, &region(1.0, 1.0, 3.0, 3.0), &EditPolicy::default()).unwrap();
    assert_eq!(outcome, EditOutcome::Ignored(IgnoredReason::RegionTooSmall));
    assert_eq!(r.current_buffer().unwrap(), &before);
    assert_eq!(r.history_len(), 0);

    // one thin dimension is enough to reject
    let outcome = begin_edit(&mut r, &region(1.0, 1.0, 30.0, 4.9), &EditPolicy::default()).unwrap();
    assert_eq!(outcome, EditOutcome::Ignored(IgnoredReason::RegionTooSmall));
    assert!(!r.is_modified());
}

#[test]
fn test_custom_min_region() {
    let mut r = ready_record();
    let policy = EditPolicy { min_region: 1.0 };
    let outcome = begin_edit(&mut r, &region(1.0, 1.0, 3.0, 3.0), &policy).unwrap();
    assert_eq!(outcome, EditOutcome::Applied { depth: 1 });
}

#[test]
fn test_edit_requires_materialized_buffer() {
    let doc = source("a.docx");
    let mut r = record(&doc, 0, common::gradient_png(8, 8), 8, 8);
    assert_eq!(r.state(), &BufferState::Unmaterialized);
    let err = begin_edit(&mut r, &region(0.0, 0.0, 8.0, 8.0), &EditPolicy::default()).unwrap_err();
    assert!(matches!(err, MosaicError::NotMaterialized(_)));
    assert_eq!(r.history_len(), 0);
}

#[test]
fn test_materialize_rejects_dimension_mismatch() {
    let doc = source("a.docx");
    // record claims 9x9 but payload is 8x8
    let store = ImageStore::new(vec![record(&doc, 0, common::gradient_png(8, 8), 9, 9)]);
    let err = store.materialize(0).unwrap_err();
    assert!(matches!(err, MosaicError::BufferDimensionMismatch { .. }));
    assert_eq!(store.get(0).unwrap().state(), &BufferState::Unmaterialized);
}

#[test]
fn test_failed_materialize_can_be_retried_as_unmaterialized() {
    let doc = source("a.docx");
    let store = ImageStore::new(vec![record(&doc, 0, b"not a png".to_vec(), 4, 4)]);
    assert!(matches!(store.materialize(0), Err(MosaicError::ImageDecodeError(_))));
    // a failed decode must not leave the record busy
    assert!(matches!(store.materialize(0), Err(MosaicError::ImageDecodeError(_))));
    let r = store.get(0).unwrap();
    assert_eq!(r.state(), &BufferState::Unmaterialized);
    assert!(r.current_buffer().is_none());
}

#[test]
fn test_history_entries_are_independent_copies() {
    let mut r = ready_record();
    let policy = EditPolicy::default();
    begin_edit(&mut r, &region(0.0, 0.0, 40.0, 30.0), &policy).unwrap();
    let snapshot = r.history()[0].clone();
    begin_edit(&mut r, &Region::new(0.0, 0.0, 40.0, 30.0, 13), &policy).unwrap();
    assert_eq!(r.history()[0], snapshot, "older snapshot must not change");
}

// ============================================================
// 2. EditingSession (レコード集合)
// ============================================================

fn session_with_two_documents() -> EditingSession {
    let a = source("a.docx");
    let b = Arc::new(SourceDocument {
        id: DocumentId(1),
        name: "sub/b.docx".into(),
        bytes: Arc::from(Vec::new()),
    });
    let records = vec![
        record(&a, 0, common::gradient_png(16, 16), 16, 16),
        record(&a, 1, common::solid_png(12, 10, [9, 9, 9, 255]), 12, 10),
        record(&b, 0, common::gradient_png(20, 8), 20, 8),
    ];
    EditingSession::new(records, EditPolicy::default())
}

#[test]
fn test_session_locate_and_index_of() {
    let session = session_with_two_documents();
    assert_eq!(session.locate("a.docx", 1).unwrap(), 1);
    assert_eq!(session.locate("sub/b.docx", 0).unwrap(), 2);
    assert_eq!(session.index_of("sub/b.docx-0").unwrap(), 2);

    assert!(matches!(
        session.locate("a.docx", 5),
        Err(MosaicError::RecordNotFound(_))
    ));
    assert!(matches!(
        session.index_of("missing"),
        Err(MosaicError::RecordNotFound(_))
    ));
}

#[test]
fn test_session_apply_before_materialize_fails() {
    let session = session_with_two_documents();
    let err = session.apply(0, &region(0.0, 0.0, 8.0, 8.0)).unwrap_err();
    assert!(matches!(err, MosaicError::NotMaterialized(_)));
}

#[test]
fn test_session_materialize_is_idempotent() {
    let session = session_with_two_documents();
    session.materialize(2).unwrap();
    session.materialize(2).unwrap();
    let record = session.store().get(2).unwrap();
    assert_eq!(record.current_buffer().unwrap().width(), 20);
    assert_eq!(record.current_buffer().unwrap().height(), 8);
}

#[test]
fn test_session_apply_and_undo_tracks_modified_count() {
    let session = session_with_two_documents();
    for i in 0..3 {
        session.materialize(i).unwrap();
    }
    assert_eq!(session.modified_count().unwrap(), 0);

    let outcome = session.apply(0, &region(0.0, 0.0, 16.0, 16.0)).unwrap();
    assert_eq!(outcome, EditOutcome::Applied { depth: 1 });
    session.apply(2, &region(2.0, 0.0, 10.0, 8.0)).unwrap();
    assert_eq!(session.modified_count().unwrap(), 2);

    assert_eq!(session.undo(2).unwrap(), UndoOutcome::Restored { depth: 0 });
    assert_eq!(session.undo(1).unwrap(), UndoOutcome::NothingToUndo);
    assert_eq!(session.modified_count().unwrap(), 1);
}

#[test]
fn test_session_out_of_range_index() {
    let session = session_with_two_documents();
    assert!(matches!(
        session.undo(99),
        Err(MosaicError::RecordNotFound(_))
    ));
    assert!(matches!(
        session.materialize(99),
        Err(MosaicError::RecordNotFound(_))
    ));
}

#[test]
fn test_snapshot_is_detached_from_later_edits() {
    let session = session_with_two_documents();
    session.materialize(0).unwrap();
    session.apply(0, &region(0.0, 0.0, 16.0, 16.0)).unwrap();

    let snapshot = session.snapshot().unwrap();
    let frozen = snapshot[0].current_buffer().unwrap().clone();

    session.apply(0, &Region::new(0.0, 0.0, 16.0, 16.0, 7)).unwrap();
    session.undo(0).unwrap();
    session.undo(0).unwrap();

    assert_eq!(snapshot[0].history_len(), 1);
    assert_eq!(snapshot[0].current_buffer().unwrap(), &frozen);
    assert!(!session.store().get(0).unwrap().is_modified());
}

#[test]
fn test_concurrent_edits_on_different_records() {
    let session = session_with_two_documents();
    for i in 0..3 {
        session.materialize(i).unwrap();
    }
    std::thread::scope(|s| {
        for i in [0usize, 2] {
            let session = &session;
            s.spawn(move || {
                for _ in 0..5 {
                    session.apply(i, &region(0.0, 0.0, 8.0, 8.0)).unwrap();
                }
            });
        }
    });
    assert_eq!(session.store().get(0).unwrap().history_len(), 5);
    assert_eq!(session.store().get(2).unwrap().history_len(), 5);
    assert_eq!(session.store().get(1).unwrap().history_len(), 0);
}
