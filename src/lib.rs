//! Mosaic redaction of images embedded in Word documents.
//!
//! Pipeline: [`input`] collects files, [`pipeline::extract`] turns `.docx`
//! documents into [`record::ImageRecord`]s, [`session::EditingSession`]
//! applies mosaic edits with undo, and [`pipeline::regenerate`] writes the
//! edited images back into copies of the documents, bundled into one zip.

pub mod config;
pub mod docx;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod raster;
pub mod record;
pub mod session;
