pub mod codec;
pub mod markup;
pub mod package;
pub mod relationships;

pub use codec::{DocumentCodec, DocxCodec, EmbeddedImage, ReplacementImage};

/// File extension of the handled container format.
pub const DOCX_EXTENSION: &str = ".docx";

/// Prefix of the lock files Word leaves next to open documents.
pub const LOCK_FILE_PREFIX: &str = "~$";
