use std::fmt;

use thiserror::Error;

/// Stage of the regeneration pipeline in which a document failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationStage {
    /// Re-encoding an edited pixel buffer into its original format.
    Encode,
    /// Substituting image parts inside the document container.
    Rebuild,
    /// Writing the output bundle.
    Archive,
}

impl fmt::Display for RegenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegenerationStage::Encode => "encode",
            RegenerationStage::Rebuild => "rebuild",
            RegenerationStage::Archive => "archive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Document decode error: {0}")]
    DocumentDecodeError(String),

    #[error("Document rebuild error: {0}")]
    DocumentRebuildError(String),

    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    #[error("Image encode error: {0}")]
    ImageEncodeError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Image record not found: {0}")]
    RecordNotFound(String),

    #[error("Image {0} has no decoded pixel buffer yet")]
    NotMaterialized(String),

    #[error("Image {0} is being decoded; retry once it is ready")]
    RecordBusy(String),

    /// 画素バッファ長が width*height*4 と一致しない（プログラムエラー扱い）。
    #[error("Buffer dimension mismatch: expected {expected} bytes, got {actual}")]
    BufferDimensionMismatch { expected: usize, actual: usize },

    #[error("Regeneration failed for {document} ({stage}): {message}")]
    RegenerationError {
        document: String,
        stage: RegenerationStage,
        message: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`MosaicError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl MosaicError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a document decode error.
    document_decode => DocumentDecodeError,
    /// Create a document rebuild error.
    document_rebuild => DocumentRebuildError,
    /// Create an image decode error.
    image_decode => ImageDecodeError,
    /// Create an image encode error.
    image_encode => ImageEncodeError,
    /// Create an archive error.
    archive => ArchiveError,
    /// Create a session error.
    session => SessionError,
}

impl MosaicError {
    /// Wrap any error as a regeneration failure of `document` at `stage`.
    pub fn regeneration(
        document: impl Into<String>,
        stage: RegenerationStage,
        source: impl fmt::Display,
    ) -> Self {
        Self::RegenerationError {
            document: document.into(),
            stage,
            message: source.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for MosaicError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::ArchiveError(e.to_string())
    }
}

impl From<quick_xml::Error> for MosaicError {
    fn from(e: quick_xml::Error) -> Self {
        Self::DocumentDecodeError(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for MosaicError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::DocumentDecodeError(e.to_string())
    }
}

impl From<image::ImageError> for MosaicError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageDecodeError(e.to_string())
    }
}

impl From<serde_json::Error> for MosaicError {
    fn from(e: serde_json::Error) -> Self {
        Self::ArchiveError(e.to_string())
    }
}

impl From<serde_yml::Error> for MosaicError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MosaicError>;
