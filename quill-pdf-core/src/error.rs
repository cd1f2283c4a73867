//! Error types shared across the crate

use thiserror::Error;

/// Errors raised while building, parsing or writing PDF object graphs.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Wrong value type: expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Object is immutable and cannot be modified")]
    Immutable,

    #[error("Expected 'obj' keyword at offset {position}, found {found:?}")]
    MissingObjectKeyword { position: u64, found: String },

    #[error("Unexpected token at offset {position}: expected {expected}, found {found:?}")]
    UnexpectedToken {
        position: u64,
        expected: &'static str,
        found: String,
    },

    #[error("Unexpected end of input at offset {position}")]
    UnexpectedEof { position: u64 },

    #[error("Invalid stream length: {0}")]
    InvalidStreamLength(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Invalid cross-reference data: {0}")]
    InvalidXref(String),

    #[error("Encryption error: {0}")]
    Encryption(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

impl PdfError {
    /// Stable copy used to replay a failed delayed load without re-parsing.
    ///
    /// IO errors lose their underlying source but keep kind and message,
    /// which is enough for the caller to see the same failure twice.
    pub(crate) fn replay(&self) -> PdfError {
        match self {
            PdfError::Io(e) => PdfError::Io(std::io::Error::new(e.kind(), e.to_string())),
            PdfError::WrongType { expected, found } => PdfError::WrongType { expected, found },
            PdfError::Immutable => PdfError::Immutable,
            PdfError::MissingObjectKeyword { position, found } => PdfError::MissingObjectKeyword {
                position: *position,
                found: found.clone(),
            },
            PdfError::UnexpectedToken {
                position,
                expected,
                found,
            } => PdfError::UnexpectedToken {
                position: *position,
                expected,
                found: found.clone(),
            },
            PdfError::UnexpectedEof { position } => {
                PdfError::UnexpectedEof { position: *position }
            }
            PdfError::InvalidStreamLength(s) => PdfError::InvalidStreamLength(s.clone()),
            PdfError::InvalidHandle(s) => PdfError::InvalidHandle(s.clone()),
            PdfError::ValueOutOfRange(s) => PdfError::ValueOutOfRange(s.clone()),
            PdfError::InvalidOperation(s) => PdfError::InvalidOperation(s.clone()),
            PdfError::InvalidHeader => PdfError::InvalidHeader,
            PdfError::InvalidXref(s) => PdfError::InvalidXref(s.clone()),
            PdfError::Encryption(s) => PdfError::Encryption(s.clone()),
        }
    }
}
