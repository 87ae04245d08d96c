/// Errors raised by the Word document layer.
use crate::ooxml::opc::error::OpcError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OoxmlError>;

#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Container-level failure
    #[error("Package error: {0}")]
    Opc(#[from] OpcError),

    /// `document.xml` is not well-formed
    #[error("Malformed document XML: {0}")]
    Xml(String),

    /// The main document part named by the package is missing
    #[error("Main document part not found: {0}")]
    PartNotFound(String),

    /// The main part is not a WordprocessingML document
    #[error("Not a Word document: expected content type {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    #[error("Invalid document: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

/// A staged save that could not be renamed into place.
impl From<tempfile::PersistError> for OoxmlError {
    fn from(err: tempfile::PersistError) -> Self {
        OoxmlError::Io(err.error)
    }
}
