/// Errors raised while reading or rebuilding a `.docx` container.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    /// The container file does not exist
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// An archive member is missing
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Neither an override nor an extension default covers the part
    #[error("No content type declared for part {0}")]
    ContentTypeNotFound(String),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `[Content_Types].xml` or `_rels/.rels` is malformed
    #[error("Malformed package XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Package XML attribute is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, OpcError>;
