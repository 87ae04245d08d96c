//! Office Open XML (OOXML) support, narrowed to WordprocessingML.
//!
//! 1. **OPC Layer** (`opc`): the ZIP container, content types, package
//!    relationships, and the container-validity probe.
//! 2. **Word Layer** (`docx`): an editable arena model of the main document
//!    part with splice-based serialization.
//!
//! ```rust,no_run
//! use docx_batch::ooxml::docx::Package;
//!
//! let pkg = Package::open("document.docx")?;
//! println!("{}", pkg.document().text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;

pub use error::{OoxmlError, Result};
