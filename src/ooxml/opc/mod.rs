/// Open Packaging Conventions (OPC) container layer.
///
/// A `.docx` file is a ZIP archive of XML parts. This module reads the
/// archive, resolves the main document part through the package
/// relationships and content types, and rebuilds the archive on save with
/// every untouched member copied in its original compressed form.
pub mod constants;
pub mod error;
pub mod phys_pkg;
pub mod pkgreader;

pub use error::{OpcError, Result};
pub use phys_pkg::{PhysPkgReader, PhysPkgWriter, probe_container};
