//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! Reading borrows the archive bytes; writing rebuilds an archive member by
//! member so that parts nobody touched keep their exact compressed bytes.

use crate::ooxml::opc::constants::{DOCX_EXTENSION, member};
use crate::ooxml::opc::error::{OpcError, Result};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Physical package reader over an in-memory ZIP archive.
pub struct PhysPkgReader<'data> {
    archive: ZipArchive<Cursor<&'data [u8]>>,
}

impl<'data> PhysPkgReader<'data> {
    /// Open the archive stored in `data`.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Number of members in the archive.
    #[inline]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// All member names, in archive order.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(String::from).collect()
    }

    /// Check if a specific member exists in the package.
    pub fn contains(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Read and decompress one member.
    pub fn blob_for(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(OpcError::PartNotFound(name.to_string())),
            Err(e) => return Err(e.into()),
        };

        let mut blob = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut blob)?;
        Ok(blob)
    }

    /// Read a member if it exists.
    pub fn optional_blob_for(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.blob_for(name) {
            Ok(blob) => Ok(Some(blob)),
            Err(OpcError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Physical package writer.
///
/// Members are written in the order they are added. Use
/// [`PhysPkgWriter::rewrite_from`] to clone an existing archive while
/// substituting selected members.
pub struct PhysPkgWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl PhysPkgWriter<Cursor<Vec<u8>>> {
    /// Create a new package writer that writes to memory.
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }
}

impl<W: Write + Seek> PhysPkgWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Write a member with Deflate compression.
    pub fn write(&mut self, name: &str, blob: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(name, options)?;
        self.zip.write_all(blob)?;
        Ok(())
    }

    /// Copy every member of `source` in archive order.
    ///
    /// Members for which `replace` returns `Some` are written fresh with the
    /// returned bytes; all others are copied raw, without recompression.
    pub fn rewrite_from<F>(&mut self, source: &mut PhysPkgReader<'_>, mut replace: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<Vec<u8>>,
    {
        for index in 0..source.archive.len() {
            let raw = source.archive.by_index_raw(index)?;
            let name = raw.name().to_string();

            match replace(&name) {
                Some(blob) => {
                    drop(raw);
                    self.write(&name, &blob)?;
                },
                None => self.zip.raw_copy_file(raw)?,
            }
        }
        Ok(())
    }

    /// Finish the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

/// Container-validity probe for Word documents.
///
/// True only when `path` has a `.docx` extension, exists, opens as a ZIP
/// archive, and carries `[Content_Types].xml`, `_rels/.rels` and
/// `word/document.xml`. Never errors: anything unexpected means "not a docx".
pub fn probe_container(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCX_EXTENSION));
    if !has_extension || !path.is_file() {
        return false;
    }

    let Ok(file) = File::open(path) else {
        return false;
    };
    let Ok(archive) = ZipArchive::new(file) else {
        return false;
    };

    member::REQUIRED
        .iter()
        .all(|required| archive.file_names().any(|name| name == *required))
}
