/// Package implementation for Word documents.
use crate::ooxml::docx::document::Document;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, member, namespace};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::pkgreader::{ContentTypeMap, main_document_member};
use crate::ooxml::opc::{PhysPkgReader, PhysPkgWriter, probe_container};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A Word (.docx) package.
///
/// Holds the original container bytes and the parsed main document. Saving
/// copies every other archive member through unchanged and writes only the
/// main part anew, and only when it was modified.
///
/// # Examples
///
/// ```rust,no_run
/// use docx_batch::ooxml::docx::Package;
///
/// let mut pkg = Package::open("document.docx")?;
/// println!("{} paragraphs", pkg.document().statistics().paragraph_count());
/// pkg.save("document.docx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Package {
    data: Vec<u8>,
    main_part: String,
    document: Document,
}

impl Package {
    /// Open a .docx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()).into());
        }
        Self::from_bytes(fs::read(path)?)
    }

    /// Create a .docx package from the bytes of a container.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (main_part, xml) = {
            let mut reader = PhysPkgReader::new(&data)?;
            let rels = reader.optional_blob_for(member::PACKAGE_RELS)?;
            let main_part = main_document_member(rels.as_deref())?;

            let content_types = ContentTypeMap::from_xml(&reader.blob_for(member::CONTENT_TYPES)?)?;
            let content_type = content_types.content_type_for(&main_part)?;
            if !ct::WML_MAIN_TYPES.contains(&content_type) {
                return Err(OoxmlError::InvalidContentType {
                    expected: ct::WML_DOCUMENT_MAIN.to_string(),
                    got: content_type.to_string(),
                });
            }

            let xml = reader.blob_for(&main_part).map_err(|e| match e {
                OpcError::PartNotFound(name) => OoxmlError::PartNotFound(name),
                other => other.into(),
            })?;
            (main_part, xml)
        };

        let document = Document::parse(xml)?;
        debug!(part = %main_part, paragraphs = document.paragraphs.len(), "parsed main document part");
        Ok(Self {
            data,
            main_part,
            document,
        })
    }

    /// Build a minimal package around the given `w:body` content.
    ///
    /// The `w` prefix is bound to the WordprocessingML namespace.
    pub fn from_body_xml(body: &str) -> Result<Self> {
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{types}"><Default Extension="rels" ContentType="{rels}"/><Default Extension="xml" ContentType="{xml}"/><Override PartName="/{main}" ContentType="{doc}"/></Types>"#,
            types = namespace::OPC_CONTENT_TYPES,
            rels = ct::OPC_RELATIONSHIPS,
            xml = ct::XML,
            main = member::MAIN_DOCUMENT,
            doc = ct::WML_DOCUMENT_MAIN,
        );
        let package_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{ns}"><Relationship Id="rId1" Type="{rel}" Target="{main}"/></Relationships>"#,
            ns = namespace::OPC_RELATIONSHIPS,
            rel = crate::ooxml::opc::constants::relationship_type::OFFICE_DOCUMENT,
            main = member::MAIN_DOCUMENT,
        );
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{ns}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{body}</w:body></w:document>"#,
            ns = namespace::WML_MAIN,
        );

        let mut writer = PhysPkgWriter::in_memory();
        writer.write(member::CONTENT_TYPES, content_types.as_bytes())?;
        writer.write(member::PACKAGE_RELS, package_rels.as_bytes())?;
        writer.write(member::MAIN_DOCUMENT, document.as_bytes())?;
        Self::from_bytes(writer.finish()?.into_inner())
    }

    /// Whether `path` looks like a Word container. See [`probe_container`].
    #[inline]
    pub fn is_docx_file<P: AsRef<Path>>(path: P) -> bool {
        probe_container(path.as_ref())
    }

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Archive member holding the main document.
    #[inline]
    pub fn main_part_name(&self) -> &str {
        &self.main_part
    }

    /// Serialize the package.
    ///
    /// An unmodified package yields the bytes it was loaded from.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.document.is_modified() {
            return Ok(self.data.clone());
        }

        let xml = self.document.to_xml();
        let mut source = PhysPkgReader::new(&self.data)?;
        let mut writer = PhysPkgWriter::in_memory();
        let mut xml = Some(xml);
        writer.rewrite_from(&mut source, |name| {
            if name == self.main_part { xml.take() } else { None }
        })?;
        Ok(writer.finish()?.into_inner())
    }

    /// Save the package to `path`.
    ///
    /// The bytes are written to a temporary sibling and renamed over the
    /// target, so a failed save never leaves a truncated file behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        staged.write_all(&bytes)?;
        staged.as_file().sync_all()?;
        if let Ok(metadata) = fs::metadata(path) {
            staged.as_file().set_permissions(metadata.permissions())?;
        }
        staged.persist(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "saved package");
        Ok(())
    }
}
