//! Read-only helpers over the package-level parts of an OPC container:
//! `[Content_Types].xml` and `_rels/.rels`.

use crate::common::xml::unescape_xml;
use crate::ooxml::opc::constants::{member, relationship_type};
use crate::ooxml::opc::error::{OpcError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// Content type map for looking up content types by part name or extension.
///
/// Implements the OPC discovery rule: an `Override` for the exact part name
/// wins, otherwise the `Default` for the part's extension applies.
#[derive(Debug, Default)]
pub struct ContentTypeMap {
    /// Lower-cased extension -> content type
    defaults: HashMap<String, String>,
    /// Lower-cased partname (with leading `/`) -> content type
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    /// Parse content types from `[Content_Types].xml`.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::default();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (attr_value(e, b"Extension")?, attr_value(e, b"ContentType")?)
                        {
                            map.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    },
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (attr_value(e, b"PartName")?, attr_value(e, b"ContentType")?)
                        {
                            map.overrides.insert(part.to_ascii_lowercase(), ct);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Content type of the archive member `member_name` (no leading `/`).
    pub fn content_type_for(&self, member_name: &str) -> Result<&str> {
        let partname = format!("/{}", member_name.trim_start_matches('/')).to_ascii_lowercase();
        if let Some(ct) = self.overrides.get(&partname) {
            return Ok(ct);
        }

        partname
            .rsplit_once('.')
            .and_then(|(_, ext)| self.defaults.get(ext))
            .map(String::as_str)
            .ok_or(OpcError::ContentTypeNotFound(partname))
    }
}

/// Resolve the archive member holding the main document.
///
/// Follows the package-level `officeDocument` relationship. Containers
/// without a usable relationship fall back to `word/document.xml`.
pub fn main_document_member(package_rels_xml: Option<&[u8]>) -> Result<String> {
    let Some(xml) = package_rels_xml else {
        return Ok(member::MAIN_DOCUMENT.to_string());
    };

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let is_main = attr_value(e, b"Type")?.is_some_and(|t| {
                    t == relationship_type::OFFICE_DOCUMENT
                        || t == relationship_type::OFFICE_DOCUMENT_STRICT
                });
                if is_main && let Some(target) = attr_value(e, b"Target")? {
                    return Ok(normalize_target(&target));
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }

    Ok(member::MAIN_DOCUMENT.to_string())
}

/// Package-relative targets are resolved against the package root.
fn normalize_target(target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in target.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)?;
            return Ok(Some(unescape_xml(raw).into_owned()));
        }
    }
    Ok(None)
}
