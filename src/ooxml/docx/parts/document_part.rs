/// DocumentPart - the main document.xml part of a Word document.
///
/// Parsing walks the part once and records byte offsets for every element
/// that may later change: run text slots, property blocks, and the
/// insertion points for property blocks that do not exist yet. Saving splices
/// the regenerated fragments into the original bytes, so everything the model
/// does not understand survives untouched.
use crate::common::xml::unescape_xml;
use crate::ooxml::docx::document::{Block, CellId, Document, ParagraphId, RunId, TableId};
use crate::ooxml::docx::paragraph::{Paragraph, Run, RunShape, Separator, TextSlot};
use crate::ooxml::docx::properties::{PropertyBlock, PropertyChild, PropertyKind};
use crate::ooxml::docx::table::{Cell, Row, Table};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::ops::Range;

/// A pending replacement of `span` in the source part with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub(crate) span: Range<usize>,
    pub(crate) text: String,
}

impl Edit {
    pub(crate) fn new(span: Range<usize>, text: String) -> Self {
        Self { span, text }
    }
}

const DEFAULT_WML_PREFIX: &str = "w";

/// Apply non-overlapping edits to `src`.
///
/// Edits are ordered by position; an insertion sorts before a replacement
/// that starts at the same offset.
pub(crate) fn splice(src: &[u8], mut edits: Vec<Edit>) -> Vec<u8> {
    edits.sort_by_key(|edit| (edit.span.start, edit.span.end));

    let growth: usize = edits.iter().map(|edit| edit.text.len()).sum();
    let mut out = Vec::with_capacity(src.len() + growth);
    let mut cursor = 0;
    for edit in edits {
        out.extend_from_slice(&src[cursor..edit.span.start]);
        out.extend_from_slice(edit.text.as_bytes());
        cursor = edit.span.end;
    }
    out.extend_from_slice(&src[cursor..]);
    out
}

/// Position-aware reader over the main document part.
pub(crate) struct DocumentPart<'a> {
    src: &'a str,
    reader: Reader<&'a [u8]>,
    doc: Document,
    /// Prefix bound to the WordprocessingML namespace on the root element.
    wml_prefix: String,
}

impl<'a> DocumentPart<'a> {
    /// Parse `src` into a document arena. The returned document does not own
    /// the source bytes yet; the caller attaches them.
    pub(crate) fn parse(src: &'a str) -> Result<Document> {
        let mut part = Self {
            src,
            reader: Reader::from_str(src),
            doc: Document::default(),
            wml_prefix: DEFAULT_WML_PREFIX.to_string(),
        };
        part.parse_root()?;
        Ok(part.doc)
    }

    fn next(&mut self) -> Result<(Event<'a>, usize)> {
        let event = self.reader.read_event()?;
        Ok((event, self.reader.buffer_position() as usize))
    }

    /// Offset of the `<` opening the tag that ends at `end`.
    ///
    /// Attribute values cannot contain `<`, so the last one before the end of
    /// a tag is its start.
    fn tag_start(&self, end: usize) -> usize {
        memchr::memrchr(b'<', &self.src.as_bytes()[..end]).unwrap_or(0)
    }

    fn parse_root(&mut self) -> Result<()> {
        let mut seen_root = false;
        loop {
            let (event, _) = self.next()?;
            match event {
                Event::Start(e) | Event::Empty(e) if !seen_root => {
                    seen_root = true;
                    self.resolve_wml_prefix(&e);
                },
                Event::Start(e) if self.is_wml(&e, b"body") => {
                    self.doc.has_body = true;
                    self.doc.blocks = self.parse_blocks(None)?;
                },
                Event::Empty(e) if self.is_wml(&e, b"body") => self.doc.has_body = true,
                Event::Eof => return Ok(()),
                _ => {},
            }
        }
    }

    /// Look up the prefix the root element binds to the WordprocessingML
    /// namespace. Without such a binding `w` is assumed.
    fn resolve_wml_prefix(&mut self, root: &BytesStart<'_>) {
        for attr in root.attributes().flatten() {
            let value = attr.value.as_ref();
            if value != namespace::WML_MAIN.as_bytes() && value != namespace::WML_MAIN_STRICT.as_bytes() {
                continue;
            }
            let key = attr.key.as_ref();
            if key == b"xmlns" {
                self.wml_prefix.clear();
                return;
            }
            if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                self.wml_prefix = String::from_utf8_lossy(prefix).into_owned();
                return;
            }
        }
    }

    /// WordprocessingML element check: `{prefix}:{local}` for the bound
    /// prefix, or unprefixed `{local}`.
    ///
    /// Other prefixes are rejected so that e.g. `m:r` (math runs) never
    /// counts as a text run.
    fn is_wml(&self, e: &BytesStart<'_>, local: &[u8]) -> bool {
        if e.local_name().as_ref() != local {
            return false;
        }
        match e.name().prefix() {
            Some(prefix) => prefix.as_ref() == self.wml_prefix.as_bytes(),
            None => true,
        }
    }

    /// Text a run child stands for, if it is a tab or a line break.
    fn separator_char(&self, e: &BytesStart<'_>) -> Option<char> {
        if self.is_wml(e, b"tab") || self.is_wml(e, b"ptab") {
            return Some('\t');
        }
        if self.is_wml(e, b"cr") {
            return Some('\n');
        }
        if !self.is_wml(e, b"br") {
            return None;
        }
        // Page and column breaks lay out the page; they are not text.
        let break_type = e
            .attributes()
            .flatten()
            .find(|attr| attr.key.local_name().as_ref() == b"type")
            .map(|attr| attr.value.into_owned());
        match break_type.as_deref() {
            None | Some(b"textWrapping") => Some('\n'),
            Some(_) => None,
        }
    }

    /// Block content of `w:body` or `w:tc`, up to the container's end tag.
    fn parse_blocks(&mut self, mut cell_properties: Option<&mut PropertyBlock>) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        loop {
            let (event, end) = self.next()?;
            match event {
                Event::Start(e) => {
                    if self.is_wml(&e, b"p") {
                        blocks.push(Block::Paragraph(self.parse_paragraph(&e, end)?));
                    } else if self.is_wml(&e, b"tbl") {
                        blocks.push(Block::Table(self.parse_table()?));
                    } else if self.is_wml(&e, b"tcPr")
                        && let Some(properties) = cell_properties.as_deref_mut()
                    {
                        *properties = self.parse_property_block(PropertyKind::Cell, &e, end)?;
                    } else {
                        if self.is_wml(&e, b"sectPr") {
                            self.doc.section_count += 1;
                        }
                        self.skip_element()?;
                    }
                },
                Event::Empty(e) => {
                    if self.is_wml(&e, b"p") {
                        let properties = PropertyBlock::absent(PropertyKind::Paragraph, &prefix_of(&e), None);
                        let id = self.push_paragraph(Paragraph::new(SmallVec::new(), properties));
                        blocks.push(Block::Paragraph(id));
                    } else if self.is_wml(&e, b"tcPr")
                        && let Some(properties) = cell_properties.as_deref_mut()
                    {
                        *properties = self.empty_property_block(PropertyKind::Cell, &e, end)?;
                    } else if self.is_wml(&e, b"sectPr") {
                        self.doc.section_count += 1;
                    }
                },
                Event::End(_) => return Ok(blocks),
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
    }

    fn parse_paragraph(&mut self, start: &BytesStart<'_>, tag_end: usize) -> Result<ParagraphId> {
        let mut properties = PropertyBlock::absent(PropertyKind::Paragraph, &prefix_of(start), Some(tag_end));
        let mut runs: SmallVec<[RunId; 8]> = SmallVec::new();
        let mut depth = 0usize;

        loop {
            let (event, end) = self.next()?;
            match event {
                Event::Start(e) => {
                    if self.is_wml(&e, b"r") {
                        runs.push(self.parse_run(&e, end)?);
                    } else if depth == 0 && self.is_wml(&e, b"pPr") {
                        properties = self.parse_property_block(PropertyKind::Paragraph, &e, end)?;
                        if properties.child("sectPr").is_some() {
                            self.doc.section_count += 1;
                        }
                    } else if e.local_name().as_ref() == b"AlternateContent" {
                        // Both branches repeat the same content; neither is text of this paragraph.
                        self.skip_element()?;
                    } else {
                        // Hyperlinks, tracked changes, smart tags: runs inside still count.
                        depth += 1;
                    }
                },
                Event::Empty(e) => {
                    if self.is_wml(&e, b"r") {
                        let run = self.self_closing_run(&e, end);
                        runs.push(self.push_run(run));
                    } else if depth == 0 && self.is_wml(&e, b"pPr") {
                        properties = self.empty_property_block(PropertyKind::Paragraph, &e, end)?;
                    }
                },
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                },
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }

        Ok(self.push_paragraph(Paragraph::new(runs, properties)))
    }

    fn parse_run(&mut self, start: &BytesStart<'_>, tag_end: usize) -> Result<RunId> {
        let prefix = prefix_of(start);
        let mut properties = PropertyBlock::absent(PropertyKind::Run, &prefix, Some(tag_end));
        let mut slots: SmallVec<[TextSlot; 1]> = SmallVec::new();
        let mut separators: SmallVec<[Separator; 2]> = SmallVec::new();

        loop {
            let (event, end) = self.next()?;
            match event {
                Event::Start(e) => {
                    if self.is_wml(&e, b"rPr") {
                        properties = self.parse_property_block(PropertyKind::Run, &e, end)?;
                    } else if self.is_wml(&e, b"t") {
                        let element_start = self.tag_start(end);
                        let element_end = self.skip_element()?;
                        let content = &self.src[end..self.tag_start(element_end)];
                        slots.push(TextSlot::parsed(
                            element_start..element_end,
                            &qname_of(&e)?,
                            decode_text(content),
                        ));
                    } else if let Some(ch) = self.separator_char(&e) {
                        let element_start = self.tag_start(end);
                        let element_end = self.skip_element()?;
                        separators.push(Separator::parsed(element_start..element_end, ch, slots.len()));
                    } else {
                        self.skip_element()?;
                    }
                },
                Event::Empty(e) => {
                    if self.is_wml(&e, b"rPr") {
                        properties = self.empty_property_block(PropertyKind::Run, &e, end)?;
                    } else if self.is_wml(&e, b"t") {
                        let element_start = self.tag_start(end);
                        slots.push(TextSlot::parsed(element_start..end, &qname_of(&e)?, String::new()));
                    } else if let Some(ch) = self.separator_char(&e) {
                        separators.push(Separator::parsed(self.tag_start(end)..end, ch, slots.len()));
                    }
                },
                Event::End(_) => {
                    let shape = RunShape::Open {
                        close_at: self.tag_start(end),
                    };
                    return Ok(self.push_run(Run::new(&prefix, slots, separators, properties, shape)));
                },
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
    }

    fn self_closing_run(&self, e: &BytesStart<'_>, end: usize) -> Run {
        let start = self.tag_start(end);
        let name_len = e.name().as_ref().len();
        // Everything between the element name and `/>`.
        let attrs = self
            .src
            .get(start + 1 + name_len..end.saturating_sub(2))
            .unwrap_or_default()
            .to_string();
        let prefix = prefix_of(e);
        Run::new(
            &prefix,
            SmallVec::new(),
            SmallVec::new(),
            PropertyBlock::absent(PropertyKind::Run, &prefix, None),
            RunShape::SelfClosing {
                element: start..end,
                attrs,
            },
        )
    }

    fn parse_table(&mut self) -> Result<TableId> {
        let mut rows = Vec::new();
        loop {
            let (event, _) = self.next()?;
            match event {
                Event::Start(e) if self.is_wml(&e, b"tr") => rows.push(self.parse_row()?),
                Event::Start(_) => {
                    self.skip_element()?;
                },
                Event::End(_) => break,
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
        Ok(self.push_table(Table::new(rows)))
    }

    fn parse_row(&mut self) -> Result<Row> {
        let mut cells: SmallVec<[CellId; 8]> = SmallVec::new();
        loop {
            let (event, end) = self.next()?;
            match event {
                Event::Start(e) if self.is_wml(&e, b"tc") => cells.push(self.parse_cell(&e, end)?),
                Event::Start(_) => {
                    self.skip_element()?;
                },
                Event::Empty(e) if self.is_wml(&e, b"tc") => {
                    let properties = PropertyBlock::absent(PropertyKind::Cell, &prefix_of(&e), None);
                    cells.push(self.push_cell(Cell::new(Vec::new(), properties)));
                },
                Event::End(_) => break,
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
        Ok(Row::new(cells))
    }

    fn parse_cell(&mut self, start: &BytesStart<'_>, tag_end: usize) -> Result<CellId> {
        let mut properties = PropertyBlock::absent(PropertyKind::Cell, &prefix_of(start), Some(tag_end));
        let blocks = self.parse_blocks(Some(&mut properties))?;
        Ok(self.push_cell(Cell::new(blocks, properties)))
    }

    fn parse_property_block(
        &mut self,
        kind: PropertyKind,
        start: &BytesStart<'_>,
        tag_end: usize,
    ) -> Result<PropertyBlock> {
        let block_start = self.tag_start(tag_end);
        let prefix = prefix_of(start);
        let attrs = attributes(start)?;
        let mut children = Vec::new();

        loop {
            let (event, end) = self.next()?;
            match event {
                Event::Start(e) => {
                    let child_start = self.tag_start(end);
                    let qname = qname_of(&e)?;
                    let child_attrs = attributes(&e)?;
                    let child_end = self.skip_element()?;
                    children.push(PropertyChild::parsed(
                        &qname,
                        child_attrs,
                        &self.src[child_start..child_end],
                    ));
                },
                Event::Empty(e) => {
                    let child_start = self.tag_start(end);
                    children.push(PropertyChild::parsed(
                        &qname_of(&e)?,
                        attributes(&e)?,
                        &self.src[child_start..end],
                    ));
                },
                Event::End(_) => {
                    return Ok(PropertyBlock::parsed(kind, &prefix, block_start..end, attrs, children));
                },
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
    }

    fn empty_property_block(&self, kind: PropertyKind, e: &BytesStart<'_>, end: usize) -> Result<PropertyBlock> {
        Ok(PropertyBlock::parsed(
            kind,
            &prefix_of(e),
            self.tag_start(end)..end,
            attributes(e)?,
            Vec::new(),
        ))
    }

    /// Skip the rest of the element whose start tag was just read.
    ///
    /// Returns the offset just past its end tag.
    fn skip_element(&mut self) -> Result<usize> {
        let mut depth = 0usize;
        loop {
            let (event, end) = self.next()?;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    if depth == 0 {
                        return Ok(end);
                    }
                    depth -= 1;
                },
                Event::Eof => return Err(unexpected_eof()),
                _ => {},
            }
        }
    }

    fn push_paragraph(&mut self, paragraph: Paragraph) -> ParagraphId {
        self.doc.paragraphs.push(paragraph);
        ParagraphId(self.doc.paragraphs.len() - 1)
    }

    fn push_run(&mut self, run: Run) -> RunId {
        self.doc.runs.push(run);
        RunId(self.doc.runs.len() - 1)
    }

    fn push_table(&mut self, table: Table) -> TableId {
        self.doc.tables.push(table);
        TableId(self.doc.tables.len() - 1)
    }

    fn push_cell(&mut self, cell: Cell) -> CellId {
        self.doc.cells.push(cell);
        CellId(self.doc.cells.len() - 1)
    }
}

fn prefix_of(e: &BytesStart<'_>) -> String {
    let name = e.name();
    match memchr::memchr(b':', name.as_ref()) {
        Some(colon) => String::from_utf8_lossy(&name.as_ref()[..colon]).into_owned(),
        None => String::new(),
    }
}

fn qname_of(e: &BytesStart<'_>) -> Result<String> {
    Ok(utf8(e.name().as_ref())?.to_string())
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| OoxmlError::Xml(err.to_string()))?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = unescape_xml(utf8(&attr.value)?).into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| OoxmlError::Xml(e.to_string()))
}

/// Text content of a `w:t`, with entities resolved and CDATA sections
/// taken literally.
fn decode_text(raw: &str) -> String {
    const CDATA_OPEN: &str = "<![CDATA[";

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find(CDATA_OPEN) {
        out.push_str(&unescape_xml(&rest[..open]));
        let body = &rest[open + CDATA_OPEN.len()..];
        let close = body.find("]]>").unwrap_or(body.len());
        out.push_str(&body[..close]);
        rest = body.get(close + 3..).unwrap_or_default();
    }
    out.push_str(&unescape_xml(rest));
    out
}

fn unexpected_eof() -> OoxmlError {
    OoxmlError::Xml("unexpected end of document part".to_string())
}
