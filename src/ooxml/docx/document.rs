/// Document - the main API for working with Word document content.
use crate::ooxml::docx::paragraph::{Paragraph, Run};
use crate::ooxml::docx::parts::{DocumentPart, splice};
use crate::ooxml::docx::statistics::DocumentStatistics;
use crate::ooxml::docx::table::{Cell, Table};
use crate::ooxml::error::{OoxmlError, Result};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position in the owning document's arena.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a paragraph owned by a [`Document`].
    ParagraphId
);
arena_id!(
    /// Handle to a run owned by a [`Document`].
    RunId
);
arena_id!(
    /// Handle to a table owned by a [`Document`].
    TableId
);
arena_id!(
    /// Handle to a table cell owned by a [`Document`].
    CellId
);

/// Block-level content of the body or of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Paragraph(ParagraphId),
    Table(TableId),
}

/// A Word document.
///
/// The document owns the original bytes of its main part plus an arena of
/// paragraphs, runs, tables and cells parsed from them. Nodes refer to each
/// other through ids; handles are only meaningful for the document that
/// produced them.
///
/// # Examples
///
/// ```rust
/// use docx_batch::ooxml::docx::Package;
///
/// let mut pkg = Package::from_body_xml(r#"<w:p><w:r><w:t>Draft</w:t></w:r></w:p>"#)?;
/// let doc = pkg.document_mut();
/// let para = doc.body_paragraphs().next().unwrap();
/// let run = doc.paragraph(para).runs()[0];
/// doc.run_mut(run).set_text("Final");
/// assert_eq!(doc.text(), "Final");
/// assert!(doc.is_modified());
/// # Ok::<(), docx_batch::ooxml::OoxmlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    xml: Vec<u8>,
    pub(crate) has_body: bool,
    pub(crate) section_count: usize,
    pub(crate) blocks: Vec<Block>,
    pub(crate) paragraphs: Vec<Paragraph>,
    pub(crate) runs: Vec<Run>,
    pub(crate) tables: Vec<Table>,
    pub(crate) cells: Vec<Cell>,
}

impl Document {
    /// Parse the bytes of a main document part.
    pub fn parse(xml: Vec<u8>) -> Result<Self> {
        let src = std::str::from_utf8(&xml)
            .map_err(|e| OoxmlError::InvalidFormat(format!("main document part is not UTF-8: {e}")))?;
        let mut doc = DocumentPart::parse(src)?;
        doc.xml = xml;
        Ok(doc)
    }

    /// Top-level blocks of the body, in document order.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Paragraphs directly inside the body.
    pub fn body_paragraphs(&self) -> impl Iterator<Item = ParagraphId> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(id) => Some(*id),
            Block::Table(_) => None,
        })
    }

    /// Tables directly inside the body.
    pub fn body_tables(&self) -> impl Iterator<Item = TableId> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(id) => Some(*id),
            Block::Paragraph(_) => None,
        })
    }

    #[inline]
    pub fn paragraph(&self, id: ParagraphId) -> &Paragraph {
        &self.paragraphs[id.0]
    }

    #[inline]
    pub fn paragraph_mut(&mut self, id: ParagraphId) -> &mut Paragraph {
        &mut self.paragraphs[id.0]
    }

    #[inline]
    pub fn run(&self, id: RunId) -> &Run {
        &self.runs[id.0]
    }

    #[inline]
    pub fn run_mut(&mut self, id: RunId) -> &mut Run {
        &mut self.runs[id.0]
    }

    #[inline]
    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0]
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    #[inline]
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.0]
    }

    /// Concatenated text of the paragraph's runs.
    pub fn paragraph_text(&self, id: ParagraphId) -> String {
        let paragraph = self.paragraph(id);
        let len = paragraph.runs().iter().map(|&r| self.run(r).text_len()).sum();
        let mut text = String::with_capacity(len);
        for &run in paragraph.runs() {
            text.push_str(&self.run(run).text());
        }
        text
    }

    /// Every paragraph in document order, descending into table cells.
    pub fn all_paragraphs(&self) -> Vec<ParagraphId> {
        let mut out = Vec::with_capacity(self.paragraphs.len());
        self.collect_paragraphs(&self.blocks, &mut out);
        out
    }

    fn collect_paragraphs(&self, blocks: &[Block], out: &mut Vec<ParagraphId>) {
        for block in blocks {
            match *block {
                Block::Paragraph(id) => out.push(id),
                Block::Table(id) => {
                    for cell in self.table(id).cells() {
                        self.collect_paragraphs(self.cell(cell).blocks(), out);
                    }
                },
            }
        }
    }

    /// All paragraph text, one paragraph per line.
    pub fn text(&self) -> String {
        self.all_paragraphs()
            .into_iter()
            .map(|id| self.paragraph_text(id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of `w:sectPr` elements found in the body and paragraph properties.
    #[inline]
    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn statistics(&self) -> DocumentStatistics {
        DocumentStatistics::collect(self)
    }

    /// Structural validation.
    ///
    /// The document must have a body and form a tree: every paragraph, run,
    /// table and cell reachable from the body exactly once, and nothing else.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if !self.has_body {
            errors.push("Document has no body".to_string());
        }

        let mut seen = Seen {
            paragraphs: vec![0; self.paragraphs.len()],
            runs: vec![0; self.runs.len()],
            tables: vec![0; self.tables.len()],
            cells: vec![0; self.cells.len()],
        };
        let mut pending: Vec<Block> = self.blocks.iter().rev().copied().collect();

        while let Some(block) = pending.pop() {
            match block {
                Block::Paragraph(id) => {
                    let Some(count) = seen.paragraphs.get_mut(id.0) else {
                        errors.push(format!("Missing paragraph {}", id.0));
                        continue;
                    };
                    *count += 1;
                    for run in self.paragraphs[id.0].runs() {
                        match seen.runs.get_mut(run.0) {
                            Some(count) => *count += 1,
                            None => errors.push(format!("Paragraph {} references missing run {}", id.0, run.0)),
                        }
                    }
                },
                Block::Table(id) => {
                    let Some(count) = seen.tables.get_mut(id.0) else {
                        errors.push(format!("Missing table {}", id.0));
                        continue;
                    };
                    *count += 1;
                    if *count > 1 {
                        continue;
                    }
                    for cell in self.tables[id.0].cells() {
                        let Some(count) = seen.cells.get_mut(cell.0) else {
                            errors.push(format!("Table {} references missing cell {}", id.0, cell.0));
                            continue;
                        };
                        *count += 1;
                        if *count == 1 {
                            pending.extend(self.cells[cell.0].blocks().iter().rev().copied());
                        }
                    }
                },
            }
        }

        report_ownership(&mut errors, "Paragraph", &seen.paragraphs);
        report_ownership(&mut errors, "Run", &seen.runs);
        report_ownership(&mut errors, "Table", &seen.tables);
        report_ownership(&mut errors, "Cell", &seen.cells);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Whether any run, paragraph or cell differs from the parsed source.
    pub fn is_modified(&self) -> bool {
        self.runs.iter().any(Run::is_modified)
            || self.paragraphs.iter().any(|p| p.properties().is_dirty())
            || self.cells.iter().any(|c| c.properties().is_dirty())
    }

    /// The original bytes of the main part.
    #[inline]
    pub fn source_xml(&self) -> &[u8] {
        &self.xml
    }

    /// Serialize the main part, splicing in every change.
    pub fn to_xml(&self) -> Vec<u8> {
        let mut edits = Vec::new();
        for paragraph in &self.paragraphs {
            paragraph.collect_edits(&mut edits);
        }
        for run in &self.runs {
            run.collect_edits(&mut edits);
        }
        for cell in &self.cells {
            cell.collect_edits(&mut edits);
        }
        if edits.is_empty() {
            return self.xml.clone();
        }
        splice(&self.xml, edits)
    }
}

struct Seen {
    paragraphs: Vec<u32>,
    runs: Vec<u32>,
    tables: Vec<u32>,
    cells: Vec<u32>,
}

fn report_ownership(errors: &mut Vec<String>, kind: &str, counts: &[u32]) {
    for (index, &count) in counts.iter().enumerate() {
        match count {
            1 => {},
            0 => errors.push(format!("{kind} {index} is not reachable from the body")),
            _ => errors.push(format!("{kind} {index} has {count} parents")),
        }
    }
}
