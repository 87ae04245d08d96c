/// Table structures for Word documents.
use crate::ooxml::docx::document::{Block, CellId, ParagraphId, TableId};
use crate::ooxml::docx::parts::Edit;
use crate::ooxml::docx::properties::PropertyBlock;
use smallvec::SmallVec;

/// A table in a Word document.
///
/// Represents a `<w:tbl>` element. Rows hold cells; cells hold paragraphs
/// and, possibly, further tables.
///
/// # Example
///
/// ```rust
/// use docx_batch::ooxml::docx::Package;
///
/// let pkg = Package::from_body_xml(
///     "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc>\
///      <w:tc><w:p><w:r><w:t>B1</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
/// )?;
/// let doc = pkg.document();
/// let table = doc.table(doc.body_tables().next().unwrap());
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(table.rows()[0].cells().len(), 2);
/// # Ok::<(), docx_batch::ooxml::OoxmlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.rows.iter().flat_map(|row| row.cells.iter().copied())
    }
}

/// A `<w:tr>` row.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: SmallVec<[CellId; 8]>,
}

impl Row {
    pub(crate) fn new(cells: SmallVec<[CellId; 8]>) -> Self {
        Self { cells }
    }

    #[inline]
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }
}

/// A `<w:tc>` cell.
///
/// Horizontally or vertically merged cells are separate `w:tc` elements in
/// the source and are visited once each.
#[derive(Debug, Clone)]
pub struct Cell {
    blocks: Vec<Block>,
    properties: PropertyBlock,
}

impl Cell {
    pub(crate) fn new(blocks: Vec<Block>, properties: PropertyBlock) -> Self {
        Self { blocks, properties }
    }

    /// Paragraphs and nested tables in document order.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = ParagraphId> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(id) => Some(*id),
            Block::Table(_) => None,
        })
    }

    /// Tables nested directly inside this cell.
    pub fn tables(&self) -> impl Iterator<Item = TableId> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(id) => Some(*id),
            Block::Paragraph(_) => None,
        })
    }

    /// The cell's `w:tcPr`.
    #[inline]
    pub fn properties(&self) -> &PropertyBlock {
        &self.properties
    }

    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyBlock {
        &mut self.properties
    }

    pub(crate) fn collect_edits(&self, edits: &mut Vec<Edit>) {
        if let Some((span, text)) = self.properties.edit() {
            edits.push(Edit::new(span, text));
        }
    }
}
