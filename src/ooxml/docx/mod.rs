/// Word (.docx) document support.
///
/// This module provides parsing and in-place editing of the main document
/// part of a Word package.
///
/// # Architecture
///
/// The module is organized around these key types:
/// - `Package`: The overall .docx file package
/// - `Document`: An arena of paragraphs, runs, tables and cells
/// - `Paragraph`, `Run`: Text and the runs that carry it
/// - `Table`, `Row`, `Cell`: Tables, possibly nested
/// - `PropertyBlock`: Editable `w:rPr` / `w:pPr` / `w:tcPr`
/// - `FormatSnapshot`: Capture and replay of formatting
///
/// # Example
///
/// ```rust
/// use docx_batch::ooxml::docx::{FormatSnapshot, Package, RunFormat};
///
/// let mut package = Package::from_body_xml(
///     r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r><w:r><w:t> plain</w:t></w:r></w:p>"#,
/// )?;
/// let doc = package.document_mut();
/// let para = doc.body_paragraphs().next().unwrap();
/// let runs = doc.paragraph(para).runs().to_vec();
///
/// let format = RunFormat::capture(doc.run(runs[0]));
/// format.apply(doc.run_mut(runs[1]));
/// assert_eq!(RunFormat::capture(doc.run(runs[1])).bold, Some(true));
/// # Ok::<(), docx_batch::ooxml::OoxmlError>(())
/// ```
pub mod document;
pub mod format;
pub mod package;
pub mod paragraph;
pub(crate) mod parts;
pub mod properties;
pub mod statistics;
pub mod table;

pub use document::{Block, CellId, Document, ParagraphId, RunId, TableId};
pub use format::{
    CellFormat, CellVerticalAlignment, CellWidth, FormatSnapshot, LineSpacing, ParagraphAlignment,
    ParagraphFormat, RunFonts, RunFormat, TextColor, UnderlineStyle,
};
pub use package::Package;
pub use paragraph::{Paragraph, Run};
pub use properties::{PropertyBlock, PropertyChild, PropertyKind};
pub use statistics::DocumentStatistics;
pub use table::{Cell, Row, Table};
