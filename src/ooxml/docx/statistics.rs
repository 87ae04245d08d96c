//! Document statistics for DOCX documents.
//!
//! # Example
//!
//! ```rust
//! use docx_batch::ooxml::docx::Package;
//!
//! let pkg = Package::from_body_xml(r#"<w:p><w:r><w:t>two words</w:t></w:r></w:p>"#)?;
//! let stats = pkg.document().statistics();
//! assert_eq!(stats.word_count(), 2);
//! assert_eq!(stats.paragraph_count(), 1);
//! # Ok::<(), docx_batch::ooxml::OoxmlError>(())
//! ```
use crate::ooxml::docx::document::Document;
use serde::Serialize;

/// Counts gathered from a parsed document.
///
/// Word, character and cell counts cover the top level of the body, as
/// `paragraph_count` and `table_count` do. `total_paragraph_count` also
/// includes paragraphs nested in tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStatistics {
    paragraph_count: usize,
    table_count: usize,
    total_paragraph_count: usize,
    cell_count: usize,
    section_count: usize,
    word_count: usize,
    character_count: usize,
}

impl DocumentStatistics {
    pub(crate) fn collect(doc: &Document) -> Self {
        let mut stats = Self {
            paragraph_count: doc.body_paragraphs().count(),
            table_count: doc.body_tables().count(),
            section_count: doc.section_count(),
            ..Self::default()
        };

        for id in doc.body_paragraphs() {
            let text = doc.paragraph_text(id);
            stats.word_count += text.split_whitespace().count();
            stats.character_count += text.chars().count();
        }
        stats.total_paragraph_count = doc.all_paragraphs().len();
        stats.cell_count = doc
            .body_tables()
            .map(|table| doc.table(table).cells().count())
            .sum();
        stats
    }

    #[inline]
    pub fn paragraph_count(&self) -> usize {
        self.paragraph_count
    }

    #[inline]
    pub fn table_count(&self) -> usize {
        self.table_count
    }

    /// Paragraphs including those inside table cells.
    #[inline]
    pub fn total_paragraph_count(&self) -> usize {
        self.total_paragraph_count
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    #[inline]
    pub fn section_count(&self) -> usize {
        self.section_count
    }

    #[inline]
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Characters, spaces included.
    #[inline]
    pub fn character_count(&self) -> usize {
        self.character_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_cover_top_level_content() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Hello world</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>财务</w:t></w:r></w:p></w:tc><w:tc><w:p/><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl></w:tc></w:tr></w:tbl><w:sectPr/></w:body></w:document>"#;
        let doc = Document::parse(xml.as_bytes().to_vec()).unwrap();
        let stats = doc.statistics();
        assert_eq!(stats.paragraph_count(), 1);
        assert_eq!(stats.table_count(), 1);
        assert_eq!(stats.total_paragraph_count(), 4);
        assert_eq!(stats.cell_count(), 2);
        assert_eq!(stats.section_count(), 1);
        assert_eq!(stats.word_count(), 2);
        assert_eq!(stats.character_count(), 11);
    }
}
