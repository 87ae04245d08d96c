//! Format-preserving find-and-replace over a [`Document`].
//!
//! Matches may straddle run boundaries. The run holding the start of a match
//! receives the replacement (keeping its own formatting), and the remaining
//! runs the match covered are emptied rather than removed.
//!
//! ```rust
//! use docx_batch::ooxml::docx::Package;
//! use docx_batch::replace::{ReplaceRule, replace_text};
//!
//! let mut pkg = Package::from_body_xml(
//!     r#"<w:p><w:r><w:t>Report 20</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>24 final</w:t></w:r></w:p>"#,
//! )?;
//! let rule = ReplaceRule::new("2024", "2025")?;
//! assert_eq!(replace_text(pkg.document_mut(), &rule, None), 1);
//! assert_eq!(pkg.document().text(), "Report 2025 final");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Document`]: crate::ooxml::docx::Document

mod engine;
mod matcher;

pub use engine::{replace_in_cell, replace_in_paragraph, replace_in_table, replace_multiple, replace_text};
pub use matcher::{Match, find_match};

use memchr::memmem::Finder;
use thiserror::Error;

/// Errors raised for invalid replacement rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("search text must not be empty")]
    EmptySearch,
}

pub type Result<T> = std::result::Result<T, ReplaceError>;

/// A literal search/replace pair.
///
/// The search text is never empty; [`ReplaceRule::new`] rejects it.
#[derive(Debug, Clone)]
pub struct ReplaceRule {
    search: String,
    replace: String,
    finder: Finder<'static>,
}

impl ReplaceRule {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Result<Self> {
        let search = search.into();
        if search.is_empty() {
            return Err(ReplaceError::EmptySearch);
        }
        let finder = Finder::new(search.as_bytes()).into_owned();
        Ok(Self {
            search,
            replace: replace.into(),
            finder,
        })
    }

    #[inline]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[inline]
    pub fn replace(&self) -> &str {
        &self.replace
    }

    /// Byte offset of the first occurrence in `haystack` at or after `from`.
    pub fn find_in(&self, haystack: &str, from: usize) -> Option<usize> {
        let tail = haystack.as_bytes().get(from..)?;
        self.finder.find(tail).map(|pos| from + pos)
    }
}

impl PartialEq for ReplaceRule {
    fn eq(&self, other: &Self) -> bool {
        self.search == other.search && self.replace == other.replace
    }
}

impl Eq for ReplaceRule {}
