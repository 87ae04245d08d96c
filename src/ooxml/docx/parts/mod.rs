/// Part implementations for Word documents.
///
/// Only the main document part is modelled; every other part of the package
/// is carried through unchanged.
pub mod document_part;

pub(crate) use document_part::{DocumentPart, Edit, splice};
