//! Single-document pipeline: load, back up, replace, save.
//!
//! `DocxProcessor` owns one document for its whole lifetime. The batch
//! orchestrator runs one per task; it is equally usable on its own.
//!
//! # Examples
//!
//! ```rust,no_run
//! use docx_batch::DocxProcessor;
//!
//! let mut processor = DocxProcessor::new("report.docx");
//! processor.load()?;
//! processor.create_backup(None)?;
//! let count = processor.replace_text("2024", "2025", None)?;
//! processor.save()?;
//! println!("{count} replacements");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::batch::backup::{self, BackupNamer};
use crate::ooxml::docx::{Document, DocumentStatistics, Package};
use crate::ooxml::error::{OoxmlError, Result};
use crate::replace::{self, ReplaceRule};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct DocxProcessor {
    path: PathBuf,
    package: Option<Package>,
    replacement_count: usize,
    backup_path: Option<PathBuf>,
}

impl DocxProcessor {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            package: None,
            replacement_count: 0,
            backup_path: None,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&mut self) -> Result<()> {
        let package = Package::open(&self.path)?;
        debug!(path = %self.path.display(), "loaded document");
        self.package = Some(package);
        Ok(())
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.package.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.package.as_ref().map(Package::document)
    }

    /// Structural check of the loaded document.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        match self.document() {
            Some(doc) => doc.validate(),
            None => Err(vec!["Document not loaded".to_string()]),
        }
    }

    /// Back up the file on disk and remember where the copy went.
    pub fn create_backup(&mut self, backup_dir: Option<&Path>) -> backup::Result<PathBuf> {
        let path = BackupNamer::default().create_backup(&self.path, backup_dir)?;
        self.backup_path = Some(path.clone());
        Ok(path)
    }

    /// Replace one literal string throughout the document.
    ///
    /// An empty `search` is an error even when nothing is loaded. With no
    /// document loaded this returns `Ok(0)`.
    pub fn replace_text(
        &mut self,
        search: &str,
        replace: &str,
        progress: Option<&mut (dyn FnMut(usize, usize) + '_)>,
    ) -> replace::Result<usize> {
        let rule = ReplaceRule::new(search, replace)?;
        Ok(self.replace_rule(&rule, progress))
    }

    pub fn replace_rule(&mut self, rule: &ReplaceRule, progress: Option<&mut (dyn FnMut(usize, usize) + '_)>) -> usize {
        let Some(package) = self.package.as_mut() else {
            return 0;
        };
        self.replacement_count = replace::replace_text(package.document_mut(), rule, progress);
        self.replacement_count
    }

    /// Apply `rules` in order; later rules see the output of earlier ones.
    pub fn replace_multiple(
        &mut self,
        rules: &[ReplaceRule],
        progress: Option<&mut (dyn FnMut(usize, usize) + '_)>,
    ) -> usize {
        let Some(package) = self.package.as_mut() else {
            return 0;
        };
        self.replacement_count = replace::replace_multiple(package.document_mut(), rules, progress);
        debug!(path = %self.path.display(), rules = rules.len(), replacements = self.replacement_count, "applied rules");
        self.replacement_count
    }

    /// Save over the source file.
    pub fn save(&self) -> Result<()> {
        self.save_as(&self.path)
    }

    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let package = self.package.as_ref().ok_or_else(not_loaded)?;
        package.save(path)
    }

    pub fn statistics(&self) -> Option<DocumentStatistics> {
        self.document().map(Document::statistics)
    }

    /// Copy the recorded backup over the source and reload it.
    ///
    /// Returns `Ok(false)` when no backup exists.
    pub fn restore_backup(&mut self) -> Result<bool> {
        let Some(backup) = self.backup_path.as_ref().filter(|path| path.is_file()) else {
            return Ok(false);
        };
        fs::copy(backup, &self.path)?;
        debug!(path = %self.path.display(), backup = %backup.display(), "restored backup");
        self.load()?;
        Ok(true)
    }

    /// Drop the loaded document.
    pub fn close(&mut self) {
        self.package = None;
    }

    /// Total of the most recent replace call.
    #[inline]
    pub fn replacement_count(&self) -> usize {
        self.replacement_count
    }

    #[inline]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }
}

fn not_loaded() -> OoxmlError {
    OoxmlError::Io(io::Error::other("document not loaded"))
}
