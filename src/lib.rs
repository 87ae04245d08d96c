//! docx-batch - bulk, format-preserving find-and-replace for Word documents
//!
//! This library edits the text of `.docx` files in place without disturbing
//! their formatting, and runs such edits over many files at once with a
//! crash-safe backup of every original.
//!
//! # Features
//!
//! - **Run-aware replacement**: matches may straddle formatting runs and
//!   are found inside arbitrarily nested tables
//! - **Minimal rewrites**: only the XML that actually changed is re-serialized;
//!   every other byte of the package is preserved
//! - **Unique backups**: traceable names, staged copies, atomic no-clobber
//!   publication
//! - **Batch orchestration**: fixed worker pool, cooperative cancellation,
//!   per-document failure isolation, aggregate summary
//!
//! # Example - Editing one document
//!
//! ```no_run
//! use docx_batch::DocxProcessor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut processor = DocxProcessor::new("contract.docx");
//! processor.load()?;
//! let backup = processor.create_backup(None)?;
//! let count = processor.replace_text("ACME Ltd", "ACME GmbH", None)?;
//! processor.save()?;
//! println!("{count} replacements, original kept at {}", backup.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Processing a directory
//!
//! ```no_run
//! use docx_batch::batch::{BatchConfig, BatchProcessor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::from_file("batch.yaml")?;
//! let processor = BatchProcessor::with_config(&config)?;
//! let files = BatchProcessor::get_files_from_directory("reports", config.recursive)?;
//!
//! processor.process_documents(&files, &config.rules()?, &config.options(), |_, _| {}, |_| {})?;
//! let summary = processor.summary();
//! println!("{}/{} succeeded", summary.successful, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod common;
pub mod ooxml;
pub mod processor;
pub mod replace;

pub use batch::{BatchOptions, BatchProcessor, BatchSummary, ProcessingResult};
pub use processor::DocxProcessor;
pub use replace::{ReplaceError, ReplaceRule};
