//! Concurrent batch processing of many documents.
//!
//! [`BatchProcessor`] validates its inputs, runs one task per document on a
//! dedicated worker pool and funnels every [`ProcessingResult`] back to the
//! calling thread, which is the only place callbacks run. A failure in one
//! document, including a panic, never affects the others.
//!
//! # Example
//!
//! ```rust,no_run
//! use docx_batch::batch::{BatchOptions, BatchProcessor};
//! use docx_batch::replace::ReplaceRule;
//!
//! let processor = BatchProcessor::new(4)?;
//! let files = BatchProcessor::get_files_from_directory("reports", true)?;
//! let rules = [ReplaceRule::new("2024", "2025")?];
//!
//! processor.process_documents(
//!     &files,
//!     &rules,
//!     &BatchOptions::default(),
//!     |done, total| eprintln!("{done}/{total}"),
//!     |result| eprintln!("{}: {}", result.file_name(), result.message),
//! )?;
//! println!("{:?}", processor.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
pub mod config;
mod discover;
pub mod error;
pub mod result;

pub use backup::{BackupError, BackupNamer, create_backup};
pub use config::{BatchConfig, ConfigError, RuleConfig};
pub use error::{BatchError, Result};
pub use result::{BatchSummary, ProcessingResult};

use crate::ooxml::opc::probe_container;
use crate::processor::DocxProcessor;
use crate::replace::ReplaceRule;
use parking_lot::Mutex;
use result::{MSG_CANCELLED, MSG_INVALID};
use std::any::Any;
use std::fs::File;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Per-call switches for [`BatchProcessor::process_documents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub create_backup: bool,
    /// Where backups go; each source's own directory when `None`.
    pub backup_dir: Option<PathBuf>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            create_backup: true,
            backup_dir: None,
        }
    }
}

/// Runs replacement rules over many documents on a fixed-size worker pool.
pub struct BatchProcessor {
    pool: rayon::ThreadPool,
    workers: usize,
    results: Mutex<Vec<ProcessingResult>>,
    cancelled: AtomicBool,
    running: AtomicBool,
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("workers", &self.workers)
            .field("results", &self.results.lock().len())
            .field("cancelled", &self.is_stopped())
            .finish()
    }
}

/// Clears the running flag when a batch call ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BatchProcessor {
    pub fn new(max_workers: usize) -> Result<Self> {
        let workers = max_workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("docx-worker-{i}"))
            .build()?;
        Ok(Self {
            pool,
            workers,
            results: Mutex::new(Vec::new()),
            cancelled: AtomicBool::new(false),
            running: AtomicBool::new(false),
        })
    }

    pub fn with_config(config: &BatchConfig) -> Result<Self> {
        Self::new(config.workers)
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Validate `(search, replace)` pairs into rules.
    pub fn rules_from_pairs<S: AsRef<str>>(pairs: &[(S, S)]) -> Result<Vec<ReplaceRule>> {
        pairs
            .iter()
            .map(|(search, replace)| ReplaceRule::new(search.as_ref(), replace.as_ref()).map_err(BatchError::from))
            .collect()
    }

    /// Process every document in `paths` and return the result log.
    ///
    /// Paths that are missing, unreadable or not Word containers are reported
    /// first, in input order, and are left out of the progress total. The
    /// remaining documents complete in any order. `on_result` and
    /// `on_progress` run on the calling thread, one result at a time.
    ///
    /// The result log and the cancellation flag are reset at the start of
    /// every call. A second call while one is in flight fails with
    /// [`BatchError::AlreadyRunning`].
    pub fn process_documents<P, FP, FR>(
        &self,
        paths: &[P],
        rules: &[ReplaceRule],
        options: &BatchOptions,
        mut on_progress: FP,
        mut on_result: FR,
    ) -> Result<Vec<ProcessingResult>>
    where
        P: AsRef<Path> + Sync,
        FP: FnMut(usize, usize),
        FR: FnMut(&ProcessingResult),
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BatchError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        self.results.lock().clear();
        self.cancelled.store(false, Ordering::Release);

        let (valid, invalid): (Vec<&Path>, Vec<&Path>) = paths
            .iter()
            .map(AsRef::<Path>::as_ref)
            .partition(|path| is_valid_input(path));
        info!(
            documents = paths.len(),
            valid = valid.len(),
            workers = self.workers,
            rules = rules.len(),
            "starting batch"
        );

        for path in invalid {
            warn!(path = %path.display(), "skipping invalid input");
            self.record(ProcessingResult::failed(path, MSG_INVALID, None), &mut on_result);
        }

        let total = valid.len();
        let (tx, rx) = crossbeam_channel::bounded::<ProcessingResult>(self.workers);
        std::thread::scope(|scope| {
            let dispatcher = scope.spawn(move || {
                self.pool.scope(|s| {
                    for &path in &valid {
                        let tx = tx.clone();
                        s.spawn(move |_| {
                            let result = guard_task(path, None, || self.process_single(path, rules, options));
                            // Fails only once the consumer has gone away.
                            let _ = tx.send(result);
                        });
                    }
                });
            });

            let mut processed = 0;
            for result in rx {
                if !result.success {
                    warn!(path = %result.path.display(), message = %result.message, "document failed");
                }
                self.record(result, &mut on_result);
                processed += 1;
                on_progress(processed, total);
            }

            if dispatcher.join().is_err() {
                warn!("dispatcher thread panicked");
            }
        });

        let results = self.results();
        let summary = BatchSummary::from_results(&results);
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            replacements = summary.total_replacements,
            "batch finished"
        );
        Ok(results)
    }

    fn record<FR: FnMut(&ProcessingResult)>(&self, result: ProcessingResult, on_result: &mut FR) {
        on_result(&result);
        self.results.lock().push(result);
    }

    fn process_single(&self, path: &Path, rules: &[ReplaceRule], options: &BatchOptions) -> ProcessingResult {
        if self.cancelled.load(Ordering::Acquire) {
            return ProcessingResult::failed(path, MSG_CANCELLED, None);
        }

        let mut processor = DocxProcessor::new(path);
        if let Err(err) = processor.load() {
            return ProcessingResult::failed(path, format!("Failed to load document: {err}"), None);
        }
        if let Err(errors) = processor.validate() {
            return ProcessingResult::failed(path, format!("Invalid document: {}", errors.join(", ")), None);
        }

        let backup_path = if options.create_backup {
            match processor.create_backup(options.backup_dir.as_deref()) {
                Ok(backup) => Some(backup),
                Err(err) => return ProcessingResult::failed(path, format!("Backup failed: {err}"), None),
            }
        } else {
            None
        };

        // From here on a failure, panics included, must still report the backup.
        guard_task(path, backup_path.as_deref(), || {
            let replacements = processor.replace_multiple(rules, None);
            if let Err(err) = processor.save() {
                return ProcessingResult::failed(path, format!("Failed to save document: {err}"), backup_path.clone());
            }

            debug!(path = %path.display(), replacements, "document processed");
            ProcessingResult::succeeded(path, replacements, backup_path.clone())
        })
    }

    /// Request cancellation. Tasks that have not started yet report
    /// "Processing cancelled"; running tasks finish normally.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::Release);
        info!("batch cancellation requested");
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn results(&self) -> Vec<ProcessingResult> {
        self.results.lock().clone()
    }

    pub fn failed_results(&self) -> Vec<ProcessingResult> {
        self.results.lock().iter().filter(|r| !r.success).cloned().collect()
    }

    pub fn successful_results(&self) -> Vec<ProcessingResult> {
        self.results.lock().iter().filter(|r| r.success).cloned().collect()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results.lock())
    }

    pub fn clear_results(&self) {
        self.results.lock().clear();
    }

    /// Sorted `.docx` files under `dir`, descending into subdirectories when
    /// `recursive` is set.
    pub fn get_files_from_directory<D: AsRef<Path>>(dir: D, recursive: bool) -> Result<Vec<PathBuf>> {
        discover::get_files_from_directory(dir.as_ref(), recursive)
    }
}

fn is_valid_input(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok() && probe_container(path)
}

/// Run `task`, turning a panic into a failed result that carries `backup`.
pub(crate) fn guard_task<F>(path: &Path, backup: Option<&Path>, task: F) -> ProcessingResult
where
    F: FnOnce() -> ProcessingResult,
{
    catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(path = %path.display(), %message, "task panicked");
        ProcessingResult::failed(path, format!("Processing error: {message}"), backup.map(Path::to_path_buf))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::Package;
    use std::fs;
    use tempfile::TempDir;

    fn write_docx(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        let body = format!(r#"<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"#);
        Package::from_body_xml(&body).unwrap().save(&path).unwrap();
        path
    }

    fn rules() -> Vec<ReplaceRule> {
        vec![ReplaceRule::new("2024", "2025").unwrap()]
    }

    #[test]
    fn test_guard_task_converts_panics() {
        let result = guard_task(Path::new("x.docx"), None, || panic!("boom"));
        assert!(!result.success);
        assert_eq!(result.message, "Processing error: boom");
        assert_eq!(result.backup_path, None);

        let result = guard_task(Path::new("x.docx"), None, || panic!("{} items", 3));
        assert_eq!(result.message, "Processing error: 3 items");
    }

    #[test]
    fn test_panic_after_backup_keeps_backup_path() {
        let dir = TempDir::new().unwrap();
        let path = write_docx(dir.path(), "a.docx", "Year 2024");
        let mut processor = DocxProcessor::new(&path);
        processor.load().unwrap();
        let backup = processor.create_backup(None).unwrap();

        let result = guard_task(&path, Some(backup.as_path()), || {
            processor.replace_text("2024", "2025", None).unwrap();
            panic!("save exploded")
        });
        assert!(!result.success);
        assert_eq!(result.message, "Processing error: save exploded");
        assert_eq!(result.backup_path.as_deref(), Some(backup.as_path()));
        assert_eq!(Package::open(&backup).unwrap().document().text(), "Year 2024");
        assert_eq!(Package::open(&path).unwrap().document().text(), "Year 2024");
    }

    #[test]
    fn test_invalid_inputs_are_reported_first() {
        let dir = TempDir::new().unwrap();
        let good = write_docx(dir.path(), "good.docx", "Year 2024");
        let not_zip = dir.path().join("fake.docx");
        fs::write(&not_zip, b"plain text").unwrap();
        let missing = dir.path().join("missing.docx");

        let processor = BatchProcessor::new(2).unwrap();
        let mut seen = Vec::new();
        let mut progress = Vec::new();
        let results = processor
            .process_documents(
                &[good.clone(), not_zip.clone(), missing.clone()],
                &rules(),
                &BatchOptions {
                    create_backup: false,
                    backup_dir: None,
                },
                |done, total| progress.push((done, total)),
                |r| seen.push(r.path.clone()),
            )
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(seen, vec![not_zip, missing, good.clone()]);
        assert_eq!(progress, vec![(1, 1)]);
        assert!(results[..2].iter().all(|r| !r.success && r.message == MSG_INVALID));
        assert!(results[2].success);
        assert_eq!(results[2].replacements, 1);
        assert_eq!(Package::open(&good).unwrap().document().text(), "Year 2025");
    }

    #[test]
    fn test_backups_are_attached_to_results() {
        let dir = TempDir::new().unwrap();
        let source = write_docx(dir.path(), "a.docx", "2024");
        let backups = dir.path().join("backups");

        let processor = BatchProcessor::new(1).unwrap();
        let options = BatchOptions {
            create_backup: true,
            backup_dir: Some(backups.clone()),
        };
        let results = processor
            .process_documents(&[&source], &rules(), &options, |_, _| {}, |_| {})
            .unwrap();

        let backup = results[0].backup_path.clone().unwrap();
        assert!(backup.starts_with(&backups));
        assert_eq!(Package::open(&backup).unwrap().document().text(), "2024");
        assert_eq!(Package::open(&source).unwrap().document().text(), "2025");
    }

    #[test]
    fn test_stop_cancels_pending_tasks() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..24)
            .map(|i| write_docx(dir.path(), &format!("doc{i:02}.docx"), "2024"))
            .collect();

        let processor = BatchProcessor::new(1).unwrap();
        let options = BatchOptions {
            create_backup: false,
            backup_dir: None,
        };
        let results = processor
            .process_documents(&paths, &rules(), &options, |_, _| processor.stop(), |_| {})
            .unwrap();

        assert_eq!(results.len(), paths.len());
        assert!(processor.is_stopped());
        let cancelled: Vec<_> = results.iter().filter(|r| r.message == MSG_CANCELLED).collect();
        assert!(!cancelled.is_empty());
        for result in cancelled {
            assert!(!result.success);
            assert_eq!(Package::open(&result.path).unwrap().document().text(), "2024");
        }

        // The next call starts fresh.
        let again = processor
            .process_documents(&paths[..1], &rules(), &options, |_, _| {}, |_| {})
            .unwrap();
        assert_eq!(again.len(), 1);
        assert!(!processor.is_stopped());
    }

    #[test]
    fn test_result_accessors() {
        let dir = TempDir::new().unwrap();
        let good = write_docx(dir.path(), "a.docx", "2024 and 2024");
        let processor = BatchProcessor::new(2).unwrap();
        let options = BatchOptions {
            create_backup: false,
            backup_dir: None,
        };
        processor
            .process_documents(&[good, dir.path().join("nope.docx")], &rules(), &options, |_, _| {}, |_| {})
            .unwrap();

        assert_eq!(processor.successful_results().len(), 1);
        assert_eq!(processor.failed_results().len(), 1);
        let summary = processor.summary();
        assert_eq!((summary.total, summary.total_replacements), (2, 2));

        processor.clear_results();
        assert_eq!(processor.summary().total, 0);
    }

    #[test]
    fn test_rules_from_pairs() {
        assert_eq!(BatchProcessor::rules_from_pairs(&[("a", "b")]).unwrap().len(), 1);
        let err = BatchProcessor::rules_from_pairs(&[("a", "b"), ("", "c")]).unwrap_err();
        assert!(matches!(err, BatchError::Replace(_)));
    }
}
