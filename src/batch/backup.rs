//! Collision-free backup copies.
//!
//! Backup names have the shape
//! `{stem}_backup_{hint}_{fingerprint}_{suffix}{ext}`:
//!
//! - `hint`: the source's parent directory name, reduced to a safe charset
//! - `fingerprint`: six hex digits of SHA-256 over the absolute source path,
//!   so same-named files from different directories never share a prefix
//! - `suffix`: eight random hex digits, redrawn on every collision (the
//!   source is replaceable through [`BackupNamer::with_suffix_source`])
//!
//! The copy is staged in a hidden temporary file in the backup directory and
//! published with a no-clobber rename. Concurrent writers targeting the same
//! directory need no coordination beyond that.
use rand::RngExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_HINT_MAX_LEN: usize = 20;
pub const DEFAULT_MAX_ATTEMPTS: usize = 50;
/// Hint used when the parent directory name has no usable characters.
pub const ROOT_HINT: &str = "root";

const FINGERPRINT_BYTES: usize = 3;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source has no file name: {}", .0.display())]
    NoFileName(PathBuf),

    #[error("cannot prepare backup directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while copying: {0}")]
    Io(#[from] io::Error),

    #[error("no unique backup name found after {attempts} attempts")]
    NamesExhausted { attempts: usize },
}

pub type Result<T> = std::result::Result<T, BackupError>;

/// Source of the collision-breaking name suffix, drawn once per attempt.
pub type SuffixSource = fn() -> String;

/// Eight lowercase hex digits from the thread-local RNG.
pub fn random_suffix() -> String {
    format!("{:08x}", rand::rng().random::<u32>())
}

/// Produces uniquely named, byte-identical backup copies.
#[derive(Debug, Clone)]
pub struct BackupNamer {
    hint_max_len: usize,
    max_attempts: usize,
    suffix: SuffixSource,
}

impl Default for BackupNamer {
    fn default() -> Self {
        Self {
            hint_max_len: DEFAULT_HINT_MAX_LEN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            suffix: random_suffix,
        }
    }
}

impl BackupNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_hint_max_len(mut self, len: usize) -> Self {
        self.hint_max_len = len;
        self
    }

    /// Replace the random suffix, e.g. with a deterministic sequence.
    pub fn with_suffix_source(mut self, suffix: SuffixSource) -> Self {
        self.suffix = suffix;
        self
    }

    /// Copy `source` into `backup_dir` (default: the source's own directory)
    /// under a fresh unique name and return that name.
    pub fn create_backup(&self, source: &Path, backup_dir: Option<&Path>) -> Result<PathBuf> {
        let absolute = std::path::absolute(source)?;
        if !absolute.is_file() {
            return Err(BackupError::SourceNotFound(source.to_path_buf()));
        }

        let dir = match backup_dir {
            Some(dir) => dir.to_path_buf(),
            None => absolute
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| BackupError::NoFileName(source.to_path_buf()))?,
        };
        fs::create_dir_all(&dir).map_err(|source| BackupError::Directory {
            path: dir.clone(),
            source,
        })?;

        let (stem, ext) = split_file_name(&absolute).ok_or_else(|| BackupError::NoFileName(source.to_path_buf()))?;
        let hint = self.hint(&absolute);
        let fingerprint = fingerprint(&absolute);

        let mut staged = stage_copy(&absolute, &dir)?;
        for attempt in 1..=self.max_attempts {
            let suffix = (self.suffix)();
            let target = dir.join(format!("{stem}_backup_{hint}_{fingerprint}_{suffix}{ext}"));

            match staged.persist_noclobber(&target) {
                Ok(_) => {
                    debug!(source = %absolute.display(), backup = %target.display(), attempt, "backup created");
                    return Ok(target);
                },
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(target = %target.display(), attempt, "backup name taken, retrying");
                    staged = err.file;
                },
                // Dropping `err` removes the staged file.
                Err(err) => return Err(err.error.into()),
            }
        }

        warn!(source = %absolute.display(), attempts = self.max_attempts, "backup names exhausted");
        Err(BackupError::NamesExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Safe rendering of the parent directory name of `path`.
    pub fn hint(&self, path: &Path) -> String {
        let parent_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        sanitize_hint(&parent_name, self.hint_max_len)
    }
}

/// Back up `source` with the default [`BackupNamer`].
pub fn create_backup(source: &Path, backup_dir: Option<&Path>) -> Result<PathBuf> {
    BackupNamer::default().create_backup(source, backup_dir)
}

/// First six lowercase hex digits of SHA-256 over the absolute path.
pub fn fingerprint(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
    digest
        .iter()
        .take(FINGERPRINT_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Keep ASCII letters, digits, `_` and CJK ideographs; everything else
/// becomes a single `_`. Leading and trailing underscores are trimmed.
pub fn sanitize_hint(raw: &str, max_len: usize) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if is_hint_char(ch) { ch } else { '_' };
        if ch == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(ch);
    }

    let truncated: String = cleaned.trim_matches('_').chars().take(max_len).collect();
    let hint = truncated.trim_matches('_');
    if hint.is_empty() {
        ROOT_HINT.to_string()
    } else {
        hint.to_string()
    }
}

fn is_hint_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || ch == '_'
        || matches!(ch, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}')
}

/// `report.docx` -> (`report`, `.docx`); `README` -> (`README`, ``).
fn split_file_name(path: &Path) -> Option<(String, String)> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let ext = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    Some((stem, ext))
}

/// Copy `source` into a hidden temporary file inside `dir`.
fn stage_copy(source: &Path, dir: &Path) -> Result<NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    let mut input = File::open(source)?;
    io::copy(&mut input, staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    let metadata = input.metadata()?;
    staged.as_file().set_permissions(metadata.permissions())?;
    if let Ok(modified) = metadata.modified() {
        // Timestamps are informational; some filesystems refuse them.
        let _ = staged.as_file().set_modified(modified);
    }
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn tmp_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn test_sanitize_hint() {
        assert_eq!(sanitize_hint("财务部-2024 Q1", 20), "财务部_2024_Q1");
        assert_eq!(sanitize_hint("  --__--  ", 20), ROOT_HINT);
        assert_eq!(sanitize_hint("", 20), ROOT_HINT);
        assert_eq!(sanitize_hint("a/b\\c..d", 20), "a_b_c_d");
        assert_eq!(sanitize_hint("abcdefghij_klmnopqrs_tuv", 20), "abcdefghij_klmnopqrs");
        assert_eq!(sanitize_hint("abcdefghijklmnopqrs-tuv", 20), "abcdefghijklmnopqrs");
        assert_eq!(sanitize_hint("café", 20), "caf");
    }

    #[test]
    fn test_fingerprint_is_stable_and_location_sensitive() {
        let a = fingerprint(Path::new("/data/a/report.docx"));
        assert_eq!(a.len(), 6);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(a, fingerprint(Path::new("/data/a/report.docx")));
        assert_ne!(a, fingerprint(Path::new("/data/b/report.docx")));
    }

    #[test]
    fn test_backup_name_shape_and_content() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("部门A").join("report.docx");
        write(&source, b"original bytes");
        let backups = root.path().join("backups");

        let backup = create_backup(&source, Some(backups.as_path())).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"original bytes");
        assert_eq!(backup.parent().unwrap(), backups);

        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        let fp = fingerprint(&source);
        let prefix = format!("report_backup_部门A_{fp}_");
        assert!(name.starts_with(&prefix), "{name}");
        let suffix = name.strip_prefix(&prefix).unwrap().strip_suffix(".docx").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(tmp_files(&backups).is_empty());
    }

    #[test]
    fn test_repeated_backups_differ_only_in_suffix() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("docs").join("a.docx");
        write(&source, b"x");

        let first = create_backup(&source, None).unwrap();
        let second = create_backup(&source, None).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.parent(), source.parent());

        let strip = |p: &Path| {
            let name = p.file_name().unwrap().to_string_lossy().into_owned();
            name[..name.len() - ".docx".len() - 8].to_string()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_missing_source() {
        let root = TempDir::new().unwrap();
        let err = create_backup(&root.path().join("nope.docx"), None).unwrap_err();
        assert!(matches!(err, BackupError::SourceNotFound(_)));
    }

    #[test]
    fn test_exhaustion_leaves_no_temp_file() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("src").join("a.docx");
        write(&source, b"x");
        let backups = root.path().join("backups");

        let err = BackupNamer::new()
            .with_max_attempts(0)
            .create_backup(&source, Some(backups.as_path()))
            .unwrap_err();
        assert!(matches!(err, BackupError::NamesExhausted { attempts: 0 }));
        assert!(tmp_files(&backups).is_empty());
        assert_eq!(fs::read_dir(&backups).unwrap().count(), 0);
    }

    fn constant_suffix() -> String {
        "0000beef".to_string()
    }

    /// 00000000, 00000001, ... per test thread.
    fn stepping_suffix() -> String {
        thread_local!(static NEXT: Cell<u32> = const { Cell::new(0) });
        NEXT.with(|next| {
            let n = next.get();
            next.set(n + 1);
            format!("{n:08x}")
        })
    }

    fn expected_name(source: &Path, suffix: &str) -> String {
        format!("a_backup_src_{}_{suffix}.docx", fingerprint(source))
    }

    #[test]
    fn test_taken_name_is_retried_with_a_fresh_suffix() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("src").join("a.docx");
        write(&source, b"payload");
        let backups = root.path().join("backups");
        fs::create_dir_all(&backups).unwrap();
        for suffix in ["00000000", "00000001"] {
            fs::write(backups.join(expected_name(&source, suffix)), b"occupied").unwrap();
        }

        let backup = BackupNamer::new()
            .with_suffix_source(stepping_suffix)
            .create_backup(&source, Some(backups.as_path()))
            .unwrap();
        assert_eq!(backup, backups.join(expected_name(&source, "00000002")));
        assert_eq!(fs::read(&backup).unwrap(), b"payload");
        for suffix in ["00000000", "00000001"] {
            assert_eq!(fs::read(backups.join(expected_name(&source, suffix))).unwrap(), b"occupied");
        }
        assert!(tmp_files(&backups).is_empty());
    }

    #[test]
    fn test_constant_suffix_exhausts_attempts() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("src").join("a.docx");
        write(&source, b"x");
        let backups = root.path().join("backups");
        fs::create_dir_all(&backups).unwrap();
        let occupied = backups.join(expected_name(&source, &constant_suffix()));
        fs::write(&occupied, b"occupied").unwrap();

        let err = BackupNamer::new()
            .with_suffix_source(constant_suffix)
            .with_max_attempts(3)
            .create_backup(&source, Some(backups.as_path()))
            .unwrap_err();
        assert!(matches!(err, BackupError::NamesExhausted { attempts: 3 }));
        assert_eq!(fs::read(&occupied).unwrap(), b"occupied");
        assert!(tmp_files(&backups).is_empty());
        assert_eq!(fs::read_dir(&backups).unwrap().count(), 1);
    }

    #[test]
    fn test_backup_directory_is_created() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("a.docx");
        write(&source, b"x");
        let nested = root.path().join("deep").join("er");
        let backup = create_backup(&source, Some(nested.as_path())).unwrap();
        assert!(backup.starts_with(&nested));
    }
}
