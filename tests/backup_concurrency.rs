mod common;

use docx_batch::batch::backup::{create_backup, fingerprint};
use docx_batch::batch::{BatchOptions, BatchProcessor};
use docx_batch::replace::ReplaceRule;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::TempDir;

fn same_named_sources(root: &Path, dirs: &[&str]) -> Vec<PathBuf> {
    dirs.iter()
        .map(|dir| {
            let path = root.join(dir).join("report.docx");
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("content of {dir}")).unwrap();
            path
        })
        .collect()
}

fn assert_no_temp_files(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn test_same_name_different_dirs_sequential() {
    let root = TempDir::new().unwrap();
    let backups = root.path().join("backups");
    let sources = same_named_sources(root.path(), &["dept_a", "dept_b"]);

    let made: Vec<PathBuf> = sources
        .iter()
        .map(|s| create_backup(s, Some(backups.as_path())).unwrap())
        .collect();

    assert_ne!(made[0], made[1]);
    for (source, backup) in sources.iter().zip(&made) {
        assert_eq!(fs::read(source).unwrap(), fs::read(backup).unwrap());
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.contains(&fingerprint(source)), "{name}");
    }
}

#[test]
fn test_cjk_parent_directories() {
    let root = TempDir::new().unwrap();
    let backups = root.path().join("backups");
    let sources = same_named_sources(root.path(), &["部门A", "部门B"]);

    let a = create_backup(&sources[0], Some(backups.as_path())).unwrap();
    let b = create_backup(&sources[1], Some(backups.as_path())).unwrap();
    assert!(a.file_name().unwrap().to_string_lossy().starts_with("report_backup_部门A_"));
    assert!(b.file_name().unwrap().to_string_lossy().starts_with("report_backup_部门B_"));
}

#[test]
fn test_concurrent_backups_into_one_directory() {
    let root = TempDir::new().unwrap();
    let backups = root.path().join("backups");
    let dirs: Vec<String> = (0..10).map(|i| format!("dir_{i}")).collect();
    let dir_refs: Vec<&str> = dirs.iter().map(String::as_str).collect();
    let sources = same_named_sources(root.path(), &dir_refs);

    // Every source is backed up three times from competing threads.
    let made: Vec<(PathBuf, PathBuf)> = thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .flat_map(|source| std::iter::repeat_n(source, 3))
            .map(|source| {
                let backups = &backups;
                scope.spawn(move || (source.clone(), create_backup(source, Some(backups.as_path())).unwrap()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<&PathBuf> = made.iter().map(|(_, backup)| backup).collect();
    assert_eq!(unique.len(), made.len());
    for (source, backup) in &made {
        assert_eq!(fs::read(source).unwrap(), fs::read(backup).unwrap());
    }
    assert_eq!(fs::read_dir(&backups).unwrap().count(), made.len());
    assert_no_temp_files(&backups);
}

#[test]
fn test_batch_backups_of_same_named_documents() {
    let root = TempDir::new().unwrap();
    let backups = root.path().join("backups");
    let sources: Vec<PathBuf> = (0..10)
        .map(|i| {
            common::write_docx(
                &root.path().join(format!("team{i}")).join("minutes.docx"),
                &common::paragraph(&format!("Team {i} 2024")),
            )
        })
        .collect();
    let originals: Vec<Vec<u8>> = sources.iter().map(|s| fs::read(s).unwrap()).collect();

    let processor = BatchProcessor::new(4).unwrap();
    let options = BatchOptions {
        create_backup: true,
        backup_dir: Some(backups.clone()),
    };
    let rules = [ReplaceRule::new("2024", "2025").unwrap()];
    let results = processor
        .process_documents(&sources, &rules, &options, |_, _| {}, |_| {})
        .unwrap();

    assert!(results.iter().all(|r| r.success));
    let unique: HashSet<_> = results.iter().map(|r| r.backup_path.clone().unwrap()).collect();
    assert_eq!(unique.len(), sources.len());

    for result in &results {
        let index = sources.iter().position(|s| *s == result.path).unwrap();
        let backup = result.backup_path.as_ref().unwrap();
        assert_eq!(fs::read(backup).unwrap(), originals[index]);
        assert_eq!(common::text_of(&result.path), format!("Team {index} 2025"));
    }
    assert_no_temp_files(&backups);
}
