use ebookdedupe::dedupe::{DedupeEngine, EngineConfig, FileAction};
use ebookdedupe::index::{IndexStore, IndexedFile, SqliteIndexStore};
use ebookdedupe::scanner::{Hasher, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

fn open(db: &Path) -> DedupeEngine<SqliteIndexStore> {
    DedupeEngine::open(SqliteIndexStore::open(db).unwrap(), EngineConfig::default()).unwrap()
}

#[test]
fn test_dedupe_empty_directory() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();

    let summary = open(&db.path().join("index.db")).remove_duplicates(dir.path());

    assert_eq!(summary.files_seen, 0);
    assert!(summary.removed.is_empty());
    assert!(!summary.has_failures());
}

#[test]
fn test_one_copy_per_digest_survives() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();

    write(&dir.path().join("fiction/Dune.epub"), b"dune");
    write(&dir.path().join("fiction/Dune (1).epub"), b"dune");
    write(&dir.path().join("backup/Dune.epub"), b"dune");
    write(&dir.path().join("fiction/Emma.epub"), b"emma");
    write(&dir.path().join("fiction/Emma 副本.epub"), b"emma");
    write(&dir.path().join("notes.txt"), b"notes");

    let mut engine = open(&db.path().join("index.db"));
    let summary = engine.remove_duplicates(dir.path());

    assert_eq!(summary.files_seen, 6);
    assert_eq!(summary.removed.len(), 3);
    assert_eq!(engine.index().len(), 3);

    // Every digest has exactly one file left on disk, and it is the indexed one
    for (digest, path) in engine.index().iter() {
        assert!(path.is_file(), "{} should exist", path.display());
        assert_eq!(Hasher::new().full_hash(path).unwrap(), digest);
    }
    assert!(dir.path().join("fiction/Emma.epub").exists());
    assert!(!dir.path().join("fiction/Emma 副本.epub").exists());
    assert!(!dir.path().join("fiction/Dune (1).epub").exists());
}

#[test]
fn test_marked_file_removed_regardless_of_order() {
    // Marked copy found first
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    write(&dir.path().join("a/book (1).epub"), b"same");
    write(&dir.path().join("b/book.epub"), b"same");

    open(&db.path().join("index.db")).remove_duplicates(dir.path());
    assert!(!dir.path().join("a/book (1).epub").exists());
    assert!(dir.path().join("b/book.epub").exists());

    // Marked copy found second
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    write(&dir.path().join("a/book.epub"), b"same");
    write(&dir.path().join("b/book (1).epub"), b"same");

    open(&db.path().join("index.db")).remove_duplicates(dir.path());
    assert!(dir.path().join("a/book.epub").exists());
    assert!(!dir.path().join("b/book (1).epub").exists());
}

#[test]
fn test_index_persists_across_runs() {
    let library = tempdir().unwrap();
    let incoming = tempdir().unwrap();
    let db = tempdir().unwrap();
    let db_path = db.path().join("index.db");

    write(&library.path().join("Dune.epub"), b"dune");
    let summary = open(&db_path).remove_duplicates(library.path());
    assert_eq!(summary.registered, 1);

    // A new engine, a different root: the old record is still known
    write(&incoming.path().join("download.epub"), b"dune");
    let summary = open(&db_path).remove_duplicates(incoming.path());

    assert_eq!(summary.removed.len(), 1);
    assert!(!incoming.path().join("download.epub").exists());
    assert!(library.path().join("Dune.epub").exists());
}

#[test]
fn test_idempotent_second_run() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    let db_path = db.path().join("index.db");

    for i in 0..5 {
        write(&dir.path().join(format!("{i}.epub")), format!("book {}", i % 3).as_bytes());
    }

    let first = open(&db_path).remove_duplicates(dir.path());
    assert_eq!(first.removed.len(), 2);

    let mut engine = open(&db_path);
    let second = engine.remove_duplicates(dir.path());
    assert!(second.removed.is_empty());
    assert_eq!(second.registered, 0);
    assert_eq!(second.unchanged, 3);
    assert_eq!(engine.store().row_count().unwrap(), 3);
}

#[test]
fn test_deeply_nested_tree() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();

    let mut deep = dir.path().to_path_buf();
    for i in 0..40 {
        deep.push(format!("d{i}"));
    }
    write(&deep.join("deep.epub"), b"x");
    write(&dir.path().join("top.epub"), b"x");

    let summary = open(&db.path().join("index.db")).remove_duplicates(dir.path());
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.removed.len(), 1);
}

#[test]
fn test_dry_run_then_real_run() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    let db_path = db.path().join("index.db");
    write(&dir.path().join("a.epub"), b"same");
    write(&dir.path().join("b.epub"), b"same");

    let config = EngineConfig::default().with_dry_run(true);
    let mut engine =
        DedupeEngine::open(SqliteIndexStore::open(&db_path).unwrap(), config).unwrap();
    let preview = engine.remove_duplicates(dir.path());
    drop(engine);

    let real = open(&db_path).remove_duplicates(dir.path());

    let names = |paths: Vec<PathBuf>| {
        paths
            .into_iter()
            .map(|p| p.file_name().unwrap().to_owned())
            .collect::<Vec<_>>()
    };
    assert_eq!(
        names(preview.removed.iter().map(|r| r.path.clone()).collect()),
        names(real.removed.iter().map(|r| r.path.clone()).collect())
    );
    assert!(!dir.path().join("b.epub").exists());
}

#[test]
fn test_stale_record_outside_root() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    let db_path = db.path().join("index.db");

    // Record for a file that no longer exists
    let digest = Hasher::hash_bytes(b"book");
    SqliteIndexStore::open(&db_path)
        .unwrap()
        .record(&IndexedFile::new("/nonexistent/old.epub", digest.clone()))
        .unwrap();

    write(&dir.path().join("book.epub"), b"book");
    let mut engine = open(&db_path);
    let summary = engine.remove_duplicates(dir.path());

    assert!(dir.path().join("book.epub").exists());
    assert_eq!(summary.repointed, 1);
    assert_eq!(
        engine.index().lookup(&digest),
        Some(dir.path().canonicalize().unwrap().join("book.epub").as_path())
    );
    let rows = engine.store().load().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].path.file_name().unwrap(), "book.epub");
}

#[test]
fn test_skip_hidden() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    write(&dir.path().join("a.epub"), b"same");
    write(&dir.path().join(".trash/a.epub"), b"same");

    let config = EngineConfig::default().with_walker_config(WalkerConfig::new(false, true));
    let mut engine = DedupeEngine::open(
        SqliteIndexStore::open(&db.path().join("index.db")).unwrap(),
        config,
    )
    .unwrap();
    let summary = engine.remove_duplicates(dir.path());

    assert_eq!(summary.files_seen, 1);
    assert!(dir.path().join(".trash/a.epub").exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_stop_run() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    let locked = dir.path().join("locked.epub");
    write(&locked, b"secret");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    write(&dir.path().join("x.epub"), b"dup");
    write(&dir.path().join("y.epub"), b"dup");

    // Running as root can read anything; nothing to test then
    if File::open(&locked).is_ok() {
        return;
    }

    let summary = open(&db.path().join("index.db")).remove_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(summary.failures_for(FileAction::Hash).count(), 1);
    assert_eq!(summary.removed.len(), 1);
    assert!(locked.exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    write(&dir.path().join("a/x.epub"), b"dup");
    write(&dir.path().join("locked/y.epub"), b"hidden");
    write(&dir.path().join("z/x (1).epub"), b"dup");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root can read anything; nothing to test then
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let summary = open(&db.path().join("index.db")).remove_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Siblings on both sides of the locked directory are still processed
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.removed.len(), 1);
    assert!(!dir.path().join("z/x (1).epub").exists());

    let walk_failures: Vec<_> = summary.failures_for(FileAction::Walk).collect();
    assert_eq!(walk_failures.len(), 1);
    assert!(walk_failures[0].path.ends_with("locked"));
    assert!(walk_failures[0].message.contains("Permission denied"));
    assert_eq!(summary.failures.len(), 1);
    assert!(locked.join("y.epub").exists());
}
