use ebookdedupe::dedupe::{DedupeEngine, EngineConfig, FileAction};
use ebookdedupe::index::SqliteIndexStore;
use ebookdedupe::rename::{
    BookMetadata, MetadataSource, RenameError, RenameOutcome, Renamer, SidecarOutcome,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Title from the file's content, date from its length.
struct ContentMetadata;

impl MetadataSource for ContentMetadata {
    fn read(&self, path: &Path) -> Result<BookMetadata, RenameError> {
        let content = fs::read_to_string(path).map_err(|e| RenameError::metadata(path, &e))?;
        let mut parts = content.splitn(2, '|');
        Ok(BookMetadata {
            title: parts.next().map(str::to_string).filter(|s| !s.is_empty()),
            date: parts.next().map(str::to_string),
        })
    }
}

fn renamer() -> Renamer {
    Renamer::new(Box::new(ContentMetadata), "epub", "mobi")
}

#[test]
fn test_collision_embeds_date_and_keeps_existing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Dune.epub"), b"original").unwrap();
    let incoming = dir.path().join("dl.epub");
    fs::write(&incoming, b"Dune|1965").unwrap();

    let outcome = renamer().rename_file(&incoming).unwrap();
    let RenameOutcome::Renamed(book) = outcome else {
        panic!("expected a rename");
    };

    let name = book.to.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.contains("1965"));
    assert_eq!(name, "Dune1965.epub");
    assert_eq!(fs::read(dir.path().join("Dune.epub")).unwrap(), b"original");
}

#[test]
fn test_uppercase_extension_is_kept() {
    let dir = tempdir().unwrap();
    let book = dir.path().join("X.EPUB");
    fs::write(&book, b"Persuasion").unwrap();

    let RenameOutcome::Renamed(renamed) = renamer().rename_file(&book).unwrap() else {
        panic!("expected a rename");
    };
    assert_eq!(renamed.to, dir.path().join("Persuasion.EPUB"));
}

#[test]
fn test_title_with_separator_is_sanitized() {
    let dir = tempdir().unwrap();
    let book = dir.path().join("x.epub");
    fs::write(&book, b"AC/DC").unwrap();

    let RenameOutcome::Renamed(renamed) = renamer().rename_file(&book).unwrap() else {
        panic!("expected a rename");
    };
    assert_eq!(renamed.to, dir.path().join("AC_DC.epub"));
}

#[test]
fn test_rename_directory_through_engine() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("1.epub"), b"Emma").unwrap();
    fs::write(dir.path().join("1.mobi"), b"kindle emma").unwrap();
    fs::write(dir.path().join("2.epub"), b"").unwrap();
    fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();

    let mut engine = DedupeEngine::open(
        SqliteIndexStore::open_in_memory().unwrap(),
        EngineConfig::default(),
    )
    .unwrap();
    let summary = engine.rename_books(dir.path(), &renamer());

    assert_eq!(summary.renamed.len(), 1);
    assert!(matches!(
        summary.renamed[0].sidecar,
        Some(SidecarOutcome::Renamed { .. })
    ));
    assert!(dir.path().join("Emma.epub").exists());
    assert!(dir.path().join("Emma.mobi").exists());

    // 2.epub has no title
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].action, FileAction::Metadata);
    assert!(dir.path().join("2.epub").exists());

    // 1.mobi (walked before its rename) and cover.jpg
    assert_eq!(summary.skipped.len(), 2);
}
