use ebookdedupe::dedupe::{DedupeEngine, EngineConfig};
use ebookdedupe::index::SqliteIndexStore;
use ebookdedupe::query::count_files;
use ebookdedupe::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_count_nested_tree() {
    let dir = tempdir().unwrap();
    for (i, sub) in ["", "a", "a/b", "a/b/c", "x/y"].iter().enumerate() {
        let d = dir.path().join(sub);
        fs::create_dir_all(&d).unwrap();
        fs::write(d.join(format!("{i}.epub")), b"x").unwrap();
    }
    fs::create_dir_all(dir.path().join("empty/dirs/only")).unwrap();

    let count = count_files(dir.path(), WalkerConfig::default());
    assert_eq!(count.files, 5);
    assert_eq!(
        count.to_string(),
        format!("There are 5 files in {}", dir.path().display())
    );
}

#[test]
fn test_search_after_dedupe() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("The Hobbit.epub"), b"hobbit").unwrap();
    fs::write(dir.path().join("The Silmarillion.epub"), b"silmarillion").unwrap();
    fs::write(dir.path().join("Dune.epub"), b"dune").unwrap();

    let mut engine = DedupeEngine::open(
        SqliteIndexStore::open_in_memory().unwrap(),
        EngineConfig::default(),
    )
    .unwrap();
    engine.remove_duplicates(dir.path());

    let hits = engine.search("THE ");
    assert_eq!(hits.len(), 2);
    assert!(hits[0].ends_with("The Hobbit.epub"));
    assert!(hits[1].ends_with("The Silmarillion.epub"));
    assert!(engine.search("tolkien").is_empty());
}
