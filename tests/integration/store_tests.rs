use ebookdedupe::index::{Index, IndexStore, IndexedFile, SqliteIndexStore};
use rusqlite::Connection;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("index.db");

    {
        let mut store = SqliteIndexStore::open(&db).unwrap();
        store.record(&IndexedFile::new("/b/a.epub", "aa")).unwrap();
        store.record(&IndexedFile::new("/b/b.epub", "bb")).unwrap();
    }

    let store = SqliteIndexStore::open(&db).unwrap();
    let rows = store.load().unwrap();
    assert_eq!(
        rows,
        vec![
            IndexedFile::new("/b/a.epub", "aa"),
            IndexedFile::new("/b/b.epub", "bb"),
        ]
    );
}

#[test]
fn test_reads_existing_ebookinfo_table() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("legacy.db");

    // Table created by an older tool, without the path index
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "CREATE TABLE ebookinfo ('id' INTEGER PRIMARY KEY AUTOINCREMENT, \
         'path' VARCHAR(1024) NOT NULL, 'hash' VARCHAR(128) NOT NULL);
         INSERT INTO ebookinfo (path, hash) VALUES ('/old/Dune.epub', 'aa');
         INSERT INTO ebookinfo (path, hash) VALUES ('/old/Dune (1).epub', 'aa');
         INSERT INTO ebookinfo (path, hash) VALUES ('/old/Emma.epub', 'bb');",
    )
    .unwrap();
    drop(conn);

    let store = SqliteIndexStore::open(&db).unwrap();
    let (index, rejected) = Index::from_records(store.load().unwrap());

    assert_eq!(index.len(), 2);
    assert_eq!(index.lookup("aa"), Some(Path::new("/old/Dune.epub")));
    assert_eq!(rejected, vec![IndexedFile::new("/old/Dune (1).epub", "aa")]);
}

#[test]
fn test_open_unwritable_location_fails() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("missing-dir").join("index.db");

    assert!(SqliteIndexStore::open(&db).is_err());
}
