use ebookdedupe::actions::DeleteMode;
use ebookdedupe::config::Config;
use figment::providers::Serialized;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.book_extension, "epub");
    assert_eq!(config.sidecar_extension, "mobi");
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("EBOOKDEDUPE_DELETE_MODE", "trash");
    std::env::set_var("EBOOKDEDUPE_BUFFER_SIZE", "65536");

    use figment::{providers::Env, Figment};
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("EBOOKDEDUPE_").split("__"));

    let config: Config = figment.extract().unwrap();

    assert_eq!(config.delete_mode, DeleteMode::Trash);
    assert_eq!(config.buffer_size, 65536);

    std::env::remove_var("EBOOKDEDUPE_DELETE_MODE");
    std::env::remove_var("EBOOKDEDUPE_BUFFER_SIZE");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let toml_content = r#"
root = "/srv/books"
database = "/var/lib/ebookinfo.db"
copy_markers = ["(1)", " - Copy"]
delete_mode = "trash"
skip_hidden = true
"#;
    fs::write(&config_path, toml_content).unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.root, PathBuf::from("/srv/books"));
    assert_eq!(config.database, PathBuf::from("/var/lib/ebookinfo.db"));
    assert_eq!(config.copy_markers, vec!["(1)", " - Copy"]);
    assert_eq!(config.delete_mode, DeleteMode::Trash);
    assert!(config.skip_hidden);
    // Unset keys keep their defaults
    assert_eq!(config.buffer_size, 8192);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "invalid = toml").unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

#[test]
fn test_config_rejects_zero_buffer() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "buffer_size = 0\n").unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let err = Config::load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_config_save_toml() {
    let config = Config {
        delete_mode: DeleteMode::Trash,
        ..Config::default()
    };
    let content = toml::to_string_pretty(&config).unwrap();
    assert!(content.contains("delete_mode = \"trash\""));
    assert!(content.contains("database = \"ebookinfo.db\""));
}
