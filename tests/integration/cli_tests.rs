use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn ebookdedupe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ebookdedupe"));
    // Keep the run independent of the caller's logging and config environment
    cmd.env_remove("RUST_LOG")
        .env_remove("EBOOKDEDUPE_DELETE_MODE")
        .env_remove("EBOOKDEDUPE_BUFFER_SIZE")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_json_report_is_the_only_stdout() {
    let dir = tempdir().unwrap();
    let lib = dir.path().join("lib");
    fs::create_dir_all(&lib).unwrap();
    fs::write(lib.join("a.epub"), b"same book").unwrap();
    fs::write(lib.join("a (1).epub"), b"same book").unwrap();

    let output = ebookdedupe()
        .arg("-p")
        .arg(&lib)
        .arg("--db")
        .arg(dir.path().join("index.db"))
        .args(["dedupe", "--output", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let removed = report["removed"].as_array().unwrap();
    assert_eq!(removed.len(), 1);
    assert!(removed[0]["path"].as_str().unwrap().ends_with("a (1).epub"));
    assert_eq!(report["exit_code"], 0);

    // Info logging still happens, on stderr
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("INFO"));
    assert!(lib.join("a.epub").exists());
    assert!(!lib.join("a (1).epub").exists());
}

#[test]
fn test_text_report_keeps_logs_on_stdout() {
    let dir = tempdir().unwrap();
    let db = tempdir().unwrap();
    fs::write(dir.path().join("b.epub"), b"only").unwrap();

    let output = ebookdedupe()
        .arg("-p")
        .arg(dir.path())
        .arg("--db")
        .arg(db.path().join("index.db"))
        .arg("dedupe")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("INFO"));
}

#[cfg(unix)]
#[test]
fn test_failed_removal_is_logged_once() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let lib = dir.path().join("lib");
    let locked = lib.join("ro");
    fs::create_dir_all(&locked).unwrap();
    fs::write(lib.join("b.epub"), b"twin").unwrap();
    fs::write(locked.join("b (1).epub"), b"twin").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Running as root can write anywhere; nothing to test then
    if fs::write(locked.join("write_check"), b"").is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let output = ebookdedupe()
        .arg("-p")
        .arg(&lib)
        .arg("--db")
        .arg(dir.path().join("index.db"))
        .args(["dedupe", "--output", "json"])
        .output()
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let failures = report["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["action"], "remove");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let logged = stderr
        .lines()
        .filter(|line| line.contains("b (1).epub") && line.contains("failed"))
        .count();
    assert_eq!(logged, 1);
    assert!(locked.join("b (1).epub").exists());
}
