use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const CONFIG_KEYS: &[&str] = &[
    "DATABASE_PATH",
    "IMAGE_STORE",
    "IMAGE_BASE",
    "VOLUME_MOUNT_PATH",
    "RAILWAY_VOLUME_MOUNT_PATH",
    "APP_ENV",
    "NODE_ENV",
    "PRODUCTION_VOLUME_PREFIXES",
    "REMOTE_SERVICE",
    "REMOTE_DB_PATHS",
    "REMOTE_IMAGE_PATHS",
    "FORCE_OVERWRITE",
    "FORCE",
    "ADMIN_PASSWORD",
    "PRODUCTION_URL",
    "RESTORE_COMMIT",
];

/// `vellum` running in `cwd` with no configuration inherited from the host.
fn vellum_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vellum"));
    cmd.current_dir(cwd).env("NO_COLOR", "1");
    for key in CONFIG_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

fn write_document(cwd: &Path, body: &str) {
    let data = cwd.join("data");
    fs::create_dir_all(&data).expect("data dir");
    fs::write(data.join("database.json"), body).expect("write document");
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_default_document_once() {
    let cwd = TempDir::new().expect("cwd");
    let doc_path = cwd.path().join("data").join("database.json");

    vellum_cmd(cwd.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Created"));
    let first = fs::read_to_string(&doc_path).expect("document written");
    assert!(first.contains("\"pages\""));
    assert!(first.contains("/students"));

    vellum_cmd(cwd.path())
        .arg("init")
        .assert()
        .success()
        .stdout(contains("already exists"));
    assert_eq!(fs::read_to_string(&doc_path).expect("document"), first);
}

#[test]
fn init_from_seed_file() {
    let cwd = TempDir::new().expect("cwd");
    let seed = cwd.path().join("seed.json");
    fs::write(
        &seed,
        r#"{ "pages": [{ "id": "home", "path": "/", "title": "Welcome" }], "settings": { "siteName": "Seeded" } }"#,
    )
    .expect("seed");

    vellum_cmd(cwd.path())
        .args(["init", "--from"])
        .arg(&seed)
        .assert()
        .success();
    let written = fs::read_to_string(cwd.path().join("data/database.json")).expect("document");
    assert!(written.contains("Seeded"));
    assert!(written.contains("Welcome"));
}

#[test]
fn init_rejects_non_object_seed() {
    let cwd = TempDir::new().expect("cwd");
    let seed = cwd.path().join("seed.json");
    fs::write(&seed, "[1, 2, 3]").expect("seed");

    vellum_cmd(cwd.path())
        .args(["init", "--from"])
        .arg(&seed)
        .assert()
        .failure();
    assert!(!cwd.path().join("data/database.json").exists());
}

#[test]
fn init_honours_database_path() {
    let cwd = TempDir::new().expect("cwd");
    vellum_cmd(cwd.path())
        .arg("init")
        .env("DATABASE_PATH", "./content")
        .assert()
        .success();
    assert!(cwd.path().join("content/database.json").is_file());
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_paths_reports_development_defaults() {
    let cwd = TempDir::new().expect("cwd");
    vellum_cmd(cwd.path())
        .args(["check", "paths"])
        .assert()
        .success()
        .stdout(contains("database.json"))
        .stdout(contains("development"))
        .stdout(contains("/images"));
}

#[test]
fn check_without_document_fails() {
    let cwd = TempDir::new().expect("cwd");
    vellum_cmd(cwd.path())
        .args(["check", "icons"])
        .assert()
        .failure()
        .stderr(contains("database.json"));
}

#[test]
fn check_icons_flags_undefined_ids() {
    let cwd = TempDir::new().expect("cwd");
    write_document(
        cwd.path(),
        r#"{
          "pages": [{ "id": "home", "path": "/", "title": "Home",
                      "sections": { "features": [{ "iconId": "ghost" }] } }],
          "icons": []
        }"#,
    );

    vellum_cmd(cwd.path())
        .args(["check", "icons"])
        .assert()
        .failure()
        .stdout(contains("ghost"))
        .stderr(contains("undefined icons"));
}

#[test]
fn check_images_passes_once_files_exist() {
    let cwd = TempDir::new().expect("cwd");
    write_document(
        cwd.path(),
        r#"{ "pages": [], "team": [{ "name": "Ada", "image": "/images/ada.jpg" }] }"#,
    );

    vellum_cmd(cwd.path())
        .args(["check", "images"])
        .assert()
        .failure()
        .stderr(contains("ada.jpg"));

    let images = cwd.path().join("data").join("images");
    fs::create_dir_all(&images).expect("images dir");
    fs::write(images.join("ada.jpg"), b"\xFF\xD8\xFF").expect("image");

    vellum_cmd(cwd.path())
        .args(["check", "images"])
        .assert()
        .success()
        .stdout(contains("All referenced images exist"));
}

// ---------------------------------------------------------------------------
// sync / remote preconditions
// ---------------------------------------------------------------------------

#[test]
fn sync_fails_cleanly_without_remote_cli() {
    let cwd = TempDir::new().expect("cwd");
    let empty_bin = TempDir::new().expect("bin");
    write_document(cwd.path(), r#"{ "pages": [] }"#);

    vellum_cmd(cwd.path())
        .args(["sync", "db"])
        .env("PATH", empty_bin.path())
        .assert()
        .failure()
        .stderr(contains("railway"));
}

#[test]
fn remote_commands_require_configuration() {
    let cwd = TempDir::new().expect("cwd");
    vellum_cmd(cwd.path())
        .args(["remote", "status"])
        .assert()
        .failure()
        .stderr(contains("PRODUCTION_URL"));

    vellum_cmd(cwd.path())
        .args(["remote", "upload"])
        .env("PRODUCTION_URL", "http://127.0.0.1:9")
        .assert()
        .failure()
        .stderr(contains("ADMIN_PASSWORD"));
}

#[test]
fn remote_images_requires_configuration() {
    let cwd = TempDir::new().expect("cwd");
    vellum_cmd(cwd.path())
        .args(["remote", "images"])
        .env("PRODUCTION_URL", "http://127.0.0.1:9")
        .assert()
        .failure()
        .stderr(contains("ADMIN_PASSWORD"));
}

// ---------------------------------------------------------------------------
// restore
// ---------------------------------------------------------------------------

/// Run git in `dir`; `false` when git is not installed.
fn git(dir: &Path, args: &[&str]) -> bool {
    let Ok(status) = Command::new("git")
        .current_dir(dir)
        .args(["-c", "user.name=vellum", "-c", "user.email=vellum@example.test"])
        .args(args)
        .status()
    else {
        return false;
    };
    assert!(status.success(), "git {args:?} failed");
    true
}

/// A repository with one commit holding `rel_path`.
fn repo_with(rel_path: &str, body: &str) -> Option<TempDir> {
    let repo = TempDir::new().expect("repo");
    if !git(repo.path(), &["init", "-q"]) {
        return None;
    }
    let file = repo.path().join(rel_path);
    fs::create_dir_all(file.parent().expect("parent")).expect("dirs");
    fs::write(&file, body).expect("write");
    git(repo.path(), &["add", "."]);
    git(repo.path(), &["commit", "-q", "-m", "content"]);
    Some(repo)
}

#[test]
fn restore_reads_document_from_history() {
    let Some(repo) = repo_with(
        "data/database.json",
        r#"{ "pages": [{ "id": "home", "path": "/", "title": "Home" }], "team": [] }"#,
    ) else {
        return;
    };
    write_document(repo.path(), r#"{ "pages": [] }"#);

    vellum_cmd(repo.path())
        .args(["restore", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("HEAD:data/database.json"))
        .stdout(contains("1 pages"));
}

#[test]
fn restore_falls_back_to_root_document_and_honours_env_commit() {
    let Some(repo) = repo_with("database.json", r#"{ "pages": [], "team": [{ "name": "Ada" }] }"#)
    else {
        return;
    };

    vellum_cmd(repo.path())
        .args(["restore", "--dry-run"])
        .env("RESTORE_COMMIT", "HEAD")
        .assert()
        .success()
        .stdout(contains("HEAD:database.json"))
        .stdout(contains("1 team members"));
}

#[test]
fn restore_rejects_invalid_or_missing_history() {
    let Some(repo) = repo_with("data/database.json", r#"["not", "a", "document"]"#) else {
        return;
    };

    vellum_cmd(repo.path())
        .args(["restore", "--dry-run"])
        .assert()
        .failure()
        .stderr(contains("not a usable document"));

    vellum_cmd(repo.path())
        .args(["restore", "--dry-run", "--commit", "does-not-exist"])
        .assert()
        .failure()
        .stderr(contains("no document at does-not-exist"));
}
