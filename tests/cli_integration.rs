//! CLI integration tests driving the `ocfl` binary end to end.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn ocfl() -> Command {
    Command::cargo_bin("ocfl").unwrap()
}

/// Create a source tree and build an object from it, returning the temp
/// dir holding both.
fn built_object(id: &str) -> (TempDir, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    tmp.child("src/a.txt").write_str("alpha\n").unwrap();
    tmp.child("src/sub/b.txt").write_str("beta\n").unwrap();
    let objdir = tmp.path().join("obj1");

    ocfl()
        .args(["create", "--id", id, "--message", "initial import", "--name", "Alice"])
        .arg("--src")
        .arg(tmp.child("src").path())
        .arg("--objdir")
        .arg(&objdir)
        .assert()
        .success();
    (tmp, objdir)
}

#[test]
fn init_root_writes_declaration_and_layout() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");

    ocfl()
        .arg("init-root")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized storage root"));

    tmp.child("root/0=ocfl_1.0").assert("ocfl_1.0\n");
    tmp.child("root/ocfl_layout.json")
        .assert(predicate::str::contains("hashed-n-tuple"));
}

#[test]
fn init_root_rejects_unknown_layout() {
    let tmp = TempDir::new().unwrap();
    ocfl()
        .arg("init-root")
        .arg(tmp.path().join("root"))
        .args(["--layout", "mystery"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown layout"));
}

#[test]
fn create_then_validate_succeeds() {
    let (_tmp, objdir) = built_object("ark:/12345/obj1");

    ocfl()
        .arg("validate")
        .arg(&objdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn validate_reports_corruption_and_fails() {
    let (_tmp, objdir) = built_object("ark:/12345/obj1");
    std::fs::write(objdir.join("v1/content/a.txt"), "bit rot\n").unwrap();

    ocfl()
        .arg("validate")
        .arg(&objdir)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[E922]"))
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn validate_warnings_flag_reveals_warnings() {
    let tmp = TempDir::new().unwrap();
    tmp.child("src/a.txt").write_str("alpha\n").unwrap();
    let objdir = tmp.path().join("obj1");
    ocfl()
        .args(["create", "--id", "ark:/12345/obj1", "--digest", "sha256"])
        .arg("--src")
        .arg(tmp.child("src").path())
        .arg("--objdir")
        .arg(&objdir)
        .assert()
        .success();

    // Warnings hidden by default.
    ocfl()
        .arg("validate")
        .arg(&objdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("W206").not());

    ocfl()
        .args(["validate", "--warnings"])
        .arg(&objdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("W206"));
}

#[test]
fn quiet_mode_still_prints_summary() {
    let (_tmp, objdir) = built_object("ark:/12345/obj1");
    std::fs::write(objdir.join("v1/content/a.txt"), "bit rot\n").unwrap();

    ocfl()
        .args(["--quiet", "validate"])
        .arg(&objdir)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[E922]").not())
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn validate_rejects_non_ocfl_directory() {
    let tmp = TempDir::new().unwrap();
    tmp.child("just-a-file.txt").write_str("hi").unwrap();

    ocfl()
        .arg("validate")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("namaste"));
}

#[test]
fn update_adds_a_version() {
    let (tmp, objdir) = built_object("ark:/12345/obj1");
    tmp.child("src2/a.txt").write_str("alpha\n").unwrap();
    tmp.child("src2/c.txt").write_str("gamma\n").unwrap();

    ocfl()
        .args(["update", "--message", "add c"])
        .arg("--objdir")
        .arg(&objdir)
        .arg("--src")
        .arg(tmp.child("src2").path())
        .assert()
        .success()
        .stdout(predicate::str::contains("to v2"));

    ocfl()
        .arg("validate")
        .arg(&objdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn show_prints_history_and_version_listing() {
    let (_tmp, objdir) = built_object("ark:/12345/obj1");

    ocfl()
        .arg("show")
        .arg(&objdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("id: ark:/12345/obj1"))
        .stdout(predicate::str::contains("initial import"));

    ocfl()
        .args(["show", "--version", "v1"])
        .arg(&objdir)
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt  v1/content/a.txt"))
        .stdout(predicate::str::contains("sub/b.txt"));
}

#[test]
fn validate_storage_root_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    ocfl()
        .arg("init-root")
        .arg(&root)
        .args(["--layout", "direct"])
        .assert()
        .success();

    tmp.child("src/a.txt").write_str("alpha\n").unwrap();
    ocfl()
        .args(["create", "--id", "obj1"])
        .arg("--src")
        .arg(tmp.child("src").path())
        .arg("--objdir")
        .arg(root.join("obj1"))
        .assert()
        .success();

    ocfl()
        .arg("validate")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 objects checked"))
        .stdout(predicate::str::contains("VALID"));
}
