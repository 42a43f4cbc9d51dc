//! Binary tests for `as`

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn artifactstore(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("as").expect("binary");
    cmd.current_dir(workdir);
    cmd
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "{}").unwrap();
}

#[test]
fn next_starts_at_one() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "rust.json");

    artifactstore(temp.path())
        .args(["next", "rust.json", "0.0.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enriched/0.0.2/rust.enriched.001.json"));
}

#[test]
fn next_skips_used_sequences() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "rust.json");
    touch(temp.path(), "enriched/0.0.2/rust.enriched.001.json");
    touch(temp.path(), "enriched/0.0.2/rust.enriched.002.json");

    artifactstore(temp.path())
        .args(["next", "rust.json", "0.0.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rust.enriched.003.json"));
}

#[test]
fn latest_picks_highest_version() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "rust.json");
    touch(temp.path(), "enriched/0.0.2/rust.enriched.005.json");
    touch(temp.path(), "enriched/0.0.10/rust.enriched.001.json");

    artifactstore(temp.path())
        .args(["latest", "rust.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enriched/0.0.10/rust.enriched.001.json"));
}

#[test]
fn list_reports_empty_store() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "rust.json");

    artifactstore(temp.path())
        .args(["list", "rust.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No artifacts found"));
}

#[test]
fn next_rejects_bad_version() {
    let temp = tempdir().unwrap();
    touch(temp.path(), "rust.json");

    artifactstore(temp.path())
        .args(["next", "rust.json", "1.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse version"));
}
