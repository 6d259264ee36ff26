// ABOUTME: Integration tests for the ephemera CLI commands.
// ABOUTME: Validates --help output, init, plan and config discovery failures.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn ephemera_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ephemera"));
    cmd.env_remove("EPHEMERA_TOKEN").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path) {
    fs::write(
        dir.join("ephemera.yml"),
        "registry_namespace: registry.test/previews\n",
    )
    .unwrap();
}

#[test]
fn help_shows_commands() {
    ephemera_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("ephemera.yml");

    ephemera_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ephemera.yml"));

    assert!(config_path.exists(), "ephemera.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("registry_namespace:"));
}

#[test]
fn init_uses_given_registry() {
    let temp_dir = tempfile::tempdir().unwrap();

    ephemera_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--registry", "ghcr.io/acme"])
        .assert()
        .success();

    let content = fs::read_to_string(temp_dir.path().join("ephemera.yml")).unwrap();
    assert!(content.contains("registry_namespace: ghcr.io/acme"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_config(temp_dir.path());

    ephemera_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn plan_lists_build_plans() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_config(temp_dir.path());
    fs::create_dir_all(temp_dir.path().join("app/frontend")).unwrap();
    fs::create_dir_all(temp_dir.path().join("app/backend")).unwrap();
    fs::write(temp_dir.path().join("app/frontend/Dockerfile"), "FROM node\n").unwrap();
    fs::write(temp_dir.path().join("app/backend/Dockerfile"), "FROM rust\n").unwrap();

    ephemera_cmd()
        .current_dir(temp_dir.path())
        .args(["plan", "app", "--repo", "Acme/Shop", "--pr", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "registry.test/previews/acme-shop-frontend:pr-3",
        ))
        .stdout(predicate::str::contains(
            "registry.test/previews/acme-shop-backend:pr-3",
        ))
        .stdout(predicate::str::contains("2 build plan(s)"));
}

#[test]
fn plan_emits_json_result() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_config(temp_dir.path());
    fs::write(temp_dir.path().join("Dockerfile"), "FROM nginx\n").unwrap();

    let output = ephemera_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "plan", "--repo", "acme/site", "--pr", "#9"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let event: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(event["event"], "result");
    assert_eq!(event["data"][0]["strategy"]["kind"], "generic");
    assert_eq!(
        event["data"][0]["image_ref"],
        "registry.test/previews/acme-site:pr-9"
    );
}

#[test]
fn plan_requires_repository() {
    ephemera_cmd()
        .args(["plan", "--pr", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--repo"));
}

#[test]
fn malformed_repository_is_rejected() {
    ephemera_cmd()
        .args(["plan", "--repo", "just-a-name", "--pr", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("owner/name"));
}

#[test]
fn zero_pr_number_is_rejected() {
    ephemera_cmd()
        .args(["delete", "--pr", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn create_requires_config() {
    let temp_dir = tempfile::tempdir().unwrap();

    ephemera_cmd()
        .current_dir(temp_dir.path())
        .args(["create", "https://github.com/acme/site", "--pr", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn delete_requires_config() {
    let temp_dir = tempfile::tempdir().unwrap();

    ephemera_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "delete", "--pr", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"event\":\"error\""))
        .stderr(predicate::str::contains("configuration file not found"));
}
