//! CLI smoke tests for smake.
//!
//! Each test writes a project into a temp directory and drives the binary
//! with `-C` pointing at it.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn smake_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("smake");
    cmd.env("SMAKE_CC", "true").env_remove("RUST_LOG");
    cmd
}

/// Create a temp project with files at the given relative paths.
fn temp_project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (rel, content) in files {
        let path = temp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    temp
}

const APP_CONFIG: &str = r#"
sources:
  - core_src: [main.c, util.c]
  - ship: [touch shipped.txt]
builds:
  - core:
      - sources: core_src
      - includes: include
      - libraries: m
targets:
  - app:
      - modes: default, release
      - builds:
          - main: core
      - postbuild:
          - default: touch done.txt
          - release: ship
"#;

// =============================================================================
// Help & Schema
// =============================================================================

#[test]
fn help_flag_works() {
    smake_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn target_is_required() {
    smake_cmd().assert().failure();
}

#[test]
fn print_schema_outputs_json() {
    smake_cmd()
        .arg("--print-schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"targets\""));
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn run_default_mode_compiles_and_runs_postbuild() {
    let project = temp_project(&[("smake.yaml", APP_CONFIG)]);
    smake_cmd()
        .arg("app")
        .arg("-C")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Built app [default]"));
    assert!(project.path().join("build/app/core.obj").is_dir());
    assert!(project.path().join("done.txt").exists());
    assert!(!project.path().join("shipped.txt").exists());
}

#[test]
fn run_release_mode_uses_defined_postbuild() {
    let project = temp_project(&[("smake.yaml", APP_CONFIG)]);
    smake_cmd()
        .args(["app", "-m", "release", "-j", "2", "-C"])
        .arg(project.path())
        .assert()
        .success();
    assert!(project.path().join("shipped.txt").exists());
    assert!(!project.path().join("done.txt").exists());
}

#[test]
fn relative_directory_builds_inside_project() {
    let workspace = temp_project(&[
        ("proj/smake.yaml", APP_CONFIG),
        (
            "fake-cc.sh",
            "out=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then out=\"$2\"; fi\n  shift\ndone\necho \"warning: fake compiler\" >&2\ntouch \"$out\"\n",
        ),
    ]);
    let compiler = format!("sh {}", workspace.path().join("fake-cc.sh").display());
    smake_cmd()
        .env("SMAKE_CC", compiler)
        .current_dir(workspace.path())
        .args(["app", "-C", "proj"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: fake compiler"));

    let proj = workspace.path().join("proj");
    assert!(proj.join("build/app/core").is_file());
    assert!(proj.join("build/app/core.obj/0-main.c.o").is_file());
    assert!(proj.join("build/app/core.obj/1-util.c.o").is_file());
    assert!(proj.join("done.txt").exists());
    assert!(!workspace.path().join("proj/proj").exists());
}

#[test]
fn dry_run_prints_commands_only() {
    let project = temp_project(&[("smake.yaml", APP_CONFIG)]);
    smake_cmd()
        .env("SMAKE_CC", "cc")
        .args(["app", "--dry-run", "-C"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cc -Iinclude -c main.c"))
        .stdout(predicate::str::contains("-lm"))
        .stdout(predicate::str::contains("touch done.txt"));
    assert!(!project.path().join("build").exists());
    assert!(!project.path().join("done.txt").exists());
}

#[test]
fn unknown_target_lists_known_targets() {
    let project = temp_project(&[
        ("a/smake.yaml", APP_CONFIG),
        (
            "b/smake.yaml",
            "builds:\n  - t:\n      - sources: t.c\ntargets:\n  - tests:\n      - modes: default\n      - builds:\n          - runner: t\n",
        ),
    ]);
    smake_cmd()
        .args(["ap", "-C"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No target ap found. Perhaps you meant one of the following:",
        ))
        .stdout(predicate::str::contains("\tapp"))
        .stdout(predicate::str::contains("\ttests"));
}

#[test]
fn unknown_mode_fails() {
    let project = temp_project(&[("smake.yaml", APP_CONFIG)]);
    smake_cmd()
        .args(["app", "-m", "debug", "-C"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("debug"));
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn invalid_config_fails() {
    let project = temp_project(&[("smake.yaml", "targets: [unclosed")]);
    smake_cmd()
        .args(["app", "-C"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn missing_sources_fails() {
    let project = temp_project(&[(
        "smake.yaml",
        "builds:\n  - core:\n      - flags: -O2\n",
    )]);
    smake_cmd()
        .args(["app", "-C"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required property 'sources'"));
}

#[test]
fn strict_rejects_dangling_build() {
    let config = "targets:\n  - app:\n      - modes: default\n      - builds:\n          - main: ghost\n";
    let project = temp_project(&[("smake.yaml", config)]);

    smake_cmd()
        .args(["app", "-C"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("main: skipped"));

    smake_cmd()
        .args(["app", "--strict", "-C"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}
