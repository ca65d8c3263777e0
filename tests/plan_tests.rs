//! Plan command tests
//!
//! Planning is read-only: these tests assert ordering, cycle diagnostics,
//! blocked steps and already-satisfied detection purely from the rendered
//! output, and that planning never mutates the workspace.

mod common;

use predicates::prelude::*;

#[test]
fn test_plan_orders_dependencies_before_dependents() {
    let workspace = common::TestWorkspace::new();
    let digest = common::sha256_hex(b"artifact");
    workspace.write_catalog(&common::catalog_doc(&[
        common::catalog_entry("editor", &digest, &["runtime"]),
        common::catalog_entry("runtime", &digest, &[]),
    ]));

    let assert = workspace.cmd().args(["plan", "editor"]).assert().success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let runtime_pos = stdout.find("runtime").expect("runtime missing from plan");
    let editor_pos = stdout.rfind("editor").expect("editor missing from plan");
    assert!(
        runtime_pos < editor_pos,
        "dependency must be listed before dependent:\n{stdout}"
    );
}

#[test]
fn test_plan_with_cycle_still_renders() {
    let workspace = common::TestWorkspace::new();
    let digest = common::sha256_hex(b"artifact");
    workspace.write_catalog(&common::catalog_doc(&[
        common::catalog_entry("a", &digest, &["b"]),
        common::catalog_entry("b", &digest, &["a"]),
    ]));

    // A cycle is a renderable planning outcome, not a process failure
    workspace
        .cmd()
        .args(["plan", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a -> b -> a"))
        .stdout(predicate::str::contains("cannot be executed"));
}

#[test]
fn test_plan_reports_blocked_dependency_and_resolves_siblings() {
    let workspace = common::TestWorkspace::new();
    let digest = common::sha256_hex(b"artifact");
    workspace.write_catalog(&common::catalog_doc(&[
        common::catalog_entry("app", &digest, &["ghost", "helper"]),
        common::catalog_entry("helper", &digest, &[]),
    ]));

    workspace
        .cmd()
        .args(["plan", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blocked"))
        .stdout(predicate::str::contains("ghost"))
        .stdout(predicate::str::contains("helper"))
        .stdout(predicate::str::contains("required by 'app'"));
}

#[test]
fn test_plan_marks_installed_dependency_satisfied() {
    let workspace = common::TestWorkspace::new();
    let digest = common::sha256_hex(b"artifact");
    workspace.write_catalog(&common::catalog_doc(&[
        common::catalog_entry("app", &digest, &["runtime"]),
        common::catalog_entry("runtime", &digest, &[]),
    ]));
    workspace.write_state(&format!(
        r#"{{
            "applications": [
                {{
                    "app_id": "runtime",
                    "version": "2.0.0",
                    "installed": true,
                    "installer_path": "{}",
                    "dependencies": [],
                    "installed_at": "2026-01-01T00:00:00Z"
                }}
            ]
        }}"#,
        workspace.cache_dir().join(&digest).display()
    ));

    workspace
        .cmd()
        .args(["plan", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("satisfied"))
        .stdout(predicate::str::contains("1 step(s) to execute"));
}

#[test]
fn test_plan_outdated_install_is_replanned() {
    let workspace = common::TestWorkspace::new();
    let digest = common::sha256_hex(b"artifact");
    workspace.write_catalog(&common::catalog_doc(&[common::catalog_entry(
        "app", &digest, &[],
    )]));
    workspace.write_state(
        r#"{
            "applications": [
                {
                    "app_id": "app",
                    "version": "0.1.0",
                    "installed": true,
                    "installer_path": "/cache/old",
                    "dependencies": [],
                    "installed_at": "2026-01-01T00:00:00Z"
                }
            ]
        }"#,
    );

    // Catalog version 1.0.0 is newer than the installed 0.1.0
    workspace
        .cmd()
        .args(["plan", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("1 step(s) to execute"));
}

#[test]
fn test_plan_does_not_touch_state_or_cache() {
    let workspace = common::TestWorkspace::new();
    let digest = common::sha256_hex(b"artifact");
    workspace.write_catalog(&common::catalog_doc(&[common::catalog_entry(
        "app", &digest, &[],
    )]));

    workspace.cmd().args(["plan", "app"]).assert().success();

    assert!(!workspace.state_path().exists());
    assert_eq!(
        std::fs::read_dir(workspace.cache_dir()).unwrap().count(),
        0
    );
}
