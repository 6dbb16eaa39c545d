use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use std::path::PathBuf;

fn orbit() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("orbit"));
    cmd.env_remove("ORBIT_CONFIG_PATH");
    cmd
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/jvm-multi-module.json")
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn names(values: &serde_json::Value) -> Vec<&str> {
    values
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v["name"].as_str().or_else(|| v.as_str()).expect("name"))
        .collect()
}

#[test]
fn help_mentions_core_commands() {
    orbit().arg("--help").assert().success().stdout(
        predicate::str::contains("deps")
            .and(predicate::str::contains("module-deps"))
            .and(predicate::str::contains("config-schema")),
    );
}

#[test]
fn deps_json_lists_libraries_used_together() {
    let output = orbit()
        .arg("deps")
        .arg(fixture())
        .arg("kotlin-stdlib")
        .arg("--json")
        .output()
        .unwrap();

    let v = json_stdout(&output);
    assert_eq!(v["library"], "kotlin-stdlib");
    let infos = v["infos"].as_array().unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0]["platform"], "jvm");
    assert_eq!(
        names(&infos[0]["libraries"]),
        vec!["kotlin-stdlib", "annotations", "kotlinx-coroutines-core", "junit"]
    );
    assert_eq!(names(&infos[0]["sdks"]), vec!["jdk-17"]);
}

#[test]
fn deps_respects_builtins_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.child("orbit.toml");
    config
        .write_str("[dependencies]\nbuiltins = \"dependencies\"\n")
        .unwrap();

    let output = orbit()
        .arg("deps")
        .arg(fixture())
        .arg("kotlin-stdlib")
        .arg("--json")
        .arg("--config")
        .arg(config.path())
        .arg("--timeout-ms")
        .arg("10000")
        .output()
        .unwrap();

    let v = json_stdout(&output);
    assert_eq!(names(&v["infos"][0]["libraries"]), vec!["kotlin-stdlib"]);
}

#[test]
fn deps_exceeding_the_timeout_exits_with_error() {
    orbit()
        .arg("deps")
        .arg(fixture())
        .arg("kotlin-stdlib")
        .arg("--timeout-ms")
        .arg("0")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("exceeded its deadline"));
}

#[test]
fn config_is_discovered_next_to_the_descriptor() {
    let temp = TempDir::new().unwrap();
    let descriptor = temp.child("project.json");
    descriptor
        .write_str(&std::fs::read_to_string(fixture()).unwrap())
        .unwrap();
    temp.child("orbit.toml")
        .write_str("[dependencies]\nbuiltins = \"dependencies\"\n")
        .unwrap();

    let output = orbit()
        .arg("deps")
        .arg(descriptor.path())
        .arg("kotlin-stdlib")
        .arg("--json")
        .output()
        .unwrap();

    let v = json_stdout(&output);
    assert_eq!(names(&v["infos"][0]["libraries"]), vec!["kotlin-stdlib"]);
}

#[test]
fn deps_human_output() {
    orbit()
        .arg("deps")
        .arg(fixture())
        .arg("junit")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("junit [jvm]")
                .and(predicate::str::contains("    kotlinx-coroutines-core [jvm]"))
                .and(predicate::str::contains("    jdk-17")),
        );
}

#[test]
fn module_deps_json_skips_transitive_sdks_and_test_scope() {
    let output = orbit()
        .arg("module-deps")
        .arg(fixture())
        .arg("app")
        .arg("--json")
        .output()
        .unwrap();

    let v = json_stdout(&output);
    assert_eq!(v["module"], "app");
    assert_eq!(v["platform"], "jvm");
    assert_eq!(
        names(&v["libraries"]),
        vec!["kotlin-stdlib", "annotations", "kotlinx-coroutines-core", "junit"]
    );
    assert_eq!(names(&v["sdks"]), vec!["jdk-17"]);
}

#[test]
fn unknown_library_exits_with_error() {
    orbit()
        .arg("deps")
        .arg(fixture())
        .arg("guava")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown library `guava`"));
}

#[test]
fn unloaded_module_is_still_addressable_but_not_a_usage() {
    let output = orbit()
        .arg("module-deps")
        .arg(fixture())
        .arg("legacy")
        .arg("--json")
        .output()
        .unwrap();
    let v = json_stdout(&output);
    assert_eq!(names(&v["libraries"]), vec!["junit"]);
}

#[test]
fn invalid_descriptor_exits_with_error() {
    let temp = TempDir::new().unwrap();
    let descriptor = temp.child("broken.json");
    descriptor
        .write_str(r#"{ "modules": [{ "name": "app", "dependencies": [{ "library": "missing" }] }] }"#)
        .unwrap();

    orbit()
        .arg("module-deps")
        .arg(descriptor.path())
        .arg("app")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "module `app` depends on unknown library `missing`",
        ));
}

#[test]
fn config_schema_is_json() {
    let output = orbit().arg("config-schema").output().unwrap();
    let v = json_stdout(&output);
    assert!(v["definitions"]["DependenciesConfig"].is_object());
}
