// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};
use serde_yaml::{Mapping, Value};
use tempfile::TempDir;

use super::*;

#[fixture]
fn envs() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let write = |name: &str, content: &str| {
        std::fs::write(tmp.path().join(name), content).expect("Failed to write environment")
    };
    write(
        "default.yaml",
        r#"
environment:
  HOST: localhost
  PORT: 8000
  URL: "http://${HOST}:${PORT}"
"#,
    );
    write(
        "dev.yml",
        r#"
imports:
  - default
  - dev
environment:
  HOST: dev.local
  DEBUG: "true"
  QUIET: "${!DEBUG}"
"#,
    );
    write(
        "broken.yaml",
        r#"
environment:
  URL: "http://${NOWHERE}"
"#,
    );
    write(
        "both.yaml",
        r#"
imports: [dev, default]
environment: {}
"#,
    );
    tmp
}

#[rstest]
fn test_load_resolves_variables(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    let env = set.load("default", &Mapping::new()).expect("Should load");

    assert!(env.resolved);
    assert_eq!(env.get("URL"), Some(&Value::from("http://localhost:8000")));
    assert_eq!(env.source_files.len(), 1);
}

#[rstest]
fn test_imports_merge_underneath_own_values(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    let env = set.load("dev", &Mapping::new()).expect("Should load");

    // Own value wins and is visible to imported references.
    assert_eq!(env.get("HOST"), Some(&Value::from("dev.local")));
    assert_eq!(env.get("URL"), Some(&Value::from("http://dev.local:8000")));
    assert_eq!(env.get("QUIET"), Some(&Value::Bool(false)));
    // Self import is ignored.
    assert_eq!(env.source_files.len(), 2);
}

#[rstest]
fn test_repeated_import_loaded_once(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    let env = set.load("both", &Mapping::new()).expect("Should load");
    assert_eq!(env.source_files.len(), 3);
    assert_eq!(env.get("HOST"), Some(&Value::from("dev.local")));
}

#[rstest]
fn test_unresolvable_falls_back_to_raw(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    let env = set.load("broken", &Mapping::new()).expect("Should fall back");

    assert!(!env.resolved);
    assert_eq!(env.get("URL"), Some(&Value::from("http://${NOWHERE}")));
}

#[rstest]
fn test_builtins_are_overridable(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    let mut builtins = Mapping::new();
    builtins.insert("HOST".into(), "builtin".into());
    builtins.insert("STACKCONF_NAMESPACE".into(), "ns".into());

    let env = set.load("default", &builtins).expect("Should load");
    assert_eq!(env.get("HOST"), Some(&Value::from("localhost")));
    assert_eq!(env.get("STACKCONF_NAMESPACE"), Some(&Value::from("ns")));
}

#[rstest]
fn test_missing_environment(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    match set.load("prod", &Mapping::new()) {
        Err(Error::MissingEnvironment { name, .. }) => assert_eq!(name, "prod"),
        other => panic!("Expected MissingEnvironment, got: {other:?}"),
    }
}

#[rstest]
fn test_list_and_create(envs: TempDir) {
    let set = EnvironmentSet::new(envs.path());
    assert_eq!(
        set.list().unwrap(),
        vec!["both", "broken", "default", "dev"]
    );

    let file = EnvironmentFile {
        imports: vec!["default".to_string()],
        environment: Mapping::new(),
    };
    let path = set.create("staging", &file).expect("Should create");
    assert!(path.is_file());
    assert!(set.find("staging").is_some());

    match set.create("dev", &file) {
        Err(Error::ExistingEnvironment(name)) => assert_eq!(name, "dev"),
        other => panic!("Expected ExistingEnvironment, got: {other:?}"),
    }
}

#[rstest]
fn test_render_export() {
    let variables: Mapping = serde_yaml::from_str(
        r#"
NAME: api
PORT: 8000
DEBUG: false
EMPTY: null
HOSTS: [a, b]
MOTD: "line one\nline two"
"#,
    )
    .unwrap();

    let export = render_export(&variables);
    let lines: Vec<&str> = export.lines().collect();
    assert_eq!(
        lines,
        vec![
            "NAME=api",
            "PORT=8000",
            "DEBUG=false",
            "EMPTY=",
            r#"HOSTS=["a","b"]"#,
            r"MOTD=line one\nline two",
        ]
    );
}
