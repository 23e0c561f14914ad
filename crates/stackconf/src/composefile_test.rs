// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

#[fixture]
fn document() -> Value {
    serde_yaml::from_str(
        r#"
services:
  web:
    image: nginx
  api:
    image: api
  worker:
    image: worker
volumes:
  static: {}
  cache: {}
"#,
    )
    .unwrap()
}

fn selection(services: &[&str], volumes: &[&str]) -> SelectionSet {
    SelectionSet {
        services: services.iter().map(|s| s.to_string()).collect(),
        volumes: volumes.iter().map(|s| s.to_string()).collect(),
        networks: Vec::new(),
    }
}

#[rstest]
fn test_filter_removes_unselected(document: Value) {
    let before = document.clone();
    let filtered = filter(&document, &selection(&["web", "api"], &["cache"]));

    assert_eq!(section_keys(&filtered, SERVICES), vec!["web", "api"]);
    assert_eq!(section_keys(&filtered, VOLUMES), vec!["cache"]);
    // Original is untouched.
    assert_eq!(document, before);
    assert_eq!(section_keys(&document, SERVICES).len(), 3);
}

#[rstest]
fn test_filter_skips_absent_sections(document: Value) {
    let mut sel = selection(&["web"], &[]);
    sel.networks.push("front".to_string());
    let filtered = filter(&document, &sel);

    assert!(filtered.get(NETWORKS).is_none());
    assert!(section(&filtered, VOLUMES).is_some_and(Mapping::is_empty));
}

#[rstest]
fn test_apply_selection_all_is_identity(document: Value) {
    assert_eq!(apply_selection(&document, &Selection::All), document);
}

#[rstest]
fn test_load_composefile_missing() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("docker-compose.yml");
    match load_composefile(&path) {
        Err(Error::MissingComposefile(p)) => assert_eq!(p, path),
        other => panic!("Expected MissingComposefile, got: {other:?}"),
    }
}

#[rstest]
fn test_load_composefiles_in_order() {
    let tmp = TempDir::new().unwrap();
    let first = tmp.path().join("a.yml");
    let second = tmp.path().join("b.yml");
    std::fs::write(&first, "services:\n  a:\n    image: a\n").unwrap();
    std::fs::write(&second, "").unwrap();

    let documents = load_composefiles(&[first, second]).expect("Should load");
    assert_eq!(documents.len(), 2);
    assert_eq!(section_keys(&documents[0], SERVICES), vec!["a"]);
    assert!(documents[1].as_mapping().is_some_and(Mapping::is_empty));
}

#[rstest]
fn test_load_composefile_rejects_non_mapping() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("list.yml");
    std::fs::write(&path, "- a\n- b\n").unwrap();
    assert!(matches!(
        load_composefile(&path),
        Err(Error::ValidationFailed(_))
    ));
}

#[rstest]
fn test_filter_prunes_depends_on() {
    let document: Value = serde_yaml::from_str(
        r#"
services:
  web:
    depends_on: [api, worker]
  api:
    depends_on:
      worker:
        condition: service_healthy
"#,
    )
    .unwrap();
    let filtered = filter(&document, &selection(&["web", "api"], &[]));
    assert_eq!(filtered["services"]["web"]["depends_on"], Value::from(vec!["api"]));
    assert!(filtered["services"]["api"].get("depends_on").is_none());
}
