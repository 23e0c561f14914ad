// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use rstest::rstest;
use tempfile::TempDir;

use super::*;

const SCHEMAS: &str = r#"
standard:
  services: [portainer]
  volumes: [portainer]
  networks: [net]
standard2:
  includes: [standard]
  services: [pouet]
  networks: [net]
database:
  services: [postgres]
  volumes: [pgdata]
"#;

fn set_of(names: &[String]) -> HashSet<&str> {
    names.iter().map(String::as_str).collect()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[rstest]
fn test_include_union() {
    let schemas = SchemaSet::from_yaml(SCHEMAS).expect("Should parse schemas");
    let resolved = schemas.resolve("standard2").expect("standard2 is defined");

    assert_eq!(resolved.services.len(), 2);
    assert_eq!(set_of(&resolved.services), HashSet::from(["portainer", "pouet"]));
    assert_eq!(set_of(&resolved.volumes), HashSet::from(["portainer"]));
    assert_eq!(resolved.networks, vec!["net"]);
}

#[rstest]
fn test_missing_schema() {
    let schemas = SchemaSet::from_yaml(SCHEMAS).unwrap();
    match schemas.resolve("nope") {
        Err(Error::MissingSchema(name)) => assert_eq!(name, "nope"),
        other => panic!("Expected MissingSchema, got: {other:?}"),
    }
}

#[rstest]
#[case::forward_reference("first:\n  includes: [second]\nsecond:\n  services: [a]\n")]
#[case::unknown("first:\n  includes: [ghost]\n")]
#[case::self_include("first:\n  includes: [first]\n")]
fn test_malformed_includes(#[case] yaml: &str) {
    match SchemaSet::from_yaml(yaml) {
        Err(Error::MalformedSchema { schema, .. }) => assert_eq!(schema, "first"),
        other => panic!("Expected MalformedSchema, got: {other:?}"),
    }
}

#[rstest]
fn test_resolve_selection_unions_existing() {
    let schemas = SchemaSet::from_yaml(SCHEMAS).unwrap();
    let existing = SelectionSet {
        services: strings(&["web", "postgres", "web"]),
        volumes: Vec::new(),
        networks: strings(&["net"]),
    };

    let selection =
        resolve_selection(&schemas, &strings(&["standard2", "database"]), &existing).unwrap();

    assert_eq!(
        set_of(&selection.services),
        HashSet::from(["web", "postgres", "portainer", "pouet"])
    );
    assert_eq!(selection.services.len(), 4);
    assert_eq!(set_of(&selection.volumes), HashSet::from(["portainer", "pgdata"]));
    assert_eq!(selection.networks, vec!["net"]);
}

#[rstest]
fn test_selection_all_sentinel() {
    let schemas = SchemaSet::default();
    let selection =
        Selection::from_schemas(&schemas, &strings(&["all"]), &SelectionSet::default()).unwrap();
    assert_eq!(selection, Selection::All);
}

#[rstest]
fn test_selection_unknown_schema_fails() {
    let schemas = SchemaSet::from_yaml(SCHEMAS).unwrap();
    let result = Selection::from_schemas(&schemas, &strings(&["ghost"]), &SelectionSet::default());
    assert!(matches!(result, Err(Error::MissingSchema(_))));
}

#[rstest]
fn test_load_missing_file_is_empty() {
    let tmp = TempDir::new().unwrap();
    let schemas = SchemaSet::load(tmp.path().join("schemas.yaml")).unwrap();
    assert_eq!(schemas.names().count(), 0);
}

#[rstest]
fn test_load_keeps_declaration_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("schemas.yaml");
    std::fs::write(&path, SCHEMAS).unwrap();

    let schemas = SchemaSet::load(&path).unwrap();
    let names: Vec<&str> = schemas.names().collect();
    assert_eq!(names, vec!["standard", "standard2", "database"]);
}
