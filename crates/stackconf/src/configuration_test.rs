// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

#[fixture]
fn tmpdir() -> TempDir {
    TempDir::new().unwrap()
}

fn store(tmp: &TempDir) -> ConfigurationStore {
    ConfigurationStore::new(tmp.path().join("configurations.yaml"))
}

#[rstest]
fn test_empty_store(tmpdir: TempDir) {
    let store = store(&tmpdir);
    assert!(store.list().unwrap().is_empty());
    assert!(matches!(
        store.get("dev"),
        Err(Error::MissingConfiguration(name)) if name == "dev"
    ));
}

#[rstest]
fn test_create_and_get(tmpdir: TempDir) {
    let store = store(&tmpdir);
    let mut config = Configuration::new("alice-dev", "alice", "dev");
    config.schemas = vec!["standard".to_string()];
    config.selection.services.push("web".to_string());
    config.namespace = Some("alice".to_string());
    store.create(&config).expect("Should create");

    let loaded = store.get("alice-dev").unwrap();
    assert_eq!(loaded, config);
    assert!(store.contains("alice-dev").unwrap());
}

#[rstest]
fn test_create_existing(tmpdir: TempDir) {
    let store = store(&tmpdir);
    let config = Configuration::new("dev", "alice", "dev");
    store.create(&config).unwrap();
    assert!(matches!(
        store.create(&config),
        Err(Error::ExistingConfiguration(_))
    ));
}

#[rstest]
fn test_update_checks_owner(tmpdir: TempDir) {
    let store = store(&tmpdir);
    let config = Configuration::new("dev", "alice", "dev");
    store.create(&config).unwrap();

    let mut changed = config.clone();
    changed.environment = "prod".to_string();
    match store.update(&changed, "bob") {
        Err(Error::NotOwner { name, owner }) => {
            assert_eq!(name, "dev");
            assert_eq!(owner, "alice");
        }
        other => panic!("Expected NotOwner, got: {other:?}"),
    }

    let updated = store.update(&changed, "alice").unwrap();
    assert_eq!(updated.environment, "prod");
    assert_eq!(updated.created, config.created);
    assert!(updated.updated >= config.updated);
    assert_eq!(store.get("dev").unwrap().environment, "prod");
}

#[rstest]
fn test_remove(tmpdir: TempDir) {
    let store = store(&tmpdir);
    store.create(&Configuration::new("a", "alice", "dev")).unwrap();
    store.create(&Configuration::new("b", "alice", "dev")).unwrap();
    store.create(&Configuration::new("c", "alice", "dev")).unwrap();

    assert!(matches!(store.remove("b", "bob"), Err(Error::NotOwner { .. })));
    let removed = store.remove("b", "alice").unwrap();
    assert_eq!(removed.name, "b");

    let names: Vec<String> = store.list().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[rstest]
fn test_resolve_selection_all() {
    let schemas = SchemaSet::from_yaml("base:\n  services: [web]\n").unwrap();
    let mut config = Configuration::new("dev", "alice", "dev");
    config.schemas = vec!["all".to_string()];
    assert_eq!(config.resolve_selection(&schemas).unwrap(), Selection::All);

    config.schemas = vec!["base".to_string()];
    config.selection.services.push("db".to_string());
    match config.resolve_selection(&schemas).unwrap() {
        Selection::Only(set) => assert_eq!(set.services, vec!["db", "web"]),
        Selection::All => panic!("Expected a filtered selection"),
    }
}
