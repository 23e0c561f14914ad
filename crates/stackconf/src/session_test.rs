// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_session_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data/session.alice.yaml");

    let mut session = Session::load(&path).unwrap();
    assert_eq!(session.current, None);
    session.current = Some("alice-dev".to_string());
    session.save().unwrap();

    let loaded = Session::load(&path).unwrap();
    assert_eq!(loaded.current.as_deref(), Some("alice-dev"));
    assert_eq!(loaded.path(), path);
}

#[rstest]
fn test_session_empty_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("session.yaml");
    std::fs::write(&path, "").unwrap();
    assert_eq!(Session::load(&path).unwrap().current, None);
}

#[rstest]
#[case(Some("explicit"), Some("current"), Some("explicit"))]
#[case(None, Some("current"), Some("current"))]
#[case(None, None, None)]
fn test_session_select(
    #[case] explicit: Option<&str>,
    #[case] current: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let session = Session {
        current: current.map(str::to_string),
        ..Default::default()
    };
    match (session.select(explicit), expected) {
        (Ok(name), Some(expected)) => assert_eq!(name, expected),
        (Err(Error::ValidationFailed(_)), None) => {}
        (other, _) => panic!("Unexpected selection: {other:?}"),
    }
}

#[rstest]
fn test_session_forget() {
    let mut session = Session {
        current: Some("dev".to_string()),
        ..Default::default()
    };
    session.forget("prod");
    assert_eq!(session.current.as_deref(), Some("dev"));
    session.forget("dev");
    assert_eq!(session.current, None);
}
