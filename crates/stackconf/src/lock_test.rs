// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_lock_records_holder() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(".stackconf/lock");

    let lock = ProjectLock::acquire(&path, LockMode::Immediate).expect("Should lock");
    let holder = ProjectLock::read_holder(&path).expect("Lock file should hold a record");
    assert_eq!(&holder, lock.holder());
    assert_eq!(holder.pid, std::process::id());

    drop(lock);
    assert!(!path.exists());
}

#[rstest]
#[case(LockMode::Immediate)]
#[case(LockMode::Bounded(Duration::ZERO))]
fn test_lock_held(#[case] mode: LockMode) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("lock");
    let _held = ProjectLock::acquire(&path, LockMode::Immediate).unwrap();

    match ProjectLock::acquire(&path, mode) {
        Err(Error::ProjectLocked { holder, path: p }) => {
            assert_eq!(p, path);
            assert!(holder.contains(&whoami::username()));
        }
        other => panic!("Expected ProjectLocked, got: {other:?}"),
    }
}

#[rstest]
fn test_lock_bounded_wait_succeeds_after_release() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("lock");
    let held = ProjectLock::acquire(&path, LockMode::Immediate).unwrap();

    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        drop(held);
    });
    let lock = ProjectLock::acquire(&path, LockMode::Bounded(Duration::from_secs(5)))
        .expect("Should lock once released");
    releaser.join().unwrap();
    assert!(path.exists());
    drop(lock);
}

#[rstest]
fn test_try_acquire_is_exclusive() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("lock");
    let first = ProjectLock::try_acquire(&path).unwrap();
    assert!(first.is_some());
    assert!(ProjectLock::try_acquire(&path).unwrap().is_none());
    drop(first);
    assert!(ProjectLock::try_acquire(&path).unwrap().is_some());
}
