// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_load_manifest() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("extensions.yaml");
    std::fs::write(
        &path,
        r#"
- name: psql
  about: Open a psql shell
  command: [./scripts/psql.sh]
- name: logs
  command: [docker, logs]
"#,
    )
    .unwrap();

    let extensions = ManifestExtensions::load(&path).unwrap();
    assert_eq!(
        extensions.describe(),
        vec![
            SubcommandInfo {
                name: "psql".to_string(),
                about: "Open a psql shell".to_string()
            },
            SubcommandInfo {
                name: "logs".to_string(),
                about: String::new()
            },
        ]
    );
}

#[rstest]
fn test_missing_manifest_is_empty() {
    let tmp = TempDir::new().unwrap();
    let extensions = ManifestExtensions::load(tmp.path().join("extensions.yaml")).unwrap();
    assert!(extensions.describe().is_empty());
}

#[rstest]
fn test_duplicate_extension_rejected() {
    let entry = ExtensionEntry {
        name: "psql".to_string(),
        about: String::new(),
        command: vec!["psql".to_string()],
    };
    assert!(matches!(
        ManifestExtensions::new(vec![entry.clone(), entry]),
        Err(Error::ValidationFailed(_))
    ));
}

#[rstest]
fn test_unknown_extension() {
    let extensions = ManifestExtensions::default();
    match extensions.handle("nope", &[], &ExtensionContext::default()) {
        Err(Error::UnknownExtension(name)) => assert_eq!(name, "nope"),
        other => panic!("Expected UnknownExtension, got: {other:?}"),
    }
}

#[cfg(unix)]
#[rstest]
fn test_handle_passes_context() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out.txt");
    let extensions = ManifestExtensions::new(vec![ExtensionEntry {
        name: "where".to_string(),
        about: String::new(),
        command: vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo \"$STACKCONF_COMPOSEFILE $1\" > out.txt".to_string(),
            "sh".to_string(),
        ],
    }])
    .unwrap();
    let context = ExtensionContext {
        project_root: tmp.path().to_path_buf(),
        configuration: Some("dev".to_string()),
        composefile: Some(PathBuf::from("/gen/dev/docker-compose.yml")),
    };

    let code = extensions
        .handle("where", &["hello".to_string()], &context)
        .unwrap();
    assert_eq!(code, 0);
    assert_eq!(
        std::fs::read_to_string(out).unwrap(),
        "/gen/dev/docker-compose.yml hello\n"
    );
}
