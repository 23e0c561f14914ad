// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

#[fixture]
fn variables() -> Mapping {
    serde_yaml::from_str(
        r#"
IMAGE: nginx:1.25
PORT: 8080
DEBUG: true
"#,
    )
    .unwrap()
}

#[rstest]
fn test_render_str_substitutes(variables: Mapping) {
    let rendered = render_str("t", "{{ IMAGE }} on {{ PORT }}", &variables).unwrap();
    assert_eq!(rendered, "nginx:1.25 on 8080");
}

#[rstest]
fn test_render_str_undefined_is_empty(variables: Mapping) {
    let rendered = render_str("t", "[{{ MISSING }}]{% if ALSO_MISSING %}x{% endif %}", &variables)
        .expect("undefined names render empty");
    assert_eq!(rendered, "[]");
}

#[rstest]
#[case("[{{ MISSING_PORT | default(value=8080) }}]", "[8080]")]
#[case("[{{ PORT | default(value=1) }}]", "[8080]")]
#[case("{% if MISSING is defined %}yes{% else %}no{% endif %}", "no")]
#[case("{% if MISSING is not defined %}unset{% endif %}", "unset")]
#[case("{% if DEBUG is defined %}yes{% else %}no{% endif %}", "yes")]
fn test_render_str_undefined_guards(
    #[case] source: &str,
    #[case] expected: &str,
    variables: Mapping,
) {
    let rendered = render_str("t", source, &variables).unwrap();
    assert_eq!(rendered, expected);
}

#[rstest]
fn test_render_document_names_yaml_breaking_variables(mut variables: Mapping) {
    variables.insert("MSG".into(), "it's: here".into());
    let document: Value = serde_yaml::from_str(
        r#"
services:
  web:
    image: "{{ IMAGE }}"
    command: "echo {{ MSG }}"
"#,
    )
    .unwrap();

    match render_document(&document, &variables) {
        Err(Error::InvalidRenderedComposefile { help, .. }) => {
            let help = help.expect("Should name the variable");
            assert!(help.contains("MSG"));
            assert!(!help.contains("IMAGE"));
        }
        other => panic!("Expected InvalidRenderedComposefile, got: {other:?}"),
    }
}

#[rstest]
fn test_render_str_conditionals(variables: Mapping) {
    let rendered = render_str("t", "{% if DEBUG %}debug{% else %}release{% endif %}", &variables)
        .unwrap();
    assert_eq!(rendered, "debug");
}

#[rstest]
fn test_render_document(variables: Mapping) {
    let document: Value = serde_yaml::from_str(
        r#"
services:
  web:
    image: "{{ IMAGE }}"
    ports:
      - "{{ PORT }}:80"
    environment:
      - COMPOSE_VAR=${LEFT_ALONE}
"#,
    )
    .unwrap();

    let rendered = render_document(&document, &variables).unwrap();
    let web = &rendered["services"]["web"];
    assert_eq!(web["image"], "nginx:1.25");
    assert_eq!(web["ports"][0], "8080:80");
    assert_eq!(web["environment"][0], "COMPOSE_VAR=${LEFT_ALONE}");
}

#[rstest]
fn test_render_file_writes_under_destination(variables: Mapping) {
    let project = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let source_dir = project.path().join("conf/nginx");
    std::fs::create_dir_all(&source_dir).unwrap();
    std::fs::write(source_dir.join("site.conf.j2"), "listen {{ PORT }};\n").unwrap();

    let renderer = TemplateRenderer::new(project.path(), out.path().join("templates"));
    let output = renderer
        .render_file(Path::new("./conf/nginx/site.conf.j2"), &variables)
        .expect("Should render");

    assert_eq!(output, out.path().join("templates/conf/nginx/site.conf"));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "listen 8080;\n");
}

#[rstest]
fn test_render_file_absolute_under_base(variables: Mapping) {
    let project = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let source = project.path().join("motd.tera");
    std::fs::write(&source, "{{ IMAGE }}").unwrap();

    let renderer = TemplateRenderer::new(project.path(), out.path());
    let output = renderer.render_file(&source, &variables).unwrap();
    assert_eq!(output, out.path().join("motd"));
}

#[rstest]
#[case("conf/site.conf")]
#[case("conf/.j2")]
fn test_render_file_requires_suffix(#[case] source: &str, variables: Mapping) {
    let project = TempDir::new().unwrap();
    let renderer = TemplateRenderer::new(project.path(), project.path().join("out"));
    assert!(matches!(
        renderer.render_file(Path::new(source), &variables),
        Err(Error::MalformedTemplate(_))
    ));
}

#[rstest]
fn test_render_file_missing(variables: Mapping) {
    let project = TempDir::new().unwrap();
    let renderer = TemplateRenderer::new(project.path(), project.path().join("out"));
    assert!(matches!(
        renderer.render_file(Path::new("nope.conf.j2"), &variables),
        Err(Error::MissingTemplate(_))
    ));
}
