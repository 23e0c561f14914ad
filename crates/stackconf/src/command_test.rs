// Copyright (c) Contributors to the stackconf project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[rstest]
fn test_command_line() {
    let compose = ComposeCommand::new(&strings(&["docker", "compose"]))
        .unwrap()
        .with_project_name("myapp-dev");
    let line = compose.command_line(Path::new("/gen/docker-compose.yml"), &strings(&["up", "-d"]));
    assert_eq!(
        line,
        vec!["docker", "compose", "-f", "/gen/docker-compose.yml", "-p", "myapp-dev", "up", "-d"]
    );
}

#[rstest]
fn test_empty_command_rejected() {
    assert!(matches!(
        ComposeCommand::new(&[]),
        Err(Error::ValidationFailed(_))
    ));
}

#[cfg(unix)]
#[rstest]
#[case("exit 0", Ok(0))]
#[case("exit 3", Err(3))]
fn test_run_exit_codes(#[case] script: &str, #[case] expected: std::result::Result<i32, i32>) {
    // The composefile arguments land in the script's positional parameters.
    let runner = ComposeCommand::new(&strings(&["sh", "-c", script, "sh"])).unwrap();
    let result = runner.run(Path::new("docker-compose.yml"), &[]);
    match (result, expected) {
        (Ok(code), Ok(expected)) => assert_eq!(code, expected),
        (Err(Error::FailedCommandExecution { code, .. }), Err(expected)) => {
            assert_eq!(code, expected)
        }
        (other, _) => panic!("Unexpected result: {other:?}"),
    }
}

#[cfg(unix)]
#[rstest]
fn test_run_passes_env() {
    let runner = ComposeCommand::new(&strings(&["sh", "-c", "test \"$GREETING\" = hello", "sh"]))
        .unwrap()
        .with_env("GREETING", "hello");
    assert_eq!(runner.run(Path::new("x.yml"), &[]).unwrap(), 0);
}

#[cfg(unix)]
#[rstest]
fn test_check_status_interrupted() {
    use std::os::unix::process::ExitStatusExt;

    // Raw wait status of a process killed by SIGINT.
    let status = ExitStatus::from_raw(2);
    assert!(matches!(
        check_status("up", status),
        Err(Error::StoppedCommandExecution(_))
    ));

    // Exit code 130, as reported by an interrupted shell.
    let status = ExitStatus::from_raw(130 << 8);
    assert!(matches!(
        check_status("up", status),
        Err(Error::StoppedCommandExecution(_))
    ));
}
