//! Integration tests for the subprocess isolation strategy, driven through
//! the backend trait with plain shell commands.

use std::time::{Duration, Instant};

use crucible_core::{CommandSpec, IsolationBackend, SandboxError, SubprocessBackend};

fn shell(script: &str) -> CommandSpec {
    CommandSpec {
        image: String::new(),
        program: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        env: vec![],
    }
}

#[tokio::test]
async fn captures_stdout_on_success() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let result = backend
        .run(&shell("echo hi"), dir.path(), None, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "hi\n");
    assert!(!result.timed_out);
}

#[tokio::test]
async fn captures_stderr_and_exit_code() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let result = backend
        .run(
            &shell("echo oops >&2; exit 2"),
            dir.path(),
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(result.exit_code, 2);
    assert_eq!(result.stderr, "oops\n");
    assert!(result.stdout.is_empty());
}

#[tokio::test]
async fn wires_stdin_from_staged_file() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let stdin_path = dir.path().join("input.txt");
    std::fs::write(&stdin_path, "ping").unwrap();

    let spec = CommandSpec {
        image: String::new(),
        program: "cat".to_string(),
        args: vec![],
        env: vec![],
    };
    let result = backend
        .run(&spec, dir.path(), Some(&stdin_path), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "ping");
}

#[tokio::test]
async fn absent_stdin_reads_as_empty() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec {
        image: String::new(),
        program: "cat".to_string(),
        args: vec![],
        env: vec![],
    };
    let result = backend
        .run(&spec, dir.path(), None, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.is_empty());
}

#[tokio::test]
async fn commands_run_rooted_at_the_workspace() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let result = backend
        .run(
            &shell("cat marker.txt"),
            dir.path(),
            None,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(result.stdout, "here");
}

#[tokio::test]
async fn environment_reaches_the_child() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let mut spec = shell("printf %s \"$CRUCIBLE_PROBE\"");
    spec.env = vec![("CRUCIBLE_PROBE".to_string(), "42".to_string())];
    let result = backend
        .run(&spec, dir.path(), None, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(result.stdout, "42");
}

#[tokio::test]
async fn timeout_kills_within_bounded_grace() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let start = Instant::now();
    let result = backend
        .run(
            &shell("sleep 30"),
            dir.path(),
            None,
            Duration::from_millis(200),
        )
        .await
        .unwrap();
    assert!(result.timed_out);
    // Termination must be confirmed well before the sleep would finish.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn missing_binary_is_a_launch_fault() {
    let backend = SubprocessBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let spec = CommandSpec {
        image: String::new(),
        program: "crucible-no-such-toolchain".to_string(),
        args: vec![],
        env: vec![],
    };
    let err = backend
        .run(&spec, dir.path(), None, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SandboxError::Launch(_)));
    assert!(!err.is_client_error());
}
