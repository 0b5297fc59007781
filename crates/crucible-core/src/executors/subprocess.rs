//! Local subprocess strategy.
//!
//! Runs the command as a child process rooted at the workspace directory.
//! Isolation is limited to what the host already enforces; this strategy
//! exists for environments without a container engine and is explicitly the
//! weaker fallback.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::core_types::RawExecutionResult;
use crate::errors::SandboxError;
use crate::executors::{CommandSpec, IsolationBackend};

/// Bound on draining output pipes after a kill; orphaned grandchildren can
/// keep the write ends open past the parent's death.
const TERMINATION_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct SubprocessBackend;

impl SubprocessBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IsolationBackend for SubprocessBackend {
    async fn run(
        &self,
        command: &CommandSpec,
        workspace_dir: &Path,
        stdin_file: Option<&Path>,
        timeout: Duration,
    ) -> Result<RawExecutionResult, SandboxError> {
        let stdin = match stdin_file {
            Some(path) => Stdio::from(std::fs::File::open(path)?),
            None => Stdio::null(),
        };

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(workspace_dir)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SandboxError::Launch(format!("toolchain binary '{}' not found", command.program))
            } else {
                SandboxError::Io(e)
            }
        })?;

        // Drain the pipes concurrently with the wait so a chatty child can
        // never fill a pipe buffer and deadlock against us.
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        // One wait, two mutually exclusive winners: normal exit or timeout.
        let (status, timed_out) = tokio::select! {
            status = child.wait() => (Some(status?), false),
            _ = tokio::time::sleep(timeout) => {
                log::warn!("subprocess '{}' exceeded {:?}, killing", command.program, timeout);
                child.start_kill()?;
                // Block until the kill is confirmed; the child is already
                // doomed, so this wait is bounded.
                let _ = child.wait().await;
                (None, true)
            }
        };

        let stdout_abort = stdout_task.abort_handle();
        let stderr_abort = stderr_task.abort_handle();
        let drain = async { (stdout_task.await, stderr_task.await) };
        let (stdout_bytes, stderr_bytes) = if timed_out {
            // Output is truncated at the grace bound rather than waiting on
            // pipes an orphan may never close.
            match tokio::time::timeout(TERMINATION_GRACE, drain).await {
                Ok((out, err)) => (out.unwrap_or_default(), err.unwrap_or_default()),
                Err(_) => {
                    stdout_abort.abort();
                    stderr_abort.abort();
                    (Vec::new(), Vec::new())
                }
            }
        } else {
            let (out, err) = drain.await;
            (out.unwrap_or_default(), err.unwrap_or_default())
        };

        let exit_code = match &status {
            Some(s) => s.code().map(i64::from).unwrap_or(-1),
            None => -1,
        };

        Ok(RawExecutionResult {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            timed_out,
        })
    }
}
