//! Isolation backends for sandboxed command execution.
//!
//! Two interchangeable strategies sit behind one trait: an ephemeral
//! container per command (the default, with real resource caps and no
//! network) and a restricted local subprocess (a weaker fallback for hosts
//! without a container engine). Both wire stdin from a staged file, capture
//! stdout/stderr, and force-terminate on timeout through a single race-free
//! wait.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::core_types::RawExecutionResult;
use crate::errors::SandboxError;

pub mod docker;
pub mod subprocess;

pub use docker::DockerBackend;
pub use subprocess::SubprocessBackend;

/// One command to run inside the isolation substrate. Paths in `args` are
/// workspace-relative; each backend resolves them against its own working
/// directory.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Container image for the container strategy; ignored by the subprocess
    /// strategy, whose isolation target is `program` itself.
    pub image: String,
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// The command as a `sh -c` line with stdin redirected from `stdin_file`.
    /// Used by the container strategy, where hooking a host file to the
    /// process's stdin happens via shell redirection inside the container.
    pub fn shell_line(&self, stdin_file: Option<&str>) -> String {
        let mut line = String::from("exec ");
        line.push_str(&shell_quote(&self.program));
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        if let Some(stdin) = stdin_file {
            line.push_str(" < ");
            line.push_str(&shell_quote(stdin));
        }
        line
    }
}

/// Single-quote a token for `sh -c`. The driver only ever passes fixed
/// toolchain names and workspace-relative file names here, but quoting keeps
/// the invariant local instead of relying on that.
fn shell_quote(token: &str) -> String {
    if !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'/' | b'_' | b'-' | b'='))
    {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', "'\\''"))
}

/// The substrate the execution driver runs commands in.
#[async_trait]
pub trait IsolationBackend: Send + Sync {
    /// Run one command rooted at `workspace_dir`, with stdin hooked from
    /// `stdin_file` when present, under a hard wall-clock `timeout`.
    ///
    /// Normal completion and forced termination are mutually exclusive
    /// outcomes of the same wait; a timed-out result is only reported after
    /// termination of the execution context has been confirmed (or a bounded
    /// grace period elapsed). Launch failures (missing image or toolchain
    /// binary) surface as [`SandboxError::Launch`].
    async fn run(
        &self,
        command: &CommandSpec,
        workspace_dir: &Path,
        stdin_file: Option<&Path>,
        timeout: Duration,
    ) -> Result<RawExecutionResult, SandboxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_line_quotes_and_redirects() {
        let spec = CommandSpec {
            image: String::new(),
            program: "python3".to_string(),
            args: vec!["main.py".to_string(), "odd arg".to_string()],
            env: vec![],
        };
        assert_eq!(
            spec.shell_line(Some("input.txt")),
            "exec python3 main.py 'odd arg' < input.txt"
        );
        assert_eq!(spec.shell_line(None), "exec python3 main.py 'odd arg'");
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("a'b"), "'a'\\''b'");
        assert_eq!(shell_quote("./main"), "./main");
    }
}
