//! Error types for sandbox failure handling
//!
//! The taxonomy keeps three kinds of failure distinct: client errors (bad
//! request, unsupported language), server faults (workspace or isolation
//! infrastructure broke), and the user program's own failures. Only the
//! first two are `SandboxError`s; a snippet that fails to compile or exits
//! non-zero is a classified
//! [`ExecutionOutcome`](crate::core_types::ExecutionOutcome), not an error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("could not create workspace: {0}")]
    WorkspaceCreation(#[source] std::io::Error),
    #[error("could not launch execution context: {0}")]
    Launch(String),
    #[error("Bollard (Docker client) error: {0}")]
    Docker(#[from] bollard::errors::Error),
    #[error("I/O error during execution: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    /// Whether the failure is the caller's fault (a 4xx-equivalent signal)
    /// rather than an infrastructure fault. Client errors are detected before
    /// any workspace or container is allocated and are never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SandboxError::UnsupportedLanguage(_) | SandboxError::InvalidRequest(_)
        )
    }
}
