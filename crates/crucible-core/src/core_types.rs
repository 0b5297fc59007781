//! Request and outcome types exchanged across the sandbox boundary.

use serde::{Deserialize, Serialize};

use crate::errors::SandboxError;

/// One execution request, created at the system boundary and consumed once.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub stdin: Option<String>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Field-level validation, run before any filesystem or container work.
    pub fn validate(&self) -> Result<(), SandboxError> {
        if self.code.trim().is_empty() {
            return Err(SandboxError::InvalidRequest(
                "code must not be empty".to_string(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(SandboxError::InvalidRequest(
                "language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Classification of one finished execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    SuccessWithWarnings,
    ExecutionError,
    Timeout,
}

/// The classified result returned to the caller. Produced once per request,
/// immutable, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub status: OutcomeStatus,
    pub stdout: String,
    pub stderr: String,
    pub warnings: Vec<String>,
}

/// What an isolation backend reports for a single command.
#[derive(Debug, Clone)]
pub struct RawExecutionResult {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    /// True when the forced-termination path won the wait. Output fields hold
    /// whatever was collected before truncation.
    pub timed_out: bool,
}

impl RawExecutionResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}
