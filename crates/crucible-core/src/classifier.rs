//! Result classification.
//!
//! A pure mapping from the raw result of the final pipeline stage to the
//! stable response shape. No state is retained between classifications.

use std::sync::OnceLock;

use regex::Regex;

use crate::core_types::{ExecutionOutcome, OutcomeStatus};
use crate::driver::{Stage, StagedResult};

/// Line-level warning heuristic: a case-insensitive `warning` word anywhere
/// in a stderr line. Applied only on the zero-exit path.
fn warning_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bwarning\b").unwrap())
}

/// Classify one finished execution. Rules apply in order:
/// timeout > compile failure > non-zero exit > warnings > success.
pub fn classify(result: &StagedResult) -> ExecutionOutcome {
    let raw = &result.raw;

    if raw.timed_out {
        return ExecutionOutcome {
            status: OutcomeStatus::Timeout,
            stdout: raw.stdout.clone(),
            stderr: raw.stderr.clone(),
            warnings: Vec::new(),
        };
    }

    if result.stage == Stage::Compile || raw.exit_code != 0 {
        // Any non-zero exit is an execution error, even with empty stderr;
        // a synthetic detail line keeps the response actionable.
        let stderr = if raw.stderr.is_empty() {
            format!("exit status {}", raw.exit_code)
        } else {
            raw.stderr.clone()
        };
        return ExecutionOutcome {
            status: OutcomeStatus::ExecutionError,
            stdout: raw.stdout.clone(),
            stderr,
            warnings: Vec::new(),
        };
    }

    let warnings: Vec<String> = raw
        .stderr
        .lines()
        .filter(|line| warning_pattern().is_match(line))
        .map(str::to_string)
        .collect();

    ExecutionOutcome {
        status: if warnings.is_empty() {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::SuccessWithWarnings
        },
        stdout: raw.stdout.clone(),
        stderr: raw.stderr.clone(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::RawExecutionResult;

    fn staged(stage: Stage, exit_code: i64, stderr: &str, timed_out: bool) -> StagedResult {
        StagedResult {
            stage,
            raw: RawExecutionResult {
                exit_code,
                stdout: "out".to_string(),
                stderr: stderr.to_string(),
                timed_out,
            },
        }
    }

    #[test]
    fn timeout_outranks_everything() {
        let result = staged(Stage::Run, 0, "warning: partial", true);
        assert_eq!(classify(&result).status, OutcomeStatus::Timeout);

        let compile_timeout = staged(Stage::Compile, -1, "", true);
        assert_eq!(classify(&compile_timeout).status, OutcomeStatus::Timeout);
    }

    #[test]
    fn compile_failure_is_an_execution_error_with_compiler_stderr() {
        let result = staged(Stage::Compile, 1, "main.c:1: error: expected ';'", false);
        let outcome = classify(&result);
        assert_eq!(outcome.status, OutcomeStatus::ExecutionError);
        assert!(outcome.stderr.contains("expected ';'"));
    }

    #[test]
    fn nonzero_exit_is_an_execution_error_even_without_stderr() {
        let result = staged(Stage::Run, 3, "", false);
        let outcome = classify(&result);
        assert_eq!(outcome.status, OutcomeStatus::ExecutionError);
        assert_eq!(outcome.stderr, "exit status 3");
    }

    #[test]
    fn warning_lines_downgrade_success() {
        let stderr = "note: something\nmain.c:4: warning: unused variable\nWARNING: deprecated\n";
        let result = staged(Stage::Run, 0, stderr, false);
        let outcome = classify(&result);
        assert_eq!(outcome.status, OutcomeStatus::SuccessWithWarnings);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[0].contains("unused variable"));
    }

    #[test]
    fn clean_zero_exit_is_success() {
        let result = staged(Stage::Run, 0, "", false);
        let outcome = classify(&result);
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(outcome.stdout, "out");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn forewarned_is_not_a_warning() {
        // Word-boundary match: substrings of larger words do not count.
        let result = staged(Stage::Run, 0, "forewarning is fine\n", false);
        assert_eq!(classify(&result).status, OutcomeStatus::Success);
    }

    #[test]
    fn classification_is_idempotent() {
        let result = staged(Stage::Run, 1, "boom", false);
        let first = classify(&result);
        let second = classify(&result);
        assert_eq!(first.status, second.status);
        assert_eq!(first.stderr, second.stderr);
        assert_eq!(first.warnings, second.warnings);
    }
}
