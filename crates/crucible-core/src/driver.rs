//! Execution driver: turns a language profile into a staged command plan and
//! dispatches it into the isolation backend.
//!
//! The driver is language-agnostic. Everything language-specific lives in the
//! profile's command templates; the driver substitutes the staged file names
//! and sequences the stages, short-circuiting the run stage when compilation
//! fails or times out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core_types::RawExecutionResult;
use crate::errors::SandboxError;
use crate::executors::{CommandSpec, IsolationBackend};
use crate::languages::LanguageProfile;
use crate::workspace::{Workspace, ARTIFACT_NAME};

/// Which pipeline stage produced the final raw result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Run,
}

/// The raw result of the stage that ended the pipeline, tagged with the
/// stage so the classifier can attribute stderr.
#[derive(Debug, Clone)]
pub struct StagedResult {
    pub stage: Stage,
    pub raw: RawExecutionResult,
}

pub struct ExecutionDriver {
    backend: Arc<dyn IsolationBackend>,
    timeout: Duration,
}

impl ExecutionDriver {
    pub fn new(backend: Arc<dyn IsolationBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Substitute `{src}` / `{bin}` into one command template.
    fn build_command(
        template: &[&str],
        profile: &LanguageProfile,
        image: &str,
    ) -> CommandSpec {
        let source_name = profile.source_name();
        let substitute = |token: &str| {
            token
                .replace("{src}", &source_name)
                .replace("{bin}", ARTIFACT_NAME)
        };
        let mut tokens = template.iter().map(|t| substitute(t));
        // Templates are non-empty by construction of the registry.
        let program = tokens.next().unwrap_or_default();
        CommandSpec {
            image: image.to_string(),
            program,
            args: tokens.collect(),
            env: profile
                .env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Run the compile stage (when the family has one), then the run stage.
    /// The same fixed timeout applies to each stage; stdin is wired only to
    /// the run stage.
    pub async fn run(
        &self,
        workspace: &Workspace,
        profile: &LanguageProfile,
        image: &str,
        stdin_file: Option<&Path>,
    ) -> Result<StagedResult, SandboxError> {
        if let Some(template) = profile.family.compile_template() {
            let compile = Self::build_command(template, profile, image);
            log::debug!("compiling {} with {}", profile.id, compile.program);
            let raw = self
                .backend
                .run(&compile, workspace.path(), None, self.timeout)
                .await?;
            if !raw.success() {
                // Compile failure (or compile timeout) short-circuits; the
                // run stage never starts.
                return Ok(StagedResult {
                    stage: Stage::Compile,
                    raw,
                });
            }
        }

        let run = Self::build_command(profile.family.run_template(), profile, image);
        log::debug!("running {} with {}", profile.id, run.program);
        let raw = self
            .backend
            .run(&run, workspace.path(), stdin_file, self.timeout)
            .await?;
        Ok(StagedResult {
            stage: Stage::Run,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::LanguageRegistry;

    #[test]
    fn interpreted_command_substitutes_source() {
        let registry = LanguageRegistry::builtin();
        let py = registry.resolve("py").unwrap();
        let cmd = ExecutionDriver::build_command(py.family.run_template(), py, "python:3.10-slim");
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["main.py"]);
        assert_eq!(cmd.image, "python:3.10-slim");
    }

    #[test]
    fn compiled_command_substitutes_artifact() {
        let registry = LanguageRegistry::builtin();
        let c = registry.resolve("c").unwrap();
        let compile = ExecutionDriver::build_command(
            c.family.compile_template().unwrap(),
            c,
            "gcc:latest",
        );
        assert_eq!(compile.program, "gcc");
        assert_eq!(compile.args, vec!["main.c", "-O2", "-o", "main"]);
        let run = ExecutionDriver::build_command(c.family.run_template(), c, "gcc:latest");
        assert_eq!(run.program, "./main");
        assert!(run.args.is_empty());
    }

    #[test]
    fn fixed_entry_point_command_names_the_entry_symbol() {
        let registry = LanguageRegistry::builtin();
        let java = registry.resolve("java").unwrap();
        let compile = ExecutionDriver::build_command(
            java.family.compile_template().unwrap(),
            java,
            "openjdk:17-slim",
        );
        assert_eq!(compile.program, "javac");
        assert_eq!(compile.args, vec!["Main.java"]);
        let run = ExecutionDriver::build_command(java.family.run_template(), java, "openjdk:17-slim");
        assert_eq!(run.program, "java");
        assert_eq!(run.args, vec!["-cp", ".", "Main"]);
    }

    #[test]
    fn go_profile_carries_toolchain_cache_env() {
        let registry = LanguageRegistry::builtin();
        let go = registry.resolve("go").unwrap();
        let compile = ExecutionDriver::build_command(
            go.family.compile_template().unwrap(),
            go,
            "golang:1.22-alpine",
        );
        assert!(compile.env.iter().any(|(k, _)| k == "GOCACHE"));
    }
}
