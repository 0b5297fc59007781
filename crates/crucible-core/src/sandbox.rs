//! The sandbox facade: one entry point tying registry, workspace, driver,
//! backend, and classifier together.
//!
//! Lifecycle ordering is the contract here: validation and language
//! resolution happen before any filesystem work, workspace creation precedes
//! execution, classification precedes teardown, and teardown runs on every
//! exit path once the workspace exists.

use std::sync::Arc;

use crate::classifier::classify;
use crate::config::{BackendKind, CrucibleConfig};
use crate::core_types::{ExecutionOutcome, ExecutionRequest};
use crate::driver::ExecutionDriver;
use crate::errors::SandboxError;
use crate::executors::{DockerBackend, IsolationBackend, SubprocessBackend};
use crate::languages::LanguageRegistry;

pub struct Sandbox {
    registry: LanguageRegistry,
    driver: ExecutionDriver,
    config: CrucibleConfig,
}

impl Sandbox {
    /// Build a sandbox from configuration, connecting the configured
    /// isolation backend.
    pub fn from_config(config: CrucibleConfig) -> Result<Self, SandboxError> {
        config.validate()?;
        let backend: Arc<dyn IsolationBackend> = match config.backend {
            BackendKind::Docker => Arc::new(DockerBackend::connect(config.limits)?),
            BackendKind::Subprocess => {
                log::warn!(
                    "using the subprocess backend; isolation is limited to host process boundaries"
                );
                Arc::new(SubprocessBackend::new())
            }
        };
        Ok(Self::with_backend(config, LanguageRegistry::builtin(), backend))
    }

    /// Build a sandbox over an explicit registry and backend. The seam for
    /// embedders and tests.
    pub fn with_backend(
        config: CrucibleConfig,
        registry: LanguageRegistry,
        backend: Arc<dyn IsolationBackend>,
    ) -> Self {
        let driver = ExecutionDriver::new(backend, config.timeout());
        Self {
            registry,
            driver,
            config,
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    /// Execute one request end to end.
    ///
    /// Client errors (empty fields, unsupported language) surface before any
    /// workspace is created. Execution errors and timeouts are classified
    /// outcomes, not `Err`s; an `Err` from this function is a server fault.
    pub async fn execute(
        &self,
        request: ExecutionRequest,
    ) -> Result<ExecutionOutcome, SandboxError> {
        request.validate()?;
        let profile = self.registry.resolve(&request.language)?;
        let image = self.config.image_for(profile);

        let workspace = crate::workspace::Workspace::create(self.config.scratch_root.as_deref())?;

        let staged = async {
            workspace.write_source(profile, &request.code).await?;
            let stdin_path = match request.stdin.as_deref() {
                Some(stdin) if !stdin.is_empty() => Some(workspace.write_stdin(stdin).await?),
                _ => None,
            };
            self.driver
                .run(&workspace, profile, &image, stdin_path.as_deref())
                .await
        }
        .await;

        // Classify before teardown; teardown runs regardless of the branch
        // taken above and can never replace the result.
        let response = staged.map(|s| classify(&s));
        workspace.teardown();

        if let Ok(outcome) = &response {
            log::info!(
                "executed {} snippet: {:?}",
                profile.id,
                outcome.status
            );
        }
        response
    }
}
