//! Container strategy.
//!
//! One ephemeral container per command: network-disabled, resource-capped,
//! with the workspace bind-mounted read-write at a fixed in-container path,
//! force-removed after every outcome. Container names carry a random suffix
//! so concurrent executions never collide and a forceful kill targets
//! exactly one execution.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions as BollardCreateContainerOptionsQuery,
    KillContainerOptions as BollardKillContainerOptionsQuery,
    LogsOptions as BollardLogsOptionsQuery,
    RemoveContainerOptions as BollardRemoveContainerOptionsQuery,
    StartContainerOptions as BollardStartContainerOptionsQuery,
    WaitContainerOptions as BollardWaitContainerOptionsQuery,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use uuid::Uuid;

use crate::config::ResourceLimits;
use crate::core_types::RawExecutionResult;
use crate::errors::SandboxError;
use crate::executors::{CommandSpec, IsolationBackend};

/// Fixed path the workspace is bind-mounted at inside every container.
const CONTAINER_WORK_DIR: &str = "/sandbox";

/// How long to wait for the engine to confirm termination after a kill.
const TERMINATION_GRACE: Duration = Duration::from_secs(5);

pub struct DockerBackend {
    docker: Docker,
    limits: ResourceLimits,
}

impl DockerBackend {
    /// Connect to the local Docker engine. Failure here means the container
    /// strategy is unavailable on this host.
    pub fn connect(limits: ResourceLimits) -> Result<Self, SandboxError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker, limits })
    }

    fn host_config(&self, workspace_dir: &Path) -> bollard::models::HostConfig {
        bollard::models::HostConfig {
            binds: Some(vec![format!(
                "{}:{}",
                workspace_dir.display(),
                CONTAINER_WORK_DIR
            )]),
            network_mode: Some("none".to_string()),
            memory: Some(self.limits.memory_bytes),
            nano_cpus: Some(self.limits.nano_cpus),
            pids_limit: Some(self.limits.pids),
            ..Default::default()
        }
    }

    /// Start the container, stream its output to completion or timeout, and
    /// resolve the exit status. The follow-mode log stream doubles as the
    /// completion signal: it ends when the container exits, and racing it
    /// against the timeout makes normal completion and forced termination
    /// mutually exclusive outcomes of one wait.
    async fn run_container(
        &self,
        container_id: &str,
        timeout: Duration,
    ) -> Result<RawExecutionResult, SandboxError> {
        self.docker
            .start_container(container_id, None::<BollardStartContainerOptionsQuery>)
            .await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        let collect = async {
            let mut log_stream = self.docker.logs(
                container_id,
                Some(BollardLogsOptionsQuery {
                    follow: true,
                    stdout: true,
                    stderr: true,
                    ..Default::default()
                }),
            );
            while let Some(log_result) = log_stream.next().await {
                match log_result {
                    Ok(LogOutput::StdOut { message }) => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::debug!("log stream for {} ended early: {}", container_id, e);
                        break;
                    }
                }
            }
        };

        let timed_out = tokio::time::timeout(timeout, collect).await.is_err();
        if timed_out {
            log::warn!(
                "execution timed out after {:?}, killing container {}",
                timeout,
                container_id
            );
            let _ = self
                .docker
                .kill_container(container_id, None::<BollardKillContainerOptionsQuery>)
                .await;
        }

        // Resolve the exit status. After a kill this also blocks until the
        // engine confirms termination, bounded by the grace period. A
        // non-zero exit is a normal classified outcome, not a fault; the
        // engine reports it through the wait stream's error variant.
        let mut wait_stream = self
            .docker
            .wait_container(container_id, None::<BollardWaitContainerOptionsQuery>);
        let wait_outcome = tokio::time::timeout(TERMINATION_GRACE, wait_stream.next()).await;

        let exit_code = match wait_outcome {
            Ok(Some(Ok(response))) => response.status_code,
            Ok(Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. }))) => code,
            Ok(Some(Err(e))) if !timed_out => return Err(SandboxError::Docker(e)),
            Ok(Some(Err(_))) | Ok(None) | Err(_) => -1,
        };

        Ok(RawExecutionResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
        })
    }
}

#[async_trait]
impl IsolationBackend for DockerBackend {
    async fn run(
        &self,
        command: &CommandSpec,
        workspace_dir: &Path,
        stdin_file: Option<&Path>,
        timeout: Duration,
    ) -> Result<RawExecutionResult, SandboxError> {
        // Stdin is hooked up via shell redirection from the staged file,
        // which lives inside the bind-mounted workspace.
        let stdin_name = stdin_file
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        let cmd = match stdin_name.as_deref() {
            Some(name) => vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                command.shell_line(Some(name)),
            ],
            None => {
                let mut cmd = vec![command.program.clone()];
                cmd.extend(command.args.iter().cloned());
                cmd
            }
        };

        let env: Vec<String> = command
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let options = Some(BollardCreateContainerOptionsQuery {
            name: Some(format!("crucible-exec-{}", Uuid::new_v4())),
            ..Default::default()
        });

        let config = ContainerCreateBody {
            image: Some(command.image.clone()),
            cmd: Some(cmd),
            env: if env.is_empty() { None } else { Some(env) },
            working_dir: Some(CONTAINER_WORK_DIR.to_string()),
            host_config: Some(self.host_config(workspace_dir)),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(options, config)
            .await
            .map_err(|e| match e {
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 404,
                    message,
                } => SandboxError::Launch(format!(
                    "image '{}' not available: {}",
                    command.image, message
                )),
                other => SandboxError::Docker(other),
            })?;

        let result = self.run_container(&container.id, timeout).await;

        // The container is removed on every path; removal failure is logged
        // and never overrides the execution result.
        if let Err(e) = self
            .docker
            .remove_container(
                &container.id,
                Some(BollardRemoveContainerOptionsQuery {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            log::warn!("failed to remove container {}: {}", container.id, e);
        }

        result
    }
}
