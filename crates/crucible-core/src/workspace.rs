//! Per-execution scratch directories.
//!
//! Each request gets a uniquely named directory holding the staged source
//! file, the optional stdin file, and any compiled artifact. Uniqueness of
//! the directory name is the only cross-request concurrency mechanism the
//! filesystem needs: no two requests ever address the same path, so a shared
//! scratch root requires no locking.

use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errors::SandboxError;
use crate::languages::LanguageProfile;

/// Name of the staged stdin file inside the workspace.
pub const STDIN_FILE_NAME: &str = "input.txt";

/// Workspace-relative name of the compiled artifact for the compiled
/// families.
pub const ARTIFACT_NAME: &str = "main";

/// An ephemeral directory owned exclusively by one execution.
///
/// Dropping a `Workspace` removes the directory (tempfile's RAII), but the
/// orderly path is [`Workspace::teardown`], which runs after classification
/// and logs removal failures instead of surfacing them.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Allocate a fresh uniquely named directory under `scratch_root`
    /// (system temp dir when `None`). Failure here is a server fault, not
    /// retried.
    pub fn create(scratch_root: Option<&Path>) -> Result<Self, SandboxError> {
        let mut builder = Builder::new();
        builder.prefix("crucible-");
        let dir = match scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(SandboxError::WorkspaceCreation)?;
        log::debug!("created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Stage the source file. The on-disk name comes from the profile (fixed
    /// name for fixed-entry-point languages, `main.<ext>` otherwise); the
    /// wrap template is applied first when the profile has one and the
    /// snippet is bare. The file is fully written and flushed before the
    /// path is returned.
    pub async fn write_source(
        &self,
        profile: &LanguageProfile,
        code: &str,
    ) -> Result<PathBuf, SandboxError> {
        let staged = match profile.wrap.as_ref().and_then(|w| w.wrap_if_bare(code)) {
            Some(wrapped) => wrapped,
            None => code.to_string(),
        };
        let path = self.dir.path().join(profile.source_name());
        let mut file = fs::File::create(&path).await?;
        file.write_all(staged.as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }

    /// Stage the stdin file. Only called for present, non-empty stdin.
    pub async fn write_stdin(&self, stdin: &str) -> Result<PathBuf, SandboxError> {
        let path = self.dir.path().join(STDIN_FILE_NAME);
        let mut file = fs::File::create(&path).await?;
        file.write_all(stdin.as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }

    /// Remove the directory and everything staged or compiled inside it.
    /// Runs on every exit path once `create` has succeeded; failures are
    /// logged and swallowed so cleanup can never mask an execution result.
    pub fn teardown(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!("failed to remove workspace {}: {}", path.display(), e);
        } else {
            log::debug!("removed workspace {}", path.display());
        }
    }
}
