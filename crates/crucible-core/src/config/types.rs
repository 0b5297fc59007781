//! Configuration type definitions for the sandbox.
//!
//! Every field defaults so that an empty file, or no file at all, yields a
//! working configuration. The timeout is global and applies identically to
//! every language; it is deliberately not configurable per request.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::SandboxError;
use crate::languages::LanguageProfile;

/// Which isolation strategy executes commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One ephemeral container per command. The default; the only strategy
    /// with real resource caps.
    Docker,
    /// Restricted local child process. Weaker fallback for hosts without a
    /// container engine.
    Subprocess,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Docker
    }
}

/// Hard resource ceilings for the container strategy's launch parameters.
/// The subprocess strategy relies on the host's own limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default = "default_memory_bytes")]
    pub memory_bytes: i64,
    #[serde(default = "default_nano_cpus")]
    pub nano_cpus: i64,
    #[serde(default = "default_pids")]
    pub pids: i64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_bytes: default_memory_bytes(),
            nano_cpus: default_nano_cpus(),
            pids: default_pids(),
        }
    }
}

/// Per-language overrides; currently the container image only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageOverride {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrucibleConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Scratch root for workspaces; `None` means the system temp dir.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
    #[serde(default)]
    pub limits: ResourceLimits,
    /// Keyed by canonical language id.
    #[serde(default)]
    pub languages: HashMap<String, LanguageOverride>,
}

impl Default for CrucibleConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            timeout_secs: default_timeout_secs(),
            scratch_root: None,
            limits: ResourceLimits::default(),
            languages: HashMap::new(),
        }
    }
}

impl CrucibleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The container image for a profile, with the config override winning
    /// over the registry default.
    pub fn image_for(&self, profile: &LanguageProfile) -> String {
        self.languages
            .get(profile.id)
            .and_then(|o| o.image.clone())
            .unwrap_or_else(|| profile.image.to_string())
    }

    pub fn validate(&self) -> Result<(), SandboxError> {
        if self.timeout_secs == 0 {
            return Err(SandboxError::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.limits.memory_bytes <= 0 || self.limits.nano_cpus <= 0 || self.limits.pids <= 0 {
            return Err(SandboxError::Config(
                "resource limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_memory_bytes() -> i64 {
    256 * 1024 * 1024
}

fn default_nano_cpus() -> i64 {
    1_000_000_000
}

fn default_pids() -> i64 {
    128
}
