//! Configuration loader for YAML files.

use std::path::Path;

use tokio::fs;

use crate::config::types::CrucibleConfig;
use crate::errors::SandboxError;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<CrucibleConfig, SandboxError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            SandboxError::Config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string.
    pub fn from_str(content: &str) -> Result<CrucibleConfig, SandboxError> {
        let config: CrucibleConfig = serde_yaml::from_str(content)
            .map_err(|e| SandboxError::Config(format!("failed to parse YAML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::BackendKind;
    use crate::languages::LanguageRegistry;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ConfigLoader::from_str("{}").unwrap();
        assert_eq!(config.backend, BackendKind::Docker);
        assert_eq!(config.timeout_secs, 10);
        assert!(config.scratch_root.is_none());
        assert_eq!(config.limits.memory_bytes, 256 * 1024 * 1024);
    }

    #[test]
    fn backend_and_timeout_parse() {
        let config = ConfigLoader::from_str("backend: subprocess\ntimeout_secs: 3\n").unwrap();
        assert_eq!(config.backend, BackendKind::Subprocess);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn language_image_override_wins() {
        let config = ConfigLoader::from_str(
            "languages:\n  py:\n    image: python:3.12-slim\n",
        )
        .unwrap();
        let registry = LanguageRegistry::builtin();
        let py = registry.resolve("py").unwrap();
        assert_eq!(config.image_for(py), "python:3.12-slim");
        let js = registry.resolve("js").unwrap();
        assert_eq!(config.image_for(js), "node:18-slim");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ConfigLoader::from_str("timeout_secs: 0\n").unwrap_err();
        assert!(matches!(err, SandboxError::Config(_)));
    }

    #[test]
    fn nonpositive_limits_are_rejected() {
        let err = ConfigLoader::from_str("limits:\n  memory_bytes: -1\n").unwrap_err();
        assert!(matches!(err, SandboxError::Config(_)));
    }
}
