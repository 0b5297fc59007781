//! Sandbox configuration: backend selection, timeout, scratch root, resource
//! limits, and per-language image overrides.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{BackendKind, CrucibleConfig, LanguageOverride, ResourceLimits};
