//! Core library for the Crucible code execution sandbox.
//!
//! Crucible accepts arbitrary user-submitted source code in one of several
//! languages, runs it inside an isolated execution context with a hard
//! wall-clock timeout, and returns captured stdout/stderr classified into a
//! stable outcome shape. The architecture emphasizes correctness under
//! partial failure: every workspace is torn down on every exit path, and a
//! timeout always pairs with confirmed forceful termination.
//!
//! # Architecture Overview
//!
//! - **Language registry**: per-language build/run strategy as data, not code
//! - **Workspace manager**: uniquely named per-execution scratch directories
//! - **Execution driver**: compile/run staging with short-circuit semantics
//! - **Isolation backends**: ephemeral Docker containers, or a restricted
//!   subprocess fallback
//! - **Result classifier**: pure mapping from raw exit status and streams to
//!   the response shape
//! - **Configuration system**: YAML with environment-sized defaults

pub mod classifier;
pub mod config;
pub mod core_types;
pub mod driver;
pub mod errors;
pub mod executors;
pub mod languages;
pub mod sandbox;
pub mod workspace;

pub use classifier::classify;
pub use config::{BackendKind, ConfigLoader, CrucibleConfig, ResourceLimits};
pub use core_types::{ExecutionOutcome, ExecutionRequest, OutcomeStatus, RawExecutionResult};
pub use driver::{ExecutionDriver, Stage, StagedResult};
pub use errors::SandboxError;
pub use executors::{CommandSpec, DockerBackend, IsolationBackend, SubprocessBackend};
pub use languages::{ExecutionFamily, LanguageProfile, LanguageRegistry, WrapTemplate};
pub use sandbox::Sandbox;
pub use workspace::Workspace;
