// ABOUTME: Exec capability of a runtime.
// ABOUTME: Commands run inside a running container, waited on or fire-and-forget.

use super::shared_types::{ExecConfig, ExecResult};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;

/// Commands run inside running containers.
#[async_trait]
pub trait ExecOps: Send + Sync {
    /// Run a command to completion and collect its exit code and output.
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError>;

    /// Start a command and return as soon as it is running.
    async fn exec_detached(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecId, ExecError>;
}

/// Errors from exec operations.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("exec instance not found: {0}")]
    ExecNotFound(String),

    #[error("exec failed: {0}")]
    Failed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
