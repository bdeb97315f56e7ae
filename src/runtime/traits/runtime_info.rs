// ABOUTME: Engine identity and liveness checks.
// ABOUTME: Used once after connecting, before any lifecycle operation.

use super::shared_types::RuntimeMetadata;
use async_trait::async_trait;

/// Engine identity and liveness.
#[async_trait]
pub trait RuntimeInfo: Send + Sync {
    /// Engine version and platform.
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError>;

    /// Fails when the engine does not answer.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

/// Errors from runtime info operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
