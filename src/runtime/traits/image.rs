// ABOUTME: Image capability of a runtime.
// ABOUTME: Checks the local store and pulls missing images.

use async_trait::async_trait;

/// The engine's local image store.
#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull `reference`, waiting for the pull to finish.
    async fn pull_image(&self, reference: &str) -> Result<(), ImageError>;

    /// Whether `reference` is already in the local store.
    async fn image_exists(&self, reference: &str) -> Result<bool, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
