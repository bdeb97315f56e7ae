// ABOUTME: Archive upload trait for container runtimes.
// ABOUTME: Extracts a tar archive into a container's filesystem.

use crate::types::ContainerId;
use async_trait::async_trait;

/// Copy files into a container without restarting it.
#[async_trait]
pub trait ArchiveOps: Send + Sync {
    /// Extract `archive` (a tar stream, optionally gzip-compressed) into
    /// `path` inside the container. Existing files are overwritten.
    async fn upload_archive(
        &self,
        container: &ContainerId,
        path: &str,
        archive: Vec<u8>,
    ) -> Result<(), ArchiveError>;
}

/// Errors from archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("archive rejected: {0}")]
    Rejected(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
