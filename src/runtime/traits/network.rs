// ABOUTME: Network capability of a runtime.
// ABOUTME: Networks are looked up by name; membership is one endpoint per container.

use super::shared_types::NetworkConfig;
use crate::types::{ContainerId, NetworkId};
use async_trait::async_trait;

/// Bridge networks and container membership.
#[async_trait]
pub trait NetworkOps: Send + Sync {
    /// Create a network. A taken name fails with `AlreadyExists`.
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    /// Add an endpoint for `container` on `network`.
    async fn connect_to_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
    ) -> Result<(), NetworkError>;

    /// Drop the endpoint `container` holds on `network`.
    async fn disconnect_from_network(
        &self,
        container: &ContainerId,
        network: &NetworkId,
    ) -> Result<(), NetworkError>;

    /// Whether a network with exactly this name exists.
    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network or container not found: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("container not connected to network: {0}")]
    NotConnected(String),

    #[error("container already connected to network: {0}")]
    AlreadyConnected(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
