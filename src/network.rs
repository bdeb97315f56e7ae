// ABOUTME: Network helpers: inspect-or-create, and reset a container's membership.
// ABOUTME: Membership is reset by disconnecting first so a container never holds two endpoints.

use crate::runtime::{NetworkConfig, NetworkError, NetworkOps};
use crate::types::{ContainerId, NetworkId};
use std::collections::HashMap;

/// Ensure the named bridge network exists, creating it if needed.
///
/// Networks are addressed by name afterwards, so the returned id is the
/// name whether or not this call created it.
pub async fn ensure_network<R: NetworkOps + ?Sized>(
    runtime: &R,
    name: &str,
) -> Result<NetworkId, NetworkError> {
    if runtime.network_exists(name).await? {
        tracing::debug!(network = name, "network already exists");
        return Ok(NetworkId::new(name));
    }

    let config = NetworkConfig {
        name: name.to_string(),
        driver: Some("bridge".to_string()),
        labels: HashMap::new(),
    };

    match runtime.create_network(&config).await {
        Ok(_) => tracing::info!(network = name, "created network"),
        // Lost a race with another creator.
        Err(NetworkError::AlreadyExists(_)) => {
            tracing::debug!(network = name, "network created concurrently")
        }
        Err(e) => return Err(e),
    }

    Ok(NetworkId::new(name))
}

/// Make `container` a member of `network` with exactly one endpoint.
///
/// Any existing membership is dropped first; "not connected" and "not
/// found" on that disconnect are expected and ignored.
pub async fn set_membership<R: NetworkOps + ?Sized>(
    runtime: &R,
    container: &ContainerId,
    network: &NetworkId,
) -> Result<(), NetworkError> {
    match runtime.disconnect_from_network(container, network).await {
        Ok(()) => {
            tracing::debug!(container = %container, network = %network, "dropped previous endpoint")
        }
        Err(NetworkError::NotConnected(_) | NetworkError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    match runtime.connect_to_network(container, network).await {
        Ok(()) | Err(NetworkError::AlreadyConnected(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
