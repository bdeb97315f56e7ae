// ABOUTME: Shared convergence steps for the lifecycle managers.
// ABOUTME: Presence lookup by name, image presence, and graceful stop-then-remove.

use crate::network;
use crate::runtime::{
    ContainerConfig, ContainerError, ContainerInfo, ContainerOps, ImageError, ImageOps,
    NetworkError, Runtime,
};
use crate::types::ContainerId;
use snafu::{ResultExt, Snafu};
use std::fmt;
use std::time::Duration;

/// Result of a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A container with the canonical name existed; nothing was changed.
    AlreadyPresent,
    /// The container was created and started.
    Created,
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Nothing to delete; nothing was changed.
    AlreadyAbsent,
    Removed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::AlreadyPresent => f.write_str("already present"),
            Outcome::Created => f.write_str("created"),
        }
    }
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Removal::AlreadyAbsent => f.write_str("already absent"),
            Removal::Removed => f.write_str("removed"),
        }
    }
}

/// Look up a container by its exact name, in any state.
///
/// Presence only: a stopped or crashed container still counts.
pub async fn find_container<R: ContainerOps + ?Sized>(
    runtime: &R,
    name: &str,
) -> Result<Option<ContainerInfo>, ContainerError> {
    match runtime.inspect_container(&ContainerId::new(name)).await {
        Ok(info) => Ok(Some(info)),
        Err(ContainerError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Pull `image` unless it is already present locally.
pub async fn ensure_image<R: ImageOps + ?Sized>(runtime: &R, image: &str) -> Result<(), ImageError> {
    if runtime.image_exists(image).await? {
        return Ok(());
    }

    tracing::info!(image, "pulling image");
    runtime.pull_image(image).await
}

/// Stop a container with a grace period, then remove it.
///
/// A container that is already stopped is removed directly.
pub async fn stop_and_remove<R: ContainerOps + ?Sized>(
    runtime: &R,
    id: &ContainerId,
    timeout: Duration,
) -> Result<(), ContainerError> {
    match runtime.stop_container(id, timeout).await {
        Ok(()) | Err(ContainerError::NotRunning(_)) => {}
        Err(e) => return Err(e),
    }

    runtime.remove_container(id, false).await
}

/// Failure while bringing up a new container.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LaunchError {
    #[snafu(display("unable to ensure network {network}: {source}"))]
    EnsureNetwork {
        network: String,
        source: NetworkError,
    },

    #[snafu(display("unable to pull image {image}: {source}"))]
    Pull { image: String, source: ImageError },

    #[snafu(display("unable to create container: {source}"))]
    Create { source: ContainerError },

    #[snafu(display("unable to start container: {source}"))]
    Start { source: ContainerError },

    #[snafu(display("unable to attach container to network {network}: {source}"))]
    Attach {
        network: String,
        source: NetworkError,
    },
}

/// Create and start a container from `config`.
///
/// With a `network`, the network is ensured before anything is created and
/// the started container becomes a member of it.
pub async fn launch<R: Runtime + ?Sized>(
    runtime: &R,
    config: &ContainerConfig,
    network: Option<&str>,
) -> Result<ContainerId, LaunchError> {
    let network = match network {
        Some(name) => Some(
            network::ensure_network(runtime, name)
                .await
                .context(EnsureNetworkSnafu { network: name })?,
        ),
        None => None,
    };

    ensure_image(runtime, &config.image)
        .await
        .context(PullSnafu {
            image: config.image.clone(),
        })?;

    let id = runtime.create_container(config).await.context(CreateSnafu)?;
    runtime.start_container(&id).await.context(StartSnafu)?;
    tracing::info!(container = %config.name, image = %config.image, "started container");

    if let Some(network) = network {
        network::set_membership(runtime, &id, &network)
            .await
            .context(AttachSnafu {
                network: network.as_str(),
            })?;
    }

    Ok(id)
}
