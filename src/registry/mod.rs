// ABOUTME: Lifecycle of the primary image registry container.
// ABOUTME: Deploy, link into the kind cluster, delete, and garbage-collect.

mod error;

pub use error::RegistryError;

use crate::cluster;
use crate::constants::{
    APP_NAME, AUX_NETWORK, CLUSTER_NETWORK, LABEL_APP, LABEL_ROLE, REGISTRY_CONFIG_PATH,
    REGISTRY_CONTAINER, REGISTRY_HOST_PORT, REGISTRY_IMAGE, REGISTRY_PORT, REGISTRY_REPOSITORIES,
    ROLE_REGISTRY, STOP_TIMEOUT,
};
use crate::converge::{self, Outcome, Removal};
use crate::network;
use crate::runtime::{
    ContainerConfig, ContainerInfo, ExecConfig, PortMapping, Protocol, RestartPolicyConfig, Runtime,
};
use crate::types::{BindAddress, ExecId, NetworkId};
use error::{
    ClusterNetworkSnafu, LaunchSnafu, LinkSnafu, LookupSnafu, NotDeployedSnafu, PruneSnafu,
    RemoveSnafu,
};
use snafu::{OptionExt, ResultExt};
use std::time::Duration;

/// Result of a prune request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prune {
    /// No registry container; nothing to collect.
    Skipped,
    /// Garbage collection is running detached in the registry.
    Started(ExecId),
}

/// Manages the `educates-registry` container.
pub struct RegistryManager<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    stop_timeout: Duration,
}

impl<'a, R: Runtime + ?Sized> RegistryManager<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            stop_timeout: STOP_TIMEOUT,
        }
    }

    /// Grace period given to the registry when it is deleted.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Deploy the registry and link it into the cluster.
    ///
    /// An existing registry container, in any state, is left untouched.
    pub async fn deploy(&self, bind: &BindAddress) -> Result<Outcome, RegistryError> {
        let outcome = self.deploy_standalone(bind).await?;
        if outcome == Outcome::Created {
            self.link_to_cluster().await?;
        }
        Ok(outcome)
    }

    /// Deploy the registry on the auxiliary network only.
    pub async fn deploy_standalone(&self, bind: &BindAddress) -> Result<Outcome, RegistryError> {
        if self.find().await?.is_some() {
            tracing::info!(container = REGISTRY_CONTAINER, "registry already deployed");
            return Ok(Outcome::AlreadyPresent);
        }

        let id = converge::launch(self.runtime, &container_config(bind), Some(AUX_NETWORK))
            .await
            .context(LaunchSnafu {
                name: REGISTRY_CONTAINER,
            })?;
        tracing::debug!(container = REGISTRY_CONTAINER, id = %id, bind = %bind, "registry running");

        Ok(Outcome::Created)
    }

    /// Attach the registry to the cluster network and point every node at it.
    ///
    /// Safe to repeat, e.g. after the cluster was recreated.
    pub async fn link_to_cluster(&self) -> Result<(), RegistryError> {
        let info = self.find().await?.context(NotDeployedSnafu {
            name: REGISTRY_CONTAINER,
        })?;

        network::set_membership(self.runtime, &info.id, &NetworkId::new(CLUSTER_NETWORK))
            .await
            .context(ClusterNetworkSnafu {
                name: REGISTRY_CONTAINER,
            })?;

        let fragment = cluster::hosts_fragment(REGISTRY_CONTAINER, false);
        for repository in REGISTRY_REPOSITORIES {
            cluster::inject_into_nodes(self.runtime, repository, &fragment)
                .await
                .context(LinkSnafu { repository })?;
        }

        Ok(())
    }

    /// Stop and remove the registry container.
    pub async fn delete(&self) -> Result<Removal, RegistryError> {
        let Some(info) = self.find().await? else {
            return Ok(Removal::AlreadyAbsent);
        };

        converge::stop_and_remove(self.runtime, &info.id, self.stop_timeout)
            .await
            .context(RemoveSnafu {
                name: REGISTRY_CONTAINER,
            })?;

        tracing::info!(container = REGISTRY_CONTAINER, "registry deleted");
        Ok(Removal::Removed)
    }

    /// Start garbage collection of untagged manifests inside the registry.
    ///
    /// The collector runs detached and its exit status is not checked.
    pub async fn prune(&self) -> Result<Prune, RegistryError> {
        let Some(info) = self.find().await? else {
            return Ok(Prune::Skipped);
        };

        let config = ExecConfig::command([
            "registry",
            "garbage-collect",
            REGISTRY_CONFIG_PATH,
            "--delete-untagged=true",
        ])
        .detached();

        let exec = self
            .runtime
            .exec_detached(&info.id, &config)
            .await
            .context(PruneSnafu {
                name: REGISTRY_CONTAINER,
            })?;

        Ok(Prune::Started(exec))
    }

    async fn find(&self) -> Result<Option<ContainerInfo>, RegistryError> {
        converge::find_container(self.runtime, REGISTRY_CONTAINER)
            .await
            .context(LookupSnafu {
                name: REGISTRY_CONTAINER,
            })
    }
}

/// Container configuration for the registry published on `bind`.
pub fn container_config(bind: &BindAddress) -> ContainerConfig {
    let mut config = ContainerConfig::new(REGISTRY_CONTAINER, REGISTRY_IMAGE);
    config.labels.insert(LABEL_APP.to_string(), APP_NAME.to_string());
    config
        .labels
        .insert(LABEL_ROLE.to_string(), ROLE_REGISTRY.to_string());
    config.ports.push(PortMapping {
        host_port: Some(REGISTRY_HOST_PORT),
        container_port: REGISTRY_PORT,
        protocol: Protocol::Tcp,
        host_ip: Some(bind.to_string()),
    });
    config.restart_policy = RestartPolicyConfig::Always;
    config
}
