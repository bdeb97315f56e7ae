// ABOUTME: Lifecycle of pull-through registry mirror containers.
// ABOUTME: One container per upstream, linked into cluster nodes under the mirror name.

mod error;

pub use error::MirrorError;

use crate::cluster::{self, InjectionPolicy};
use crate::constants::{
    APP_NAME, AUX_NETWORK, CLUSTER_NETWORK, LABEL_APP, LABEL_MIRROR, LABEL_ROLE,
    MIRROR_CONTAINER_PREFIX, REGISTRY_IMAGE, REGISTRY_PORT, ROLE_MIRROR, STOP_TIMEOUT,
};
use crate::converge::{self, Outcome, Removal};
use crate::diagnostics::{Diagnostics, Warning};
use crate::network;
use crate::runtime::{
    ContainerConfig, ContainerFilters, EnvVar, PortMapping, Protocol, RestartPolicyConfig,
    Runtime,
};
use crate::types::{MirrorName, NetworkId};
use error::{
    ClusterNetworkSnafu, LaunchSnafu, ListSnafu, LookupSnafu, RemoveSnafu, UnlinkSnafu,
};
use snafu::ResultExt;
use std::time::Duration;

/// A pull-through mirror of one upstream registry.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Repository name nodes pull through this mirror, e.g. `docker.io`.
    pub name: MirrorName,
    /// Upstream host, without scheme. Defaults to the mirror name.
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MirrorConfig {
    pub fn new(name: MirrorName) -> Self {
        Self {
            name,
            url: None,
            username: None,
            password: None,
        }
    }

    /// Upstream the mirror proxies, always over https.
    pub fn remote_url(&self) -> String {
        let host = match self.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => self.name.as_str(),
        };
        format!("https://{}", host)
    }
}

/// Canonical container name for a mirror.
pub fn container_name(name: &MirrorName) -> String {
    format!("{}{}", MIRROR_CONTAINER_PREFIX, name)
}

/// Container configuration for a mirror.
///
/// The registry port is exposed to the auxiliary and cluster networks but
/// not published on the host.
pub fn container_config(mirror: &MirrorConfig) -> ContainerConfig {
    let mut config = ContainerConfig::new(container_name(&mirror.name), REGISTRY_IMAGE);

    config
        .env
        .push(EnvVar::new("REGISTRY_PROXY_REMOTEURL", mirror.remote_url()));
    if let Some(username) = mirror.username.as_deref().filter(|u| !u.is_empty()) {
        config
            .env
            .push(EnvVar::secret("REGISTRY_PROXY_USERNAME", username));
    }
    if let Some(password) = mirror.password.as_deref().filter(|p| !p.is_empty()) {
        config
            .env
            .push(EnvVar::secret("REGISTRY_PROXY_PASSWORD", password));
    }

    config.labels.insert(LABEL_APP.to_string(), APP_NAME.to_string());
    config
        .labels
        .insert(LABEL_ROLE.to_string(), ROLE_MIRROR.to_string());
    config
        .labels
        .insert(LABEL_MIRROR.to_string(), mirror.name.to_string());

    config.ports.push(PortMapping {
        host_port: None,
        container_port: REGISTRY_PORT,
        protocol: Protocol::Tcp,
        host_ip: None,
    });
    config.restart_policy = RestartPolicyConfig::Always;
    config
}

/// Manages `educates-registry-mirror-*` containers.
pub struct MirrorManager<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    stop_timeout: Duration,
    policy: InjectionPolicy,
}

impl<'a, R: Runtime + ?Sized> MirrorManager<'a, R> {
    /// Mirrors are optional for nodes, so injection is best effort by default.
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            stop_timeout: STOP_TIMEOUT,
            policy: InjectionPolicy::BestEffort,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn with_injection_policy(mut self, policy: InjectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deploy a mirror and point cluster nodes at it.
    ///
    /// A container with the mirror's name, in any state, is left untouched.
    pub async fn deploy(
        &self,
        mirror: &MirrorConfig,
        diag: &mut Diagnostics,
    ) -> Result<Outcome, MirrorError> {
        let name = container_name(&mirror.name);

        let existing = converge::find_container(self.runtime, &name)
            .await
            .context(LookupSnafu { name: name.as_str() })?;
        if existing.is_some() {
            tracing::info!(container = %name, "registry mirror already deployed");
            return Ok(Outcome::AlreadyPresent);
        }

        let config = container_config(mirror);
        tracing::debug!(container = %name, env = ?config.env, "creating registry mirror");

        let id = converge::launch(self.runtime, &config, Some(AUX_NETWORK))
            .await
            .context(LaunchSnafu { name: name.as_str() })?;

        network::set_membership(self.runtime, &id, &NetworkId::new(CLUSTER_NETWORK))
            .await
            .context(ClusterNetworkSnafu { name: name.as_str() })?;

        let fragment = cluster::hosts_fragment(&name, true);
        match cluster::inject_into_nodes(self.runtime, mirror.name.as_str(), &fragment).await {
            Ok(_) => {}
            Err(source) => match self.policy {
                InjectionPolicy::Required => {
                    return Err(MirrorError::Link { name, source });
                }
                InjectionPolicy::BestEffort => {
                    diag.warn(Warning::node_injection(format!(
                        "mirror {} not added to cluster nodes: {}",
                        mirror.name, source
                    )));
                }
            },
        }

        Ok(Outcome::Created)
    }

    /// Stop and remove a mirror, then drop its configuration from the nodes.
    pub async fn delete(&self, mirror: &MirrorName) -> Result<Removal, MirrorError> {
        let name = container_name(mirror);

        let Some(info) = converge::find_container(self.runtime, &name)
            .await
            .context(LookupSnafu { name: name.as_str() })?
        else {
            return Ok(Removal::AlreadyAbsent);
        };

        converge::stop_and_remove(self.runtime, &info.id, self.stop_timeout)
            .await
            .context(RemoveSnafu { name: name.as_str() })?;

        cluster::remove_from_nodes(self.runtime, mirror.as_str())
            .await
            .context(UnlinkSnafu {
                repository: mirror.as_str(),
            })?;

        tracing::info!(container = %name, "registry mirror deleted");
        Ok(Removal::Removed)
    }

    /// Delete every mirror, running or not. Returns how many were removed.
    pub async fn delete_all(&self) -> Result<usize, MirrorError> {
        let filters =
            ContainerFilters::with_labels([(LABEL_APP, APP_NAME), (LABEL_ROLE, ROLE_MIRROR)]);
        let mirrors = self
            .runtime
            .list_containers(&filters)
            .await
            .context(ListSnafu)?;

        for mirror in &mirrors {
            converge::stop_and_remove(self.runtime, &mirror.id, self.stop_timeout)
                .await
                .context(RemoveSnafu {
                    name: mirror.name.as_str(),
                })?;

            if let Some(repository) = mirror.labels.get(LABEL_MIRROR) {
                cluster::remove_from_nodes(self.runtime, repository)
                    .await
                    .context(UnlinkSnafu {
                        repository: repository.as_str(),
                    })?;
            }
        }

        Ok(mirrors.len())
    }
}
