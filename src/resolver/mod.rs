// ABOUTME: Lifecycle of the local dnsmasq resolver container.
// ABOUTME: Config lives in a host file bind-mounted read-only; updates re-render and restart.

pub mod dnsmasq;
pub mod host;

use crate::constants::{
    RESOLVER_CONFIG_FILE, RESOLVER_CONFIG_TARGET, RESOLVER_CONTAINER, RESOLVER_HOST_IP,
    RESOLVER_IMAGE, RESOLVER_LOG_MAX_SIZE, RESOLVER_PORT, STOP_TIMEOUT,
};
use crate::converge::{self, LaunchError, Outcome, Removal};
use crate::runtime::{
    ContainerConfig, ContainerError, ContainerInfo, PortMapping, Protocol, RestartPolicyConfig,
    Runtime, VolumeMount,
};
use snafu::{OptionExt, ResultExt, Snafu};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the resolver answers for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Ingress domain; it and every subdomain resolve to the target.
    pub domain: String,
    /// Empty means the host's own address.
    pub target_address: String,
    pub extra_domains: Vec<String>,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ResolverError {
    #[snafu(display("unable to look up DNS resolver container {name}: {source}"))]
    Lookup {
        name: String,
        source: ContainerError,
    },

    #[snafu(display("DNS resolver container {name} not found"))]
    NotDeployed { name: String },

    #[snafu(display("unable to write DNS resolver config {}: {source}", path.display()))]
    WriteConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("unable to deploy DNS resolver container {name}: {source}"))]
    Launch { name: String, source: LaunchError },

    #[snafu(display("unable to restart DNS resolver container {name}: {source}"))]
    Restart {
        name: String,
        source: ContainerError,
    },

    #[snafu(display("unable to delete DNS resolver container {name}: {source}"))]
    Remove {
        name: String,
        source: ContainerError,
    },
}

/// Manages the `educates-resolver` container and its config file.
pub struct ResolverManager<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    config_path: PathBuf,
    stop_timeout: Duration,
    host_lookup: fn() -> Option<IpAddr>,
}

impl<'a, R: Runtime + ?Sized> ResolverManager<'a, R> {
    /// The config file is kept in `data_dir`.
    pub fn new(runtime: &'a R, data_dir: &Path) -> Self {
        Self {
            runtime,
            config_path: data_dir.join(RESOLVER_CONFIG_FILE),
            stop_timeout: STOP_TIMEOUT,
            host_lookup: host::host_ip,
        }
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Replace how the host's own address is found.
    pub fn with_host_lookup(mut self, lookup: fn() -> Option<IpAddr>) -> Self {
        self.host_lookup = lookup;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write the config and start the resolver.
    ///
    /// An existing resolver container is left untouched, config included.
    pub async fn deploy(&self, config: &ResolverConfig) -> Result<Outcome, ResolverError> {
        if self.find().await?.is_some() {
            tracing::info!(container = RESOLVER_CONTAINER, "DNS resolver already deployed");
            return Ok(Outcome::AlreadyPresent);
        }

        self.write(config)?;

        let id = converge::launch(self.runtime, &self.container_config(), None)
            .await
            .context(LaunchSnafu {
                name: RESOLVER_CONTAINER,
            })?;
        tracing::debug!(container = RESOLVER_CONTAINER, id = %id, "DNS resolver running");

        Ok(Outcome::Created)
    }

    /// Re-render the config and restart the resolver so it takes effect.
    ///
    /// Returns the path of the rewritten file.
    pub async fn update(&self, config: &ResolverConfig) -> Result<PathBuf, ResolverError> {
        let info = self.find().await?.context(NotDeployedSnafu {
            name: RESOLVER_CONTAINER,
        })?;

        self.write(config)?;

        self.runtime
            .restart_container(&info.id, self.stop_timeout)
            .await
            .context(RestartSnafu {
                name: RESOLVER_CONTAINER,
            })?;

        tracing::info!(path = %self.config_path.display(), "DNS resolver reloaded");
        Ok(self.config_path.clone())
    }

    /// Stop and remove the resolver. The config file is kept.
    pub async fn delete(&self) -> Result<Removal, ResolverError> {
        let Some(info) = self.find().await? else {
            return Ok(Removal::AlreadyAbsent);
        };

        converge::stop_and_remove(self.runtime, &info.id, self.stop_timeout)
            .await
            .context(RemoveSnafu {
                name: RESOLVER_CONTAINER,
            })?;

        Ok(Removal::Removed)
    }

    fn write(&self, config: &ResolverConfig) -> Result<(), ResolverError> {
        let target = dnsmasq::resolve_target(&config.target_address, self.host_lookup);
        let content = dnsmasq::render(&config.domain, &target, &config.extra_domains);

        dnsmasq::write_config(&self.config_path, &content).context(WriteConfigSnafu {
            path: self.config_path.clone(),
        })?;

        tracing::debug!(path = %self.config_path.display(), target = %target, "wrote DNS resolver config");
        Ok(())
    }

    fn container_config(&self) -> ContainerConfig {
        let mut config = ContainerConfig::new(RESOLVER_CONTAINER, RESOLVER_IMAGE);
        config.ports.push(PortMapping {
            host_port: Some(RESOLVER_PORT),
            container_port: RESOLVER_PORT,
            protocol: Protocol::Udp,
            host_ip: Some(RESOLVER_HOST_IP.to_string()),
        });
        config.volumes.push(VolumeMount {
            source: self.config_path.display().to_string(),
            target: RESOLVER_CONFIG_TARGET.to_string(),
            read_only: true,
        });
        config.restart_policy = RestartPolicyConfig::Always;
        config.log_options.insert(
            "max-size".to_string(),
            RESOLVER_LOG_MAX_SIZE.to_string(),
        );
        config
    }

    async fn find(&self) -> Result<Option<ContainerInfo>, ResolverError> {
        converge::find_container(self.runtime, RESOLVER_CONTAINER)
            .await
            .context(LookupSnafu {
                name: RESOLVER_CONTAINER,
            })
    }
}
