// ABOUTME: Configuration types and loading for localinfra's config.yaml.
// ABOUTME: Every section is optional; missing values fall back to local defaults.

mod stop;

pub use stop::StopConfig;

use crate::error::{Error, Result};
use crate::resolver::ResolverConfig;
use crate::runtime::RuntimeConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "config.yaml";
pub const APP_DIR: &str = "localinfra";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub cluster_ingress: ClusterIngressConfig,

    #[serde(rename = "localDNSResolver")]
    pub local_dns_resolver: LocalDnsResolverConfig,

    pub local_registry: LocalRegistryConfig,

    pub runtime: RuntimeConfig,

    pub stop: StopConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterIngressConfig {
    pub domain: String,
}

impl Default for ClusterIngressConfig {
    fn default() -> Self {
        Self {
            domain: "127-0-0-1.nip.io".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalDnsResolverConfig {
    /// Address answers point at; empty means this host.
    pub target_address: String,
    pub extra_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalRegistryConfig {
    /// Host address the registry port is published on. Validated at use.
    #[serde(rename = "bindIP")]
    pub bind_ip: String,
}

impl Default for LocalRegistryConfig {
    fn default() -> Self {
        Self {
            bind_ip: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load `explicit` if given, else `config.yaml` in `data_dir`.
    ///
    /// A missing explicit file is an error; a missing default file means
    /// defaults.
    pub fn discover(explicit: Option<&Path>, data_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            return Self::load(path);
        }

        let path = data_dir.join(CONFIG_FILENAME);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolver settings derived from the ingress and resolver sections.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            domain: self.cluster_ingress.domain.clone(),
            target_address: self.local_dns_resolver.target_address.clone(),
            extra_domains: self.local_dns_resolver.extra_domains.clone(),
        }
    }
}

/// Directory holding the config file and generated resolver config.
///
/// `$XDG_DATA_HOME/localinfra`, else `$HOME/.local/share/localinfra`.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }

    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".local/share").join(APP_DIR))
        .ok_or(Error::NoDataDir)
}
