// ABOUTME: Runtime type definitions for Docker and Podman.
// ABOUTME: Includes RuntimeType enum, detected endpoint and explicit override config.

use serde::Deserialize;
use std::fmt;

/// The container runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// Where the engine API is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAddress {
    /// Unix socket path.
    Socket(String),
    /// Whatever `DOCKER_HOST` points at.
    DockerHost(String),
}

impl fmt::Display for RuntimeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeAddress::Socket(path) => write!(f, "{path}"),
            RuntimeAddress::DockerHost(host) => write!(f, "{host} (DOCKER_HOST)"),
        }
    }
}

/// Detected runtime endpoint.
#[derive(Debug, Clone)]
pub struct RuntimeEndpoint {
    /// The type of runtime detected.
    pub runtime_type: RuntimeType,
    /// How to reach it.
    pub address: RuntimeAddress,
}

/// Configuration for explicit runtime override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    /// Explicit runtime type (overrides auto-detection).
    pub runtime: Option<RuntimeType>,
    /// Explicit socket path (overrides default).
    pub socket: Option<String>,
}
