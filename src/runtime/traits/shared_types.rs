// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, ContainerInfo, NetworkConfig, ExecConfig, etc.

use crate::types::ContainerId;
use std::collections::HashMap;
use std::fmt;

/// Configuration for creating a container.
///
/// Built by a lifecycle manager for a single create request; never persisted.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Name for the container. Also the handle later lookups use.
    pub name: String,
    /// Image to run.
    pub image: String,
    /// Environment variables, in the order they are passed to the engine.
    pub env: Vec<EnvVar>,
    /// Labels to apply. Used to discover containers later.
    pub labels: HashMap<String, String>,
    /// Exposed ports and optional host bindings.
    pub ports: Vec<PortMapping>,
    /// Bind mounts.
    pub volumes: Vec<VolumeMount>,
    /// Restart policy.
    pub restart_policy: RestartPolicyConfig,
    /// Options for the engine's default log driver (e.g. `max-size`).
    pub log_options: HashMap<String, String>,
}

impl ContainerConfig {
    /// Start a configuration with no env, labels, ports or mounts.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            env: Vec::new(),
            labels: HashMap::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            restart_policy: RestartPolicyConfig::default(),
            log_options: HashMap::new(),
        }
    }

    /// Look up an environment variable's value by name.
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }
}

/// A single environment variable.
///
/// Sensitive values (credentials) are redacted from `Debug` output so a
/// config can be logged without leaking them.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
    pub sensitive: bool,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            sensitive: false,
        }
    }

    pub fn secret(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            sensitive: true,
            ..Self::new(name, value)
        }
    }

    /// `NAME=value` as the engine expects it.
    pub fn to_assignment(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.sensitive { "<redacted>" } else { &self.value };
        write!(f, "{}={}", self.name, value)
    }
}

/// Port mapping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// Host port. `None` exposes the port without publishing it.
    pub host_port: Option<u16>,
    /// Container port.
    pub container_port: u16,
    /// Protocol (tcp/udp).
    pub protocol: Protocol,
    /// Host IP to bind to.
    pub host_ip: Option<String>,
}

impl PortMapping {
    /// `5000/tcp` style key used by the engine API.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Network protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// Bind mount configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Host path.
    pub source: String,
    /// Target path in container.
    pub target: String,
    /// Read-only flag.
    pub read_only: bool,
}

/// Restart policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RestartPolicyConfig {
    /// Never restart.
    No,
    /// Always restart.
    Always,
    /// Restart unless explicitly stopped.
    #[default]
    UnlessStopped,
}

/// Information about an existing container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Container ID.
    pub id: ContainerId,
    /// Container name.
    pub name: String,
    /// Image used.
    pub image: String,
    /// Current state.
    pub state: ContainerState,
    /// Labels.
    pub labels: HashMap<String, String>,
    /// Endpoints by network name.
    pub networks: HashMap<String, NetworkInfo>,
}

/// Container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

/// A container's endpoint on one network.
#[derive(Debug, Clone, Default)]
pub struct NetworkInfo {
    /// Network ID.
    pub network_id: String,
    /// IP address in this network.
    pub ip_address: String,
}

/// Configuration for creating a network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name.
    pub name: String,
    /// Network driver (bridge, overlay, ...).
    pub driver: Option<String>,
    /// Labels.
    pub labels: HashMap<String, String>,
}

/// Runtime metadata.
#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    /// Runtime name (e.g., "Docker", "Podman").
    pub name: String,
    /// Runtime version.
    pub version: String,
    /// Operating system.
    pub os: String,
    /// Architecture.
    pub arch: String,
}

/// Exec configuration for running commands in containers.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Command and arguments to run.
    pub cmd: Vec<String>,
    /// Attach stdout.
    pub attach_stdout: bool,
    /// Attach stderr.
    pub attach_stderr: bool,
}

impl ExecConfig {
    /// Run `cmd` with stdout and stderr attached.
    pub fn command<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Run without attaching any output stream.
    pub fn detached(mut self) -> Self {
        self.attach_stdout = false;
        self.attach_stderr = false;
        self
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            attach_stdout: true,
            attach_stderr: true,
        }
    }
}

/// Result of an exec operation.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Exit code.
    pub exit_code: i64,
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
