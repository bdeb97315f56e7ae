// ABOUTME: Runtime detection for the local system.
// ABOUTME: Honors explicit config, then DOCKER_HOST, then the Docker and Podman sockets.

use super::types::{RuntimeAddress, RuntimeConfig, RuntimeEndpoint, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked DOCKER_HOST, Podman and Docker sockets)")]
    NoRuntimeFound,
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect the container runtime on the local system.
///
/// Detection order (when not explicitly configured):
/// 1. `DOCKER_HOST`
/// 2. Docker socket (`/var/run/docker.sock`)
/// 3. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 4. Rootful Podman socket (`/run/podman/podman.sock`)
pub fn detect_local(config: Option<&RuntimeConfig>) -> Result<RuntimeEndpoint, DetectionError> {
    if let Some(cfg) = config {
        match (cfg.runtime, &cfg.socket) {
            (Some(runtime_type), socket) => {
                let socket = socket
                    .clone()
                    .unwrap_or_else(|| default_socket_path(runtime_type));
                return Ok(socket_endpoint(runtime_type, socket));
            }
            (None, Some(socket)) => {
                let runtime_type = if socket.contains("podman") {
                    RuntimeType::Podman
                } else {
                    RuntimeType::Docker
                };
                return Ok(socket_endpoint(runtime_type, socket.clone()));
            }
            (None, None) => {}
        }
    }

    if let Ok(host) = std::env::var("DOCKER_HOST")
        && !host.is_empty()
    {
        return Ok(RuntimeEndpoint {
            runtime_type: RuntimeType::Docker,
            address: RuntimeAddress::DockerHost(host),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(socket_endpoint(RuntimeType::Docker, DOCKER_SOCKET.to_string()));
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(socket_endpoint(RuntimeType::Podman, rootless_socket));
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(socket_endpoint(RuntimeType::Podman, ROOTFUL_PODMAN.to_string()));
    }

    Err(DetectionError::NoRuntimeFound)
}

fn socket_endpoint(runtime_type: RuntimeType, socket: String) -> RuntimeEndpoint {
    RuntimeEndpoint {
        runtime_type,
        address: RuntimeAddress::Socket(socket),
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}
