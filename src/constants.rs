// ABOUTME: Fixed names, images, labels and paths shared with the cluster bootstrap.
// ABOUTME: Changing any of these breaks lookups of containers created by earlier runs.

use std::time::Duration;

/// Image used by the primary registry and every mirror.
pub const REGISTRY_IMAGE: &str = "docker.io/library/registry:3";

/// Image used by the DNS resolver.
pub const RESOLVER_IMAGE: &str = "ghcr.io/dockur/dnsmasq:2.90";

pub const REGISTRY_CONTAINER: &str = "educates-registry";
pub const MIRROR_CONTAINER_PREFIX: &str = "educates-registry-mirror-";
pub const RESOLVER_CONTAINER: &str = "educates-resolver";

/// Network shared by the auxiliary containers.
pub const AUX_NETWORK: &str = "educates";

/// Network the kind cluster nodes live on.
pub const CLUSTER_NETWORK: &str = "kind";

/// Label kind puts on every node container of a cluster.
pub const CLUSTER_NODE_LABEL: &str = "io.x-k8s.kind.cluster";
pub const CLUSTER_NAME: &str = "educates";

pub const LABEL_APP: &str = "app";
pub const LABEL_ROLE: &str = "role";
pub const LABEL_MIRROR: &str = "mirror";
pub const APP_NAME: &str = "educates";
pub const ROLE_REGISTRY: &str = "registry";
pub const ROLE_MIRROR: &str = "mirror";

/// Port the registry listens on inside its container.
pub const REGISTRY_PORT: u16 = 5000;

/// Host port the primary registry is published on.
pub const REGISTRY_HOST_PORT: u16 = 5001;

/// Repository names under which nodes reach the primary registry.
pub const REGISTRY_REPOSITORIES: [&str; 2] = ["localhost:5001", "registry.default.svc.cluster.local"];

pub const REGISTRY_CONFIG_PATH: &str = "/etc/distribution/config.yml";

/// Parent of the per-repository containerd host configuration.
pub const CERTS_DIR: &str = "/etc/containerd/certs.d";
pub const HOSTS_FILE: &str = "hosts.toml";

pub const RESOLVER_PORT: u16 = 53;
pub const RESOLVER_HOST_IP: &str = "127.0.0.1";
pub const RESOLVER_CONFIG_TARGET: &str = "/etc/dnsmasq.conf";
pub const RESOLVER_CONFIG_FILE: &str = "dnsmasq.conf";
pub const RESOLVER_LOG_MAX_SIZE: &str = "100m";

/// Default grace period before a stopping container is killed.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory holding the containerd host configuration for `repository`.
pub fn certs_dir(repository: &str) -> String {
    format!("{}/{}", CERTS_DIR, repository)
}
