// ABOUTME: Cluster node discovery and fan-out of containerd host fragments.
// ABOUTME: Nodes are the running containers kind labelled with the cluster name.

use crate::constants::{CLUSTER_NAME, CLUSTER_NODE_LABEL, HOSTS_FILE, REGISTRY_PORT, certs_dir};
use crate::inject::{self, InjectError};
use crate::runtime::{ContainerError, ContainerFilters, ContainerSummary, Runtime};
use snafu::{ResultExt, Snafu};

/// What a deploy does when the node fragment cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPolicy {
    /// Fail the deploy.
    Required,
    /// Record a warning and report the deploy as successful.
    BestEffort,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClusterError {
    #[snafu(display("unable to list nodes of cluster {cluster}: {source}"))]
    ListNodes {
        cluster: String,
        source: ContainerError,
    },

    #[snafu(display("no running nodes found for cluster {cluster}"))]
    NoClusterNodes { cluster: String },

    #[snafu(display("unable to update node {node}: {source}"))]
    Node { node: String, source: InjectError },
}

/// Running node containers of the cluster.
pub async fn nodes<R: Runtime + ?Sized>(runtime: &R) -> Result<Vec<ContainerSummary>, ClusterError> {
    let filters = ContainerFilters::with_labels([(CLUSTER_NODE_LABEL, CLUSTER_NAME)]).running_only();
    runtime
        .list_containers(&filters)
        .await
        .context(ListNodesSnafu {
            cluster: CLUSTER_NAME,
        })
}

/// Contents of `hosts.toml` pointing a repository at a registry container.
///
/// Pull-through mirrors also advertise the capabilities containerd needs to
/// use them in place of the upstream.
pub fn hosts_fragment(container: &str, pull_through: bool) -> String {
    let mut fragment = format!("[host.\"http://{}:{}\"]\n", container, REGISTRY_PORT);
    if pull_through {
        fragment.push_str("  capabilities = [\"pull\", \"resolve\"]\n");
    }
    fragment
}

/// Write the `hosts.toml` for `repository` on every node.
///
/// Returns the number of nodes updated. A cluster with no running nodes is
/// an error since nothing would route to the registry.
pub async fn inject_into_nodes<R: Runtime + ?Sized>(
    runtime: &R,
    repository: &str,
    fragment: &str,
) -> Result<usize, ClusterError> {
    let nodes = nodes(runtime).await?;
    if nodes.is_empty() {
        return NoClusterNodesSnafu {
            cluster: CLUSTER_NAME,
        }
        .fail();
    }

    let dir = certs_dir(repository);
    for node in &nodes {
        inject::inject_file(runtime, &node.id, &dir, HOSTS_FILE, fragment.as_bytes(), 0o644)
            .await
            .context(NodeSnafu {
                node: node.name.clone(),
            })?;
        tracing::info!(node = %node.name, repository, "linked repository on node");
    }

    Ok(nodes.len())
}

/// Delete the host configuration directory for `repository` on every node.
///
/// Without a cluster there is nothing to clean up.
pub async fn remove_from_nodes<R: Runtime + ?Sized>(
    runtime: &R,
    repository: &str,
) -> Result<usize, ClusterError> {
    let nodes = nodes(runtime).await?;
    let dir = certs_dir(repository);

    for node in &nodes {
        inject::remove_directory(runtime, &node.id, &dir)
            .await
            .context(NodeSnafu {
                node: node.name.clone(),
            })?;
        tracing::debug!(node = %node.name, repository, "removed repository configuration");
    }

    Ok(nodes.len())
}
