// ABOUTME: Errors for registry lifecycle operations.
// ABOUTME: One variant per step, each naming the container it was acting on.

use crate::cluster::ClusterError;
use crate::converge::LaunchError;
use crate::runtime::{ContainerError, ExecError, NetworkError};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    #[snafu(display("unable to look up registry container {name}: {source}"))]
    Lookup {
        name: String,
        source: ContainerError,
    },

    #[snafu(display("unable to deploy registry container {name}: {source}"))]
    Launch { name: String, source: LaunchError },

    #[snafu(display("registry container {name} is not deployed"))]
    NotDeployed { name: String },

    #[snafu(display("unable to connect registry container {name} to the cluster network: {source}"))]
    ClusterNetwork {
        name: String,
        source: NetworkError,
    },

    #[snafu(display("unable to link registry {repository} into cluster nodes: {source}"))]
    Link {
        repository: String,
        source: ClusterError,
    },

    #[snafu(display("unable to delete registry container {name}: {source}"))]
    Remove {
        name: String,
        source: ContainerError,
    },

    #[snafu(display("unable to prune registry container {name}: {source}"))]
    Prune { name: String, source: ExecError },
}
