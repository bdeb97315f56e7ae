// ABOUTME: Errors for registry mirror lifecycle operations.
// ABOUTME: Each variant carries the mirror container name it was acting on.

use crate::cluster::ClusterError;
use crate::converge::LaunchError;
use crate::runtime::{ContainerError, NetworkError};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MirrorError {
    #[snafu(display("unable to look up registry mirror container {name}: {source}"))]
    Lookup {
        name: String,
        source: ContainerError,
    },

    #[snafu(display("unable to list registry mirror containers: {source}"))]
    List { source: ContainerError },

    #[snafu(display("unable to start registry mirror container {name}: {source}"))]
    Launch { name: String, source: LaunchError },

    #[snafu(display("unable to connect registry mirror container {name} to the cluster network: {source}"))]
    ClusterNetwork {
        name: String,
        source: NetworkError,
    },

    #[snafu(display("unable to link registry mirror {name} into cluster nodes: {source}"))]
    Link { name: String, source: ClusterError },

    #[snafu(display("unable to delete registry mirror container {name}: {source}"))]
    Remove {
        name: String,
        source: ContainerError,
    },

    #[snafu(display("unable to remove registry config for {repository} from cluster nodes: {source}"))]
    Unlink {
        repository: String,
        source: ClusterError,
    },
}
