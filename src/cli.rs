// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Registry, mirror and resolver subcommands with their arguments.

use clap::{Parser, Subcommand};
use localinfra::types::MirrorName;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "localinfra")]
#[command(about = "Registry, mirror and DNS resolver containers for a local kind cluster")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: config.yaml in the data directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the local image registry
    #[command(subcommand)]
    Registry(RegistryCommand),

    /// Manage pull-through registry mirrors
    #[command(subcommand)]
    Mirror(MirrorCommand),

    /// Manage the local DNS resolver
    #[command(subcommand)]
    Resolver(ResolverCommand),
}

#[derive(Subcommand)]
pub enum RegistryCommand {
    /// Deploy the registry and link it into the cluster
    Deploy {
        /// Host address to publish the registry on (IP or resolvable hostname)
        #[arg(long)]
        bind_ip: Option<String>,

        /// Do not link the registry into the cluster
        #[arg(long)]
        standalone: bool,
    },

    /// Link an existing registry into the cluster
    Link,

    /// Delete the registry
    Delete,

    /// Garbage-collect untagged images in the registry
    Prune,
}

#[derive(Subcommand)]
pub enum MirrorCommand {
    /// Deploy a mirror for an upstream registry
    DeployMirror {
        /// Registry host to mirror, e.g. docker.io
        name: MirrorName,

        /// Upstream host if different from the mirror name
        #[arg(long)]
        url: Option<String>,

        /// Upstream username
        #[arg(long)]
        username: Option<String>,

        /// Upstream password
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete a mirror
    DeleteMirror {
        /// Registry host the mirror was deployed for
        name: MirrorName,
    },

    /// Delete every mirror
    DeleteAll,
}

#[derive(Subcommand)]
pub enum ResolverCommand {
    /// Deploy the DNS resolver
    Deploy,

    /// Rewrite the resolver configuration and reload it
    Update,

    /// Delete the DNS resolver
    Delete,
}
