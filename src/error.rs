// ABOUTME: Application-wide error types for localinfra.
// ABOUTME: Uses thiserror to wrap config, runtime and lifecycle failures for the CLI.

use crate::mirror::MirrorError;
use crate::registry::RegistryError;
use crate::resolver::ResolverError;
use crate::runtime::RuntimeError;
use crate::types::BindAddressError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("unable to determine data directory (neither XDG_DATA_HOME nor HOME is set)")]
    NoDataDir,

    #[error(transparent)]
    BindAddress(#[from] BindAddressError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
