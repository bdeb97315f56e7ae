// ABOUTME: Command module aggregator for the localinfra CLI.
// ABOUTME: Re-exports the registry, mirror and resolver command handlers.

mod mirror;
mod registry;
mod resolver;
mod runtime_connection;

pub use mirror::mirror;
pub use registry::registry;
pub use resolver::resolver;

use localinfra::config::Config;
use localinfra::output::Output;
use std::path::PathBuf;

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: Config,
    pub data_dir: PathBuf,
    pub output: Output,
}
