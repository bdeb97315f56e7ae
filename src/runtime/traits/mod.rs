// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ImageOps, ContainerOps, NetworkOps, ExecOps, ArchiveOps, RuntimeInfo.

mod archive;
mod container;
mod exec;
mod image;
mod network;
mod runtime_info;
mod shared_types;

pub use archive::{ArchiveError, ArchiveOps};
pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use exec::{ExecError, ExecOps};
pub use image::{ImageError, ImageOps};
pub use network::{NetworkError, NetworkOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Every capability the lifecycle managers need from one engine handle.
///
/// Blanket-implemented, so any type providing the individual traits
/// (the bollard client, or an in-memory fake in tests) qualifies.
pub trait Runtime: ContainerOps + ImageOps + NetworkOps + ExecOps + ArchiveOps {}

impl<T> Runtime for T where T: ContainerOps + ImageOps + NetworkOps + ExecOps + ArchiveOps {}
