// ABOUTME: Container runtime client: capability traits and the bollard implementation.
// ABOUTME: Auto-detects the local engine or uses explicit config.

mod bollard;
mod detection;
mod error;
pub mod traits;
mod types;

pub use self::bollard::{BollardRuntime, connect};
pub use detection::{DetectionError, detect_local};
pub use error::RuntimeError;
pub use traits::*;
pub use types::{RuntimeAddress, RuntimeConfig, RuntimeEndpoint, RuntimeType};
