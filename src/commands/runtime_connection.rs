// ABOUTME: Shared helper for connecting to the local container runtime.
// ABOUTME: Used by every registry, mirror and resolver command.

use localinfra::config::Config;
use localinfra::error::Result;
use localinfra::runtime::{BollardRuntime, RuntimeError, connect, detect_local};

/// Detect the local engine, honoring config overrides, and connect to it.
pub async fn connect_to_runtime(config: &Config) -> Result<BollardRuntime> {
    let endpoint = detect_local(Some(&config.runtime)).map_err(RuntimeError::from)?;

    tracing::debug!(
        runtime = %endpoint.runtime_type,
        address = %endpoint.address,
        "connecting to container runtime"
    );

    let runtime = connect(&endpoint).await?;
    Ok(runtime)
}
