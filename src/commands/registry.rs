// ABOUTME: Registry command implementation.
// ABOUTME: Deploys, links, deletes and prunes the local image registry.

use super::Context;
use super::runtime_connection::connect_to_runtime;
use crate::cli::RegistryCommand;
use localinfra::converge::{Outcome, Removal};
use localinfra::error::Result;
use localinfra::registry::{Prune, RegistryManager};
use localinfra::types::BindAddress;

pub async fn registry(command: RegistryCommand, mut ctx: Context) -> Result<()> {
    // Reject a bad address before touching the engine.
    let bind = match &command {
        RegistryCommand::Deploy { bind_ip, .. } => {
            let bind_ip = bind_ip
                .as_deref()
                .unwrap_or(&ctx.config.local_registry.bind_ip);
            Some(BindAddress::resolve(bind_ip)?)
        }
        _ => None,
    };

    let runtime = connect_to_runtime(&ctx.config).await?;
    let manager = RegistryManager::new(&runtime).with_stop_timeout(ctx.config.stop.timeout);
    let output = &mut ctx.output;

    match command {
        RegistryCommand::Deploy { standalone, .. } => {
            let bind = bind.unwrap_or_default();

            output.start_timer();
            output.progress("Deploying local image registry");
            let outcome = if standalone {
                manager.deploy_standalone(&bind).await?
            } else {
                manager.deploy(&bind).await?
            };

            match outcome {
                Outcome::AlreadyPresent => output.success("Registry already exists"),
                Outcome::Created => output.success(&format!(
                    "Local image registry deployed on {}:5001",
                    bind
                )),
            }
        }
        RegistryCommand::Link => {
            output.progress("Linking local image registry to cluster");
            manager.link_to_cluster().await?;
            output.success("Local image registry linked to cluster");
        }
        RegistryCommand::Delete => {
            output.progress("Deleting local image registry");
            match manager.delete().await? {
                Removal::AlreadyAbsent => output.success("Registry does not exist"),
                Removal::Removed => output.success("Local image registry deleted"),
            }
        }
        RegistryCommand::Prune => {
            output.progress("Pruning local image registry");
            match manager.prune().await? {
                Prune::Skipped => output.success("Registry does not exist, nothing to prune"),
                Prune::Started(_) => output.success("Registry garbage collection started"),
            }
        }
    }

    Ok(())
}
