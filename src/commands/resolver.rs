// ABOUTME: Resolver command implementation.
// ABOUTME: Deploys, reconfigures and deletes the local DNS resolver.

use super::Context;
use super::runtime_connection::connect_to_runtime;
use crate::cli::ResolverCommand;
use localinfra::converge::{Outcome, Removal};
use localinfra::error::Result;
use localinfra::resolver::ResolverManager;

pub async fn resolver(command: ResolverCommand, mut ctx: Context) -> Result<()> {
    let runtime = connect_to_runtime(&ctx.config).await?;
    let manager =
        ResolverManager::new(&runtime, &ctx.data_dir).with_stop_timeout(ctx.config.stop.timeout);
    let resolver_config = ctx.config.resolver_config();
    let output = &mut ctx.output;

    match command {
        ResolverCommand::Deploy => {
            output.start_timer();
            output.progress("Deploying local DNS resolver");
            match manager.deploy(&resolver_config).await? {
                Outcome::AlreadyPresent => output.success("DNS resolver already exists"),
                Outcome::Created => output.success(&format!(
                    "Local DNS resolver deployed for {}",
                    resolver_config.domain
                )),
            }
        }
        ResolverCommand::Update => {
            output.progress("Updating local DNS resolver configuration");
            let path = manager.update(&resolver_config).await?;
            output.success("Local DNS resolver configuration updated and reloaded");
            output.progress(&format!(
                "Local DNS resolver configuration in {}",
                path.display()
            ));
        }
        ResolverCommand::Delete => {
            output.progress("Deleting local DNS resolver");
            match manager.delete().await? {
                Removal::AlreadyAbsent => output.success("DNS resolver does not exist"),
                Removal::Removed => output.success("Local DNS resolver deleted"),
            }
        }
    }

    Ok(())
}
