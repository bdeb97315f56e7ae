// ABOUTME: Mirror command implementation.
// ABOUTME: Deploys and deletes pull-through registry mirrors.

use super::Context;
use super::runtime_connection::connect_to_runtime;
use crate::cli::MirrorCommand;
use localinfra::converge::{Outcome, Removal};
use localinfra::diagnostics::Diagnostics;
use localinfra::error::Result;
use localinfra::mirror::{MirrorConfig, MirrorManager};

pub async fn mirror(command: MirrorCommand, mut ctx: Context) -> Result<()> {
    let runtime = connect_to_runtime(&ctx.config).await?;
    let manager = MirrorManager::new(&runtime).with_stop_timeout(ctx.config.stop.timeout);
    let output = &mut ctx.output;

    match command {
        MirrorCommand::DeployMirror {
            name,
            url,
            username,
            password,
        } => {
            let mirror = MirrorConfig {
                name: name.clone(),
                url,
                username,
                password,
            };

            output.start_timer();
            output.progress(&format!("Deploying local image registry mirror {}", name));
            let mut diag = Diagnostics::default();
            let outcome = manager.deploy(&mirror, &mut diag).await?;
            output.warnings(&diag);

            match outcome {
                Outcome::AlreadyPresent => {
                    output.success(&format!("Registry mirror {} already exists", name))
                }
                Outcome::Created => output.success(&format!("Registry mirror {} deployed", name)),
            }
        }
        MirrorCommand::DeleteMirror { name } => {
            output.progress(&format!("Deleting local image registry mirror {}", name));
            match manager.delete(&name).await? {
                Removal::AlreadyAbsent => {
                    output.success(&format!("Registry mirror {} does not exist", name))
                }
                Removal::Removed => output.success(&format!("Registry mirror {} deleted", name)),
            }
        }
        MirrorCommand::DeleteAll => {
            output.progress("Deleting local image registry mirrors");
            let count = manager.delete_all().await?;
            output.success(&format!("Deleted {} registry mirror(s)", count));
        }
    }

    Ok(())
}
