// ABOUTME: Writes configuration files into running containers via exec and archive upload.
// ABOUTME: Used to drop containerd host fragments onto cluster nodes.

use crate::archive;
use crate::runtime::{ArchiveError, ArchiveOps, ExecConfig, ExecError, ExecOps};
use crate::types::ContainerId;
use snafu::{ResultExt, Snafu};

/// Errors writing to or cleaning up inside a target container.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum InjectError {
    #[snafu(display("unable to run `{command}` in {container}: {source}"))]
    Exec {
        container: String,
        command: String,
        source: ExecError,
    },

    #[snafu(display("`{command}` in {container} exited with status {code}: {stderr}"))]
    CommandFailed {
        container: String,
        command: String,
        code: i64,
        stderr: String,
    },

    #[snafu(display("unable to build archive for {path}: {source}"))]
    BuildArchive {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("unable to copy {path} into {container}: {source}"))]
    Upload {
        container: String,
        path: String,
        source: ArchiveError,
    },
}

/// Write `content` to `<dir>/<file_name>` inside `target`.
///
/// Creates the directory, then extracts a single-entry archive at `/`.
/// An existing file is replaced. Not transactional: a failed upload can
/// leave the directory behind.
pub async fn inject_file<R: ExecOps + ArchiveOps + ?Sized>(
    runtime: &R,
    target: &ContainerId,
    dir: &str,
    file_name: &str,
    content: &[u8],
    mode: u32,
) -> Result<(), InjectError> {
    let command = vec!["mkdir".to_string(), "-p".to_string(), dir.to_string()];
    run_checked(runtime, target, command).await?;

    let path = format!("{}/{}", dir.trim_end_matches('/'), file_name);
    let archive = archive::single_file(&path, content, mode).context(BuildArchiveSnafu {
        path: path.clone(),
    })?;

    runtime
        .upload_archive(target, "/", archive)
        .await
        .context(UploadSnafu {
            container: target.to_string(),
            path: path.clone(),
        })?;

    tracing::debug!(container = %target, path = %path, "injected file");
    Ok(())
}

/// Recursively delete `dir` inside `target`. A missing target is not an error.
pub async fn remove_directory<R: ExecOps + ?Sized>(
    runtime: &R,
    target: &ContainerId,
    dir: &str,
) -> Result<(), InjectError> {
    let command = vec!["rm".to_string(), "-rf".to_string(), dir.to_string()];
    match run_checked(runtime, target, command).await {
        Err(InjectError::Exec {
            source: ExecError::ContainerNotFound(_),
            ..
        }) => {
            tracing::debug!(container = %target, "target gone, nothing to remove");
            Ok(())
        }
        other => other,
    }
}

async fn run_checked<R: ExecOps + ?Sized>(
    runtime: &R,
    target: &ContainerId,
    command: Vec<String>,
) -> Result<(), InjectError> {
    let shown = command.join(" ");
    let result = runtime
        .exec(target, &ExecConfig::command(command))
        .await
        .context(ExecSnafu {
            container: target.to_string(),
            command: shown.clone(),
        })?;

    let stdout = String::from_utf8_lossy(&result.stdout);
    let stderr = String::from_utf8_lossy(&result.stderr);
    tracing::debug!(
        container = %target,
        command = %shown,
        stdout = %stdout,
        stderr = %stderr,
        exit_code = result.exit_code
    );

    if !result.success() {
        return CommandFailedSnafu {
            container: target.to_string(),
            command: shown,
            code: result.exit_code,
            stderr: stderr.trim().to_string(),
        }
        .fail();
    }

    Ok(())
}
