//! Running external tools to completion.

use std::process::Output;
use tokio::process::Command;

use crate::error::{Result, SubtitleError};

/// Run `command` and collect its output. The child is killed if the returned
/// future is dropped. A non-zero exit becomes
/// [`SubtitleError::ExternalProcessFailure`] carrying the trimmed stderr.
pub(crate) async fn run(tool: &str, command: &mut Command) -> Result<Output> {
    let output = command.kill_on_drop(true).output().await?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(SubtitleError::ExternalProcessFailure {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
