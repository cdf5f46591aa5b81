//! Subprocess runner shared by the converter and the renderer.
//!
//! Both tools are driven the same way: stdin closed, stdout and stderr
//! captured, exit status checked, and an optional wall-clock limit. The
//! child is spawned with `kill_on_drop` so a timed-out (or cancelled)
//! request does not leave the tool running.

use crate::error::{Doc2MdError, ToolRole};
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Run `program` with `args` and return its stdout on success.
///
/// * Spawn failures become [`Doc2MdError::ToolUnavailable`].
/// * A non-zero exit becomes [`Doc2MdError::ToolFailed`] carrying the
///   trimmed stderr (or stdout when stderr is empty).
/// * Exceeding `timeout_secs` (when non-zero) becomes
///   [`Doc2MdError::ToolTimeout`].
pub async fn run_tool<I, S>(
    role: ToolRole,
    program: &Path,
    args: I,
    timeout_secs: u64,
) -> Result<Vec<u8>, Doc2MdError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program_name = program.display().to_string();
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {}: {:?}", role, cmd.as_std());
    let start = Instant::now();

    let result = if timeout_secs > 0 {
        match tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
            Ok(result) => result,
            Err(_) => {
                return Err(Doc2MdError::ToolTimeout {
                    role,
                    program: program_name,
                    secs: timeout_secs,
                })
            }
        }
    } else {
        cmd.output().await
    };
    let output = result.map_err(|e| Doc2MdError::ToolUnavailable {
        role,
        program: program_name.clone(),
        source: e,
    })?;

    debug!(
        "{} finished with {} in {}ms",
        program_name,
        output.status,
        start.elapsed().as_millis()
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        return Err(Doc2MdError::ToolFailed {
            role,
            program: program_name,
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(output.stdout)
}
