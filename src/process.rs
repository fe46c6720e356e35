use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use log::debug;
use tokio::process::Command;
use crate::errors::ServiceError;

// @module: Running external programs with a timeout

/// Run `program` with `args` and wait for it to exit, at most `timeout`.
///
/// A non-zero exit status is an error carrying the program's stderr after
/// passing it through `filter_stderr`. The child is killed if it outlives
/// the timeout.
pub async fn run_command<I, S>(
    service: &str,
    program: &str,
    args: I,
    working_dir: Option<&Path>,
    timeout: Duration,
    filter_stderr: fn(&str) -> String,
) -> Result<Output, ServiceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    debug!("Running {}: {:?}", service, command.as_std());

    let output_future = command.output();
    let output = tokio::select! {
        result = output_future => {
            result.map_err(|e| ServiceError::Launch {
                program: program.to_string(),
                message: e.to_string(),
            })?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(ServiceError::Timeout {
                service: service.to_string(),
                secs: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ServiceError::Failed {
            service: service.to_string(),
            status: output.status.to_string(),
            message: filter_stderr(&stderr),
        });
    }

    Ok(output)
}

/// Keep stderr as-is apart from surrounding whitespace
pub fn trim_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        "no error output".to_string()
    } else {
        trimmed.to_string()
    }
}
