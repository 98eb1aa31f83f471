//! Running external commands and capturing their failures.

use std::ffi::OsStr;
use std::process::{Command, Output};

use log::debug;

use crate::error::CommandError;

/// Render a command line for logs and error messages.
pub(crate) fn describe(command: &Command) -> String {
    let program = command.get_program().to_string_lossy();
    let args: Vec<_> = command.get_args().map(OsStr::to_string_lossy).collect();
    if args.is_empty() {
        program.into_owned()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

/// Run `command` to completion, capturing output.
///
/// A non-zero exit status is an error carrying trimmed stderr.
pub(crate) fn run(command: &mut Command) -> Result<Output, CommandError> {
    let output = run_unchecked(command)?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(status_error(command, &output))
    }
}

/// Run `command` to completion, capturing output, without checking the exit status.
pub(crate) fn run_unchecked(command: &mut Command) -> Result<Output, CommandError> {
    let rendered = describe(command);
    debug!("running `{rendered}`");
    command.output().map_err(|source| CommandError::Spawn {
        command: rendered,
        source,
    })
}

/// Build the error for a command that exited unsuccessfully.
pub(crate) fn status_error(command: &Command, output: &Output) -> CommandError {
    CommandError::Status {
        command: describe(command),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
