//! Runs the OS network configuration utilities.
//!
//! Everything here blocks until the child exits. There is no timeout.

use crate::Error;
use itertools::Itertools as _;
use std::process::{Command, Stdio};

/// Hides the console window of child processes on Windows
///
/// <https://stackoverflow.com/questions/59692146/is-it-possible-to-use-the-standard-library-to-spawn-a-process-without-showing-th#60958956>
#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Builds a [`Command`] for `program` that won't flash a console window on Windows.
pub(crate) fn command(program: &str) -> Command {
    let command = Command::new(program);

    #[cfg(target_os = "windows")]
    let command = {
        use std::os::windows::process::CommandExt as _;

        let mut command = command;
        command.creation_flags(CREATE_NO_WINDOW);
        command
    };

    command
}

/// Runs `command` to completion, discarding stdout.
///
/// A non-zero exit is an error carrying whatever the child wrote to stderr.
pub(crate) fn run(mut command: Command) -> Result<(), Error> {
    let rendered = render(&command);
    tracing::debug!(command = %rendered, "Running");

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| Error::BackendLaunch {
            command: rendered.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::BackendCommand {
            command: rendered,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    Ok(())
}

/// Runs `command` to completion and returns its stdout.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))] // Only Linux reads DNS servers through a subprocess.
pub(crate) fn read(mut command: Command) -> Result<String, Error> {
    let rendered = render(&command);
    tracing::debug!(command = %rendered, "Reading");

    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::BackendLaunch {
            command: rendered.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::BackendCommand {
            command: rendered,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// e.g. `resolvectl dns eth0 1.1.1.1`
fn render(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|arg| arg.to_string_lossy())
        .join(" ")
}
