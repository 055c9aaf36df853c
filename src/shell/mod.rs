use anyhow::{Context, Result};
use std::process::Command;
use tracing::{debug, info};

use crate::capability::{ShellCapability, ShellKind};

/// How a translated line is handed to the target shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Program and arguments that run `line` under `capability`.
    ///
    /// A console-legacy line is already wrapped in a `powershell` call by
    /// the translator, so `cmd` only has to start it.
    #[must_use]
    pub fn for_line(line: &str, capability: &ShellCapability) -> Self {
        match capability.kind {
            ShellKind::Posix => Self {
                program: std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string()),
                args: vec!["-c".to_string(), line.to_string()],
            },
            ShellKind::ShellModern => Self {
                program: capability.powershell_executable().to_string(),
                args: vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    line.to_string(),
                ],
            },
            ShellKind::ConsoleLegacy => Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string(), line.to_string()],
            },
        }
    }
}

#[cfg(windows)]
fn command_for(invocation: &Invocation, capability: &ShellCapability) -> Command {
    use std::os::windows::process::CommandExt;

    let mut command = Command::new(&invocation.program);
    if capability.kind == ShellKind::ConsoleLegacy {
        // cmd parses its own command line; argv quoting would mangle it.
        for arg in &invocation.args {
            command.raw_arg(arg);
        }
    } else {
        command.args(&invocation.args);
    }
    command
}

#[cfg(not(windows))]
fn command_for(invocation: &Invocation, _capability: &ShellCapability) -> Command {
    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args);
    command
}

/// Run `line` through the target shell with inherited stdio and return its
/// exit code. A process killed by a signal reports 1.
///
/// # Errors
/// Returns an error if the shell process cannot be spawned
pub fn run(line: &str, capability: &ShellCapability) -> Result<i32> {
    let invocation = Invocation::for_line(line, capability);
    info!("Running through {}", invocation.program);
    debug!("Arguments: {:?}", invocation.args);

    let status = command_for(&invocation, capability)
        .status()
        .with_context(|| format!("Failed to spawn shell `{}`", invocation.program))?;

    debug!("Shell exited with {}", status);
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_uses_pwsh() {
        let invocation = Invocation::for_line("Get-Location", &ShellCapability::modern(Some(7)));
        assert_eq!(invocation.program, "pwsh");
        assert_eq!(invocation.args, ["-NoProfile", "-Command", "Get-Location"]);
    }

    #[test]
    fn test_unknown_version_uses_windows_powershell() {
        let invocation = Invocation::for_line("Get-Location", &ShellCapability::modern(None));
        assert_eq!(invocation.program, "powershell");
    }

    #[test]
    fn test_console_runs_through_cmd() {
        let invocation = Invocation::for_line("dir", &ShellCapability::console_legacy());
        assert_eq!(invocation.program, "cmd");
        assert_eq!(invocation.args, ["/C", "dir"]);
    }

    #[test]
    fn test_posix_uses_dash_c() {
        let invocation = Invocation::for_line("true", &ShellCapability::posix());
        assert_eq!(invocation.args, ["-c", "true"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_exit_code() {
        assert_eq!(run("exit 3", &ShellCapability::posix()).unwrap(), 3);
    }
}
