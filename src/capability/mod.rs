//! Target shell detection.
//!
//! Resolution order: explicit override, then environment heuristics, then
//! the POSIX default. The only blocking step is the version probe, which
//! runs the candidate shell under a short deadline and reports "unknown"
//! on any failure.

use serde::Serialize;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Environment variable naming the target shell explicitly.
pub const OVERRIDE_VAR: &str = "CMDX_SHELL";

/// Deadline for the external version probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShellKind {
    Posix,
    ConsoleLegacy,
    ShellModern,
}

/// Resolved facts about the target shell. Built once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShellCapability {
    pub kind: ShellKind,
    pub version: Option<u32>,
    pub supports_native_connectors: bool,
}

impl ShellCapability {
    #[must_use]
    pub const fn posix() -> Self {
        Self {
            kind: ShellKind::Posix,
            version: None,
            supports_native_connectors: true,
        }
    }

    /// cmd.exe, which hands translated lines to Windows PowerShell.
    #[must_use]
    pub const fn console_legacy() -> Self {
        Self {
            kind: ShellKind::ConsoleLegacy,
            version: None,
            supports_native_connectors: false,
        }
    }

    /// PowerShell. `&&`/`||` only exist from major version 7; an unknown
    /// version counts as unsupported.
    #[must_use]
    pub fn modern(version: Option<u32>) -> Self {
        Self {
            kind: ShellKind::ShellModern,
            version,
            supports_native_connectors: version.is_some_and(|v| v >= 7),
        }
    }

    /// Whether lines must be rewritten at all.
    #[must_use]
    pub fn translates(&self) -> bool {
        self.kind != ShellKind::Posix
    }

    fn modern_at_least(&self, major: u32) -> bool {
        self.kind == ShellKind::ShellModern && self.version.is_some_and(|v| v >= major)
    }

    /// Executable used to re-enter PowerShell (elevation, legacy wrapping).
    #[must_use]
    pub fn powershell_executable(&self) -> &'static str {
        if self.modern_at_least(6) {
            "pwsh"
        } else {
            "powershell"
        }
    }

    /// `Select-String -Raw` exists from PowerShell 7.
    #[must_use]
    pub fn has_raw_select_string(&self) -> bool {
        self.modern_at_least(7)
    }

    /// `Get-Uptime` exists from PowerShell 6.
    #[must_use]
    pub fn has_get_uptime(&self) -> bool {
        self.modern_at_least(6)
    }
}

impl Default for ShellCapability {
    fn default() -> Self {
        Self::posix()
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("`{0}` not found on PATH")]
    NotFound(String),
    #[error("failed to run `{exe}`: {source}")]
    Spawn {
        exe: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{0}` did not answer within {1:?}")]
    Timeout(String, Duration),
    #[error("unexpected version output: {0:?}")]
    Malformed(String),
}

/// Everything resolution needs from the host, so tests can fake it.
pub trait CapabilityProvider {
    fn var(&self, key: &str) -> Option<String>;

    fn locate(&self, exe: &str) -> bool;

    /// Major version of a PowerShell executable, `None` when unknown.
    fn probe_version(&self, exe: &str) -> Option<u32>;
}

/// Reads the real environment and spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemProvider {
    timeout: Duration,
}

impl Default for SystemProvider {
    fn default() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }
}

impl SystemProvider {
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CapabilityProvider for SystemProvider {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn locate(&self, exe: &str) -> bool {
        which::which(exe).is_ok()
    }

    fn probe_version(&self, exe: &str) -> Option<u32> {
        match probe(exe, self.timeout) {
            Ok(version) => {
                debug!("Probed {} major version {}", exe, version);
                Some(version)
            }
            Err(e) => {
                debug!("Version probe failed, treating as unknown: {}", e);
                None
            }
        }
    }
}

/// Ask a PowerShell executable for its major version, bounded by `timeout`.
///
/// # Errors
/// Returns an error if the executable is missing, cannot be spawned, does
/// not exit in time, or prints something that is not an integer.
pub fn probe(exe: &str, timeout: Duration) -> Result<u32, ProbeError> {
    let path = which::which(exe).map_err(|_| ProbeError::NotFound(exe.to_string()))?;

    let mut child = Command::new(path)
        .args(["-NoLogo", "-NoProfile", "-Command", "$PSVersionTable.PSVersion.Major"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ProbeError::Spawn {
            exe: exe.to_string(),
            source,
        })?;

    // Drain stdout while waiting so a chatty child never fills the pipe.
    let reader = child.stdout.take().map(|mut stdout| {
        thread::spawn(move || {
            let mut output = String::new();
            stdout.read_to_string(&mut output).map(|_| output)
        })
    });

    let spawn_error = |source| ProbeError::Spawn {
        exe: exe.to_string(),
        source,
    };
    if child.wait_timeout(timeout).map_err(spawn_error)?.is_none() {
        let _ = child.kill();
        let _ = child.wait();
        return Err(ProbeError::Timeout(exe.to_string(), timeout));
    }

    let output = match reader.map(thread::JoinHandle::join) {
        Some(Ok(read)) => read.map_err(spawn_error)?,
        Some(Err(_)) | None => String::new(),
    };
    parse_version(&output)
}

/// Parse the first non-empty line of probe output as a major version.
///
/// # Errors
/// Returns [`ProbeError::Malformed`] when that line is not an integer.
pub fn parse_version(output: &str) -> Result<u32, ProbeError> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    line.parse()
        .map_err(|_| ProbeError::Malformed(line.to_string()))
}

enum Override {
    Posix,
    Console,
    Versioned(&'static str),
}

fn parse_override(name: &str) -> Option<Override> {
    let name = name.trim().to_ascii_lowercase();
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    match name {
        "posix" | "sh" | "bash" | "zsh" | "dash" | "ksh" => Some(Override::Posix),
        "cmd" | "console" => Some(Override::Console),
        "pwsh" => Some(Override::Versioned("pwsh")),
        "powershell" => Some(Override::Versioned("powershell")),
        _ => None,
    }
}

fn from_override(provider: &dyn CapabilityProvider, target: Override) -> ShellCapability {
    match target {
        Override::Posix => ShellCapability::posix(),
        Override::Console => ShellCapability::console_legacy(),
        Override::Versioned(exe) => ShellCapability::modern(provider.probe_version(exe)),
    }
}

/// Resolve against the real host with no explicit override.
#[must_use]
pub fn resolve() -> ShellCapability {
    resolve_with(&SystemProvider::default(), None, None)
}

/// Resolve the target shell.
///
/// `explicit` (command line) beats the `CMDX_SHELL` variable, which beats
/// `configured` (config file). Unrecognized names fall through to
/// detection.
#[must_use]
pub fn resolve_with(
    provider: &dyn CapabilityProvider,
    explicit: Option<&str>,
    configured: Option<&str>,
) -> ShellCapability {
    let env_override = provider.var(OVERRIDE_VAR);
    let candidates = [explicit, env_override.as_deref(), configured];

    for name in candidates.into_iter().flatten() {
        match parse_override(name) {
            Some(target) => {
                let capability = from_override(provider, target);
                info!("Target shell from override `{}`: {:?}", name, capability);
                return capability;
            }
            None => warn!("Ignoring unknown shell override `{}`", name),
        }
    }

    let capability = detect(provider);
    info!("Detected target shell: {:?}", capability);
    capability
}

fn detect(provider: &dyn CapabilityProvider) -> ShellCapability {
    if provider.var("PSModulePath").is_some() {
        let exe = if provider.locate("pwsh") { "pwsh" } else { "powershell" };
        return ShellCapability::modern(provider.probe_version(exe));
    }
    // A POSIX shell path wins over cmd.exe leftovers (e.g. Git Bash on Windows).
    if provider.var("SHELL").is_some() {
        return ShellCapability::posix();
    }
    if provider.var("PROMPT").is_some() && provider.var("ComSpec").is_some() {
        return ShellCapability::console_legacy();
    }
    ShellCapability::posix()
}
