//! Table-driven command mappings.
//!
//! A [`RuleTable`] is the built-in generic table plus an overlay supplied
//! at startup. It is built once and only read afterwards. On a name
//! collision the first registration wins: later records are dropped, never
//! merged or overwritten.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

use super::bespoke;

/// A generic flag-substitution rule for one Unix command.
///
/// `flag_table` maps a Unix flag to its target spelling. An empty value
/// drops the flag. A flag missing from the table is unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMapping {
    pub unix_name: String,
    pub target_verb: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flag_table: BTreeMap<String, String>,
    #[serde(default)]
    pub requires_arguments: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule has an empty command name")]
    EmptyName,
    #[error("rule for `{0}` has an empty target verb")]
    EmptyTarget(String),
    #[error("rule name `{0}` contains whitespace")]
    InvalidName(String),
}

impl CommandMapping {
    /// Check that a mapping can be registered.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.unix_name.is_empty() {
            return Err(RuleError::EmptyName);
        }
        if self.unix_name.chars().any(char::is_whitespace) {
            return Err(RuleError::InvalidName(self.unix_name.clone()));
        }
        if self.target_verb.trim().is_empty() {
            return Err(RuleError::EmptyTarget(self.unix_name.clone()));
        }
        Ok(())
    }
}

struct BuiltinMapping {
    unix: &'static str,
    target: &'static str,
    description: &'static str,
    flags: &'static [(&'static str, &'static str)],
    requires_args: bool,
}

const RECURSE_FORCE: &str = "-Recurse -Force";

static BUILTIN_MAPPINGS: &[BuiltinMapping] = &[
    BuiltinMapping {
        unix: "ls",
        target: "Get-ChildItem",
        description: "List directory contents",
        flags: &[
            ("-a", "-Force"),
            ("-A", "-Force"),
            ("-l", ""),
            ("-h", ""),
            ("-la", "-Force"),
            ("-al", "-Force"),
            ("-lh", ""),
            ("-lah", "-Force"),
            ("-R", "-Recurse"),
            ("-1", "-Name"),
        ],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "cat",
        target: "Get-Content",
        description: "Display file contents",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "rm",
        target: "Remove-Item",
        description: "Remove files",
        flags: &[
            ("-r", "-Recurse"),
            ("-R", "-Recurse"),
            ("-f", "-Force"),
            ("-rf", RECURSE_FORCE),
            ("-fr", RECURSE_FORCE),
            ("-Rf", RECURSE_FORCE),
            ("-i", "-Confirm"),
            ("-v", "-Verbose"),
            ("-d", ""),
        ],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "cp",
        target: "Copy-Item",
        description: "Copy files",
        flags: &[
            ("-r", "-Recurse"),
            ("-R", "-Recurse"),
            ("-a", "-Recurse"),
            ("-f", "-Force"),
            ("-rf", RECURSE_FORCE),
            ("-v", "-Verbose"),
            ("-i", "-Confirm"),
        ],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "mv",
        target: "Move-Item",
        description: "Move/rename files",
        flags: &[("-f", "-Force"), ("-v", "-Verbose"), ("-i", "-Confirm")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "mkdir",
        target: "New-Item -ItemType Directory",
        description: "Create directories",
        flags: &[("-p", "-Force"), ("-v", "-Verbose")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "touch",
        target: "New-Item -ItemType File",
        description: "Create empty file",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "pwd",
        target: "Get-Location",
        description: "Print working directory",
        flags: &[("-L", ""), ("-P", "")],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "cd",
        target: "Set-Location",
        description: "Change directory",
        flags: &[],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "clear",
        target: "Clear-Host",
        description: "Clear screen",
        flags: &[],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "echo",
        target: "Write-Output",
        description: "Print arguments",
        flags: &[("-e", ""), ("-E", "")],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "which",
        target: "Get-Command",
        description: "Locate command",
        flags: &[("-a", "-All")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "ps",
        target: "Get-Process",
        description: "List processes",
        flags: &[("-e", ""), ("-A", ""), ("-ef", ""), ("-f", "")],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "kill",
        target: "Stop-Process",
        description: "Terminate process",
        flags: &[("-9", "-Force"), ("-KILL", "-Force"), ("-15", ""), ("-TERM", "")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "df",
        target: "Get-PSDrive -PSProvider FileSystem",
        description: "Display disk space",
        flags: &[("-h", ""), ("-H", ""), ("-k", "")],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "sort",
        target: "Sort-Object",
        description: "Sort lines",
        flags: &[("-r", "-Descending"), ("-u", "-Unique"), ("-n", ""), ("-f", "")],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "uniq",
        target: "Get-Unique",
        description: "Drop adjacent duplicate lines",
        flags: &[],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "tee",
        target: "Tee-Object",
        description: "Copy input to a file",
        flags: &[("-a", "-Append")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "curl",
        target: "Invoke-WebRequest",
        description: "Transfer a URL",
        flags: &[
            ("-s", ""),
            ("-S", ""),
            ("-L", ""),
            ("-sSL", ""),
            ("-fsSL", ""),
            ("-o", "-OutFile"),
            ("-I", "-Method Head"),
            ("-X", "-Method"),
        ],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "wget",
        target: "Invoke-WebRequest",
        description: "Download a URL",
        flags: &[("-O", "-OutFile"), ("-q", "")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "man",
        target: "Get-Help",
        description: "Show help for a command",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "env",
        target: "Get-ChildItem Env:",
        description: "List environment variables",
        flags: &[],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "printenv",
        target: "Get-ChildItem Env:",
        description: "List environment variables",
        flags: &[],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "date",
        target: "Get-Date",
        description: "Show the current date",
        flags: &[("-u", "-AsUTC")],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "history",
        target: "Get-History",
        description: "Show command history",
        flags: &[],
        requires_args: false,
    },
    BuiltinMapping {
        unix: "basename",
        target: "Split-Path -Leaf",
        description: "Strip directory from a path",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "dirname",
        target: "Split-Path -Parent",
        description: "Strip last component from a path",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "realpath",
        target: "Resolve-Path",
        description: "Print the resolved path",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "stat",
        target: "Get-Item",
        description: "Show file status",
        flags: &[],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "unzip",
        target: "Expand-Archive",
        description: "Extract a zip archive",
        flags: &[("-o", "-Force"), ("-d", "-DestinationPath"), ("-q", "")],
        requires_args: true,
    },
    BuiltinMapping {
        unix: "source",
        target: ".",
        description: "Run a script in the current shell",
        flags: &[],
        requires_args: true,
    },
];

static BUILTIN_RULES: Lazy<Vec<CommandMapping>> = Lazy::new(|| {
    BUILTIN_MAPPINGS
        .iter()
        .map(|m| CommandMapping {
            unix_name: m.unix.to_string(),
            target_verb: m.target.to_string(),
            description: m.description.to_string(),
            flag_table: m
                .flags
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
            requires_arguments: m.requires_args,
        })
        .collect()
});

/// Read-only lookup over built-in and overlay mappings.
#[derive(Debug, Clone)]
pub struct RuleTable {
    mappings: Vec<CommandMapping>,
    index: HashMap<String, usize>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTable {
    /// The built-in table with no overlay.
    #[must_use]
    pub fn builtin() -> Self {
        Self::with_overlay(Vec::new())
    }

    /// Built-in mappings followed by `overlay`, in order. Invalid records
    /// and names that are already registered are skipped.
    #[must_use]
    pub fn with_overlay(overlay: impl IntoIterator<Item = CommandMapping>) -> Self {
        let mut table = Self {
            mappings: Vec::with_capacity(BUILTIN_RULES.len()),
            index: HashMap::with_capacity(BUILTIN_RULES.len()),
        };

        for mapping in BUILTIN_RULES.iter().cloned() {
            table.register(mapping);
        }
        for mapping in overlay {
            if let Err(e) = mapping.validate() {
                warn!("Skipping overlay rule: {}", e);
                continue;
            }
            table.register(mapping);
        }

        table
    }

    /// Insert unless the name is taken. Returns whether it was inserted.
    fn register(&mut self, mapping: CommandMapping) -> bool {
        let name = mapping.unix_name.clone();
        if self.index.contains_key(&name) || bespoke::lookup(&name).is_some() {
            debug!("Rule for `{}` already registered, ignoring later one", name);
            return false;
        }
        self.index.insert(name, self.mappings.len());
        self.mappings.push(mapping);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandMapping> {
        self.index.get(name).map(|&i| &self.mappings[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Mappings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandMapping> {
        self.mappings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
