//! Command-specific translators.
//!
//! These cover commands whose meaning cannot be carried by flag
//! substitution alone. A bespoke rule always shadows the generic table for
//! its name.

mod files;
mod system;
mod text;

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::dispatch::{Dispatcher, Invocation};
use super::roles::Role;

pub type TranslateFn = fn(&Invocation<'_>, &Dispatcher<'_>) -> Option<String>;

/// Which of an invocation's flags belong to the command itself.
#[derive(Debug, Clone, Copy)]
pub enum FlagScope {
    /// Every flag.
    Whole,
    /// Flags before the wrapped command, skipping values of `valued` flags.
    UntilCommand(&'static [&'static str]),
    /// Flags up to and including this predicate.
    Through(&'static str),
}

pub struct BespokeRule {
    pub name: &'static str,
    pub description: &'static str,
    /// Accepted flags. `-#` stands for any `-<digits>`, a trailing `*`
    /// accepts any suffix, and short clusters are checked per character.
    pub allowed_flags: &'static [&'static str],
    pub scope: FlagScope,
    pub translate: TranslateFn,
}

impl std::fmt::Debug for BespokeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BespokeRule")
            .field("name", &self.name)
            .field("allowed_flags", &self.allowed_flags)
            .finish_non_exhaustive()
    }
}

fn flag_matches(allowed: &str, flag: &str) -> bool {
    if allowed == "-#" {
        return flag.len() > 1 && flag[1..].bytes().all(|b| b.is_ascii_digit());
    }
    match allowed.strip_suffix('*') {
        Some(prefix) => flag.starts_with(prefix),
        None => allowed == flag,
    }
}

impl BespokeRule {
    #[must_use]
    pub fn accepts_flag(&self, flag: &str) -> bool {
        if self.allowed_flags.iter().any(|allowed| flag_matches(allowed, flag)) {
            return true;
        }
        let Some(cluster) = flag.strip_prefix('-') else {
            return false;
        };
        if cluster.starts_with('-') || cluster.chars().count() < 2 {
            return false;
        }
        cluster.chars().all(|c| {
            let single = format!("-{c}");
            self.allowed_flags.iter().any(|allowed| flag_matches(allowed, &single))
        })
    }

    /// Flags owned by this command according to its scope.
    #[must_use]
    pub fn own_flags<'a>(&self, invocation: &Invocation<'a>) -> Vec<&'a str> {
        match self.scope {
            FlagScope::Whole => invocation.flags().collect(),
            FlagScope::UntilCommand(valued) => {
                let end = invocation
                    .command_index(valued)
                    .unwrap_or(invocation.words.len());
                invocation.words[..end]
                    .iter()
                    .filter(|t| t.role == Role::Flag)
                    .map(|&t| t.value())
                    .collect()
            }
            FlagScope::Through(stop) => {
                let mut flags = Vec::new();
                for flag in invocation.flags() {
                    flags.push(flag);
                    if flag == stop {
                        break;
                    }
                }
                flags
            }
        }
    }

    /// Owned flags this rule cannot translate.
    #[must_use]
    pub fn unsupported_flags<'a>(&self, invocation: &Invocation<'a>) -> Vec<&'a str> {
        self.own_flags(invocation)
            .into_iter()
            .filter(|flag| !self.accepts_flag(flag))
            .collect()
    }
}

macro_rules! rule {
    ($name:literal, $desc:literal, $flags:expr, $scope:expr, $func:path) => {
        BespokeRule {
            name: $name,
            description: $desc,
            allowed_flags: $flags,
            scope: $scope,
            translate: $func,
        }
    };
}

use FlagScope::{Through, UntilCommand, Whole};

static BESPOKE_RULES: &[BespokeRule] = &[
    // text
    rule!("head", "First lines of input", &["-#", "-n*", "-c*", "--lines=*", "-q"], Whole, text::head),
    rule!("tail", "Last lines of input", &["-#", "-n*", "-c*", "--lines=*", "-f", "-F", "-q"], Whole, text::tail),
    rule!("wc", "Count lines, words or characters", &["-l", "-w", "-c", "-m"], Whole, text::wc),
    rule!("sed", "Stream editor", &["-n", "-e", "-E", "-r", "-i"], Whole, text::sed),
    rule!("awk", "Field extraction", &["-F*"], Whole, text::awk),
    rule!("cut", "Select fields", &["-d*", "-f*"], Whole, text::cut),
    rule!("tr", "Translate or delete characters", &["-d"], Whole, text::tr),
    rule!("nl", "Number lines", &["-ba"], Whole, text::nl),
    rule!(
        "grep",
        "Search for a pattern",
        &["-i", "-v", "-c", "-l", "-n", "-r", "-R", "-E", "-F", "-w", "-e", "--color*"],
        Whole,
        text::grep
    ),
    rule!("less", "Page through input", &["-R", "-S"], Whole, text::pager),
    rule!("more", "Page through input", &[], Whole, text::pager),
    // files
    rule!("rsync", "Recursive copy", &["-a", "-r", "-v", "-z", "-h", "-P", "--progress"], Whole, files::rsync),
    rule!("du", "Disk usage", &["-s", "-h", "-a", "-c"], Whole, files::du),
    rule!("chmod", "Change permissions", &["-R", "-v"], Whole, files::chmod),
    rule!("chown", "Change owner", &["-R", "-v"], Whole, files::chown),
    rule!("ln", "Create links", &["-s", "-f"], Whole, files::ln),
    rule!(
        "find",
        "Search a directory tree",
        &["-name", "-iname", "-type", "-maxdepth", "-delete", "-print", "-exec"],
        Through("-exec"),
        files::find
    ),
    rule!("gzip", "Compress files", &["-k", "-d", "-f"], Whole, files::gzip),
    rule!("gunzip", "Decompress files", &["-k", "-f"], Whole, files::gunzip),
    rule!("mktemp", "Create a temporary file", &["-d", "-t"], Whole, files::mktemp),
    rule!("rmdir", "Remove an empty directory", &["-v"], Whole, files::rmdir),
    // system
    rule!("systemctl", "Manage services", &["--no-pager", "-q"], Whole, system::systemctl),
    rule!("ping", "Test reachability", &["-c*", "-q"], Whole, system::ping),
    rule!("top", "Busiest processes", &["-b", "-n*"], Whole, system::top),
    rule!("netstat", "Network connections", &["-t", "-u", "-l", "-n", "-p", "-a"], Whole, system::netstat),
    rule!("dig", "DNS lookup", &[], Whole, system::dig),
    rule!("uptime", "Time since boot", &["-p", "-s"], Whole, system::uptime),
    rule!("free", "Memory usage", &["-b", "-k", "-m", "-g", "-h"], Whole, system::free),
    rule!("whoami", "Current user name", &[], Whole, system::whoami),
    rule!("sleep", "Pause", &[], Whole, system::sleep),
    rule!("sudo", "Run elevated", &["-E", "-H"], UntilCommand(&[]), system::sudo),
    rule!("xargs", "Run a command per input item", &["-0", "-I", "-n*", "-r"], UntilCommand(&["-I", "-n"]), system::xargs),
    rule!("export", "Set environment variables", &["-p"], Whole, system::export),
    rule!("unset", "Remove environment variables", &["-v"], Whole, system::unset),
];

static INDEX: Lazy<HashMap<&'static str, &'static BespokeRule>> =
    Lazy::new(|| BESPOKE_RULES.iter().map(|rule| (rule.name, rule)).collect());

#[must_use]
pub fn lookup(name: &str) -> Option<&'static BespokeRule> {
    INDEX.get(name).copied()
}

/// All bespoke rules, in table order.
#[must_use]
pub fn rules() -> &'static [BespokeRule] {
    BESPOKE_RULES
}

/// Single-quoted PowerShell literal.
#[must_use]
pub(crate) fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Strip one layer of matching quotes from a shell word.
#[must_use]
pub(crate) fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 && bytes[0] == bytes[bytes.len() - 1] {
        let inner = &value[1..value.len() - 1];
        match bytes[0] {
            b'\'' => return inner.to_string(),
            b'"' => return inner.replace("\\\"", "\"").replace("\\\\", "\\"),
            _ => {}
        }
    }
    value.to_string()
}

/// Feed `files` into `body` through `Get-Content`, or leave `body` reading
/// the pipeline when there are none.
#[must_use]
pub(crate) fn with_input(files: &[&str], body: String) -> String {
    if files.is_empty() {
        body
    } else {
        format!("Get-Content {} | {}", files.join(", "), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("head").map(|r| r.name), Some("head"));
        assert!(lookup("ls").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        assert_eq!(INDEX.len(), BESPOKE_RULES.len());
    }

    #[test]
    fn test_accepts_flag_patterns() {
        let head = lookup("head").unwrap();
        assert!(head.accepts_flag("-5"));
        assert!(head.accepts_flag("-n"));
        assert!(head.accepts_flag("-n20"));
        assert!(head.accepts_flag("--lines=3"));
        assert!(!head.accepts_flag("-z"));

        let grep = lookup("grep").unwrap();
        assert!(grep.accepts_flag("-rn"));
        assert!(grep.accepts_flag("--color=auto"));
        assert!(!grep.accepts_flag("-rz"));
        assert!(!grep.accepts_flag("--fixed"));
    }

    #[test]
    fn test_quote_helpers() {
        assert_eq!(ps_quote("it's"), "'it''s'");
        assert_eq!(unquote("'a b'"), "a b");
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_with_input() {
        assert_eq!(with_input(&[], "Sort-Object".into()), "Sort-Object");
        assert_eq!(with_input(&["a", "b"], "Sort-Object".into()), "Get-Content a, b | Sort-Object");
    }
}
