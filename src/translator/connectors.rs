//! `&&`/`||` emulation for targets without native short-circuit operators.
//!
//! The rewritten chain records each link's status in a variable, so a
//! skipped link leaves the status of the last link that ran:
//! `a && b || c` becomes
//! `a; $cmdxOk = $?; if ($cmdxOk) { b; $cmdxOk = $? }; if (-not $cmdxOk) { c }`.

use tracing::trace;

use super::segment::{split_connectors, Connector, Segment};
use crate::capability::ShellCapability;

const STATUS_VAR: &str = "$cmdxOk";

pub const DESCRIPTION: &str = "Emulate && and || with $?";

/// Rewrite connectors of an already translated line when `capability`
/// lacks them. Lines without connectors come back unchanged.
#[must_use]
pub fn emulate(line: &str, capability: &ShellCapability) -> String {
    if capability.supports_native_connectors {
        return line.to_string();
    }

    let mut links: Vec<(Option<Connector>, String)> = Vec::new();
    let mut pending = None;
    for segment in split_connectors(line) {
        match segment {
            Segment::Connector(connector) => pending = Some(connector),
            Segment::Commands(text) => {
                // A leading connector has no status to test.
                let guard = if links.is_empty() { None } else { pending.take() };
                links.push((guard, text));
            }
        }
    }
    if links.len() < 2 {
        return line.to_string();
    }

    trace!("Emulating {} connector links", links.len() - 1);
    let last = links.len() - 1;
    let mut out = String::new();
    for (i, (guard, text)) in links.iter().enumerate() {
        let record = if i < last {
            format!("; {STATUS_VAR} = $?")
        } else {
            String::new()
        };
        match guard {
            None if i == 0 => out.push_str(&format!("{text}{record}")),
            None => out.push_str(&format!("; {text}{record}")),
            Some(Connector::And) => out.push_str(&format!("; if ({STATUS_VAR}) {{ {text}{record} }}")),
            Some(Connector::Or) => {
                out.push_str(&format!("; if (-not {STATUS_VAR}) {{ {text}{record} }}"));
            }
        }
    }
    out
}
