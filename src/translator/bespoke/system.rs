//! Service, network, process and environment translators, plus the
//! wrappers (`sudo`, `xargs`) that dispatch their inner command again.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{ps_quote, unquote};
use crate::translator::dispatch::{Dispatcher, Invocation};

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:\{([A-Za-z_]\w*)\}|([A-Za-z_]\w*))").unwrap());

const RECORD_TYPES: &[&str] = &["A", "AAAA", "MX", "NS", "TXT", "CNAME", "SOA", "PTR", "SRV", "ANY"];

const OS_INFO: &str = "Get-CimInstance -ClassName Win32_OperatingSystem";

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn systemctl(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&[]);
    let (action, units) = positionals.split_first()?;
    if units.is_empty() {
        return None;
    }
    let names = units
        .iter()
        .map(|&unit| unit.strip_suffix(".service").unwrap_or(unit))
        .collect::<Vec<_>>()
        .join(", ");

    let body = match *action {
        "start" => format!("Start-Service -Name {names}"),
        "stop" => format!("Stop-Service -Name {names}"),
        "restart" => format!("Restart-Service -Name {names}"),
        "reload" => format!("Restart-Service -Name {names} -Force"),
        "status" => format!("Get-Service -Name {names}"),
        "enable" => format!("Get-Service -Name {names} | Set-Service -StartupType Automatic"),
        "disable" => format!("Get-Service -Name {names} | Set-Service -StartupType Disabled"),
        _ => return None,
    };
    Some(inv.finish(body))
}

pub(super) fn ping(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&["-c"]);
    let [host] = positionals.as_slice() else {
        return None;
    };
    let count = match inv.option_value("-c") {
        Some(count) => format!(" -Count {}", count.parse::<u32>().ok()?),
        None => String::new(),
    };
    Some(inv.finish(format!("Test-Connection -ComputerName {host}{count}")))
}

pub(super) fn top(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    if !inv.positionals(&["-n"]).is_empty() {
        return None;
    }
    Some(inv.finish(
        "Get-Process | Sort-Object -Property CPU -Descending | Select-Object -First 20".to_string(),
    ))
}

pub(super) fn netstat(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    if !inv.positionals(&[]).is_empty() {
        return None;
    }
    let tcp = if inv.has_short('l') {
        "Get-NetTCPConnection -State Listen"
    } else {
        "Get-NetTCPConnection"
    };
    let body = match (inv.has_short('t'), inv.has_short('u')) {
        (false, true) => "Get-NetUDPEndpoint".to_string(),
        (true, true) => format!("@({tcp}) + @(Get-NetUDPEndpoint)"),
        _ => tcp.to_string(),
    };
    Some(inv.finish(body))
}

pub(super) fn dig(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let mut name = None;
    let mut record = None;
    let mut server = None;
    let mut short = false;

    for word in inv.positionals(&[]) {
        let upper = word.to_ascii_uppercase();
        if let Some(address) = word.strip_prefix('@') {
            server = Some(address);
        } else if word == "+short" {
            short = true;
        } else if word.starts_with('+') {
            continue;
        } else if RECORD_TYPES.contains(&upper.as_str()) && name.is_some() {
            record = Some(upper);
        } else if name.is_none() {
            name = Some(word);
        } else {
            return None;
        }
    }

    let mut body = format!("Resolve-DnsName -Name {}", name?);
    if let Some(record) = record {
        body.push_str(&format!(" -Type {record}"));
    }
    if let Some(server) = server {
        body.push_str(&format!(" -Server {server}"));
    }
    if short {
        body.push_str(" | Where-Object IPAddress | Select-Object -ExpandProperty IPAddress");
    }
    Some(inv.finish(body))
}

pub(super) fn uptime(inv: &Invocation<'_>, dispatcher: &Dispatcher<'_>) -> Option<String> {
    if !inv.positionals(&[]).is_empty() {
        return None;
    }
    let native = dispatcher.capability().has_get_uptime();
    let body = match (inv.has_short('s'), native) {
        (true, true) => "Get-Uptime -Since".to_string(),
        (true, false) => format!("({OS_INFO}).LastBootUpTime"),
        (false, true) => "Get-Uptime".to_string(),
        (false, false) => format!("(Get-Date) - ({OS_INFO}).LastBootUpTime"),
    };
    Some(inv.finish(body))
}

pub(super) fn free(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    if !inv.positionals(&[]).is_empty() {
        return None;
    }
    let divisor = match inv.short_chars().last() {
        Some('b') => "1",
        Some('m') => "1MB",
        Some('g' | 'h') => "1GB",
        _ => "1KB",
    };
    let column = |name: &str, kilobytes: &str| {
        format!(
            "@{{Name='{name}'; Expression={{ [math]::Round(({kilobytes}) * 1KB / {divisor}, 2) }}}}"
        )
    };
    Some(inv.finish(format!(
        "{OS_INFO} | Select-Object {}, {}, {}",
        column("Total", "$_.TotalVisibleMemorySize"),
        column("Used", "$_.TotalVisibleMemorySize - $_.FreePhysicalMemory"),
        column("Free", "$_.FreePhysicalMemory")
    )))
}

pub(super) fn whoami(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    if !inv.words.is_empty() {
        return None;
    }
    Some(inv.finish("[Environment]::UserName".to_string()))
}

/// Seconds in `5`, `0.5`, `2m`, `1h` or `1d`.
fn duration_millis(word: &str) -> Option<u64> {
    let (number, scale) = match word.char_indices().last()? {
        (i, 's') => (&word[..i], 1.0),
        (i, 'm') => (&word[..i], 60.0),
        (i, 'h') => (&word[..i], 3600.0),
        (i, 'd') => (&word[..i], 86400.0),
        _ => (word, 1.0),
    };
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let millis = (value * scale * 1000.0).round();
    // 2^64 is exact as f64; anything at or past it cannot be held.
    if millis >= u64::MAX as f64 {
        return None;
    }
    Some(millis as u64)
}

pub(super) fn sleep(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let durations = inv.positionals(&[]);
    if durations.is_empty() {
        return None;
    }
    let mut total = 0u64;
    for word in durations {
        total = total.checked_add(duration_millis(word)?)?;
    }
    let body = if total % 1000 == 0 {
        format!("Start-Sleep -Seconds {}", total / 1000)
    } else {
        format!("Start-Sleep -Milliseconds {total}")
    };
    Some(inv.finish(body))
}

pub(super) fn sudo(inv: &Invocation<'_>, dispatcher: &Dispatcher<'_>) -> Option<String> {
    let line = inv.text_from(inv.command_index(&[])?)?;
    let inner = dispatcher.translate_nested(line)?;
    let exe = dispatcher.capability().powershell_executable();
    Some(inv.finish(format!(
        "Start-Process -FilePath {exe} -Verb RunAs -Wait -ArgumentList '-NoProfile', '-Command', {}",
        ps_quote(&inner)
    )))
}

pub(super) fn xargs(inv: &Invocation<'_>, dispatcher: &Dispatcher<'_>) -> Option<String> {
    let line = match inv.command_index(&["-I", "-n"]) {
        Some(index) => {
            let command = inv.text_from(index)?;
            match inv.option_value("-I") {
                Some(placeholder) => command.replace(placeholder, "$_"),
                None => format!("{command} $_"),
            }
        }
        None => "echo $_".to_string(),
    };
    let inner = dispatcher.translate_nested(&line)?;
    let source = if inv.has_flag("-0") {
        "ForEach-Object { $_ -split \"`0\" } | Where-Object { $_ } | "
    } else {
        ""
    };
    Some(inv.finish(format!("{source}ForEach-Object {{ {inner} }}")))
}

/// Right-hand side of an assignment as a PowerShell string. Single quotes
/// stay literal; `$NAME` and `${NAME}` become environment reads.
fn env_value(raw: &str) -> Option<String> {
    let value = unquote(raw);
    if raw.starts_with('\'') || !value.contains('$') {
        return Some(ps_quote(&value));
    }
    if value.contains("$(") || value.contains('`') {
        return None;
    }
    let expanded = ENV_REF.replace_all(&value, |caps: &Captures<'_>| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("${{env:{name}}}")
    });
    Some(format!("\"{}\"", expanded.replace('"', "`\"")))
}

pub(super) fn export(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    if inv.has_flag("-p") {
        return (inv.words.len() == 1).then(|| inv.finish("Get-ChildItem Env:".to_string()));
    }
    let assignments = inv.positionals(&[]);
    if assignments.is_empty() {
        return None;
    }
    let mut statements = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let (name, raw) = assignment.split_once('=')?;
        if !is_identifier(name) {
            return None;
        }
        statements.push(format!("$env:{name} = {}", env_value(raw)?));
    }
    Some(inv.finish(statements.join("; ")))
}

pub(super) fn unset(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let names = inv.positionals(&[]);
    if names.is_empty() || !names.iter().all(|name| is_identifier(name)) {
        return None;
    }
    let statements: Vec<String> = names
        .iter()
        .map(|name| format!("Remove-Item Env:{name} -ErrorAction SilentlyContinue"))
        .collect();
    Some(inv.finish(statements.join("; ")))
}
