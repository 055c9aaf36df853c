//! Text filters: head, tail, wc, sed, awk, cut, tr, nl, grep and pagers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ps_quote, unquote, with_input};
use crate::translator::dispatch::{Dispatcher, Invocation};

static AWK_PRINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\s*print\s+\$(\d+)\s*;?\s*\}$").unwrap());

static SED_PRINT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+|\$)(?:,(\d+|\$))?p$").unwrap());

/// Widest field list `cut` rewrites. Each field becomes one `$f[i]` pick.
const MAX_FIELDS: usize = 256;

/// Largest character set `tr` expands into a class.
const MAX_SET: usize = 1024;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const CLASSES: &[(&str, &str)] = &[
    ("[:lower:]", LOWER),
    ("[:upper:]", UPPER),
    ("[:digit:]", "0123456789"),
    ("[:space:]", " \t\n\r"),
];

/// Count from `-n N`, `-nN`, `--lines=N`, `-c N`, `-cN` or `-N`. The value
/// is returned as written, so a negative count never parses.
fn count_option<'a>(inv: &Invocation<'a>) -> Option<&'a str> {
    inv.option_value("-n")
        .or_else(|| inv.option_value("--lines"))
        .or_else(|| inv.option_value("-c"))
        .or_else(|| {
            inv.flags().find_map(|f| {
                f.strip_prefix('-')
                    .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
        })
}

pub(super) fn head(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let count: u64 = count_option(inv)?.parse().ok()?;
    let files = inv.positionals(&["-n", "-c"]);
    Some(inv.finish(with_input(&files, format!("Select-Object -First {count}"))))
}

pub(super) fn tail(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let files = inv.positionals(&["-n", "-c"]);
    let count = count_option(inv);

    if inv.has_short('f') || inv.has_short('F') {
        let [file] = files.as_slice() else {
            return None;
        };
        let body = match count {
            None => format!("Get-Content {file} -Wait"),
            Some(count) => match count.strip_prefix('+') {
                Some(from) => {
                    let from: u64 = from.parse().ok()?;
                    format!(
                        "Get-Content {file} -Wait | Select-Object -Skip {}",
                        from.saturating_sub(1)
                    )
                }
                None => format!("Get-Content {file} -Wait -Tail {}", count.parse::<u64>().ok()?),
            },
        };
        return Some(inv.finish(body));
    }

    let count = count?;
    let body = match count.strip_prefix('+') {
        Some(from) => {
            let from: u64 = from.parse().ok()?;
            format!("Select-Object -Skip {}", from.saturating_sub(1))
        }
        None => format!("Select-Object -Last {}", count.parse::<u64>().ok()?),
    };
    Some(inv.finish(with_input(&files, body)))
}

pub(super) fn wc(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let chars = inv.short_chars();
    let mut measures = Vec::new();
    if chars.contains(&'l') {
        measures.push(("-Line", "Lines"));
    }
    if chars.contains(&'w') {
        measures.push(("-Word", "Words"));
    }
    if chars.contains(&'c') || chars.contains(&'m') {
        measures.push(("-Character", "Characters"));
    }

    let body = match measures.as_slice() {
        [] => "Measure-Object -Line -Word -Character".to_string(),
        [(switch, property)] => {
            format!("Measure-Object {switch} | Select-Object -ExpandProperty {property}")
        }
        many => {
            let switches: Vec<&str> = many.iter().map(|(switch, _)| *switch).collect();
            format!("Measure-Object {}", switches.join(" "))
        }
    };
    Some(inv.finish(with_input(&inv.positionals(&[]), body)))
}

/// Rewrite basic regular expression syntax to the extended form .NET reads.
pub(crate) fn bre_to_ere(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(e @ ('(' | ')' | '{' | '}' | '+' | '?' | '|')) => out.push(e),
                Some(e) => {
                    out.push('\\');
                    out.push(e);
                }
                None => out.push_str("\\\\"),
            },
            '(' | ')' | '{' | '}' | '+' | '?' | '|' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split on `delim`, honoring `\<delim>` escapes.
fn split_unescaped(text: &str, delim: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(e) if e == delim => current.push(e),
                Some(e) => {
                    current.push('\\');
                    current.push(e);
                }
                None => current.push('\\'),
            }
        } else if c == delim {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// sed replacement text to .NET replacement syntax.
fn sed_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d) if d.is_ascii_digit() => out.push_str(&format!("${{{d}}}")),
                Some(e) => out.push(e),
                None => out.push('\\'),
            },
            '&' => out.push_str("${0}"),
            '$' => out.push_str("$$"),
            _ => out.push(c),
        }
    }
    out
}

fn substitute(script: &str, extended: bool) -> Option<String> {
    let mut chars = script.chars();
    if chars.next()? != 's' {
        return None;
    }
    let delim = chars.next()?;
    if delim.is_alphanumeric() || delim.is_whitespace() || delim == '\\' {
        return None;
    }
    let parts = split_unescaped(chars.as_str(), delim);
    let [pattern, replacement, flags] = parts.as_slice() else {
        return None;
    };
    if !flags.chars().all(|c| matches!(c, 'g' | 'i' | 'I')) {
        return None;
    }
    let global = flags.contains('g');
    let ignore_case = flags.contains('i') || flags.contains('I');

    let pattern = if extended {
        pattern.clone()
    } else {
        bre_to_ere(pattern)
    };
    let pattern = ps_quote(&pattern);
    let replacement = ps_quote(&sed_replacement(replacement));

    Some(match (global, ignore_case) {
        (true, false) => format!("ForEach-Object {{ $_ -creplace {pattern}, {replacement} }}"),
        (true, true) => format!("ForEach-Object {{ $_ -replace {pattern}, {replacement} }}"),
        (false, false) => {
            format!("ForEach-Object {{ ([regex]{pattern}).Replace($_, {replacement}, 1) }}")
        }
        (false, true) => format!(
            "ForEach-Object {{ [regex]::new({pattern}, 'IgnoreCase').Replace($_, {replacement}, 1) }}"
        ),
    })
}

/// `Np`, `M,Np` and `$` addresses under `sed -n`.
fn print_lines(script: &str) -> Option<String> {
    let caps = SED_PRINT.captures(script.trim())?;
    let first = caps.get(1)?.as_str();
    match caps.get(2).map(|m| m.as_str()) {
        None if first == "$" => Some("Select-Object -Last 1".to_string()),
        None => {
            let line: usize = first.parse().ok()?;
            Some(format!("Select-Object -Index {}", line.checked_sub(1)?))
        }
        Some("$") => {
            let from: usize = first.parse().ok()?;
            Some(format!("Select-Object -Skip {}", from.checked_sub(1)?))
        }
        Some(last) => {
            let from: usize = first.parse().ok()?;
            let to: usize = last.parse().ok()?;
            if from == 0 || to < from {
                return None;
            }
            Some(format!("Select-Object -Index ({}..{})", from - 1, to - 1))
        }
    }
}

pub(super) fn sed(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&["-e"]);
    let (script, files) = match inv.option_value("-e") {
        Some(script) => (script, positionals.as_slice()),
        None => {
            let (first, rest) = positionals.split_first()?;
            (*first, rest)
        }
    };
    let script = unquote(script);

    let body = if inv.has_short('n') {
        print_lines(&script)?
    } else {
        substitute(&script, inv.has_short('E') || inv.has_short('r'))?
    };

    if inv.has_short('i') {
        let [file] = files else {
            return None;
        };
        return Some(inv.finish(format!("(Get-Content {file}) | {body} | Set-Content {file}")));
    }
    Some(inv.finish(with_input(files, body)))
}

/// Expression splitting `$_` on a literal separator.
fn split_expression(separator: &str) -> String {
    match separator {
        "\\t" | "\t" => "$_.Split(\"`t\")".to_string(),
        sep if sep.chars().count() == 1 => format!("$_.Split({})", ps_quote(sep)),
        sep => format!("($_ -split {})", ps_quote(sep)),
    }
}

pub(super) fn awk(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let separator = inv.option_value("-F").map(unquote);
    let positionals = inv.positionals(&["-F"]);
    let (program, files) = positionals.split_first()?;
    let program = unquote(program);
    let caps = AWK_PRINT.captures(program.trim())?;
    let field: usize = caps.get(1)?.as_str().parse().ok()?;

    let expression = match (field, separator.as_deref()) {
        (0, _) => "$_".to_string(),
        (n, None) => format!("($_.Trim() -split '\\s+')[{}]", n - 1),
        (n, Some(sep)) => format!("{}[{}]", split_expression(sep), n - 1),
    };
    Some(inv.finish(with_input(files, format!("ForEach-Object {{ {expression} }}"))))
}

/// `2`, `1,3` or `2-4` to zero-based indices.
fn field_indices(list: &str) -> Option<Vec<usize>> {
    let mut indices = Vec::new();
    for part in list.split(',') {
        match part.split_once('-') {
            Some((from, to)) => {
                let from: usize = from.parse().ok()?;
                let to: usize = to.parse().ok()?;
                if from == 0 || to < from || to - from >= MAX_FIELDS - indices.len() {
                    return None;
                }
                indices.extend(from - 1..to);
            }
            None => indices.push(part.parse::<usize>().ok()?.checked_sub(1)?),
        }
        if indices.len() > MAX_FIELDS {
            return None;
        }
    }
    Some(indices)
}

pub(super) fn cut(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let indices = field_indices(&unquote(inv.option_value("-f")?))?;
    let delimiter = inv
        .option_value("-d")
        .map(unquote)
        .unwrap_or_else(|| "\t".to_string());
    if delimiter != "\\t" && delimiter.chars().count() != 1 {
        return None;
    }
    let split = split_expression(&delimiter);

    let body = match indices.as_slice() {
        [index] => format!("ForEach-Object {{ {split}[{index}] }}"),
        many => {
            let picks: Vec<String> = many.iter().map(|i| format!("$f[{i}]")).collect();
            let joiner = if split.contains('`') {
                "\"`t\"".to_string()
            } else {
                ps_quote(&delimiter)
            };
            format!(
                "ForEach-Object {{ $f = {split}; ({}) -join {joiner} }}",
                picks.join(", ")
            )
        }
    };
    Some(inv.finish(with_input(&inv.positionals(&["-d", "-f"]), body)))
}

/// Expand `a-z` ranges, `[:class:]` names and `\n`/`\t` escapes.
fn expand_set(set: &str) -> Option<Vec<char>> {
    let mut out = Vec::new();
    let mut rest = set;
    while let Some(c) = rest.chars().next() {
        if let Some((class, members)) = CLASSES.iter().find(|(class, _)| rest.starts_with(class)) {
            out.extend(members.chars());
            rest = &rest[class.len()..];
            continue;
        }

        let (c, len) = if c == '\\' {
            match rest[1..].chars().next() {
                Some('n') => ('\n', 2),
                Some('t') => ('\t', 2),
                Some(e) => (e, 1 + e.len_utf8()),
                None => ('\\', 1),
            }
        } else {
            (c, c.len_utf8())
        };
        rest = &rest[len..];

        let mut ahead = rest.chars();
        if let (Some('-'), Some(end)) = (ahead.next(), ahead.next()) {
            let width = (end as usize).checked_sub(c as usize)?;
            if width >= MAX_SET - out.len().min(MAX_SET) {
                return None;
            }
            out.extend(c..=end);
            rest = &rest[1 + end.len_utf8()..];
        } else {
            out.push(c);
        }
        if out.len() > MAX_SET {
            return None;
        }
    }
    Some(out)
}

fn char_class(chars: &[char]) -> String {
    let mut class = String::from("[");
    for &c in chars {
        match c {
            '\\' | ']' | '[' | '^' | '-' => {
                class.push('\\');
                class.push(c);
            }
            '\n' => class.push_str("\\n"),
            '\t' => class.push_str("\\t"),
            '\r' => class.push_str("\\r"),
            _ => class.push(c),
        }
    }
    class.push(']');
    class
}

fn translate_chars(from: &[char], to: &[char]) -> Option<String> {
    if from.is_empty() || from.len() != to.len() {
        return None;
    }
    let lower: Vec<char> = LOWER.chars().collect();
    let upper: Vec<char> = UPPER.chars().collect();
    if from == lower.as_slice() && to == upper.as_slice() {
        return Some("ForEach-Object { $_.ToUpper() }".to_string());
    }
    if from == upper.as_slice() && to == lower.as_slice() {
        return Some("ForEach-Object { $_.ToLower() }".to_string());
    }

    let from_text: String = from.iter().collect();
    let to_text: String = to.iter().collect();
    if from.len() == 1 {
        return Some(format!(
            "ForEach-Object {{ $_.Replace({}, {}) }}",
            ps_quote(&from_text),
            ps_quote(&to_text)
        ));
    }
    Some(format!(
        "ForEach-Object {{ [regex]::Replace($_, {}, {{ param($m) {}[{}.IndexOf($m.Value)] }}) }}",
        ps_quote(&char_class(from)),
        ps_quote(&to_text),
        ps_quote(&from_text)
    ))
}

pub(super) fn tr(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let sets = inv
        .positionals(&[])
        .iter()
        .map(|set| expand_set(&unquote(set)))
        .collect::<Option<Vec<_>>>()?;

    let body = if inv.has_flag("-d") {
        let [set] = sets.as_slice() else {
            return None;
        };
        if set.is_empty() {
            return None;
        }
        format!("ForEach-Object {{ $_ -creplace {}, '' }}", ps_quote(&char_class(set)))
    } else {
        let [from, to] = sets.as_slice() else {
            return None;
        };
        translate_chars(from, to)?
    };
    Some(inv.finish(body))
}

pub(super) fn nl(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let body = "ForEach-Object -Begin { $n = 0 } -Process { $n++; \"{0,6}`t{1}\" -f $n, $_ }";
    Some(inv.finish(with_input(&inv.positionals(&[]), body.to_string())))
}

pub(super) fn grep(inv: &Invocation<'_>, dispatcher: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&["-e"]);
    let (pattern, paths) = match inv.option_value("-e") {
        Some(pattern) => (pattern, positionals.as_slice()),
        None => {
            let (first, rest) = positionals.split_first()?;
            (*first, rest)
        }
    };
    let chars = inv.short_chars();
    let has = |c: char| chars.contains(&c);

    let literal = has('F');
    let mut pattern = unquote(pattern);
    if has('w') {
        let body = if literal {
            regex::escape(&pattern)
        } else {
            pattern.clone()
        };
        pattern = format!("\\b{body}\\b");
    } else if !literal && !has('E') {
        pattern = bre_to_ere(&pattern);
    }

    let recursive = has('r') || has('R');
    let mut args = vec![format!("-Pattern {}", ps_quote(&pattern))];
    if !has('i') {
        args.push("-CaseSensitive".to_string());
    }
    if has('v') {
        args.push("-NotMatch".to_string());
    }
    if literal && !has('w') {
        args.push("-SimpleMatch".to_string());
    }
    if has('l') {
        args.push("-List".to_string());
    }
    let raw = dispatcher.capability().has_raw_select_string()
        && !recursive
        && paths.len() <= 1
        && !has('n')
        && !has('l')
        && !has('c');
    if raw {
        args.push("-Raw".to_string());
    }
    let args = args.join(" ");

    let mut body = if recursive {
        let root = if paths.is_empty() {
            ".".to_string()
        } else {
            paths.join(", ")
        };
        format!("Get-ChildItem -Path {root} -Recurse -File | Select-String {args}")
    } else if paths.is_empty() {
        format!("Select-String {args}")
    } else {
        format!("Select-String {args} -Path {}", paths.join(", "))
    };
    if has('l') {
        body.push_str(" | Select-Object -ExpandProperty Path");
    } else if has('c') {
        body.push_str(" | Measure-Object | Select-Object -ExpandProperty Count");
    }
    Some(inv.finish(body))
}

pub(super) fn pager(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    Some(inv.finish(with_input(&inv.positionals(&[]), "Out-Host -Paging".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ShellCapability;
    use crate::translator::rules::RuleTable;

    fn translate_on(stage: &str, capability: ShellCapability) -> String {
        let rules = RuleTable::builtin();
        Dispatcher::new(&rules, &capability).translate_stage(stage)
    }

    fn translate(stage: &str) -> String {
        translate_on(stage, ShellCapability::modern(Some(5)))
    }

    #[test]
    fn test_head_counts() {
        assert_eq!(translate("head -5"), "Select-Object -First 5");
        assert_eq!(translate("head -n 3 notes.txt"), "Get-Content notes.txt | Select-Object -First 3");
        assert_eq!(translate("head -n12"), "Select-Object -First 12");
        assert_eq!(translate("head -c 8"), "Select-Object -First 8");
        assert_eq!(translate("head notes.txt"), "head notes.txt");
    }

    #[test]
    fn test_head_negative_count_passes_through() {
        assert_eq!(translate("head -n -5 f"), "head -n -5 f");
        assert_eq!(translate("head -c -8 f"), "head -c -8 f");
    }

    #[test]
    fn test_tail_forms() {
        assert_eq!(translate("tail -2 log"), "Get-Content log | Select-Object -Last 2");
        assert_eq!(translate("tail -n +3"), "Select-Object -Skip 2");
        assert_eq!(translate("tail -f app.log"), "Get-Content app.log -Wait");
        assert_eq!(translate("tail -f -n 20 app.log"), "Get-Content app.log -Wait -Tail 20");
    }

    #[test]
    fn test_tail_follow_from_line() {
        assert_eq!(
            translate("tail -f -n +3 app.log"),
            "Get-Content app.log -Wait | Select-Object -Skip 2"
        );
        assert_eq!(translate("tail -f -n +x app.log"), "tail -f -n +x app.log");
    }

    #[test]
    fn test_wc() {
        assert_eq!(translate("wc -l"), "Measure-Object -Line | Select-Object -ExpandProperty Lines");
        assert_eq!(
            translate("wc -l a.txt"),
            "Get-Content a.txt | Measure-Object -Line | Select-Object -ExpandProperty Lines"
        );
        assert_eq!(translate("wc -lw"), "Measure-Object -Line -Word");
        assert_eq!(translate("wc -x"), "wc -x");
    }

    #[test]
    fn test_sed_substitution() {
        assert_eq!(
            translate("sed 's/foo/bar/g' in.txt"),
            "Get-Content in.txt | ForEach-Object { $_ -creplace 'foo', 'bar' }"
        );
        assert_eq!(
            translate("sed s/a/b/"),
            "ForEach-Object { ([regex]'a').Replace($_, 'b', 1) }"
        );
        assert_eq!(
            translate(r"sed 's|\(x\)+|[\1]|g'"),
            r"ForEach-Object { $_ -creplace '(x)\+', '[${1}]' }"
        );
        assert_eq!(
            translate("sed -E 's/(a)+/&!/gi'"),
            "ForEach-Object { $_ -replace '(a)+', '${0}!' }"
        );
        assert_eq!(translate("sed 's/a/b/x'"), "sed 's/a/b/x'");
        assert_eq!(translate("sed '3d'"), "sed '3d'");
    }

    #[test]
    fn test_sed_print_lines() {
        assert_eq!(translate("sed -n '2p' f"), "Get-Content f | Select-Object -Index 1");
        assert_eq!(translate("sed -n '2,4p'"), "Select-Object -Index (1..3)");
        assert_eq!(translate("sed -n '$p'"), "Select-Object -Last 1");
        assert_eq!(translate("sed -n '0p'"), "sed -n '0p'");
    }

    #[test]
    fn test_sed_in_place() {
        assert_eq!(
            translate("sed -i 's/a/b/g' f.txt"),
            "(Get-Content f.txt) | ForEach-Object { $_ -creplace 'a', 'b' } | Set-Content f.txt"
        );
        assert_eq!(translate("sed -i 's/a/b/g'"), "sed -i 's/a/b/g'");
    }

    #[test]
    fn test_awk_print_field() {
        assert_eq!(
            translate("awk '{print $2}'"),
            "ForEach-Object { ($_.Trim() -split '\\s+')[1] }"
        );
        assert_eq!(translate("awk -F: '{ print $1 }' /etc/passwd"), "Get-Content /etc/passwd | ForEach-Object { $_.Split(':')[0] }");
        assert_eq!(translate("awk '{print $0}'"), "ForEach-Object { $_ }");
        assert_eq!(translate("awk '{sum += $1} END {print sum}'"), "awk '{sum += $1} END {print sum}'");
    }

    #[test]
    fn test_cut_fields() {
        assert_eq!(translate("cut -d: -f2"), "ForEach-Object { $_.Split(':')[1] }");
        assert_eq!(translate("cut -d ',' -f 1"), "ForEach-Object { $_.Split(',')[0] }");
        assert_eq!(translate("cut -f3"), "ForEach-Object { $_.Split(\"`t\")[2] }");
        assert_eq!(
            translate("cut -d, -f1,3 data.csv"),
            "Get-Content data.csv | ForEach-Object { $f = $_.Split(','); ($f[0], $f[2]) -join ',' }"
        );
        assert_eq!(translate("cut -d: -f0"), "cut -d: -f0");
        assert_eq!(translate("cut -c1-3"), "cut -c1-3");
    }

    #[test]
    fn test_cut_wide_ranges_pass_through() {
        assert_eq!(translate("cut -d, -f1-2000000"), "cut -d, -f1-2000000");
        assert_eq!(translate("cut -f1-4000000000"), "cut -f1-4000000000");
        assert_eq!(translate("cut -d, -f1-200,300-400"), "cut -d, -f1-200,300-400");
        assert!(field_indices("1-256").is_some());
        assert!(field_indices("1-257").is_none());
    }

    #[test]
    fn test_tr() {
        assert_eq!(translate("tr a b"), "ForEach-Object { $_.Replace('a', 'b') }");
        assert_eq!(translate("tr a-z A-Z"), "ForEach-Object { $_.ToUpper() }");
        assert_eq!(translate("tr '[:upper:]' '[:lower:]'"), "ForEach-Object { $_.ToLower() }");
        assert_eq!(
            translate("tr abc xyz"),
            "ForEach-Object { [regex]::Replace($_, '[abc]', { param($m) 'xyz'['abc'.IndexOf($m.Value)] }) }"
        );
        assert_eq!(translate("tr -d '0-9'"), "ForEach-Object { $_ -creplace '[0123456789]', '' }");
        assert_eq!(translate("tr abc xy"), "tr abc xy");
    }

    #[test]
    fn test_expand_set() {
        assert_eq!(expand_set("a-d").unwrap(), ['a', 'b', 'c', 'd']);
        assert_eq!(expand_set(r"\n-").unwrap(), ['\n', '-']);
        assert!(expand_set("z-a").is_none());
        assert!(expand_set("\u{1}-\u{10FFFF}").is_none());
        assert_eq!(expand_set("[:lower:][:upper:]").map(|s| s.len()), Some(52));
    }

    #[test]
    fn test_tr_wide_range_passes_through() {
        assert_eq!(translate("tr a-z '\u{4e00}-\u{9fa5}'"), "tr a-z '\u{4e00}-\u{9fa5}'");
    }

    #[test]
    fn test_nl_and_pagers() {
        assert!(translate("nl f").starts_with("Get-Content f | ForEach-Object -Begin"));
        assert_eq!(translate("less README.md"), "Get-Content README.md | Out-Host -Paging");
        assert_eq!(translate("more"), "Out-Host -Paging");
    }

    #[test]
    fn test_grep() {
        assert_eq!(
            translate("grep error app.log"),
            "Select-String -Pattern 'error' -CaseSensitive -Path app.log"
        );
        assert_eq!(
            translate("grep -iv 'warn' app.log"),
            "Select-String -Pattern 'warn' -NotMatch -Path app.log"
        );
        assert_eq!(
            translate("grep -rl TODO src"),
            "Get-ChildItem -Path src -Recurse -File | Select-String -Pattern 'TODO' -CaseSensitive -List | Select-Object -ExpandProperty Path"
        );
        assert_eq!(
            translate("grep -c x"),
            "Select-String -Pattern 'x' -CaseSensitive | Measure-Object | Select-Object -ExpandProperty Count"
        );
        assert_eq!(translate("grep -P x"), "grep -P x");
    }

    #[test]
    fn test_grep_raw_on_modern_shell() {
        assert_eq!(
            translate_on("grep foo", ShellCapability::modern(Some(7))),
            "Select-String -Pattern 'foo' -CaseSensitive -Raw"
        );
        assert_eq!(
            translate_on("grep -n foo", ShellCapability::modern(Some(7))),
            "Select-String -Pattern 'foo' -CaseSensitive"
        );
    }

    #[test]
    fn test_grep_word_and_literal() {
        assert_eq!(
            translate("grep -wF a.b"),
            r"Select-String -Pattern '\ba\.b\b' -CaseSensitive"
        );
        assert_eq!(translate("grep -F a.b"), "Select-String -Pattern 'a.b' -CaseSensitive -SimpleMatch");
    }
}
