//! File and directory translators.

use super::{ps_quote, unquote};
use crate::translator::dispatch::{Dispatcher, Invocation};
use crate::translator::roles::Role;

/// Stands in for `{}` inside `find -exec`.
const FOUND_PATH: &str = "$_.FullName";

const SIZE_SUM: &str = "Measure-Object -Property Length -Sum";

fn path_list(paths: &[&str]) -> String {
    if paths.is_empty() {
        ".".to_string()
    } else {
        paths.join(", ")
    }
}

pub(super) fn rsync(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    if !inv.has_short('a') && !inv.has_short('r') {
        return None;
    }
    let positionals = inv.positionals(&[]);
    let [source, destination] = positionals.as_slice() else {
        return None;
    };
    let source = if source.ends_with('/') {
        format!("{source}*")
    } else {
        (*source).to_string()
    };
    Some(inv.finish(format!(
        "Copy-Item -Path {source} -Destination {destination} -Recurse -Force"
    )))
}

pub(super) fn du(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let path = path_list(&inv.positionals(&[]));
    let summarize = inv.has_short('s');
    let human = inv.has_short('h');
    let files = format!("Get-ChildItem -Path {path} -Recurse -File");

    let body = if inv.has_short('a') || (human && !summarize) {
        if human {
            format!("{files} | Select-Object FullName, @{{Name='Size'; Expression={{ '{{0:N1}} KB' -f ($_.Length / 1KB) }}}}")
        } else {
            format!("{files} | Select-Object FullName, Length")
        }
    } else if human {
        format!("'{{0:N1}} MB' -f (({files} | {SIZE_SUM}).Sum / 1MB)")
    } else {
        format!("{files} | {SIZE_SUM} | Select-Object -ExpandProperty Sum")
    };
    Some(inv.finish(body))
}

/// icacls right for the owner digit of an octal mode.
fn owner_right(mode: &str) -> Option<&'static str> {
    let octal = mode.bytes().all(|b| (b'0'..=b'7').contains(&b));
    if !octal || !(3..=4).contains(&mode.len()) {
        return None;
    }
    match mode.as_bytes()[mode.len() - 3] - b'0' {
        7 => Some("F"),
        6 => Some("M"),
        4 | 5 => Some("R"),
        2 | 3 => Some("W"),
        1 => Some("RX"),
        _ => None,
    }
}

fn for_each_target(targets: &[&str], command: impl Fn(&str) -> String) -> String {
    targets
        .iter()
        .map(|target| command(target))
        .collect::<Vec<_>>()
        .join("; ")
}

pub(super) fn chmod(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&[]);
    let (mode, targets) = positionals.split_first()?;
    if targets.is_empty() {
        return None;
    }
    let right = owner_right(mode)?;
    let recurse = if inv.has_short('R') { " /T" } else { "" };
    Some(inv.finish(for_each_target(targets, |target| {
        format!("icacls {target} /grant \"${{env:USERNAME}}:({right})\"{recurse}")
    })))
}

pub(super) fn chown(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&[]);
    let (owner, targets) = positionals.split_first()?;
    if targets.is_empty() {
        return None;
    }
    let user = owner.split(':').next().filter(|user| !user.is_empty())?;
    let recurse = if inv.has_short('R') { " /T" } else { "" };
    Some(inv.finish(for_each_target(targets, |target| {
        format!("icacls {target} /setowner {user}{recurse}")
    })))
}

pub(super) fn ln(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let positionals = inv.positionals(&[]);
    let [target, link] = positionals.as_slice() else {
        return None;
    };
    let kind = if inv.has_short('s') {
        "SymbolicLink"
    } else {
        "HardLink"
    };
    let force = if inv.has_short('f') { " -Force" } else { "" };
    Some(inv.finish(format!(
        "New-Item -ItemType {kind} -Path {link} -Target {target}{force}"
    )))
}

fn is_exec_terminator(word: &str) -> bool {
    matches!(word, ";" | "\\;" | "';'" | "\";\"" | "+")
}

/// Translate the command between `-exec` and its terminator. Returns the
/// per-item stage and the index just past the terminator.
fn exec_stage(inv: &Invocation<'_>, start: usize, dispatcher: &Dispatcher<'_>) -> Option<(String, usize)> {
    let end = (start..inv.words.len()).find(|&i| is_exec_terminator(inv.words[i].value()))?;
    if end == start {
        return None;
    }
    let first = &inv.words[start].token;
    let last = &inv.words[end - 1].token;
    let line = inv
        .stage
        .get(first.start..last.end)?
        .replace("'{}'", FOUND_PATH)
        .replace("\"{}\"", FOUND_PATH)
        .replace("{}", FOUND_PATH);
    let inner = dispatcher.translate_nested(&line)?;
    Some((format!("ForEach-Object {{ {inner} }}"), end + 1))
}

pub(super) fn find(inv: &Invocation<'_>, dispatcher: &Dispatcher<'_>) -> Option<String> {
    let words = &inv.words;
    let mut i = 0;
    let mut roots = Vec::new();
    while i < words.len() && words[i].role != Role::Flag {
        roots.push(words[i].value());
        i += 1;
    }

    let mut options = Vec::new();
    let mut action = None;
    while i < words.len() {
        let value = words.get(i + 1).map(|t| t.value());
        match words[i].value() {
            "-name" | "-iname" => options.push(format!("-Filter {}", ps_quote(&unquote(value?)))),
            "-type" => options.push(
                match value? {
                    "f" => "-File",
                    "d" => "-Directory",
                    _ => return None,
                }
                .to_string(),
            ),
            "-maxdepth" => {
                let depth: u32 = value?.parse().ok()?;
                options.push(format!("-Depth {}", depth.checked_sub(1)?));
            }
            "-print" => {
                i += 1;
                continue;
            }
            "-delete" => {
                action = Some("Remove-Item -Force".to_string());
                i += 1;
                continue;
            }
            "-exec" => {
                let (stage, next) = exec_stage(inv, i + 1, dispatcher)?;
                action = Some(stage);
                i = next;
                continue;
            }
            _ => return None,
        }
        i += 2;
    }

    let mut command = format!("Get-ChildItem -Path {} -Recurse", path_list(&roots));
    for option in options {
        command.push(' ');
        command.push_str(&option);
    }
    let action = action.unwrap_or_else(|| "Select-Object -ExpandProperty FullName".to_string());
    Some(inv.finish(format!("{command} | {action}")))
}

fn compress_loop(files: &[&str], keep: bool) -> String {
    let remove = if keep { "" } else { "; Remove-Item $f.FullName" };
    format!(
        "foreach ($f in (Get-Item {})) {{ $in = [IO.File]::OpenRead($f.FullName); \
         $out = [IO.File]::Create($f.FullName + '.gz'); \
         $gz = [IO.Compression.GZipStream]::new($out, [IO.Compression.CompressionMode]::Compress); \
         $in.CopyTo($gz); $gz.Dispose(); $out.Dispose(); $in.Dispose(){remove} }}",
        files.join(", ")
    )
}

fn decompress_loop(files: &[&str], keep: bool) -> String {
    let remove = if keep { "" } else { "; Remove-Item $f.FullName" };
    format!(
        "foreach ($f in (Get-Item {})) {{ $in = [IO.File]::OpenRead($f.FullName); \
         $gz = [IO.Compression.GZipStream]::new($in, [IO.Compression.CompressionMode]::Decompress); \
         $out = [IO.File]::Create(($f.FullName -replace '\\.gz$', '')); \
         $gz.CopyTo($out); $out.Dispose(); $gz.Dispose(); $in.Dispose(){remove} }}",
        files.join(", ")
    )
}

pub(super) fn gzip(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let files = inv.positionals(&[]);
    if files.is_empty() {
        return None;
    }
    let keep = inv.has_short('k');
    let body = if inv.has_short('d') {
        decompress_loop(&files, keep)
    } else {
        compress_loop(&files, keep)
    };
    Some(inv.finish(body))
}

pub(super) fn gunzip(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let files = inv.positionals(&[]);
    if files.is_empty() {
        return None;
    }
    Some(inv.finish(decompress_loop(&files, inv.has_short('k'))))
}

pub(super) fn mktemp(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let body = if inv.has_short('d') {
        "New-Item -ItemType Directory -Path (Join-Path ([IO.Path]::GetTempPath()) ([IO.Path]::GetRandomFileName())) | Select-Object -ExpandProperty FullName"
    } else {
        "New-TemporaryFile | Select-Object -ExpandProperty FullName"
    };
    Some(inv.finish(body.to_string()))
}

pub(super) fn rmdir(inv: &Invocation<'_>, _: &Dispatcher<'_>) -> Option<String> {
    let directories = inv.positionals(&[]);
    if directories.is_empty() {
        return None;
    }
    Some(inv.finish(format!("Remove-Item -Path {}", directories.join(", "))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ShellCapability;
    use crate::translator::rules::RuleTable;

    fn translate(stage: &str) -> String {
        let rules = RuleTable::builtin();
        let capability = ShellCapability::modern(Some(7));
        Dispatcher::new(&rules, &capability).translate_stage(stage)
    }

    #[test]
    fn test_rsync_needs_recursion() {
        assert_eq!(
            translate("rsync -av src/ backup"),
            "Copy-Item -Path src/* -Destination backup -Recurse -Force"
        );
        assert_eq!(translate("rsync -v a b"), "rsync -v a b");
        assert_eq!(translate("rsync -a a"), "rsync -a a");
    }

    #[test]
    fn test_du_modes() {
        assert_eq!(
            translate("du -s logs"),
            "Get-ChildItem -Path logs -Recurse -File | Measure-Object -Property Length -Sum | Select-Object -ExpandProperty Sum"
        );
        assert_eq!(translate("du"), translate("du -s ."));
        assert!(translate("du -h").ends_with("Select-Object FullName, @{Name='Size'; Expression={ '{0:N1} KB' -f ($_.Length / 1KB) }}"));
        assert!(translate("du -sh").starts_with("'{0:N1} MB' -f"));
    }

    #[test]
    fn test_chmod_tiers() {
        assert_eq!(translate("chmod 755 f"), "icacls f /grant \"${env:USERNAME}:(F)\"");
        assert_eq!(translate("chmod 644 f"), "icacls f /grant \"${env:USERNAME}:(M)\"");
        assert_eq!(translate("chmod 444 f"), "icacls f /grant \"${env:USERNAME}:(R)\"");
        assert_eq!(translate("chmod 0200 f"), "icacls f /grant \"${env:USERNAME}:(W)\"");
        assert_eq!(translate("chmod 100 f"), "icacls f /grant \"${env:USERNAME}:(RX)\"");
        assert_eq!(translate("chmod -R 700 d"), "icacls d /grant \"${env:USERNAME}:(F)\" /T");
    }

    #[test]
    fn test_chmod_passthrough() {
        assert_eq!(translate("chmod +x run.sh"), "chmod +x run.sh");
        assert_eq!(translate("chmod 055 f"), "chmod 055 f");
        assert_eq!(translate("chmod 789 f"), "chmod 789 f");
        assert_eq!(translate("chmod 755"), "chmod 755");
    }

    #[test]
    fn test_chown() {
        assert_eq!(translate("chown alice:staff f"), "icacls f /setowner alice");
        assert_eq!(translate("chown -R bob d"), "icacls d /setowner bob /T");
        assert_eq!(translate("chown :staff f"), "chown :staff f");
    }

    #[test]
    fn test_ln() {
        assert_eq!(translate("ln -s target link"), "New-Item -ItemType SymbolicLink -Path link -Target target");
        assert_eq!(translate("ln a b"), "New-Item -ItemType HardLink -Path b -Target a");
        assert_eq!(translate("ln -sf a b"), "New-Item -ItemType SymbolicLink -Path b -Target a -Force");
        assert_eq!(translate("ln -s a"), "ln -s a");
    }

    #[test]
    fn test_find_filters() {
        assert_eq!(
            translate("find . -name '*.log' -delete"),
            "Get-ChildItem -Path . -Recurse -Filter '*.log' | Remove-Item -Force"
        );
        assert_eq!(
            translate("find src -type f -maxdepth 2"),
            "Get-ChildItem -Path src -Recurse -File -Depth 1 | Select-Object -ExpandProperty FullName"
        );
        assert_eq!(translate("find . -mtime -1"), "find . -mtime -1");
        assert_eq!(translate("find . -type l"), "find . -type l");
    }

    #[test]
    fn test_find_exec() {
        assert_eq!(
            translate(r#"find . -name "*.txt" -exec echo {} \;"#),
            "Get-ChildItem -Path . -Recurse -Filter '*.txt' | ForEach-Object { Write-Output $_.FullName }"
        );
        assert_eq!(
            translate("find . -name '*.tmp' -exec rm -f {} +"),
            "Get-ChildItem -Path . -Recurse -Filter '*.tmp' | ForEach-Object { Remove-Item -Force $_.FullName }"
        );
        assert_eq!(translate("find . -exec rm {}"), "find . -exec rm {}");
    }

    #[test]
    fn test_find_exec_bare_semicolon() {
        assert_eq!(
            translate("find . -name '*.txt' -exec echo {} ;"),
            "Get-ChildItem -Path . -Recurse -Filter '*.txt' | ForEach-Object { Write-Output $_.FullName }"
        );
    }

    #[test]
    fn test_gzip() {
        let out = translate("gzip -k a.txt");
        assert!(out.starts_with("foreach ($f in (Get-Item a.txt))"));
        assert!(out.contains("CompressionMode]::Compress"));
        assert!(!out.contains("Remove-Item"));
        assert!(translate("gunzip a.txt.gz").contains("Remove-Item $f.FullName"));
        assert!(translate("gzip -d a.gz").contains("CompressionMode]::Decompress"));
        assert_eq!(translate("gzip"), "gzip");
    }

    #[test]
    fn test_mktemp_and_rmdir() {
        assert_eq!(translate("mktemp"), "New-TemporaryFile | Select-Object -ExpandProperty FullName");
        assert!(translate("mktemp -d").starts_with("New-Item -ItemType Directory"));
        assert_eq!(translate("rmdir build"), "Remove-Item -Path build");
        assert_eq!(translate("rmdir"), "rmdir");
    }
}
