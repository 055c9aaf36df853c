//! Per-stage rule dispatch.
//!
//! A stage goes to its bespoke translator if one exists, otherwise to the
//! generic mapping table. Anything that cannot be translated safely comes
//! back unchanged.

use tracing::{debug, trace, warn};

use super::bespoke;
use super::fusion;
use super::lexer::tokenize;
use super::roles::{is_redirection, tag_roles, Role, RoleToken};
use super::rules::{CommandMapping, RuleTable};
use crate::capability::ShellCapability;

/// Nested dispatches allowed through `sudo`, `xargs` and `find -exec`.
pub const MAX_DEPTH: usize = 8;

/// One command invocation, split into its words and its redirections.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub name: &'a str,
    pub stage: &'a str,
    pub words: Vec<&'a RoleToken>,
    pub redirects: Vec<&'a str>,
}

impl<'a> Invocation<'a> {
    /// Build the invocation for the first command word in `tagged`.
    pub(crate) fn from_tagged(stage: &'a str, tagged: &'a [RoleToken]) -> Option<Self> {
        let command = tagged.iter().position(|t| t.role == Role::Command)?;
        let mut words = Vec::new();
        let mut redirects = Vec::new();
        let mut pending_target = false;

        for (i, token) in tagged.iter().enumerate() {
            if i == command {
                continue;
            }
            let value = token.value();
            if pending_target {
                redirects.push(value);
                pending_target = false;
            } else if token.token.quote.is_none() && is_redirection(value) {
                redirects.push(value);
                pending_target = value.ends_with('>') || value.ends_with('<');
            } else if i > command {
                words.push(token);
            }
        }

        Some(Self {
            name: tagged[command].value(),
            stage,
            words,
            redirects,
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.words.iter().map(|&t| t.value())
    }

    pub fn flags(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.words.iter().filter(|t| t.role == Role::Flag).map(|&t| t.value())
    }

    pub fn arguments(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.words.iter().filter(|t| t.role != Role::Flag).map(|&t| t.value())
    }

    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags().any(|f| f == flag)
    }

    /// Whether any short-flag cluster (`-abc`) contains `c`.
    #[must_use]
    pub fn has_short(&self, c: char) -> bool {
        self.flags().any(|f| !f.starts_with("--") && f[1..].contains(c))
    }

    /// Characters of every short-flag cluster, excluding long flags.
    #[must_use]
    pub fn short_chars(&self) -> Vec<char> {
        self.flags()
            .filter(|f| !f.starts_with("--"))
            .flat_map(|f| f[1..].chars())
            .collect()
    }

    /// Value of an option spelled `-n 5`, `-n5`, `--lines 5` or `--lines=5`.
    #[must_use]
    pub fn option_value(&self, flag: &str) -> Option<&'a str> {
        let short = !flag.starts_with("--") && flag.len() == 2;
        for (i, &token) in self.words.iter().enumerate() {
            if token.role != Role::Flag {
                continue;
            }
            let value = token.value();
            if value == flag {
                return self.words.get(i + 1).map(|&t| t.value());
            }
            if let Some(rest) = value.strip_prefix(flag) {
                if short && !rest.is_empty() {
                    return Some(rest);
                }
                if let Some(rest) = rest.strip_prefix('=') {
                    return Some(rest);
                }
            }
        }
        None
    }

    /// Non-flag words, skipping the value after any flag in `valued`.
    #[must_use]
    pub fn positionals(&self, valued: &[&str]) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut skip = false;
        for &token in &self.words {
            if skip {
                skip = false;
                continue;
            }
            if token.role == Role::Flag {
                skip = valued.contains(&token.value());
                continue;
            }
            out.push(token.value());
        }
        out
    }

    /// Index of the first word that is neither a flag nor the value of a
    /// flag in `valued`. For wrappers this is the wrapped command.
    #[must_use]
    pub fn command_index(&self, valued: &[&str]) -> Option<usize> {
        let mut skip = false;
        for (i, token) in self.words.iter().enumerate() {
            if skip {
                skip = false;
                continue;
            }
            if token.role != Role::Flag {
                return Some(i);
            }
            skip = valued.contains(&token.value());
        }
        None
    }

    /// Original text of the stage from word `index` to the last word.
    #[must_use]
    pub fn text_from(&self, index: usize) -> Option<&'a str> {
        let first = self.words.get(index)?;
        let last = self.words.last()?;
        let stage: &'a str = self.stage;
        stage.get(first.token.start..last.token.end)
    }

    /// Append this invocation's redirections to a translated body. An input
    /// redirection becomes a `Get-Content` source and `/dev/null` becomes
    /// `$null`.
    #[must_use]
    pub fn finish(&self, body: String) -> String {
        if self.redirects.is_empty() {
            return body;
        }
        let mut input = None;
        let mut parts = vec![body];
        let mut redirects = self.redirects.iter().copied();
        while let Some(redirect) = redirects.next() {
            if redirect == "<" {
                input = redirects.next();
            } else if let Some(source) = redirect.strip_prefix('<').filter(|s| !s.is_empty()) {
                input = Some(source);
            } else {
                parts.push(redirect.replace("/dev/null", "$null"));
            }
        }
        let joined = fusion::join_words(&parts);
        match input {
            Some(source) => format!("Get-Content {} | {}", source, joined),
            None => joined,
        }
    }
}

/// Lex, fuse and tag one stage.
#[must_use]
pub fn tag_stage(stage: &str) -> Vec<RoleToken> {
    tag_roles(fusion::fuse(stage, tokenize(stage)))
}

/// Translates single pipeline stages for one target shell.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    rules: &'a RuleTable,
    capability: &'a ShellCapability,
    depth: usize,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(rules: &'a RuleTable, capability: &'a ShellCapability) -> Self {
        Self {
            rules,
            capability,
            depth: 0,
        }
    }

    #[must_use]
    pub fn capability(&self) -> &ShellCapability {
        self.capability
    }

    /// Translate one stage, returning it unchanged when no rule applies.
    #[must_use]
    pub fn translate_stage(&self, stage: &str) -> String {
        self.try_translate(stage).unwrap_or_else(|| stage.to_string())
    }

    /// Translate a reconstructed sub-line one level deeper. `None` only
    /// when the nesting limit is hit; an untranslatable sub-line comes back
    /// as-is.
    #[must_use]
    pub fn translate_nested(&self, line: &str) -> Option<String> {
        if self.depth >= MAX_DEPTH {
            warn!("Nesting limit reached, leaving `{}` untranslated", line);
            return None;
        }
        let inner = Self {
            depth: self.depth + 1,
            ..*self
        };
        Some(inner.translate_stage(line))
    }

    fn try_translate(&self, stage: &str) -> Option<String> {
        if !self.capability.translates() {
            return None;
        }
        let trimmed = stage.trim();
        if trimmed.starts_with('(') || trimmed.starts_with('{') {
            trace!("Grouped stage passes through: {}", trimmed);
            return None;
        }

        let tagged = tag_stage(stage);
        if tagged.iter().any(|t| t.token.is_heredoc()) {
            trace!("Here-document stage passes through: {}", trimmed);
            return None;
        }
        let invocation = Invocation::from_tagged(stage, &tagged)?;

        if let Some(rule) = bespoke::lookup(invocation.name) {
            let unsupported = rule.unsupported_flags(&invocation);
            if !unsupported.is_empty() {
                debug!("`{}` flags {:?} are not supported", rule.name, unsupported);
                return None;
            }
            let translated = (rule.translate)(&invocation, self);
            if translated.is_none() {
                debug!("`{}` has no rewrite for: {}", rule.name, trimmed);
            }
            return translated;
        }

        match self.rules.get(invocation.name) {
            Some(mapping) => translate_generic(mapping, &invocation),
            None => {
                trace!("No rule for `{}`", invocation.name);
                None
            }
        }
    }
}

/// Strip one layer of surrounding quotes when nothing inside needs them.
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    let quoted = bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0];
    if quoted {
        let inner = &value[1..value.len() - 1];
        let plain = !inner.is_empty()
            && inner
                .chars()
                .all(|c| c.is_alphanumeric() || "._-/\\:+=,@%~*?".contains(c));
        if plain {
            return inner;
        }
    }
    value
}

fn translate_generic(mapping: &CommandMapping, invocation: &Invocation<'_>) -> Option<String> {
    let mut parts = vec![mapping.target_verb.as_str()];
    let mut has_arguments = false;

    for token in &invocation.words {
        let value = token.value();
        if token.role == Role::Flag {
            let Some(mapped) = mapping.flag_table.get(value) else {
                debug!("`{}` flag `{}` is not supported", mapping.unix_name, value);
                return None;
            };
            parts.push(mapped.as_str());
        } else {
            has_arguments = true;
            parts.push(strip_quotes(value));
        }
    }

    if mapping.requires_arguments && !has_arguments {
        debug!("`{}` requires arguments, leaving untranslated", mapping.unix_name);
        return None;
    }

    Some(invocation.finish(fusion::join_words(&parts)))
}
