//! Advisory check of a command line against the known commands and flags.
//!
//! Nothing here translates. A line is walked the same way the translator
//! walks it and every unknown command or flag is reported, along with up
//! to [`MAX_SUGGESTIONS`] near matches.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::debug;

use crate::translator::bespoke;
use crate::translator::dispatch::{tag_stage, Invocation};
use crate::translator::rules::RuleTable;
use crate::translator::segment::{split_connectors, split_pipe, split_sequence, Segment};

/// Upper bound on suggestions per unknown command or flag.
pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub unsupported: Vec<String>,
    pub suggestions: Vec<String>,
}

impl LintReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unsupported.is_empty()
    }
}

pub struct Linter<'a> {
    rules: &'a RuleTable,
    known: Vec<&'a str>,
    matcher: SkimMatcherV2,
}

impl<'a> Linter<'a> {
    /// The known universe is every generic rule in `rules` plus every
    /// bespoke command.
    pub fn new(rules: &'a RuleTable) -> Self {
        let mut known: Vec<&'a str> = rules
            .iter()
            .map(|m| m.unix_name.as_str())
            .chain(bespoke::rules().iter().map(|r| r.name))
            .collect();
        known.sort_unstable();
        known.dedup();

        Self {
            rules,
            known,
            matcher: SkimMatcherV2::default(),
        }
    }

    #[must_use]
    pub fn is_known(&self, command: &str) -> bool {
        self.known.binary_search(&command).is_ok()
    }

    pub fn lint(&self, line: &str) -> LintReport {
        let mut report = LintReport::default();
        for segment in split_connectors(line) {
            let Segment::Commands(text) = segment else {
                continue;
            };
            for piece in split_sequence(&text) {
                for stage in split_pipe(&piece) {
                    self.lint_stage(&stage, &mut report);
                }
            }
        }
        debug!(
            "Lint found {} unsupported entries in: {}",
            report.unsupported.len(),
            line
        );
        report
    }

    fn lint_stage(&self, stage: &str, report: &mut LintReport) {
        let trimmed = stage.trim();
        if trimmed.starts_with('(') || trimmed.starts_with('{') {
            return;
        }
        let tagged = tag_stage(stage);
        let Some(invocation) = Invocation::from_tagged(stage, &tagged) else {
            return;
        };
        let name = invocation.name;

        if !self.is_known(name) {
            report.unsupported.push(trimmed.to_string());
            let similar = self.command_suggestions(name);
            if !similar.is_empty() {
                report
                    .suggestions
                    .push(format!("{}: did you mean {}?", name, similar.join(", ")));
            }
            return;
        }

        let unsupported: Vec<&str> = match bespoke::lookup(name) {
            Some(rule) => rule.unsupported_flags(&invocation),
            None => match self.rules.get(name) {
                Some(mapping) => invocation
                    .flags()
                    .filter(|flag| !mapping.flag_table.contains_key(*flag))
                    .collect(),
                None => Vec::new(),
            },
        };

        for flag in unsupported {
            report.unsupported.push(format!("{name} {flag}"));
            let similar = self.flag_suggestions(name, flag);
            if !similar.is_empty() {
                report
                    .suggestions
                    .push(format!("{name} {flag}: did you mean {}?", similar.join(", ")));
            }
        }
    }

    /// Known commands close to `name`: containing it, contained by it, or
    /// within two characters of its length.
    #[must_use]
    pub fn command_suggestions(&self, name: &str) -> Vec<String> {
        if name.is_empty() {
            return Vec::new();
        }
        let candidates = self.known.iter().copied().filter(|&known| {
            known != name
                && (known.contains(name)
                    || name.contains(known)
                    || known.len().abs_diff(name.len()) <= 2)
        });
        self.rank(name, candidates)
    }

    /// Allowed flags of `command` that contain `flag` or are contained by
    /// it, ignoring leading dashes.
    #[must_use]
    pub fn flag_suggestions(&self, command: &str, flag: &str) -> Vec<String> {
        let bare = flag.trim_start_matches('-');
        if bare.is_empty() {
            return Vec::new();
        }
        let allowed: Vec<&str> = match bespoke::lookup(command) {
            Some(rule) => rule
                .allowed_flags
                .iter()
                .filter(|f| **f != "-#")
                .map(|f| f.trim_end_matches('*').trim_end_matches('='))
                .collect(),
            None => match self.rules.get(command) {
                Some(mapping) => mapping.flag_table.keys().map(String::as_str).collect(),
                None => return Vec::new(),
            },
        };
        let candidates = allowed.into_iter().filter(|&candidate| {
            let other = candidate.trim_start_matches('-');
            candidate != flag && !other.is_empty() && (other.contains(bare) || bare.contains(other))
        });
        self.rank(flag, candidates)
    }

    /// Best matches first: fuzzy score, then shared characters, then name.
    fn rank<'c>(&self, query: &str, candidates: impl Iterator<Item = &'c str>) -> Vec<String> {
        let mut scored: Vec<(i64, usize, &str)> = candidates
            .map(|candidate| {
                let score = self
                    .matcher
                    .fuzzy_match(candidate, query)
                    .or_else(|| self.matcher.fuzzy_match(query, candidate))
                    .unwrap_or(0);
                let shared = query.chars().filter(|&c| candidate.contains(c)).count();
                (score, shared, candidate)
            })
            .collect();
        scored.sort_by_key(|&(score, shared, candidate)| (Reverse(score), Reverse(shared), candidate));
        scored.dedup_by_key(|entry| entry.2);
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, _, candidate)| candidate.to_string())
            .collect()
    }
}
