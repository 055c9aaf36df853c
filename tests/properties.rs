//! Property-based tests for the translation core
//!
//! Uses proptest to check the invariants that must hold for every input:
//! no panics, unknown commands untouched, and bounded suggestions.

use cmdx::capability::ShellCapability;
use cmdx::lint::{Linter, MAX_SUGGESTIONS};
use cmdx::translator::dispatch::Dispatcher;
use cmdx::translator::lexer::tokenize;
use cmdx::translator::rules::RuleTable;
use cmdx::translator::segment::{split_connectors, split_pipe, Segment};
use cmdx::CommandTranslator;
use proptest::prelude::*;

mod strategies {
    use proptest::prelude::*;

    /// Shell-flavoured noise: quotes, groups, operators and escapes.
    pub fn shell_noise() -> impl Strategy<Value = String> {
        prop::string::string_regex(r#"[a-z0-9 \-'"(){}|&;<>$\\`*.=/]{0,60}"#).unwrap()
    }

    /// Words that cannot collide with a known command.
    pub fn unknown_command() -> impl Strategy<Value = String> {
        prop::string::string_regex("zz[a-z]{1,8}").unwrap()
    }

    pub fn word() -> impl Strategy<Value = String> {
        prop::string::string_regex("-{0,2}[a-zA-Z0-9_./]{1,12}").unwrap()
    }

    /// A line with no connectors, pipes or grouping.
    pub fn plain_line() -> impl Strategy<Value = String> {
        prop::string::string_regex("[ a-zA-Z0-9_./=-]{1,60}").unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Translation is total on arbitrary input
    #[test]
    fn translate_never_panics(line in strategies::shell_noise()) {
        for capability in [
            ShellCapability::modern(Some(7)),
            ShellCapability::modern(None),
            ShellCapability::console_legacy(),
        ] {
            let _ = CommandTranslator::new(true, capability).translate(&line);
        }
    }

    /// Same for arbitrary unicode
    #[test]
    fn translate_never_panics_on_unicode(line in ".{0,40}") {
        let _ = CommandTranslator::new(true, ShellCapability::modern(Some(7))).translate(&line);
    }

    #[test]
    fn lexer_spans_are_ordered_slices(line in strategies::shell_noise()) {
        let tokens = tokenize(&line);
        let mut last_end = 0;
        for token in &tokens {
            prop_assert!(token.start >= last_end);
            prop_assert!(token.start < token.end);
            prop_assert_eq!(&line[token.start..token.end], token.value.as_str());
            last_end = token.end;
        }
    }

    #[test]
    fn unknown_commands_pass_through(
        name in strategies::unknown_command(),
        args in prop::collection::vec(strategies::word(), 0..5),
    ) {
        let stage = std::iter::once(name).chain(args).collect::<Vec<_>>().join(" ");
        let rules = RuleTable::builtin();
        let capability = ShellCapability::modern(Some(7));
        let dispatcher = Dispatcher::new(&rules, &capability);
        prop_assert_eq!(dispatcher.translate_stage(&stage), stage);
    }

    #[test]
    fn connector_free_line_is_one_trimmed_segment(line in strategies::plain_line()) {
        prop_assume!(!line.trim().is_empty());
        prop_assert_eq!(
            split_connectors(&line),
            vec![Segment::Commands(line.trim().to_string())]
        );
    }

    #[test]
    fn grouped_connectors_never_split(
        a in "[a-z]{1,6}",
        b in "[a-z]{1,6}",
        op in prop::sample::select(vec!["&&", "||", "|"]),
    ) {
        let line = format!("({a} {op} {b}) | cat");
        prop_assert_eq!(split_pipe(&line), vec![format!("({a} {op} {b})"), "cat".to_string()]);
    }

    #[test]
    fn suggestions_are_bounded(query in "[a-z-]{0,10}") {
        let rules = RuleTable::builtin();
        let linter = Linter::new(&rules);
        prop_assert!(linter.command_suggestions(&query).len() <= MAX_SUGGESTIONS);
        prop_assert!(linter.flag_suggestions("grep", &query).len() <= MAX_SUGGESTIONS);
        prop_assert!(linter.flag_suggestions("ls", &query).len() <= MAX_SUGGESTIONS);
    }
}

#[test]
fn flag_tables_are_total() {
    let rules = RuleTable::builtin();
    let capability = ShellCapability::modern(Some(7));
    let dispatcher = Dispatcher::new(&rules, &capability);

    for mapping in rules.iter() {
        for flag in mapping.flag_table.keys() {
            let stage = format!("{} {} target.txt", mapping.unix_name, flag);
            let translated = dispatcher.translate_stage(&stage);
            assert_ne!(translated, stage, "`{stage}` fell back to pass-through");
        }
    }
}
