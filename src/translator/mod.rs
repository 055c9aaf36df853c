pub mod bespoke;
pub mod connectors;
pub mod dispatch;
pub mod fusion;
pub mod lexer;
pub mod roles;
pub mod rules;
pub mod segment;

use serde::Serialize;
use tracing::debug;

use crate::capability::{ShellCapability, ShellKind};
use dispatch::{tag_stage, Dispatcher, Invocation};
use rules::RuleTable;
use segment::{split_connectors, split_pipe, split_sequence, Segment};

/// Command translator for running Unix command lines on another shell.
/// Owns the rule table and the resolved target capability.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    enabled: bool,
    capability: ShellCapability,
    rules: RuleTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub translated: bool,
    pub original_command: String,
    pub final_command: String,
    pub description: String,
}

impl TranslationResult {
    fn unchanged(command: &str) -> Self {
        Self {
            translated: false,
            original_command: command.to_string(),
            final_command: command.to_string(),
            description: String::new(),
        }
    }
}

impl CommandTranslator {
    /// Create a translator with the built-in rule table.
    pub fn new(enabled: bool, capability: ShellCapability) -> Self {
        Self::with_rules(enabled, capability, RuleTable::builtin())
    }

    pub fn with_rules(enabled: bool, capability: ShellCapability, rules: RuleTable) -> Self {
        Self {
            enabled,
            capability,
            rules,
        }
    }

    /// Translate a full command line if translation is enabled and the
    /// target is not POSIX.
    pub fn translate(&self, command: &str) -> TranslationResult {
        if !self.enabled {
            return TranslationResult::unchanged(command);
        }

        let command = command.trim();
        if command.is_empty() || !self.capability.translates() {
            return TranslationResult::unchanged(command);
        }

        let dispatcher = Dispatcher::new(&self.rules, &self.capability);
        let mut descriptions: Vec<&str> = Vec::new();
        let mut line = String::new();

        for segment in split_connectors(command) {
            match segment {
                Segment::Connector(connector) => {
                    line.push(' ');
                    line.push_str(connector.as_str());
                    line.push(' ');
                }
                Segment::Commands(text) => {
                    let mut pieces = Vec::new();
                    for piece in split_sequence(&text) {
                        let mut stages = Vec::new();
                        for stage in split_pipe(&piece) {
                            stages.push(self.translate_stage(&dispatcher, &stage, &mut descriptions));
                        }
                        pieces.push(stages.join(" | "));
                    }
                    line.push_str(&pieces.join("; "));
                }
            }
        }

        let line = line.trim();
        let emulated = connectors::emulate(line, &self.capability);
        // cmd runs `&&` and `||` natively; connectors alone do not wrap.
        if emulated != line && self.capability.kind == ShellKind::ShellModern {
            descriptions.push(connectors::DESCRIPTION);
        }

        if descriptions.is_empty() {
            debug!("Nothing to translate in: {}", command);
            return TranslationResult::unchanged(command);
        }

        let line = emulated;
        let final_command = match self.capability.kind {
            // Doubled quotes keep cmd inside one quoted argument.
            ShellKind::ConsoleLegacy => format!(
                "{} -NoProfile -Command \"{}\"",
                self.capability.powershell_executable(),
                line.replace('"', "\"\"")
            ),
            _ => line,
        };

        TranslationResult {
            translated: true,
            original_command: command.to_string(),
            final_command,
            description: descriptions.join("; "),
        }
    }

    /// Translate one stage, recording the rule description when it changed.
    fn translate_stage<'s>(
        &'s self,
        dispatcher: &Dispatcher<'_>,
        stage: &str,
        descriptions: &mut Vec<&'s str>,
    ) -> String {
        let translated = dispatcher.translate_stage(stage);
        if translated != stage {
            if let Some(description) = self.describe(stage) {
                if !descriptions.contains(&description) {
                    descriptions.push(description);
                }
            }
        }
        translated
    }

    fn describe(&self, stage: &str) -> Option<&str> {
        let tagged = tag_stage(stage);
        let name = Invocation::from_tagged(stage, &tagged)?.name;
        match bespoke::lookup(name) {
            Some(rule) => Some(rule.description),
            None => self.rules.get(name).map(|m| m.description.as_str()),
        }
    }

    /// Enable or disable translation
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if translation is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capability(&self) -> &ShellCapability {
        &self.capability
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modern() -> CommandTranslator {
        CommandTranslator::new(true, ShellCapability::modern(Some(7)))
    }

    #[test]
    fn test_translator_creation() {
        let translator = modern();
        assert!(translator.is_enabled());
        assert_eq!(translator.capability().kind, ShellKind::ShellModern);
    }

    #[test]
    fn test_disabled_translator() {
        let mut translator = modern();
        translator.set_enabled(false);
        let result = translator.translate("ls -la");
        assert!(!result.translated);
        assert_eq!(result.final_command, "ls -la");
    }

    #[test]
    fn test_unknown_command() {
        let result = modern().translate("unknowncommand arg1 arg2");
        assert!(!result.translated);
        assert_eq!(result.final_command, "unknowncommand arg1 arg2");
        assert!(result.description.is_empty());
    }

    #[test]
    fn test_empty_command() {
        let result = modern().translate("   ");
        assert!(!result.translated);
        assert_eq!(result.final_command, "");
    }

    #[test]
    fn test_posix_target_passes_through() {
        let translator = CommandTranslator::new(true, ShellCapability::posix());
        let result = translator.translate("rm -rf build && ls");
        assert!(!result.translated);
        assert_eq!(result.final_command, "rm -rf build && ls");
    }

    #[test]
    fn test_pipeline_and_sequence() {
        let result = modern().translate("cd src; ls -a | head -3");
        assert!(result.translated);
        assert_eq!(
            result.final_command,
            "Set-Location src; Get-ChildItem -Force | Select-Object -First 3"
        );
        assert!(result.description.contains("First lines of input"));
    }

    #[test]
    fn test_native_connectors_kept() {
        let result = modern().translate("mkdir out && cp a out || echo failed");
        assert_eq!(
            result.final_command,
            "New-Item -ItemType Directory out && Copy-Item a out || Write-Output failed"
        );
    }

    #[test]
    fn test_untranslated_stage_survives_in_line() {
        let result = modern().translate("git status | wc -l");
        assert_eq!(
            result.final_command,
            "git status | Measure-Object -Line | Select-Object -ExpandProperty Lines"
        );
    }

    #[test]
    fn test_old_modern_emulates_connectors() {
        let translator = CommandTranslator::new(true, ShellCapability::modern(Some(5)));
        let result = translator.translate("rm -r tmp && pwd");
        assert_eq!(
            result.final_command,
            "Remove-Item -Recurse tmp; $cmdxOk = $?; if ($cmdxOk) { Get-Location }"
        );
    }

    #[test]
    fn test_console_legacy_wraps() {
        let translator = CommandTranslator::new(true, ShellCapability::console_legacy());
        let result = translator.translate("echo \"hi there\" && pwd");
        assert_eq!(
            result.final_command,
            r#"powershell -NoProfile -Command "Write-Output ""hi there""; $cmdxOk = $?; if ($cmdxOk) { Get-Location }""#
        );
    }

    #[test]
    fn test_console_legacy_keeps_pipe_inside_quotes() {
        let translator = CommandTranslator::new(true, ShellCapability::console_legacy());
        let result = translator.translate("echo \"a|b\" && pwd");
        assert_eq!(
            result.final_command,
            r#"powershell -NoProfile -Command "Write-Output ""a|b""; $cmdxOk = $?; if ($cmdxOk) { Get-Location }""#
        );
        // An even number of quotes before the `|` leaves cmd inside the argument.
        let before_pipe = &result.final_command[..result.final_command.find('|').unwrap_or(0)];
        assert_eq!(before_pipe.matches('"').count() % 2, 1);
    }

    #[test]
    fn test_old_modern_emulates_untranslated_connectors() {
        let translator = CommandTranslator::new(true, ShellCapability::modern(Some(5)));
        let result = translator.translate("git pull && git push");
        assert!(result.translated);
        assert_eq!(result.final_command, "git pull; $cmdxOk = $?; if ($cmdxOk) { git push }");
        assert_eq!(result.description, connectors::DESCRIPTION);

        let translator = CommandTranslator::new(true, ShellCapability::modern(None));
        assert_eq!(
            translator.translate("make || exit 1").final_command,
            "make; $cmdxOk = $?; if (-not $cmdxOk) { exit 1 }"
        );
    }

    #[test]
    fn test_find_exec_with_bare_semicolon() {
        let result = modern().translate("find . -name '*.txt' -exec echo {} ; && pwd");
        assert_eq!(
            result.final_command,
            "Get-ChildItem -Path . -Recurse -Filter '*.txt' | ForEach-Object { Write-Output $_.FullName } && Get-Location"
        );
    }

    #[test]
    fn test_console_legacy_untouched_without_rules() {
        let translator = CommandTranslator::new(true, ShellCapability::console_legacy());
        let result = translator.translate("git pull && git push");
        assert!(!result.translated);
        assert_eq!(result.final_command, "git pull && git push");
    }
}
