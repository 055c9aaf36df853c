//! Syntactic role tagging.
//!
//! A single left-to-right pass with one bit of state: whether the next word
//! starts a new command. There is no lookahead.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexer::Token;

/// Redirection shapes: `>`, `>>`, `<`, `<<`, `2>`, `2>&1`, `&>`, `>&2`, `2>&-`,
/// and fused forms carrying their target such as `2>/dev/null`.
static REDIRECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d*|&)(?:(?:>>?|<<?)&?(?:\d+|-)?|(?:>>?|<)[^&<>(].*)$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Command,
    Flag,
    Argument,
    Operator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleToken {
    pub token: Token,
    pub role: Role,
}

impl RoleToken {
    #[must_use]
    pub fn value(&self) -> &str {
        &self.token.value
    }
}

/// Connectors that end the current command: `&&`, `||`, `|`, `;`, `|&`.
#[must_use]
pub fn is_connector(token: &Token) -> bool {
    token.quote.is_none() && matches!(token.value.as_str(), "&&" | "||" | "|" | ";" | "|&")
}

/// Whether a bare value has the shape of a redirection operator.
#[must_use]
pub fn is_redirection(value: &str) -> bool {
    !value.is_empty() && REDIRECTION.is_match(value)
}

/// Tag every token with its role.
#[must_use]
pub fn tag_roles(tokens: Vec<Token>) -> Vec<RoleToken> {
    let mut expecting_command = true;

    tokens
        .into_iter()
        .map(|token| {
            let role = if is_connector(&token) {
                expecting_command = true;
                Role::Operator
            } else if token.quote.is_none() && is_redirection(&token.value) {
                Role::Argument
            } else if expecting_command {
                expecting_command = false;
                Role::Command
            } else if token.quote.is_none() && token.value.len() > 1 && token.value.starts_with('-') {
                Role::Flag
            } else {
                Role::Argument
            };
            RoleToken { token, role }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::lexer::tokenize;

    fn roles(line: &str) -> Vec<(String, Role)> {
        tag_roles(tokenize(line))
            .into_iter()
            .map(|t| (t.token.value, t.role))
            .collect()
    }

    #[test]
    fn test_basic_roles() {
        let tagged = roles("ls -la /tmp");
        assert_eq!(tagged[0].1, Role::Command);
        assert_eq!(tagged[1].1, Role::Flag);
        assert_eq!(tagged[2].1, Role::Argument);
    }

    #[test]
    fn test_connectors_expect_new_command() {
        let tagged = roles("cat f | grep x && wc -l");
        let commands: Vec<_> = tagged
            .iter()
            .filter(|(_, r)| *r == Role::Command)
            .map(|(v, _)| v.as_str())
            .collect();
        assert_eq!(commands, ["cat", "grep", "wc"]);
        assert_eq!(tagged[2].1, Role::Operator);
    }

    #[test]
    fn test_redirection_is_never_command() {
        let tagged = roles("> out.txt");
        assert_eq!(tagged[0].1, Role::Argument);

        let tagged = roles("echo hi >> out.txt");
        assert_eq!(tagged[2], (">>".to_string(), Role::Argument));
        assert_eq!(tagged[3].1, Role::Argument);
    }

    #[test]
    fn test_quoted_dash_is_argument() {
        let tagged = roles("grep '-v' file");
        assert_eq!(tagged[1].1, Role::Argument);
    }

    #[test]
    fn test_lone_dash_is_argument() {
        let tagged = roles("cat -");
        assert_eq!(tagged[1].1, Role::Argument);
    }

    #[test]
    fn test_redirection_shapes() {
        for shape in [">", ">>", "<", "<<", "2>", "2>&1", "&>", ">&2", "2>&-", "1>>", "2>/dev/null", "&>log"] {
            assert!(is_redirection(shape), "{shape}");
        }
        for other in ["-n", "file", "2", "&", "<<EOF", "a>b", "<(ls)"] {
            assert!(!is_redirection(other), "{other}");
        }
    }
}
