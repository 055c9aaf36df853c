//! Re-fusion of constructs the lexer splits apart.
//!
//! The lexer has no idea that `$(date)` or `2>&1` is one shell unit. These
//! passes glue such runs back into a single token, slicing the original
//! line so the unit keeps its exact spelling. None of them interpret what
//! they fuse.

use super::lexer::Token;

/// Run the full fusion chain in order.
#[must_use]
pub fn fuse(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    let tokens = fuse_command_substitution(line, tokens);
    let tokens = fuse_brace_expansion(line, tokens);
    let tokens = fuse_empty_braces(line, tokens);
    let tokens = fuse_heredoc(line, tokens);
    let tokens = fuse_process_substitution(line, tokens);
    fuse_fd_redirection(line, tokens)
}

fn merge(line: &str, run: &[Token]) -> Token {
    let start = run[0].start;
    let end = run[run.len() - 1].end;
    Token {
        value: line[start..end].to_string(),
        start,
        end,
        quote: None,
    }
}

fn is_op(token: &Token, op: &str) -> bool {
    token.quote.is_none() && token.value == op
}

/// Index of the token closing the group opened at `open`. An unclosed group
/// extends to the last token.
fn matching_close(tokens: &[Token], open: usize, open_op: &str, close_op: &str) -> usize {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if is_op(token, open_op) {
            depth += 1;
        } else if is_op(token, close_op) {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    tokens.len() - 1
}

/// Extend `end` over following tokens that touch it and are not operators,
/// e.g. the `/bin` in `$(pwd)/bin`.
fn extend_adjacent(tokens: &[Token], mut end: usize) -> usize {
    while let Some(next) = tokens.get(end + 1) {
        if !tokens[end].touches(next) || next.is_operator() {
            break;
        }
        end += 1;
    }
    end
}

/// Fuse `<prefix>$` + `(`...`)` or `<prefix>$` + `{`...`}`.
fn fuse_dollar_group(line: &str, tokens: Vec<Token>, open_op: &str, close_op: &str) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let opens = token.quote.is_none()
            && token.value.ends_with('$')
            && tokens
                .get(i + 1)
                .is_some_and(|next| is_op(next, open_op) && token.touches(next));
        if opens {
            let close = matching_close(&tokens, i + 1, open_op, close_op);
            let end = extend_adjacent(&tokens, close);
            out.push(merge(line, &tokens[i..=end]));
            i = end + 1;
        } else {
            out.push(token.clone());
            i += 1;
        }
    }
    out
}

/// `$( ... )`, depth-tracked on parentheses.
#[must_use]
pub fn fuse_command_substitution(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    fuse_dollar_group(line, tokens, "(", ")")
}

/// `${ ... }`, depth-tracked on braces.
#[must_use]
pub fn fuse_brace_expansion(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    fuse_dollar_group(line, tokens, "{", "}")
}

/// A touching `{` `}` pair is the literal word `{}` (the `find -exec` and
/// `xargs -I` placeholder), together with anything glued to it.
#[must_use]
pub fn fuse_empty_braces(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let pair = is_op(token, "{")
            && tokens
                .get(i + 1)
                .is_some_and(|next| is_op(next, "}") && token.touches(next));
        if pair {
            let end = extend_adjacent(&tokens, i + 1);
            out.push(merge(line, &tokens[i..=end]));
            i = end + 1;
        } else {
            out.push(token.clone());
            i += 1;
        }
    }
    out
}

/// `<<` plus the following delimiter word. Body lines are not interpreted.
#[must_use]
pub fn fuse_heredoc(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match tokens.get(i + 1) {
            Some(word) if is_op(token, "<<") && !word.is_operator() => {
                out.push(merge(line, &tokens[i..=i + 1]));
                i += 2;
            }
            _ => {
                out.push(token.clone());
                i += 1;
            }
        }
    }
    out
}

/// `<(` ... `)` and `>(` ... `)`.
#[must_use]
pub fn fuse_process_substitution(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let opens = (is_op(token, "<") || is_op(token, ">"))
            && tokens
                .get(i + 1)
                .is_some_and(|next| is_op(next, "(") && token.touches(next));
        if opens {
            let close = matching_close(&tokens, i + 1, "(", ")");
            out.push(merge(line, &tokens[i..=close]));
            i = close + 1;
        } else {
            out.push(token.clone());
            i += 1;
        }
    }
    out
}

fn is_redirect_op(token: &Token) -> bool {
    is_op(token, ">") || is_op(token, ">>") || is_op(token, "<")
}

/// Numeric descriptor redirections: `2>&1`, `2>/dev/null`, `&>file`, `>&2`.
#[must_use]
pub fn fuse_fd_redirection(line: &str, tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let next = tokens.get(i + 1);

        let descriptor_prefix = token.quote.is_none()
            && (token.value == "&"
                || (!token.value.is_empty() && token.value.bytes().all(|b| b.is_ascii_digit())))
            && next.is_some_and(|n| is_redirect_op(n) && token.touches(n));
        let dup_target = is_redirect_op(token)
            && next.is_some_and(|n| is_op(n, "&") && token.touches(n));

        if !descriptor_prefix && !dup_target {
            out.push(token.clone());
            i += 1;
            continue;
        }

        let mut end = if descriptor_prefix { i + 1 } else { i };
        if let Some(amp) = tokens.get(end + 1) {
            if is_op(amp, "&") && tokens[end].touches(amp) {
                end += 1;
            }
        }
        if let Some(target) = tokens.get(end + 1) {
            if tokens[end].touches(target) && !target.is_operator() && !is_op(target, "&") {
                end += 1;
            }
        }
        out.push(merge(line, &tokens[i..=end]));
        i = end + 1;
    }
    out
}

/// Join output words with single spaces, keeping a `$` glued to a following
/// `(` or `{` so a substitution spelled `$ (` comes out as `$(`.
#[must_use]
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    let mut out = String::new();
    for word in words {
        let word = word.as_ref();
        if word.is_empty() {
            continue;
        }
        let glue = out.ends_with('$') && (word.starts_with('(') || word.starts_with('{'));
        if !out.is_empty() && !glue {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
