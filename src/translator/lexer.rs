//! Positioned tokenizer for a single Unix command line.
//!
//! The lexer never fails. Unterminated quotes run to the end of the input,
//! and any byte no rule can claim becomes a one-character token, so every
//! scan terminates and every token is non-empty.

/// Operators recognized as single tokens, longest first so `&&` wins over `&`.
const OPERATORS: &[&str] = &[
    "&&", "||", "|&", "<<", ">>", "|", ";", "<", ">", "(", ")", "{", "}",
];

/// A lexed slice of the input line. `start..end` is a half-open byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub quote: Option<char>,
}

impl Token {
    /// Whether this token is one of the fixed shell operators.
    #[must_use]
    pub fn is_operator(&self) -> bool {
        self.quote.is_none() && OPERATORS.contains(&self.value.as_str())
    }

    /// Whether this token is a fused here-document (`<<WORD`).
    #[must_use]
    pub fn is_heredoc(&self) -> bool {
        self.quote.is_none() && self.value.len() > 2 && self.value.starts_with("<<")
    }

    /// Whether `next` starts exactly where this token ends.
    #[must_use]
    pub fn touches(&self, next: &Token) -> bool {
        self.end == next.start
    }
}

/// Bytes that may begin an operator and therefore end a bare word.
#[inline]
#[must_use]
pub fn is_operator_start(b: u8) -> bool {
    matches!(b, b'<' | b'>' | b'|' | b'&' | b';' | b'(' | b')' | b'{' | b'}')
}

/// Split `line` into positioned tokens.
#[must_use]
pub fn tokenize(line: &str) -> Vec<Token> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let next = bytes.get(pos + 1).copied();
        let mut quote = None;

        let end = if b == b'\'' || b == b'"' {
            quote = Some(char::from(b));
            scan_quoted(bytes, pos)
        } else if b == b'\\' && next.is_some_and(is_operator_start) {
            pos + 2
        } else if b == b'`' && next.is_some_and(is_operator_start) {
            let rest = &bytes[pos..];
            if rest.starts_with(b"`&`&") || rest.starts_with(b"`|`|") {
                pos + 4
            } else {
                pos + 2
            }
        } else if let Some(op) = longest_operator(&line[pos..]) {
            pos + op.len()
        } else {
            scan_word(bytes, pos)
        };

        // Nothing claimed this position: take one whole character.
        let end = if end <= start {
            start + line[start..].chars().next().map_or(1, char::len_utf8)
        } else {
            end
        };

        tokens.push(Token {
            value: line[start..end].to_string(),
            start,
            end,
            quote,
        });
        pos = end;
    }

    tokens
}

fn longest_operator(rest: &str) -> Option<&'static str> {
    OPERATORS.iter().copied().find(|op| rest.starts_with(op))
}

/// Scan a quoted run starting at the opening quote. Returns the offset just
/// past the closing quote, or the end of input when unterminated.
fn scan_quoted(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Scan a bare word. Embedded quoted runs and backslash escape pairs are
/// part of the word.
fn scan_word(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || is_operator_start(b) {
            break;
        }
        match b {
            b'\\' => i += 2,
            b'\'' | b'"' => i = scan_quoted(bytes, i),
            _ => i += 1,
        }
    }
    i.min(bytes.len())
}
