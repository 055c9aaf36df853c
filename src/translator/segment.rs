//! Connector and pipe segmentation.
//!
//! Every splitter re-lexes its input and only splits at depth zero, so a
//! grouped `( ... )` or braced `{ ... }` span always stays in one chunk.
//! Chunks are sliced from the original text, never rebuilt from token values.

use super::lexer::{tokenize, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Connector::And => "&&",
            Connector::Or => "||",
        }
    }

    fn from_token(token: &Token) -> Option<Self> {
        if token.quote.is_some() {
            return None;
        }
        match token.value.as_str() {
            "&&" => Some(Connector::And),
            "||" => Some(Connector::Or),
            _ => None,
        }
    }
}

/// One piece of a connector-split line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Commands(String),
    Connector(Connector),
}

/// A chunk of text and the separator token that ended it, if any.
struct Chunk {
    text: String,
    separator: Option<String>,
}

fn split_top_level(line: &str, mut is_split: impl FnMut(&Token) -> bool) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut paren_depth = 0usize;
    let mut brace_depth = 0usize;
    let mut chunk_start = 0;

    for token in tokenize(line) {
        if token.quote.is_none() {
            match token.value.as_str() {
                "(" => paren_depth += 1,
                ")" => paren_depth = paren_depth.saturating_sub(1),
                "{" => brace_depth += 1,
                "}" => brace_depth = brace_depth.saturating_sub(1),
                _ => {}
            }
        }

        if paren_depth == 0 && brace_depth == 0 && is_split(&token) {
            chunks.push(Chunk {
                text: line[chunk_start..token.start].trim().to_string(),
                separator: Some(token.value.clone()),
            });
            chunk_start = token.end;
        }
    }

    chunks.push(Chunk {
        text: line[chunk_start..].trim().to_string(),
        separator: None,
    });
    chunks
}

/// Split a line on top-level `&&` / `||`.
#[must_use]
pub fn split_connectors(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for chunk in split_top_level(line, |t| Connector::from_token(t).is_some()) {
        if !chunk.text.is_empty() {
            segments.push(Segment::Commands(chunk.text));
        }
        match chunk.separator.as_deref() {
            Some("&&") => segments.push(Segment::Connector(Connector::And)),
            Some("||") => segments.push(Segment::Connector(Connector::Or)),
            _ => {}
        }
    }
    segments
}

/// Split a connector segment on top-level `;`.
///
/// A bare `;` that closes a `find -exec` run belongs to `find` and does
/// not split.
#[must_use]
pub fn split_sequence(segment: &str) -> Vec<String> {
    let mut at_command = true;
    let mut in_find = false;
    let mut exec_open = false;
    let mut after_brace = false;
    split_top_level(segment, |t| {
        let bare = t.quote.is_none();
        let split = bare && t.value == ";" && !exec_open;
        if at_command {
            in_find = bare && t.value == "find";
        }
        match t.value.as_str() {
            "-exec" | "-execdir" | "-ok" | "-okdir" if bare && in_find => exec_open = true,
            ";" | "\\;" | "';'" | "\";\"" => exec_open = false,
            "+" if after_brace => exec_open = false,
            _ => {}
        }
        at_command = split;
        after_brace = bare && t.value == "}";
        split
    })
        .into_iter()
        .map(|chunk| chunk.text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Split a segment into pipeline stages on top-level `|` and `|&`.
///
/// A stage ended by `|&` carries an explicit `2>&1` so the stderr merge
/// survives translation.
#[must_use]
pub fn split_pipe(segment: &str) -> Vec<String> {
    split_top_level(segment, |t| t.quote.is_none() && (t.value == "|" || t.value == "|&"))
        .into_iter()
        .filter(|chunk| !chunk.text.is_empty())
        .map(|chunk| match chunk.separator.as_deref() {
            Some("|&") => format!("{} 2>&1", chunk.text),
            _ => chunk.text,
        })
        .collect()
}
