//! Line lexer for SSH config text
//!
//! Each physical line is split into its layout parts (indentation, keyword,
//! separator, value, trailing whitespace/comment, line terminator) so that an
//! unmodified line can be written back exactly as it was read.

use std::ops::Range;

use super::ParseError;

/// A physical line with its terminator kept separately
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RawLine {
    pub text: String,
    pub eol: &'static str,
}

/// Lexed form of a non-trivia line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct KeywordLine {
    pub indent: String,
    pub key: String,
    pub separator: String,
    pub value: String,
    pub trailing: String,
}

/// Result of lexing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Lexed {
    /// Blank line or comment
    Trivia,
    /// `Key value` line
    Keyword(KeywordLine),
}

/// Splits text into lines, keeping `\n` / `\r\n` terminators apart
pub(super) fn split_lines(text: &str) -> Vec<RawLine> {
    text.split_inclusive('\n')
        .map(|piece| {
            if let Some(text) = piece.strip_suffix("\r\n") {
                RawLine {
                    text: text.to_string(),
                    eol: "\r\n",
                }
            } else if let Some(text) = piece.strip_suffix('\n') {
                RawLine {
                    text: text.to_string(),
                    eol: "\n",
                }
            } else {
                RawLine {
                    text: piece.to_string(),
                    eol: "",
                }
            }
        })
        .collect()
}

/// Lexes a single line (without its terminator)
pub(super) fn lex_line(text: &str, line_no: usize) -> Result<Lexed, ParseError> {
    let body = text.trim_start();
    if body.is_empty() || body.starts_with('#') {
        return Ok(Lexed::Trivia);
    }
    let indent = &text[..text.len() - body.len()];

    let key_end = body
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(body.len());
    if key_end == 0 {
        return Err(ParseError::new(line_no, "line starts with '=' and has no keyword"));
    }
    let key = &body[..key_end];
    let after_key = &body[key_end..];

    let mut rest = after_key.trim_start();
    if let Some(stripped) = rest.strip_prefix('=') {
        rest = stripped.trim_start();
    }
    let separator = &after_key[..after_key.len() - rest.len()];

    let (value_part, comment) = split_comment(rest)
        .map_err(|reason| ParseError::new(line_no, format!("{key}: {reason}")))?;
    let value = value_part.trim_end();
    if value.is_empty() {
        return Err(ParseError::new(line_no, format!("missing value for '{key}'")));
    }
    let trailing = format!("{}{}", &value_part[value.len()..], comment);

    Ok(Lexed::Keyword(KeywordLine {
        indent: indent.to_string(),
        key: key.to_string(),
        separator: separator.to_string(),
        value: value.to_string(),
        trailing,
    }))
}

/// Splits `rest` at the first unquoted `#` that follows whitespace
fn split_comment(rest: &str) -> Result<(&str, &str), String> {
    let mut in_quote = false;
    let mut prev_whitespace = false;
    for (i, c) in rest.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            '#' if !in_quote && prev_whitespace => return Ok((&rest[..i], &rest[i..])),
            _ => {}
        }
        prev_whitespace = c.is_whitespace();
    }
    if in_quote {
        return Err("unterminated quote".to_string());
    }
    Ok((rest, ""))
}

/// Splits a header value into patterns, honouring double quotes
pub(super) fn split_tokens(value: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut has_token = false;

    for c in value.chars() {
        match c {
            '"' => {
                in_quote = !in_quote;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quote => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quote {
        return Err("unterminated quote".to_string());
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Byte ranges of the tokens in a header value, quotes included
///
/// Yields one range per pattern returned by [`split_tokens`].
pub(super) fn token_spans(value: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut in_quote = false;

    for (i, c) in value.char_indices() {
        if c == '"' {
            in_quote = !in_quote;
        }
        if c.is_whitespace() && !in_quote {
            if let Some(begin) = start.take() {
                spans.push(begin..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(begin) = start {
        spans.push(begin..value.len());
    }
    spans
}

/// Quotes a value that contains whitespace
pub(super) fn quote(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Removes one pair of surrounding double quotes
pub(super) fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
