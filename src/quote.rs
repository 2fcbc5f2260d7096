//! Value quoting and shell-style tokenizing
//!
//! [`quote`] wraps a value so that [`split`] reads it back as exactly one token with the same
//! text. The tokenizer follows POSIX shell word splitting: single quotes are literal, double
//! quotes honour `\"` and `\\`, and outside quotes a backslash escapes the next character.

use crate::error::TokenizeError;
use std::borrow::Cow;

/// One word of a tag's argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    /// Byte offset into `value` of the first `=` that was neither quoted nor escaped
    separator: Option<usize>,
}

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Token {
            value: value.into(),
            separator: None,
        }
    }

    /// Split a `key=value` token on its first bare `=`.
    ///
    /// Returns `None` for positional tokens, including `=value` (empty key).
    pub fn keyword(&self) -> Option<(&str, &str)> {
        match self.separator {
            Some(0) | None => None,
            Some(at) => Some((&self.value[..at], &self.value[at + 1..])),
        }
    }
}

/// Quote `value` for re-serialization into tag syntax.
///
/// - contains `"` but no `'`: wrapped in single quotes
/// - contains `'` or whitespace: wrapped in double quotes
/// - anything else is returned unchanged
///
/// Values that need escaping to survive [`split`] (both quote kinds, backslashes, empty
/// strings) are handled as well. A value containing the closing marker `%]` is written as
/// double-quoted pieces joined by an escaped `\]`, so the marker never appears literally.
pub fn quote(value: &str) -> Cow<'_, str> {
    if value.is_empty() {
        return Cow::Borrowed("\"\"");
    }
    if value.contains("%]") {
        return Cow::Owned(guard_closing_marker(value));
    }
    let double = value.contains('"');
    let single = value.contains('\'');
    let backslash = value.contains('\\');
    let space = value.chars().any(char::is_whitespace);

    if double && !single {
        Cow::Owned(format!("'{value}'"))
    } else if single || space {
        Cow::Owned(double_quoted(value))
    } else if backslash {
        Cow::Owned(format!("'{value}'"))
    } else {
        Cow::Borrowed(value)
    }
}

/// `50%]` becomes `"50%"\]`
fn guard_closing_marker(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    let mut pieces = value.split("%]").peekable();
    while let Some(piece) = pieces.next() {
        let last = pieces.peek().is_none();
        if last {
            if !piece.is_empty() {
                out.push_str(&double_quoted(piece));
            }
        } else {
            out.push_str(&double_quoted(&format!("{piece}%")));
            out.push_str("\\]");
        }
    }
    out
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Split argument text into tokens using shell quoting rules.
///
/// Adjacent quoted and bare pieces join into one token, so `key="one two"` is the single
/// token `key=one two`. An unterminated quote or a trailing backslash is an error.
pub fn split(input: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut separator = None;
    let mut started = false;
    let mut chars = input.char_indices();

    while let Some((pos, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if started {
                    tokens.push(Token {
                        value: std::mem::take(&mut current),
                        separator: separator.take(),
                    });
                    started = false;
                }
            }
            '\'' => {
                started = true;
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, c)) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote { quote: '\'', pos }),
                    }
                }
            }
            '"' => {
                started = true;
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.clone().next() {
                            Some((_, next @ ('"' | '\\'))) => {
                                chars.next();
                                current.push(next);
                            }
                            _ => current.push('\\'),
                        },
                        Some((_, c)) => current.push(c),
                        None => return Err(TokenizeError::UnterminatedQuote { quote: '"', pos }),
                    }
                }
            }
            '\\' => {
                started = true;
                match chars.next() {
                    Some((_, c)) => current.push(c),
                    None => return Err(TokenizeError::TrailingEscape),
                }
            }
            '=' => {
                started = true;
                if separator.is_none() {
                    separator = Some(current.len());
                }
                current.push('=');
            }
            c => {
                started = true;
                current.push(c);
            }
        }
    }
    if started {
        tokens.push(Token {
            value: current,
            separator,
        });
    }
    Ok(tokens)
}
