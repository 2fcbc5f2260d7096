//! Tag grammar
//!
//! A tag is `[%` name args `%]`. The name is a run of non-whitespace characters; the args are
//! any text up to the first closing `%]`, newlines included. Whitespace around the name and
//! before the closing marker is insignificant.

use crate::error::TokenizeError;
use crate::quote::{split, Token};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ops::Range;

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[%\s*([^\s%]\S*?)(?:\s+(.*?))?\s*%\]").unwrap());

/// One tag occurrence found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'t> {
    pub name: &'t str,
    pub args: &'t str,
    /// Full matched text, `[%` through `%]`
    pub source: &'t str,
    pub span: Range<usize>,
}

impl<'t> Tag<'t> {
    fn from_captures(caps: Captures<'t>) -> Option<Self> {
        let whole = caps.get(0)?;
        Some(Tag {
            name: caps.get(1)?.as_str(),
            args: caps.get(2).map_or("", |m| m.as_str()),
            source: whole.as_str(),
            span: whole.range(),
        })
    }

    /// Tokenize the argument text into positional and keyword parts
    pub fn tokens(&self) -> Result<TagArgs, TokenizeError> {
        Ok(TagArgs::from_tokens(split(self.args)?))
    }
}

/// Arguments of one tag, split by kind
///
/// Positional order is preserved; a repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagArgs {
    pub positional: Vec<String>,
    pub keywords: Vec<(String, String)>,
}

impl TagArgs {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut args = TagArgs::default();
        let mut seen: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            let keyword = token
                .keyword()
                .map(|(key, value)| (key.to_string(), value.to_string()));
            match keyword {
                Some((key, value)) => match seen.get(&key) {
                    Some(&at) => args.keywords[at].1 = value,
                    None => {
                        seen.insert(key.clone(), args.keywords.len());
                        args.keywords.push((key, value));
                    }
                },
                None => args.positional.push(token.value),
            }
        }
        args
    }
}

/// Iterate over every tag in `text`, left to right, non-overlapping
pub fn scan(text: &str) -> impl Iterator<Item = Tag<'_>> {
    TAG_REGEX.captures_iter(text).filter_map(Tag::from_captures)
}
