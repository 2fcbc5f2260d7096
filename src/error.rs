//! Error types for shortcode registration, expansion and reversal
//!
//! Every failure the engine can detect has its own variant so callers can tell
//! "unknown shortcode" apart from "bad arguments" or "nothing registered".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortcodeError>;

/// Failure while splitting a tag's argument text into tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated {quote} quote starting at byte {pos}")]
    UnterminatedQuote { quote: char, pos: usize },

    #[error("dangling escape character at end of input")]
    TrailingEscape,
}

#[derive(Error, Debug)]
pub enum ShortcodeError {
    /// Tag name is not registered
    #[error("unknown shortcode `{name}` in {tag}")]
    UnknownShortcode { name: String, tag: String },

    /// Positional shortcode received more tokens than it declares
    #[error("shortcode {name} got {count} parameters when {expected} expected")]
    ExtraParameters {
        name: String,
        count: usize,
        expected: usize,
    },

    /// Keyword shortcode received keys outside its declared inputs
    #[error("shortcode {name} got unknown keys {keys:?}, allowed: {allowed:?}")]
    InvalidKeywords {
        name: String,
        keys: Vec<String>,
        allowed: Vec<String>,
    },

    /// The shortcode definition itself is malformed
    #[error("invalid input declaration for shortcode `{name}`: {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("shortcode `{0}` already registered")]
    DuplicateShortcode(String),

    #[error("no shortcodes registered")]
    NoShortcodesRegistered,

    #[error("shortcode `{0}` does not support reversal")]
    NotReversible(String),

    /// A required input was neither supplied nor defaulted
    #[error("missing required input `{input}` for shortcode `{name}`")]
    MissingInput { name: String, input: String },

    #[error("error rendering {name} shortcode: {message}")]
    Rendering {
        name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Markup claimed by a shortcode's marker that cannot be reversed reliably
    #[error("malformed `{name}` shortcode markup: {fragment}")]
    MalformedMarkup { name: String, fragment: String },

    #[error("malformed shortcode arguments: {0}")]
    Tokenize(#[from] TokenizeError),
}

impl ShortcodeError {
    pub fn invalid_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn rendering(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rendering {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn rendering_caused_by<E>(name: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Rendering {
            name: name.into(),
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }
}
