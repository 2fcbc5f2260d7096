//! Shortcode trait definition
//!
//! This module defines the [`Shortcode`] trait every registered shortcode implements. A
//! shortcode exposes its [`Signature`] so the dispatcher can bind tag arguments, converts
//! bound [`Arguments`] into output text, and may optionally reverse its own output back
//! into tag form.

use crate::error::{Result, ShortcodeError};
use crate::signature::{Arguments, Signature};
use crate::tag::TagArgs;
use std::fmt;

/// Extra values handed to every conversion, shared across one parse
pub type Context = serde_json::Map<String, serde_json::Value>;

/// Trait for shortcodes
///
/// # Examples
///
/// ```ignore
/// struct Upper(Signature);
///
/// impl Shortcode for Upper {
///     fn signature(&self) -> &Signature {
///         &self.0
///     }
///
///     fn convert(&self, args: &Arguments, _context: &Context) -> Result<String> {
///         Ok(args.values().collect::<Vec<_>>().join(" ").to_uppercase())
///     }
/// }
/// ```
pub trait Shortcode: Send + Sync {
    fn signature(&self) -> &Signature;

    /// The tag name this shortcode answers to
    fn name(&self) -> &str {
        self.signature().name()
    }

    /// Bind one tag's arguments to the declared inputs
    ///
    /// Default implementation delegates to [`Signature::bind`].
    fn bind(&self, args: TagArgs) -> Result<Arguments> {
        self.signature().bind(args)
    }

    /// Render bound arguments into output text
    fn convert(&self, args: &Arguments, context: &Context) -> Result<String>;

    /// Whether [`Shortcode::reverse`] is implemented
    fn supports_reverse(&self) -> bool {
        false
    }

    /// Rewrite this shortcode's rendered output found in `text` back into tags.
    ///
    /// Default implementation returns [`ShortcodeError::NotReversible`].
    fn reverse(&self, _text: &str) -> Result<String> {
        Err(ShortcodeError::NotReversible(self.name().to_string()))
    }
}

type ConvertFn = dyn Fn(&Arguments, &Context) -> Result<String> + Send + Sync;
type ReverseFn = dyn Fn(&Signature, &str) -> Result<String> + Send + Sync;

/// Shortcode backed by closures
///
/// ```ignore
/// let link = FnShortcode::new(
///     Signature::positional("link", vec![Input::new("url"), Input::new("text")])?,
///     |args, _| Ok(format!("<a href=\"{}\">{}</a>", args.get("url").unwrap_or(""), args.get("text").unwrap_or(""))),
/// );
/// ```
pub struct FnShortcode {
    signature: Signature,
    convert: Box<ConvertFn>,
    reverse: Option<Box<ReverseFn>>,
}

impl FnShortcode {
    pub fn new<F>(signature: Signature, convert: F) -> Self
    where
        F: Fn(&Arguments, &Context) -> Result<String> + Send + Sync + 'static,
    {
        FnShortcode {
            signature,
            convert: Box::new(convert),
            reverse: None,
        }
    }

    /// Attach a reversal function; it receives the signature so it can use
    /// [`Signature::rejoin`]
    pub fn with_reverse<F>(mut self, reverse: F) -> Self
    where
        F: Fn(&Signature, &str) -> Result<String> + Send + Sync + 'static,
    {
        self.reverse = Some(Box::new(reverse));
        self
    }
}

impl Shortcode for FnShortcode {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn convert(&self, args: &Arguments, context: &Context) -> Result<String> {
        (self.convert)(args, context)
    }

    fn supports_reverse(&self) -> bool {
        self.reverse.is_some()
    }

    fn reverse(&self, text: &str) -> Result<String> {
        match &self.reverse {
            Some(reverse) => reverse(&self.signature, text),
            None => Err(ShortcodeError::NotReversible(self.name().to_string())),
        }
    }
}

impl fmt::Debug for FnShortcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnShortcode")
            .field("signature", &self.signature)
            .field("reversible", &self.reverse.is_some())
            .finish()
    }
}
