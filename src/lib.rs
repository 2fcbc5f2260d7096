//! Bidirectional shortcodes
//!
//!     Shortcodes are small tags embedded in free text, `[% name args %]`, that expand into
//!     richer output. This crate expands them and, for shortcodes that support it, reverses
//!     the output back into canonical tag text.
//!
//! Architecture
//!
//!     - Shortcode trait: uniform interface for every shortcode (convert and optionally reverse)
//!     - Shortcoder: registry of shortcodes that scans text and dispatches tags
//!     - Signature: declared inputs plus a binding mode that maps tag tokens to arguments
//!     - HtmlShortcode: shortcode rendering a marked HTML fragment, reversible through paths
//!
//!     This is a pure lib. It never reads files, environment variables or stdin; layered
//!     configuration lives in the shortcoder-config crate.
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # ShortcodeError, TokenizeError
//!     ├── quote.rs                # shell-style splitting and quoting of values
//!     ├── tag.rs                  # tag scanning and token classification
//!     ├── input.rs                # declared inputs
//!     ├── signature.rs            # binding modes, Arguments, bind and rejoin
//!     ├── shortcode.rs            # Shortcode trait, FnShortcode
//!     ├── shortcoder.rs           # Shortcoder registry and dispatcher
//!     ├── html                    # feature "html"
//!     │   ├── mod.rs              # HtmlShortcode
//!     │   ├── template.rs         # format and function templates
//!     │   ├── markup.rs           # html5ever fragments, marker class
//!     │   └── path.rs             # reverse-lookup paths
//!     ├── lib.rs
//!
//! Testing
//!     tests
//!     ├── manager.rs              # registry and dispatch scenarios
//!     ├── html_shortcodes.rs      # HTML rendering and reversal
//!     └── quote_proptest.rs       # quoting and tokenizing properties
//!
//! Tag syntax
//!
//!     A tag opens with `[%`, closes with `%]` and starts with the shortcode name. The
//!     remaining text is split like a shell command line: whitespace separates tokens, single
//!     and double quotes group them, and a token of the form `key=value` is a keyword token.
//!
//!         [%link http://example.com/ "Example site" %]
//!         [%youtube id=dQw4w9WgXcQ width=560 %]
//!
//!     Reversal only rewrites output carrying a shortcode's marker, so hand-written markup
//!     that happens to look like shortcode output is left alone.

pub mod error;
#[cfg(feature = "html")]
pub mod html;
pub mod input;
pub mod quote;
pub mod shortcode;
pub mod shortcoder;
pub mod signature;
pub mod tag;

pub use error::{Result, ShortcodeError, TokenizeError};
#[cfg(feature = "html")]
pub use html::{HtmlShortcode, Template};
pub use input::Input;
pub use quote::{quote, split};
pub use shortcode::{Context, FnShortcode, Shortcode};
pub use shortcoder::Shortcoder;
pub use signature::{Arguments, Binding, KeywordPolicy, Rejoin, Signature};
