//! HTML shortcodes
//!
//! [`HtmlShortcode`] renders its arguments through a [`Template`] into a single-root markup
//! fragment and tags the root element with a marker class, `shortcode-<name>` unless
//! configured otherwise. Reversal finds elements carrying that marker, reads each input back
//! through its reverse-lookup path and rejoins the values into a tag.
//!
//! ```ignore
//! let link = HtmlShortcode::positional(
//!     "link",
//!     vec![Input::new("url").with_path("@href"), Input::new("text").with_path("text()")],
//!     r#"<a href="{url}">{text}</a>"#,
//! )?;
//! // [%link http://example.com/ text %]
//! //   <-> <a href="http://example.com/" class="shortcode-link">text</a>
//! ```
//!
//! Ownership
//!
//!     The marker class is the only signal reversal trusts. Elements without it are left
//!     untouched, even when they look exactly like this shortcode's output. An element that
//!     carries the marker but is never closed cannot be reversed reliably and fails with
//!     [`ShortcodeError::MalformedMarkup`].
//!
//! Reversibility
//!
//!     Every positional input needs a reverse path unless it declares a default; keyword
//!     inputs without a path rejoin as their default, which is then omitted. Otherwise
//!     `reverse` fails with [`ShortcodeError::NotReversible`].

pub mod markup;
pub mod path;
pub mod template;

pub use path::{PathError, ReversePath};
pub use template::{Template, TemplateError};

use crate::error::{Result, ShortcodeError};
use crate::input::Input;
use crate::shortcode::{Context, Shortcode};
use crate::signature::{Arguments, Binding, Signature};
use crate::tag::TagArgs;
use markup::Fragment;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// Prefix of the default marker class
pub const MARKER_PREFIX: &str = "shortcode-";

/// Comment, closing tag or opening tag; attribute values may be quoted and contain `>`.
/// Comments match as a whole (to the end of text when unterminated) so tags inside them
/// are never seen.
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<!--.*?(?:-->|\z)|</(?P<close>[a-z][a-z0-9:-]*)\s*>|<(?P<open>[a-z][a-z0-9:-]*)(?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*\s*(?P<selfclose>/?)>"#,
    )
    .unwrap()
});

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Shortcode rendered as a marked HTML fragment
#[derive(Debug, Clone)]
pub struct HtmlShortcode {
    signature: Signature,
    template: Template,
    marker: String,
    /// Compiled reverse paths, parallel to the signature's inputs
    paths: Vec<Option<ReversePath>>,
}

impl HtmlShortcode {
    /// Build from a signature, compiling every input's reverse path.
    ///
    /// An invalid path fails with [`ShortcodeError::InvalidInput`].
    pub fn new(signature: Signature, template: impl Into<Template>) -> Result<Self> {
        let paths = signature
            .inputs()
            .iter()
            .map(|input| {
                input
                    .path
                    .as_deref()
                    .map(ReversePath::compile)
                    .transpose()
                    .map_err(|e| ShortcodeError::invalid_input(signature.name(), e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(HtmlShortcode {
            marker: format!("{MARKER_PREFIX}{}", signature.name()),
            signature,
            template: template.into(),
            paths,
        })
    }

    pub fn positional(
        name: impl Into<String>,
        inputs: Vec<Input>,
        template: impl Into<Template>,
    ) -> Result<Self> {
        Self::new(Signature::positional(name, inputs)?, template)
    }

    pub fn keyword(
        name: impl Into<String>,
        inputs: Vec<Input>,
        template: impl Into<Template>,
    ) -> Result<Self> {
        Self::new(Signature::keyword(name, inputs)?, template)
    }

    /// Replace the marker class
    pub fn with_marker(mut self, marker: impl Into<String>) -> Result<Self> {
        let marker = marker.into();
        if marker.is_empty() || marker.chars().any(char::is_whitespace) {
            return Err(ShortcodeError::invalid_input(
                self.signature.name(),
                format!("marker class `{marker}` must be a single non-empty class name"),
            ));
        }
        self.marker = marker;
        Ok(self)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// First input that reversal would need but has no reverse path
    fn unreversible_input(&self) -> Option<&Input> {
        self.signature
            .inputs()
            .iter()
            .zip(&self.paths)
            .find(|(input, path)| {
                path.is_none()
                    && match self.signature.binding() {
                        Binding::Positional => input.default.is_none(),
                        Binding::Keyword(_) => false,
                    }
            })
            .map(|(input, _)| input)
    }

    /// A required input that is still missing cannot be rendered
    fn missing_as_rendering(&self, error: ShortcodeError) -> ShortcodeError {
        match error {
            missing @ ShortcodeError::MissingInput { .. } => {
                ShortcodeError::rendering_caused_by(self.name(), missing)
            }
            other => other,
        }
    }

    /// Rejoin one candidate fragment, or `None` when it is not ours
    fn reverse_fragment(&self, candidate: &str, closed: bool) -> Result<Option<String>> {
        let Some(fragment) = Fragment::parse(candidate) else {
            trace!(shortcode = self.name(), candidate, "skipping: no element");
            return Ok(None);
        };
        if !fragment.has_class(&self.marker) {
            trace!(shortcode = self.name(), candidate, "skipping: marker absent");
            return Ok(None);
        }
        if !closed {
            return Err(ShortcodeError::MalformedMarkup {
                name: self.name().to_string(),
                fragment: candidate.to_string(),
            });
        }

        let values = self
            .signature
            .inputs()
            .iter()
            .zip(&self.paths)
            .map(|(input, path)| {
                let value = match path {
                    Some(path) => path.evaluate(fragment.root()).unwrap_or_default(),
                    None => input.resolved_default().to_string(),
                };
                (input.name.clone(), value)
            })
            .collect();
        Ok(Some(self.signature.rejoin(&Arguments::new(values))))
    }
}

impl Shortcode for HtmlShortcode {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn bind(&self, args: TagArgs) -> Result<Arguments> {
        self.signature
            .bind(args)
            .map_err(|e| self.missing_as_rendering(e))
    }

    fn convert(&self, args: &Arguments, context: &Context) -> Result<String> {
        let args = self
            .signature
            .fill(args)
            .map_err(|e| self.missing_as_rendering(e))?;
        let html = self
            .template
            .render(&args, context)
            .map_err(|e| ShortcodeError::rendering_caused_by(self.name(), e))?;
        markup::apply_marker(&html, &self.marker)
            .map_err(|e| ShortcodeError::rendering_caused_by(self.name(), e))
    }

    fn supports_reverse(&self) -> bool {
        self.unreversible_input().is_none()
    }

    fn reverse(&self, text: &str) -> Result<String> {
        if let Some(input) = self.unreversible_input() {
            debug!(
                shortcode = self.name(),
                input = %input.name,
                "input has no reverse path"
            );
            return Err(ShortcodeError::NotReversible(self.name().to_string()));
        }

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut pos = 0;
        let mut count = 0;
        while let Some(caps) = MARKUP_TAG.captures_at(text, pos) {
            let Some(whole) = caps.get(0) else { break };
            pos = whole.end();
            let Some(open) = caps.name("open") else {
                continue;
            };
            if !whole.as_str().contains(self.marker.as_str()) {
                continue;
            }

            let standalone = caps.name("selfclose").is_some_and(|m| !m.as_str().is_empty())
                || VOID_ELEMENTS.contains(&open.as_str().to_ascii_lowercase().as_str());
            let end = if standalone {
                Some(whole.end())
            } else {
                closing_tag_end(text, whole.end(), open.as_str())
            };
            let candidate_end = end.unwrap_or(whole.end());
            let candidate = &text[whole.start()..candidate_end];

            if let Some(tag) = self.reverse_fragment(candidate, end.is_some())? {
                output.push_str(&text[last..whole.start()]);
                output.push_str(&tag);
                last = candidate_end;
                pos = candidate_end;
                count += 1;
            }
        }
        output.push_str(&text[last..]);

        debug!(shortcode = self.name(), fragments = count, "reversed fragments");
        Ok(output)
    }
}

/// End offset of the tag closing the `name` element opened just before `from`
fn closing_tag_end(text: &str, from: usize, name: &str) -> Option<usize> {
    let mut depth = 1usize;
    for caps in MARKUP_TAG.captures_iter(&text[from..]) {
        let whole = caps.get(0)?;
        if let Some(close) = caps.name("close") {
            if close.as_str().eq_ignore_ascii_case(name) {
                depth -= 1;
                if depth == 0 {
                    return Some(from + whole.end());
                }
            }
        } else if let Some(open) = caps.name("open") {
            let self_closing = caps.name("selfclose").is_some_and(|m| !m.as_str().is_empty());
            if open.as_str().eq_ignore_ascii_case(name) && !self_closing {
                depth += 1;
            }
        }
    }
    None
}
