//! Shortcode registry and dispatcher
//!
//! [`Shortcoder`] owns the registered shortcodes, expands tags in free text and drives
//! reversal across every registered shortcode.
//!
//! Reversal runs in registration order and each shortcode sees the output of the ones before
//! it. When one shortcode's markup could be mistaken for another's, register them with that
//! in mind.

use crate::error::{Result, ShortcodeError};
use crate::shortcode::{Context, Shortcode};
use crate::tag;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Registry of shortcodes
///
/// # Examples
///
/// ```ignore
/// let mut shortcoder = Shortcoder::new();
/// shortcoder.register(link)?;
///
/// let html = shortcoder.parse("Follow [%link https://example.com/ me %]")?;
/// let source = shortcoder.reverse(&html)?;
/// ```
#[derive(Default)]
pub struct Shortcoder {
    shortcodes: Vec<Box<dyn Shortcode>>,
    index: HashMap<String, usize>,
    context: Context,
}

impl Shortcoder {
    /// Create a new empty registry
    pub fn new() -> Self {
        Shortcoder::default()
    }

    /// Create a registry holding `shortcodes`, registered in order
    pub fn with_shortcodes<I>(shortcodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = Box<dyn Shortcode>>,
    {
        let mut shortcoder = Self::new();
        for shortcode in shortcodes {
            shortcoder.register_boxed(shortcode)?;
        }
        Ok(shortcoder)
    }

    /// Set the context passed to every conversion when `parse` is not given one
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Register a shortcode
    ///
    /// Fails with [`ShortcodeError::DuplicateShortcode`] if the name is taken.
    pub fn register<S: Shortcode + 'static>(&mut self, shortcode: S) -> Result<()> {
        self.register_boxed(Box::new(shortcode))
    }

    pub fn register_boxed(&mut self, shortcode: Box<dyn Shortcode>) -> Result<()> {
        let name = shortcode.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ShortcodeError::DuplicateShortcode(name));
        }
        debug!(shortcode = %name, "registering shortcode");
        self.index.insert(name, self.shortcodes.len());
        self.shortcodes.push(shortcode);
        Ok(())
    }

    /// Get a shortcode by name
    pub fn get(&self, name: &str) -> Option<&dyn Shortcode> {
        self.index
            .get(name)
            .map(|&at| self.shortcodes[at].as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.shortcodes.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.shortcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcodes.is_empty()
    }

    /// Expand every tag in `text` using the registry's own context
    pub fn parse(&self, text: &str) -> Result<String> {
        self.expand(text, &self.context)
    }

    /// Expand every tag in `text`, handing `context` to each conversion
    pub fn parse_with(&self, text: &str, context: &Context) -> Result<String> {
        self.expand(text, context)
    }

    fn expand(&self, text: &str, context: &Context) -> Result<String> {
        if self.is_empty() {
            return Err(ShortcodeError::NoShortcodesRegistered);
        }

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        let mut count = 0;
        for occurrence in tag::scan(text) {
            trace!(name = occurrence.name, span = ?occurrence.span, "found tag");
            let shortcode =
                self.get(occurrence.name)
                    .ok_or_else(|| ShortcodeError::UnknownShortcode {
                        name: occurrence.name.to_string(),
                        tag: occurrence.source.to_string(),
                    })?;
            let args = shortcode.bind(occurrence.tokens()?)?;
            let rendered = shortcode.convert(&args, context)?;

            output.push_str(&text[last..occurrence.span.start]);
            output.push_str(&rendered);
            last = occurrence.span.end;
            count += 1;
        }
        output.push_str(&text[last..]);

        debug!(tags = count, "expanded shortcodes");
        Ok(output)
    }

    /// Reverse rendered output back into tags
    ///
    /// Each shortcode rewrites its own output in turn, in registration order.
    pub fn reverse(&self, text: &str) -> Result<String> {
        let mut text = text.to_string();
        for shortcode in &self.shortcodes {
            trace!(shortcode = shortcode.name(), "reversing");
            text = shortcode.reverse(&text)?;
        }
        debug!(shortcodes = self.shortcodes.len(), "reversed text");
        Ok(text)
    }
}

impl std::fmt::Debug for Shortcoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shortcoder")
            .field("shortcodes", &self.names())
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::shortcode::FnShortcode;
    use crate::signature::{Arguments, Signature};

    // Test shortcode
    struct TestShortcode(Signature);

    impl Shortcode for TestShortcode {
        fn signature(&self) -> &Signature {
            &self.0
        }
        fn convert(&self, args: &Arguments, _context: &Context) -> Result<String> {
            Ok(format!(
                "<a href=\"{}\">{}</a>",
                args.get_index(0).unwrap_or(""),
                args.get_index(1).unwrap_or("")
            ))
        }
    }

    fn link() -> TestShortcode {
        TestShortcode(
            Signature::positional("link", vec![Input::new("url"), Input::new("text")]).unwrap(),
        )
    }

    #[test]
    fn test_registry_creation() {
        let shortcoder = Shortcoder::new();
        assert!(shortcoder.is_empty());
        assert_eq!(shortcoder.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut shortcoder = Shortcoder::new();
        shortcoder.register(link()).unwrap();

        assert!(shortcoder.has("link"));
        assert!(!shortcoder.has("nonexistent"));
        assert_eq!(shortcoder.names(), vec!["link"]);
        assert_eq!(shortcoder.get("link").map(|s| s.name()), Some("link"));
    }

    #[test]
    fn test_registry_duplicate() {
        let mut shortcoder = Shortcoder::new();
        shortcoder.register(link()).unwrap();
        match shortcoder.register(link()) {
            Err(ShortcodeError::DuplicateShortcode(name)) => assert_eq!(name, "link"),
            other => panic!("Expected DuplicateShortcode, got {other:?}"),
        }
        assert_eq!(shortcoder.len(), 1);
    }

    #[test]
    fn test_parse_basic() {
        let shortcoder = Shortcoder::with_shortcodes([Box::new(link()) as Box<dyn Shortcode>])
            .unwrap();
        assert_eq!(
            shortcoder.parse("[%link one two %]").unwrap(),
            "<a href=\"one\">two</a>"
        );
        assert_eq!(
            shortcoder
                .parse("a [%link one two %] b [% link three%] c")
                .unwrap(),
            "a <a href=\"one\">two</a> b <a href=\"three\"></a> c"
        );
    }

    #[test]
    fn test_parse_without_tags_is_identity() {
        let mut shortcoder = Shortcoder::new();
        shortcoder.register(link()).unwrap();
        assert_eq!(shortcoder.parse("plain [text] %").unwrap(), "plain [text] %");
    }

    #[test]
    fn test_parse_no_shortcodes_registered() {
        let result = Shortcoder::new().parse("foobar");
        assert!(matches!(result, Err(ShortcodeError::NoShortcodesRegistered)));
    }

    #[test]
    fn test_parse_unknown_shortcode() {
        let mut shortcoder = Shortcoder::new();
        shortcoder.register(link()).unwrap();
        match shortcoder.parse("x [%linkz one two %]") {
            Err(ShortcodeError::UnknownShortcode { name, tag }) => {
                assert_eq!(name, "linkz");
                assert_eq!(tag, "[%linkz one two %]");
            }
            other => panic!("Expected UnknownShortcode, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let mut shortcoder = Shortcoder::new();
        shortcoder.register(link()).unwrap();
        let result = shortcoder.parse("[%link \"one two %]");
        assert!(matches!(result, Err(ShortcodeError::Tokenize(_))));
    }

    #[test]
    fn test_parse_context() {
        let mut context = Context::new();
        context.insert("site".to_string(), "example.com".into());
        let mut shortcoder = Shortcoder::new().with_context(context);
        shortcoder
            .register(FnShortcode::new(
                Signature::positional("site", vec![]).unwrap(),
                |_, context| {
                    Ok(context
                        .get("site")
                        .and_then(|v| v.as_str())
                        .unwrap_or("none")
                        .to_string())
                },
            ))
            .unwrap();

        assert_eq!(shortcoder.parse("[%site %]").unwrap(), "example.com");

        let mut other = Context::new();
        other.insert("site".to_string(), "other.org".into());
        assert_eq!(
            shortcoder.parse_with("[%site %]", &other).unwrap(),
            "other.org"
        );
    }

    #[test]
    fn test_reverse_not_reversible() {
        let mut shortcoder = Shortcoder::new();
        shortcoder.register(link()).unwrap();
        assert!(matches!(
            shortcoder.reverse("<a href=\"one\">two</a>"),
            Err(ShortcodeError::NotReversible(name)) if name == "link"
        ));
    }

    #[test]
    fn test_reverse_runs_in_registration_order() {
        let first = FnShortcode::new(Signature::positional("first", vec![]).unwrap(), |_, _| {
            Ok(String::new())
        })
        .with_reverse(|_, text| Ok(text.replace("A", "B")));
        let second = FnShortcode::new(Signature::positional("second", vec![]).unwrap(), |_, _| {
            Ok(String::new())
        })
        .with_reverse(|_, text| Ok(text.replace("B", "[%second %]")));

        let mut shortcoder = Shortcoder::new();
        shortcoder.register(first).unwrap();
        shortcoder.register(second).unwrap();
        assert_eq!(shortcoder.reverse("xAx").unwrap(), "x[%second %]x");
        assert_eq!(shortcoder.names(), vec!["first", "second"]);
    }
}
