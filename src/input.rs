//! Input declarations
//!
//! An [`Input`] names one parameter of a shortcode. It is built once, when the shortcode is
//! defined, and never changes afterwards.

/// Declaration of a single shortcode parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    /// Reverse-lookup path used to read the value back out of rendered markup
    pub path: Option<String>,
    pub default: Option<String>,
    pub required: bool,
}

impl Input {
    pub fn new(name: impl Into<String>) -> Self {
        Input {
            name: name.into(),
            path: None,
            default: None,
            required: false,
        }
    }

    /// Set the reverse-lookup path, e.g. `@href` or `text()`
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The value an omitted argument resolves to: the default, or the empty string
    pub fn resolved_default(&self) -> &str {
        self.default.as_deref().unwrap_or("")
    }
}

impl From<&str> for Input {
    fn from(name: &str) -> Self {
        Input::new(name)
    }
}
