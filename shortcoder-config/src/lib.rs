//! Layered configuration for shortcoder.
//!
//! `defaults/shortcoder.default.toml` is embedded so that the documented
//! defaults and runtime behavior stay in sync. Applications layer their own
//! files on top via [`Loader`] before deserializing into [`ShortcoderConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
#[cfg(feature = "html")]
use shortcoder::{HtmlShortcode, Shortcode, Template};
use shortcoder::{Binding, Context, Input, KeywordPolicy, Shortcoder, Signature};
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/shortcoder.default.toml");

/// Top-level configuration consumed by applications embedding shortcoder.
#[derive(Debug, Clone, Deserialize)]
pub struct ShortcoderConfig {
    /// Default context for every convert call
    #[serde(default)]
    pub context: Context,
    pub keyword: KeywordPolicy,
    pub html: HtmlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
    pub marker_prefix: String,
}

impl ShortcoderConfig {
    pub fn keyword_policy(&self) -> KeywordPolicy {
        self.keyword
    }

    /// Keyword binding carrying the configured policy
    pub fn keyword_binding(&self) -> Binding {
        Binding::Keyword(self.keyword)
    }

    /// Marker class for the shortcode called `name`
    pub fn marker_for(&self, name: &str) -> String {
        format!("{}{}", self.html.marker_prefix, name)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Keyword signature using the configured policy
    pub fn keyword_signature(
        &self,
        name: impl Into<String>,
        inputs: Vec<Input>,
    ) -> shortcoder::Result<Signature> {
        Signature::new(name, inputs, self.keyword_binding())
    }

    /// Give `shortcode` the configured marker class
    #[cfg(feature = "html")]
    pub fn mark(&self, shortcode: HtmlShortcode) -> shortcoder::Result<HtmlShortcode> {
        let marker = self.marker_for(shortcode.name());
        shortcode.with_marker(marker)
    }

    /// Positional HTML shortcode carrying the configured marker
    #[cfg(feature = "html")]
    pub fn html_positional(
        &self,
        name: impl Into<String>,
        inputs: Vec<Input>,
        template: impl Into<Template>,
    ) -> shortcoder::Result<HtmlShortcode> {
        self.mark(HtmlShortcode::positional(name, inputs, template)?)
    }

    /// Keyword HTML shortcode carrying the configured marker and keyword policy
    #[cfg(feature = "html")]
    pub fn html_keyword(
        &self,
        name: impl Into<String>,
        inputs: Vec<Input>,
        template: impl Into<Template>,
    ) -> shortcoder::Result<HtmlShortcode> {
        self.mark(HtmlShortcode::new(
            self.keyword_signature(name, inputs)?,
            template,
        )?)
    }

    /// Hand the configured context to `shortcoder`.
    ///
    /// Keys the shortcoder already carries win over configured ones. Marker prefix and
    /// keyword policy are fixed when a shortcode is built, so build shortcodes through
    /// [`ShortcoderConfig::keyword_signature`], [`ShortcoderConfig::html_positional`] or
    /// [`ShortcoderConfig::html_keyword`] to pick them up.
    pub fn apply(&self, shortcoder: Shortcoder) -> Shortcoder {
        let mut context = self.context.clone();
        context.extend(shortcoder.context().clone());
        shortcoder.with_context(context)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file, ignored if absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `keyword.rejoin`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ShortcoderConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ShortcoderConfig, ConfigError> {
    Loader::new().build()
}
