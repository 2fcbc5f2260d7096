//! Markup templates
//!
//! A [`Template`] turns bound arguments into a markup string. Format templates interpolate
//! `{name}` and `{index}` placeholders; `{{` and `}}` stand for literal braces.
//! Interpolated values are HTML-escaped, so the rendered markup decodes back to the exact
//! argument values when it is reversed.

use crate::shortcode::Context;
use crate::signature::Arguments;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

type TemplateFn = dyn Fn(&Arguments, &Context) -> Result<String, String> + Send + Sync;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),

    #[error("unbalanced brace at byte {0}")]
    Unbalanced(usize),

    #[error("{0}")]
    Function(String),
}

#[derive(Clone)]
pub enum Template {
    Format(String),
    Function(Arc<TemplateFn>),
}

impl Template {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Arguments, &Context) -> Result<String, String> + Send + Sync + 'static,
    {
        Template::Function(Arc::new(f))
    }

    pub fn render(&self, args: &Arguments, context: &Context) -> Result<String, TemplateError> {
        match self {
            Template::Format(format) => interpolate(format, args, context),
            Template::Function(f) => f(args, context).map_err(TemplateError::Function),
        }
    }
}

fn interpolate(format: &str, args: &Arguments, context: &Context) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;
    let mut offset = 0;

    while let Some(at) = rest.find(&['{', '}'][..]) {
        out.push_str(&rest[..at]);
        let brace = &rest[at..];
        if brace.starts_with("{{") {
            out.push('{');
            rest = &brace[2..];
            offset += at + 2;
        } else if brace.starts_with("}}") {
            out.push('}');
            rest = &brace[2..];
            offset += at + 2;
        } else if brace.starts_with('}') {
            return Err(TemplateError::Unbalanced(offset + at));
        } else {
            let close = brace
                .find('}')
                .ok_or(TemplateError::Unbalanced(offset + at))?;
            let key = brace[1..close].trim();
            out.push_str(&escape(&lookup(key, args, context)?));
            rest = &brace[close + 1..];
            offset += at + close + 1;
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup(key: &str, args: &Arguments, context: &Context) -> Result<String, TemplateError> {
    let positional = key.parse::<usize>().ok().and_then(|i| args.get_index(i));
    if let Some(value) = positional.or_else(|| args.get(key)) {
        return Ok(value.to_string());
    }
    match context.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(value) => Ok(value.to_string()),
        None => Err(TemplateError::UnknownPlaceholder(key.to_string())),
    }
}

/// Escape text for use in HTML content and attribute values
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

impl From<&str> for Template {
    fn from(format: &str) -> Self {
        Template::Format(format.to_string())
    }
}

impl From<String> for Template {
    fn from(format: String) -> Self {
        Template::Format(format)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Format(format) => f.debug_tuple("Format").field(format).finish(),
            Template::Function(_) => f.write_str("Function(..)"),
        }
    }
}
