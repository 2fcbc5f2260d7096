//! Reverse-lookup paths
//!
//! A small XPath subset evaluated against the root element of a rendered fragment:
//!
//! | Path            | Selects                                             |
//! |-----------------|-----------------------------------------------------|
//! | `@href`         | attribute of the root                               |
//! | `text()`        | first direct text node of the root                  |
//! | `.`             | text content of the root                            |
//! | `img/@src`      | attribute of a child element                        |
//! | `span[2]`       | second `span` child, as text content                |
//! | `//b/text()`    | first text node of any descendant `b`               |
//! | `*/text()`      | text of any child element                           |
//!
//! Element names match case-insensitively. `@attr` and `text()` must be the last step.

use super::markup::{
    attribute, children_elements, descendant_elements, direct_text, element_name, text_content,
};
use markup5ever_rcdom::Handle;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid reverse path `{path}`: {reason}")]
pub struct PathError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// `None` name is the `*` wildcard; index is 1-based
    Element {
        name: Option<String>,
        index: Option<usize>,
    },
    Current,
    Attribute(String),
    Text,
}

/// A compiled reverse-lookup path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversePath {
    source: String,
    steps: Vec<(Axis, Step)>,
}

impl ReversePath {
    pub fn compile(source: &str) -> Result<Self, PathError> {
        let error = |reason: &str| PathError {
            path: source.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(error("path is empty"));
        }
        if trimmed.starts_with('/') && !trimmed.starts_with("//") {
            return Err(error("absolute paths are not supported"));
        }

        let mut steps = Vec::new();
        let mut rest = trimmed;
        while !rest.is_empty() {
            let axis = if let Some(after) = rest.strip_prefix("//") {
                rest = after;
                Axis::Descendant
            } else if let Some(after) = rest.strip_prefix('/') {
                rest = after;
                Axis::Child
            } else {
                Axis::Child
            };

            let end = rest.find('/').unwrap_or(rest.len());
            let segment = &rest[..end];
            rest = &rest[end..];

            if matches!(steps.last(), Some((_, Step::Attribute(_) | Step::Text))) {
                return Err(error("`@attr` and `text()` must be the last step"));
            }
            steps.push((axis, parse_step(segment).map_err(|reason| error(&reason))?));
        }

        Ok(ReversePath {
            source: source.to_string(),
            steps,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against `root`, returning the first selected value
    pub fn evaluate(&self, root: &Handle) -> Option<String> {
        let mut nodes = vec![root.clone()];
        for (axis, step) in &self.steps {
            let scope = |node: &Handle| -> Vec<Handle> {
                match axis {
                    Axis::Child => vec![node.clone()],
                    Axis::Descendant => {
                        let mut all = vec![node.clone()];
                        all.extend(descendant_elements(node));
                        all
                    }
                }
            };

            match step {
                Step::Attribute(name) => {
                    return nodes
                        .iter()
                        .flat_map(scope)
                        .find_map(|node| attribute(&node, name));
                }
                Step::Text => {
                    return nodes
                        .iter()
                        .flat_map(scope)
                        .find_map(|node| direct_text(&node).into_iter().next());
                }
                Step::Current => {
                    nodes = nodes.iter().flat_map(scope).collect();
                }
                Step::Element { name, index } => {
                    nodes = nodes
                        .iter()
                        .flat_map(|node| {
                            let candidates = match axis {
                                Axis::Child => children_elements(node),
                                Axis::Descendant => descendant_elements(node),
                            };
                            let matching: Vec<Handle> = candidates
                                .into_iter()
                                .filter(|el| match name {
                                    None => true,
                                    Some(name) => element_name(el)
                                        .is_some_and(|n| n.eq_ignore_ascii_case(name)),
                                })
                                .collect();
                            match index {
                                Some(i) => matching.into_iter().nth(i - 1).into_iter().collect(),
                                None => matching,
                            }
                        })
                        .collect();
                }
            }
        }
        nodes.first().map(text_content)
    }
}

fn parse_step(segment: &str) -> Result<Step, String> {
    match segment {
        "" => Err("empty step".to_string()),
        "." => Ok(Step::Current),
        "text()" => Ok(Step::Text),
        ".." => Err("parent steps are not supported".to_string()),
        _ => {
            if let Some(attr) = segment.strip_prefix('@') {
                return if is_name(attr) {
                    Ok(Step::Attribute(attr.to_ascii_lowercase()))
                } else {
                    Err(format!("invalid attribute name `{attr}`"))
                };
            }

            let (name, index) = match segment.find('[') {
                Some(open) => {
                    let inner = segment[open + 1..]
                        .strip_suffix(']')
                        .ok_or_else(|| format!("unclosed predicate in `{segment}`"))?;
                    let index: usize = inner
                        .trim()
                        .parse()
                        .ok()
                        .filter(|&i| i > 0)
                        .ok_or_else(|| format!("predicate must be a position >= 1, got `{inner}`"))?;
                    (&segment[..open], Some(index))
                }
                None => (segment, None),
            };

            match name {
                "*" => Ok(Step::Element { name: None, index }),
                name if is_name(name) => Ok(Step::Element {
                    name: Some(name.to_string()),
                    index,
                }),
                name => Err(format!("invalid element name `{name}`")),
            }
        }
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

impl FromStr for ReversePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for ReversePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::markup::Fragment;

    fn select(markup: &str, path: &str) -> Option<String> {
        let fragment = Fragment::parse(markup).expect("an element");
        ReversePath::compile(path).unwrap().evaluate(fragment.root())
    }

    const FIGURE: &str = r#"<figure data-id="7"><img src="a.jpg" alt="A"><figcaption>Hello <b>bold</b> world</figcaption><span>one</span><span>two</span></figure>"#;

    #[test]
    fn test_attribute_and_text() {
        let link = r#"<a href="foo's.jpg" class="x">image</a>"#;
        assert_eq!(select(link, "@href").as_deref(), Some("foo's.jpg"));
        assert_eq!(select(link, "text()").as_deref(), Some("image"));
        assert_eq!(select(link, "@missing"), None);
    }

    #[test]
    fn test_child_steps() {
        assert_eq!(select(FIGURE, "@data-id").as_deref(), Some("7"));
        assert_eq!(select(FIGURE, "img/@src").as_deref(), Some("a.jpg"));
        assert_eq!(select(FIGURE, "IMG/@alt").as_deref(), Some("A"));
        assert_eq!(select(FIGURE, "figcaption/text()").as_deref(), Some("Hello "));
        assert_eq!(
            select(FIGURE, "figcaption").as_deref(),
            Some("Hello bold world")
        );
        assert_eq!(select(FIGURE, "span[2]").as_deref(), Some("two"));
        assert_eq!(select(FIGURE, "span[3]"), None);
        assert_eq!(select(FIGURE, "*/@src").as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_descendant_and_current() {
        assert_eq!(select(FIGURE, "//b/text()").as_deref(), Some("bold"));
        assert_eq!(select(FIGURE, "//@src").as_deref(), Some("a.jpg"));
        assert_eq!(select(FIGURE, "./@data-id").as_deref(), Some("7"));
        assert_eq!(
            select("<p>a <i>b</i></p>", ".").as_deref(),
            Some("a b")
        );
    }

    #[test]
    fn test_compile_errors() {
        for path in ["", "/a", "a/", "@", "a[0]", "a[x]", "a[1", "..", "@href/text()", "1a"] {
            assert!(ReversePath::compile(path).is_err(), "{path:?} should fail");
        }
        assert_eq!(
            "img/@src".parse::<ReversePath>().unwrap().to_string(),
            "img/@src"
        );
    }
}
