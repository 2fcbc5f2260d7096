//! Markup fragments over html5ever's RcDom
//!
//! Pipeline for rendering: markup string → RcDom → root element (+ marker class) → string.
//! Reversal parses a candidate fragment the same way and reads values off the root element.
//!
//! html5ever never rejects input; it repairs it. A fragment "fails to parse" here when the
//! repaired tree has no root element (e.g. a stray `<td>`), or, when rendering, more than one.

use html5ever::tendril::TendrilSink;
use html5ever::{
    ns, parse_document, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute,
    LocalName, ParseOpts, QualName,
};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("markup has no root element")]
    NoRoot,

    #[error("markup must have exactly one root element, found {0} top-level nodes")]
    MultipleRoots(usize),

    #[error("HTML serialization failed: {0}")]
    Serialize(#[from] std::io::Error),

    #[error("UTF-8 conversion failed: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A parsed fragment and its root element
pub struct Fragment {
    // keeps the tree alive; `root` only holds weak parent links
    _dom: RcDom,
    root: Handle,
    top_level: usize,
}

impl Fragment {
    /// Parse `markup`; `None` when the repaired tree contains no element
    pub fn parse(markup: &str) -> Option<Fragment> {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(markup);
        let nodes = top_level_nodes(&dom);
        let root = nodes.iter().find(|node| element_name(node).is_some())?.clone();
        Some(Fragment {
            top_level: nodes.len(),
            _dom: dom,
            root,
        })
    }

    pub fn root(&self) -> &Handle {
        &self.root
    }

    /// Lowercase tag name of the root element
    pub fn tag_name(&self) -> String {
        element_name(&self.root).unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        attribute(&self.root, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Append `class` to the root's class list, keeping existing classes
    pub fn add_class(&self, class: &str) {
        if self.has_class(class) {
            return;
        }
        if let NodeData::Element { attrs, .. } = &self.root.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|attr| &*attr.name.local == "class") {
                Some(attr) => {
                    let joined = format!("{} {}", attr.value.trim(), class);
                    attr.value = joined.trim().to_string().into();
                }
                None => attrs.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from("class")),
                    value: class.to_string().into(),
                }),
            }
        }
    }

    /// Serialize the root element and its children
    pub fn serialize(&self) -> Result<String, MarkupError> {
        let mut output = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::IncludeNode,
            ..Default::default()
        };
        let serializable = SerializableHandle::from(self.root.clone());
        serialize(&mut output, &serializable, opts)?;
        Ok(String::from_utf8(output)?)
    }
}

/// Parse rendered markup, tag its single root element with `marker` and serialize it back
pub fn apply_marker(markup: &str, marker: &str) -> Result<String, MarkupError> {
    let fragment = Fragment::parse(markup).ok_or(MarkupError::NoRoot)?;
    if fragment.top_level != 1 {
        return Err(MarkupError::MultipleRoots(fragment.top_level));
    }
    fragment.add_class(marker);
    fragment.serialize()
}

/// Elements and non-blank text directly under `<head>` and `<body>`
fn top_level_nodes(dom: &RcDom) -> Vec<Handle> {
    let mut nodes = Vec::new();
    for html in children_elements(&dom.document) {
        for section in children_elements(&html) {
            for node in section.children.borrow().iter() {
                let keep = match &node.data {
                    NodeData::Element { .. } => true,
                    NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
                    _ => false,
                };
                if keep {
                    nodes.push(node.clone());
                }
            }
        }
    }
    nodes
}

/// Lowercase local name of an element node
pub fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

pub fn attribute(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| (*attr.name.local).eq_ignore_ascii_case(name))
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub fn children_elements(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// All element descendants in document order, excluding `node` itself
pub fn descendant_elements(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    for child in children_elements(node) {
        out.push(child.clone());
        out.extend(descendant_elements(&child));
    }
    out
}

/// Text nodes directly under `node`
pub fn direct_text(node: &Handle) -> Vec<String> {
    node.children
        .borrow()
        .iter()
        .filter_map(|child| match &child.data {
            NodeData::Text { contents } => Some(contents.borrow().to_string()),
            _ => None,
        })
        .collect()
}

/// Concatenated text of `node` and all its descendants
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &node.data {
        out.push_str(&contents.borrow());
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}
