//! Page tree types
//!
//! A [`PageNode`] tree is the classified, indexed view of one page capture.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::Coordinates;

/// Bounding box in viewport CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Centre of the box, if it is a usable click target
    pub fn center(&self) -> Option<Coordinates> {
        let x = self.x + self.width / 2.0;
        let y = self.y + self.height / 2.0;
        if !x.is_finite() || !y.is_finite() || x <= 0.0 || y <= 0.0 {
            return None;
        }
        Some(Coordinates::new(x, y))
    }
}

/// A node of the captured page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageNode {
    Element(ElementNode),
    Text(TextNode),
}

/// A rendered text run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNode {
    pub text: String,
    pub visible: bool,
}

/// A classified element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Visible text of the direct text children
    pub text: String,
    pub xpath: String,
    pub bounds: Option<BoundingBox>,
    pub coordinates: Option<Coordinates>,
    pub visible: bool,
    pub interactive: bool,
    pub topmost: bool,
    /// Set only when interactive, visible and topmost
    pub highlight_index: Option<usize>,
    pub children: Vec<Option<PageNode>>,
    pub shadow_root: bool,
    /// XPath of the hosting iframe, for nodes captured inside one
    pub iframe_context: Option<String>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: String::new(),
            xpath: String::new(),
            bounds: None,
            coordinates: None,
            visible: false,
            interactive: false,
            topmost: false,
            highlight_index: None,
            children: Vec::new(),
            shadow_root: false,
            iframe_context: None,
        }
    }

    /// Copy of this node without its subtree
    pub fn shallow_clone(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }

    /// Direct child nodes that were kept
    pub fn child_nodes(&self) -> impl DoubleEndedIterator<Item = &PageNode> {
        self.children.iter().flatten()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl PageNode {
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            PageNode::Element(el) => Some(el),
            PageNode::Text(_) => None,
        }
    }

    /// Pre-order walk over every element of the tree
    pub fn elements(&self) -> Vec<&ElementNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let PageNode::Element(el) = node {
                out.push(el);
                stack.extend(el.child_nodes().rev());
            }
        }
        out
    }
}
