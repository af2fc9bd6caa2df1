//! Raw capture types and element classification
//!
//! The capture script only reports facts. Everything that decides whether an
//! element gets a highlight index lives here so it can be tested without a page.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::dom::node::{BoundingBox, ElementNode, PageNode, TextNode};

/// Tags that never carry page semantics
pub const SKIPPED_TAGS: &[&str] = &["script", "style", "svg", "link", "meta"];

const INTERACTIVE_TAGS: &[&str] = &[
    "a", "button", "details", "embed", "input", "label", "menu", "menuitem", "object",
    "select", "textarea", "summary",
];

const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "menu",
    "menuitem",
    "link",
    "checkbox",
    "radio",
    "slider",
    "tab",
    "tabpanel",
    "textbox",
    "combobox",
    "grid",
    "listbox",
    "option",
    "progressbar",
    "scrollbar",
    "searchbox",
    "switch",
    "tree",
    "treeitem",
    "spinbutton",
    "tooltip",
    "a-button-inner",
    "a-dropdown-button",
    "click",
    "menuitemcheckbox",
    "menuitemradio",
    "a-button-text",
    "button-text",
    "button-icon",
    "button-icon-only",
    "button-text-icon-only",
    "dropdown",
];

const CLICK_EVENTS: &[&str] = &["click", "mousedown", "mouseup", "touchstart", "touchend"];

const CLICK_HANDLER_ATTRIBUTES: &[&str] = &["onclick", "ng-click", "@click", "v-on:click"];

const ARIA_STATE_ATTRIBUTES: &[&str] =
    &["aria-expanded", "aria-pressed", "aria-selected", "aria-checked"];

/// How far outside the viewport an element may sit and still be indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportExpansion {
    /// No spatial filtering at all
    Disabled,
    /// Expand the viewport by this many pixels on every side
    Pixels(u32),
}

impl ViewportExpansion {
    /// Map the configured value; `-1` disables the filter
    pub fn from_setting(value: i64) -> Self {
        if value < 0 {
            Self::Disabled
        } else {
            Self::Pixels(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl Default for ViewportExpansion {
    fn default() -> Self {
        Self::Pixels(0)
    }
}

/// Result of the capture script
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCapture {
    pub viewport: RawViewport,
    /// Nodes in document order; each refers to an earlier node as parent
    pub nodes: Vec<RawNode>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawViewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One node as reported by the page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub kind: String,
    pub parent: Option<usize>,

    // text nodes
    pub text: String,
    pub visible: bool,

    // element nodes
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub xpath: String,
    pub rect: Option<RawRect>,
    pub offset_width: f64,
    pub offset_height: f64,
    pub visibility: Option<String>,
    pub display: Option<String>,
    pub listeners: Vec<String>,
    pub draggable: bool,
    pub has_shadow_root: bool,
    pub in_iframe: bool,
    pub in_shadow_root: bool,
    pub iframe_context: Option<String>,
    /// Centre hit-test; `None` when not applicable or the hit-test threw
    pub hit: Option<bool>,
    pub iframe_blocked: bool,
}

impl RawNode {
    fn is_element(&self) -> bool {
        self.kind == "element"
    }

    fn is_text(&self) -> bool {
        self.kind == "text"
    }
}

pub fn classify_interactivity(node: &RawNode) -> bool {
    let tag = node.tag.to_ascii_lowercase();
    if INTERACTIVE_TAGS.contains(&tag.as_str()) {
        return true;
    }

    let has_role = ["role", "aria-role"].iter().any(|name| {
        node.attributes
            .get(*name)
            .is_some_and(|role| INTERACTIVE_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()))
    });
    if has_role {
        return true;
    }

    if node
        .attributes
        .get("tabindex")
        .and_then(|t| t.trim().parse::<i64>().ok())
        .is_some_and(|t| t >= 0)
    {
        return true;
    }

    if node
        .listeners
        .iter()
        .any(|event| CLICK_EVENTS.contains(&event.as_str()))
    {
        return true;
    }

    CLICK_HANDLER_ATTRIBUTES
        .iter()
        .chain(ARIA_STATE_ATTRIBUTES)
        .any(|name| node.attributes.contains_key(*name))
        || node.draggable
}

pub fn classify_visibility(node: &RawNode) -> bool {
    node.offset_width > 0.0
        && node.offset_height > 0.0
        && node.visibility.as_deref() != Some("hidden")
        && node.display.as_deref() != Some("none")
}

pub fn classify_topmost(
    node: &RawNode,
    viewport: &RawViewport,
    expansion: ViewportExpansion,
) -> bool {
    if node.in_iframe {
        return true;
    }
    if node.in_shadow_root {
        return node.hit.unwrap_or(true);
    }
    let ViewportExpansion::Pixels(px) = expansion else {
        return true;
    };
    let Some(rect) = node.rect else {
        return false;
    };

    let px = f64::from(px);
    let left = rect.x + viewport.scroll_x;
    let top = rect.y + viewport.scroll_y;
    let right = left + rect.width;
    let bottom = top + rect.height;

    let outside = bottom < viewport.scroll_y - px
        || top > viewport.scroll_y + viewport.height + px
        || right < viewport.scroll_x - px
        || left > viewport.scroll_x + viewport.width + px;
    if outside {
        return false;
    }

    let cx = rect.x + rect.width / 2.0;
    let cy = rect.y + rect.height / 2.0;
    if cx < 0.0 || cy < 0.0 || cx >= viewport.width || cy >= viewport.height {
        return true;
    }

    node.hit.unwrap_or(true)
}

/// Deepest element nesting kept in the tree. Anything below is dropped; the
/// HTML parser itself stops nesting at this depth.
pub const MAX_TREE_DEPTH: usize = 512;

/// Build the classified tree from a raw capture, assigning highlight indices
/// from 1 in document order.
pub fn build_tree(capture: &RawCapture, expansion: ViewportExpansion) -> Option<PageNode> {
    let nodes = &capture.nodes;
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut root = None;

    for (id, node) in nodes.iter().enumerate() {
        match node.parent {
            // parents always precede children, anything else is dropped
            Some(parent) if parent < id => children[parent].push(id),
            Some(_) => {}
            None if root.is_none() => root = Some(id),
            None => {}
        }
    }

    let root = root?;
    if !nodes[root].is_element() {
        return None;
    }

    let order = classify_in_document_order(capture, &children, root, expansion);
    assemble(capture, &children, order)
}

/// Per-node result of the classification pass
enum Classified {
    Text(String),
    Element {
        tag: String,
        visible: bool,
        interactive: bool,
        topmost: bool,
        highlight_index: Option<usize>,
    },
}

/// Pre-order walk with an explicit stack. Returns the kept nodes in document
/// order, with highlight indices already assigned.
fn classify_in_document_order(
    capture: &RawCapture,
    children: &[Vec<usize>],
    root: usize,
    expansion: ViewportExpansion,
) -> Vec<(usize, Classified)> {
    let mut order = Vec::new();
    let mut next_index = 1;
    let mut stack = vec![(root, 0usize)];

    while let Some((id, depth)) = stack.pop() {
        let raw = &capture.nodes[id];

        if raw.is_text() {
            let text = raw.text.trim();
            if !text.is_empty() && raw.visible {
                order.push((id, Classified::Text(text.to_string())));
            }
            continue;
        }

        if !raw.is_element() {
            continue;
        }
        if depth > MAX_TREE_DEPTH {
            tracing::debug!(xpath = %raw.xpath, "Dropping subtree nested too deep");
            continue;
        }

        let tag = raw.tag.to_ascii_lowercase();
        if tag.is_empty() || SKIPPED_TAGS.contains(&tag.as_str()) {
            continue;
        }

        let visible = classify_visibility(raw);
        let interactive = classify_interactivity(raw);
        let topmost = classify_topmost(raw, &capture.viewport, expansion);

        let highlight_index = if interactive && visible && topmost {
            let index = next_index;
            next_index += 1;
            Some(index)
        } else {
            None
        };

        order.push((
            id,
            Classified::Element {
                tag,
                visible,
                interactive,
                topmost,
                highlight_index,
            },
        ));

        if !raw.iframe_blocked {
            stack.extend(children[id].iter().rev().map(|&child| (child, depth + 1)));
        }
    }

    order
}

/// Build nodes in reverse document order, so every child exists before its
/// parent takes it. Slots of dropped children stay `None`.
fn assemble(
    capture: &RawCapture,
    children: &[Vec<usize>],
    order: Vec<(usize, Classified)>,
) -> Option<PageNode> {
    let mut built: Vec<Option<PageNode>> = vec![None; capture.nodes.len()];
    let mut root = None;

    for (id, classified) in order.into_iter().rev() {
        let raw = &capture.nodes[id];
        let node = match classified {
            Classified::Text(text) => PageNode::Text(TextNode {
                text,
                visible: true,
            }),
            Classified::Element {
                tag,
                visible,
                interactive,
                topmost,
                highlight_index,
            } => {
                let child_nodes: Vec<Option<PageNode>> = if raw.iframe_blocked {
                    Vec::new()
                } else {
                    children[id].iter().map(|&child| built[child].take()).collect()
                };

                let text = child_nodes
                    .iter()
                    .flatten()
                    .filter_map(|child| match child {
                        PageNode::Text(t) => Some(t.text.as_str()),
                        PageNode::Element(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ");

                let bounds = raw.rect.map(|r| BoundingBox {
                    x: r.x,
                    y: r.y,
                    width: r.width,
                    height: r.height,
                });

                PageNode::Element(ElementNode {
                    tag,
                    attributes: raw.attributes.clone(),
                    text,
                    xpath: raw.xpath.clone(),
                    coordinates: bounds.and_then(|b| b.center()),
                    bounds,
                    visible,
                    interactive,
                    topmost,
                    highlight_index,
                    children: child_nodes,
                    shadow_root: raw.has_shadow_root,
                    iframe_context: raw.iframe_context.clone(),
                })
            }
        };
        root = Some(id);
        built[id] = Some(node);
    }

    root.and_then(|id| built[id].take())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn element(tag: &str) -> RawNode {
        RawNode {
            kind: "element".into(),
            tag: tag.into(),
            offset_width: 100.0,
            offset_height: 20.0,
            rect: Some(RawRect {
                x: 10.0,
                y: 10.0,
                width: 100.0,
                height: 20.0,
            }),
            hit: Some(true),
            ..Default::default()
        }
    }

    fn viewport() -> RawViewport {
        RawViewport {
            width: 1280.0,
            height: 720.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    #[test]
    fn test_interactive_tags_and_roles() {
        assert!(classify_interactivity(&element("button")));
        assert!(classify_interactivity(&element("A")));
        assert!(!classify_interactivity(&element("div")));

        let mut div = element("div");
        div.attributes.insert("role".into(), "Button".into());
        assert!(classify_interactivity(&div));

        let mut div = element("div");
        div.attributes.insert("role".into(), "presentation".into());
        assert!(!classify_interactivity(&div));
    }

    #[test]
    fn test_interactive_tabindex() {
        let mut div = element("div");
        div.attributes.insert("tabindex".into(), "0".into());
        assert!(classify_interactivity(&div));

        div.attributes.insert("tabindex".into(), "-1".into());
        assert!(!classify_interactivity(&div));

        div.attributes.insert("tabindex".into(), "".into());
        assert!(!classify_interactivity(&div));
    }

    #[test]
    fn test_interactive_handlers_and_aria() {
        let mut div = element("div");
        div.listeners = vec!["mouseover".into()];
        assert!(!classify_interactivity(&div));
        div.listeners.push("mousedown".into());
        assert!(classify_interactivity(&div));

        let mut span = element("span");
        span.attributes.insert("v-on:click".into(), "open".into());
        assert!(classify_interactivity(&span));

        let mut li = element("li");
        li.attributes.insert("aria-expanded".into(), "false".into());
        assert!(classify_interactivity(&li));

        let mut card = element("div");
        card.draggable = true;
        assert!(classify_interactivity(&card));
    }

    #[test]
    fn test_visibility() {
        assert!(classify_visibility(&element("div")));

        let mut hidden = element("div");
        hidden.visibility = Some("hidden".into());
        assert!(!classify_visibility(&hidden));

        let mut none = element("div");
        none.display = Some("none".into());
        assert!(!classify_visibility(&none));

        let mut collapsed = element("div");
        collapsed.offset_height = 0.0;
        assert!(!classify_visibility(&collapsed));
    }

    #[test]
    fn test_topmost_viewport_filter() {
        let vp = viewport();
        let expansion = ViewportExpansion::Pixels(0);

        let mut below = element("button");
        below.rect = Some(RawRect {
            x: 10.0,
            y: 2000.0,
            width: 100.0,
            height: 20.0,
        });
        below.hit = None;
        assert!(!classify_topmost(&below, &vp, expansion));
        assert!(classify_topmost(&below, &vp, ViewportExpansion::Pixels(2000)));
        assert!(classify_topmost(&below, &vp, ViewportExpansion::Disabled));

        let mut covered = element("button");
        covered.hit = Some(false);
        assert!(!classify_topmost(&covered, &vp, expansion));

        let mut unknown = element("button");
        unknown.hit = None;
        assert!(classify_topmost(&unknown, &vp, expansion));
    }

    #[test]
    fn test_topmost_iframe_and_shadow() {
        let vp = viewport();
        let mut framed = element("button");
        framed.in_iframe = true;
        framed.hit = Some(false);
        assert!(classify_topmost(&framed, &vp, ViewportExpansion::Pixels(0)));

        let mut shadowed = element("button");
        shadowed.in_shadow_root = true;
        shadowed.hit = Some(false);
        assert!(!classify_topmost(&shadowed, &vp, ViewportExpansion::Disabled));
    }

    #[test]
    fn test_expansion_from_setting() {
        assert_eq!(ViewportExpansion::from_setting(-1), ViewportExpansion::Disabled);
        assert_eq!(ViewportExpansion::from_setting(0), ViewportExpansion::Pixels(0));
        assert_eq!(ViewportExpansion::from_setting(500), ViewportExpansion::Pixels(500));
    }

    #[test]
    fn test_raw_capture_tolerates_missing_fields() {
        let capture: RawCapture = serde_json::from_value(json!({
            "nodes": [
                {"type": "element", "tag": "body"},
                {"type": "comment", "parent": 0},
                {"type": "text", "parent": 0, "text": "hello", "visible": true, "extra": 1}
            ]
        }))
        .unwrap();
        assert_eq!(capture.nodes.len(), 3);
        assert_eq!(capture.viewport.width, 0.0);

        let tree = build_tree(&capture, ViewportExpansion::Disabled).unwrap();
        let body = tree.as_element().unwrap();
        assert_eq!(body.text, "hello");
        assert_eq!(body.children.len(), 2);
        assert!(body.children[0].is_none());
    }

    #[test]
    fn test_build_tree_indices_in_document_order() {
        let mut nodes = vec![element("body")];
        let mut form = element("form");
        form.parent = Some(0);
        nodes.push(form);
        let mut input = element("input");
        input.parent = Some(1);
        nodes.push(input);
        let mut hidden = element("button");
        hidden.parent = Some(1);
        hidden.display = Some("none".into());
        nodes.push(hidden);
        let mut script = element("script");
        script.parent = Some(0);
        nodes.push(script);
        let mut button = element("button");
        button.parent = Some(0);
        nodes.push(button);

        let capture = RawCapture {
            viewport: viewport(),
            nodes,
        };
        let tree = build_tree(&capture, ViewportExpansion::Pixels(0)).unwrap();

        let indexed: Vec<_> = tree
            .elements()
            .into_iter()
            .filter_map(|e| e.highlight_index.map(|i| (i, e.tag.clone())))
            .collect();
        assert_eq!(indexed, vec![(1, "input".to_string()), (2, "button".to_string())]);

        for el in tree.elements() {
            if el.highlight_index.is_some() {
                assert!(el.interactive && el.visible && el.topmost);
            }
        }
        assert!(tree.elements().iter().all(|e| e.tag != "script"));
    }

    #[test]
    fn test_build_tree_ignores_forward_parents() {
        let mut nodes = vec![element("body")];
        let mut orphan = element("button");
        orphan.parent = Some(5);
        nodes.push(orphan);
        let capture = RawCapture {
            viewport: viewport(),
            nodes,
        };
        let tree = build_tree(&capture, ViewportExpansion::Pixels(0)).unwrap();
        assert_eq!(tree.elements().len(), 1);
    }

    #[test]
    fn test_blocked_iframe_is_leaf() {
        let mut frame = element("iframe");
        frame.iframe_blocked = true;
        let mut inner = element("button");
        inner.parent = Some(0);
        let capture = RawCapture {
            viewport: viewport(),
            nodes: vec![frame, inner],
        };
        let tree = build_tree(&capture, ViewportExpansion::Pixels(0)).unwrap();
        assert!(tree.as_element().unwrap().children.is_empty());
    }

    #[test]
    fn test_deep_nesting_is_cut_without_recursion() {
        let depth = 20_000;
        let mut nodes = vec![element("body")];
        for i in 0..depth {
            let mut div = element("div");
            div.parent = Some(i);
            nodes.push(div);
        }
        let mut button = element("button");
        button.parent = Some(depth);
        nodes.push(button);

        let capture = RawCapture {
            viewport: viewport(),
            nodes,
        };
        let tree = build_tree(&capture, ViewportExpansion::Pixels(0)).unwrap();

        let elements = tree.elements();
        assert_eq!(elements.len(), MAX_TREE_DEPTH + 1);
        assert!(elements.iter().all(|e| e.highlight_index.is_none()));
    }

    #[test]
    fn test_empty_capture() {
        assert!(build_tree(&RawCapture::default(), ViewportExpansion::Pixels(0)).is_none());
    }
}
