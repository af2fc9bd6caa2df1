//! Page snapshots
//!
//! A [`SnapshotBuilder`] owns the selector map for the browser session it
//! observes. Every successful [`SnapshotBuilder::snapshot`] replaces the map
//! wholesale, so highlight indices are only meaningful against the snapshot
//! they were produced with.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::browser::Browser;
use crate::core::Coordinates;
use crate::dom::classify::{build_tree, RawCapture, ViewportExpansion};
use crate::dom::node::{ElementNode, PageNode};
use crate::dom::script::{self, HighlightBox};

/// SHA-256 of the empty string; the hash of a page without indexed elements
pub const EMPTY_TREE_HASH: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Attributes worth showing to the planner
pub const IMPORTANT_ATTRIBUTES: &[&str] = &[
    "id",
    "name",
    "type",
    "value",
    "placeholder",
    "aria-label",
    "role",
    "for",
    "href",
    "alt",
    "title",
    "data-testid",
    "data-test",
    "data-test-id",
    "data-test-name",
    "data-test-value",
];

const MAX_TEXT_CHARS: usize = 100;

/// Highlight index to element table of one snapshot
#[derive(Debug, Clone, Default)]
pub struct SelectorMap {
    entries: BTreeMap<usize, ElementNode>,
}

impl SelectorMap {
    pub fn from_tree(root: Option<&PageNode>) -> Self {
        let entries = root
            .map(|root| {
                root.elements()
                    .into_iter()
                    .filter_map(|el| el.highlight_index.map(|i| (i, el.shallow_clone())))
                    .collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    pub fn get(&self, index: usize) -> Option<&ElementNode> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ElementNode)> {
        self.entries.iter().map(|(i, el)| (*i, el))
    }
}

/// One capture of the page with everything derived from it
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub root: PageNode,
    /// Planner-facing text form
    pub serialized: String,
    /// Content hash used for staleness checks
    pub hash: String,
    pub indexed_count: usize,
}

/// Captures and indexes the live page of one browser session
pub struct SnapshotBuilder {
    browser: Arc<dyn Browser>,
    expansion: ViewportExpansion,
    highlight: bool,
    selector_map: SelectorMap,
}

impl SnapshotBuilder {
    pub fn new(browser: Arc<dyn Browser>, expansion: ViewportExpansion) -> Self {
        Self {
            browser,
            expansion,
            highlight: false,
            selector_map: SelectorMap::default(),
        }
    }

    /// Draw numbered boxes over indexed elements after each snapshot
    pub fn with_highlights(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn selector_map(&self) -> &SelectorMap {
        &self.selector_map
    }

    /// Capture and classify the current page. Any failure yields `None`.
    pub async fn capture_tree(&self) -> Option<PageNode> {
        if let Err(e) = self.browser.wait_for_stable().await {
            tracing::debug!(error = %e, "Page did not settle before capture");
        }

        let value = match self.browser.evaluate(script::capture_script()).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Page capture failed");
                return None;
            }
        };
        if value.is_null() {
            tracing::debug!("Page capture returned nothing");
            return None;
        }

        let capture: RawCapture = match serde_json::from_value(value) {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!(error = %e, "Page capture was malformed");
                return None;
            }
        };

        build_tree(&capture, self.expansion)
    }

    /// Capture the page, replace the selector map and derive the planner view.
    ///
    /// A failed capture clears the selector map, so stale indices never resolve.
    pub async fn snapshot(&mut self) -> Option<PageSnapshot> {
        let Some(root) = self.capture_tree().await else {
            self.selector_map = SelectorMap::default();
            return None;
        };

        self.selector_map = SelectorMap::from_tree(Some(&root));
        let serialized = serialize(Some(&root));
        let hash = hash(Some(&root));
        let indexed_count = self.selector_map.len();

        tracing::debug!(indexed = indexed_count, hash = %hash, "Captured page snapshot");

        if self.highlight {
            self.draw_highlights().await;
        }

        Some(PageSnapshot {
            root,
            serialized,
            hash,
            indexed_count,
        })
    }

    /// Hash of the live page, leaving the selector map untouched
    pub async fn current_hash(&self) -> String {
        let root = self.capture_tree().await;
        hash(root.as_ref())
    }

    /// Viewport position of an indexed element in the current selector map
    pub fn resolve(&self, index: usize) -> Option<Coordinates> {
        self.selector_map.get(index).and_then(|el| el.coordinates)
    }

    pub async fn clear_highlights(&self) {
        if let Err(e) = self.browser.evaluate(script::RESET_HIGHLIGHTS_SCRIPT).await {
            tracing::debug!(error = %e, "Could not clear highlights");
        }
    }

    pub async fn highlight_pointer(&self, at: Coordinates) {
        if let Err(e) = self.browser.evaluate(&script::pointer_script(at)).await {
            tracing::debug!(error = %e, "Could not draw pointer");
        }
    }

    async fn draw_highlights(&self) {
        let boxes: Vec<HighlightBox> = self
            .selector_map
            .iter()
            .filter_map(|(index, el)| {
                el.bounds.map(|b| HighlightBox {
                    index,
                    x: b.x,
                    y: b.y,
                    width: b.width,
                    height: b.height,
                })
            })
            .collect();
        if boxes.is_empty() {
            return;
        }
        if let Err(e) = self
            .browser
            .evaluate(&script::highlight_script(&boxes))
            .await
        {
            tracing::debug!(error = %e, "Could not draw highlights");
        }
    }
}

/// Planner-facing text form of the tree.
///
/// Indexed elements render as `[i]__<tag attrs>text</tag>`; other elements
/// with visible text render as `[]__<tag attrs>text</tag>` for context.
pub fn serialize(root: Option<&PageNode>) -> String {
    let Some(root) = root else {
        return String::new();
    };

    let mut lines = Vec::new();
    for el in root.elements() {
        let text = clean_text(&el.text);
        let label = match el.highlight_index {
            Some(index) => index.to_string(),
            None if !text.is_empty() => String::new(),
            None => continue,
        };

        let mut line = format!("[{}]__<{}", label, el.tag);
        for name in IMPORTANT_ATTRIBUTES {
            if let Some(value) = el.attribute(name) {
                line.push_str(&format!(" {}=\"{}\"", name, value.replace('"', "\\\"")));
            }
        }
        line.push_str(&format!(">{}</{}>", text, el.tag));
        lines.push(line);
    }
    lines.join("\n")
}

/// Terse form hashed for staleness: one `[i]__<tag>` line per indexed element
pub fn hash_form(root: Option<&PageNode>) -> String {
    let Some(root) = root else {
        return String::new();
    };
    root.elements()
        .into_iter()
        .filter_map(|el| {
            el.highlight_index
                .map(|index| format!("[{}]__<{}>", index, el.tag))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn hash(root: Option<&PageNode>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash_form(root).as_bytes());
    format!("{:x}", hasher.finalize())
}

fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_TEXT_CHARS {
        let truncated: String = collapsed.chars().take(MAX_TEXT_CHARS).collect();
        format!("{}...", truncated)
    } else {
        collapsed
    }
}
