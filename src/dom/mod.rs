//! Page observation
//!
//! Turns the live page into an indexed tree the planner can refer to by number.

pub mod classify;
pub mod node;
pub mod script;
pub mod snapshot;

pub use classify::ViewportExpansion;
pub use node::{BoundingBox, ElementNode, PageNode, TextNode};
pub use snapshot::{
    hash, hash_form, serialize, PageSnapshot, SelectorMap, SnapshotBuilder, EMPTY_TREE_HASH,
};
