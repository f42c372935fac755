//! Data Models
//!
//! This module contains the core data structures used throughout Arbor:
//!
//! - `Node` - the persisted directory entry (folder or document)
//! - `NodeKind` - explicit node kind, replacing the legacy name sigil
//! - `TreeNode` - enriched read view with derived path, depth and child count
//!
//! Structural facts are never stored; they are recomputed from the flat
//! adjacency list by the [`crate::tree`] algorithms.

mod node;
mod tree_node;

pub use node::{validate_name, Node, NodeKind, ValidationError, DOCUMENT_SIGIL, PATH_SEPARATOR};
pub use tree_node::TreeNode;
