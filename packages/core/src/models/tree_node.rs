//! Enriched tree view of a node.
//!
//! `TreeNode` is the read DTO produced by [`crate::tree::materialize`]:
//! a [`crate::models::Node`] plus the structural facts that are never
//! persisted and always recomputed.

use crate::models::NodeKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node enriched with derived structure.
///
/// - `path` is root-relative, `/`-joined and excludes the materialization
///   root's own name (the root's path is the empty string)
/// - `depth` is 0 at the materialization root
/// - `child_count` counts direct children only
///
/// For the tree root, `parent_id` is `None` - consumers never see the
/// legacy self-referencing sentinel as a real edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub parent_id: Option<String>,
    pub path: String,
    pub depth: u32,
    pub child_count: usize,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
