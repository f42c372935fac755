//! Node Data Structures
//!
//! This module defines the core `Node` struct for Arbor's flat adjacency
//! list storage. A node is a single directory entry - a folder or a
//! document - that stores only its own identity and its parent's identity.
//! Everything structural (path, depth, child count) is derived at read
//! time; see [`crate::tree`].
//!
//! # Root Node Detection
//!
//! The root is the single node with `parent_id = None`.
//!
//! **CRITICAL:** Never use the node's name or a fixed id for root
//! detection. Legacy exports encoded "no parent" as a self-referencing
//! `parent_id`; [`Node::effective_parent`] normalizes that sentinel away,
//! so the self-loop is never visible as a real edge.
//!
//! # Examples
//!
//! ```rust
//! use arbor_core::models::{Node, NodeKind};
//!
//! let folder = Node::new("docs".to_string(), NodeKind::Folder, Some("root".to_string()));
//! let report = Node::new("report".to_string(), NodeKind::Document, Some(folder.id.clone()));
//! assert_eq!(report.wire_name(), "_report");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Leading sigil that marks a document in the legacy wire format.
///
/// Stored names are always sigil-free; the sigil only appears when
/// translating to or from clients that still speak the old format.
pub const DOCUMENT_SIGIL: char = '_';

/// Separator used when joining ancestor names into a derived path.
pub const PATH_SEPARATOR: char = '/';

/// Validation errors for Node operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Node name must not be empty")]
    EmptyName,

    #[error("Node name '{0}' must not contain '{PATH_SEPARATOR}'")]
    NameContainsSeparator(String),

    #[error("Node name '{0}' must not start with the reserved '{DOCUMENT_SIGIL}' prefix")]
    ReservedPrefix(String),
}

/// Explicit node kind.
///
/// Replaces the legacy convention of a leading [`DOCUMENT_SIGIL`] in the
/// name: the kind is its own field, and the sigil survives only in the
/// wire-compat helpers on [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Document,
}

impl NodeKind {
    /// Stable storage/wire spelling of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::Document => "document",
        }
    }

    /// Parse the storage spelling produced by [`NodeKind::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "folder" => Some(NodeKind::Folder),
            "document" => Some(NodeKind::Document),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a node name for creation or rename.
///
/// Names must be non-empty, must not contain the path separator (it would
/// corrupt derived paths) and must not start with the reserved document
/// sigil (the kind is an explicit field; the sigil is a wire artifact).
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(ValidationError::NameContainsSeparator(name.to_string()));
    }
    if name.starts_with(DOCUMENT_SIGIL) {
        return Err(ValidationError::ReservedPrefix(name.to_string()));
    }
    Ok(())
}

/// A single directory entry in the flat adjacency list.
///
/// # Fields
///
/// - `id`: unique identifier (UUID v4; the seeded root uses a fixed id)
/// - `name`: sibling-unique display name, sigil-free
/// - `kind`: folder or document
/// - `parent_id`: containing node, `None` only for the root
/// - `created_at` / `modified_at`: audit timestamps
///
/// Derived facts (path, depth, child count) are intentionally absent;
/// they live on [`crate::models::TreeNode`] and are recomputed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier
    pub id: String,

    /// Display name, unique among siblings (case-sensitive)
    pub name: String,

    /// Folder or document
    pub kind: NodeKind,

    /// Containing node; `None` marks the root
    pub parent_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new Node with an auto-generated UUID.
    ///
    /// The name is taken as-is; callers that accept user input should run
    /// [`validate_name`] first (the service layer does).
    pub fn new(name: String, kind: NodeKind, parent_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            kind,
            parent_id,
            created_at: now,
            modified_at: now,
        }
    }

    /// Create a node from a legacy wire name, splitting off the document
    /// sigil into the explicit kind.
    ///
    /// ```rust
    /// # use arbor_core::models::{Node, NodeKind};
    /// let node = Node::from_wire_name("_report", Some("parent".to_string()));
    /// assert_eq!(node.name, "report");
    /// assert_eq!(node.kind, NodeKind::Document);
    /// ```
    pub fn from_wire_name(raw: &str, parent_id: Option<String>) -> Self {
        let (kind, name) = split_wire_name(raw);
        Self::new(name.to_string(), kind, parent_id)
    }

    /// Re-apply the legacy sigil for clients speaking the old wire format.
    pub fn wire_name(&self) -> String {
        match self.kind {
            NodeKind::Document => format!("{}{}", DOCUMENT_SIGIL, self.name),
            NodeKind::Folder => self.name.clone(),
        }
    }

    /// Whether this node is the tree root (no parent).
    pub fn is_root(&self) -> bool {
        self.effective_parent().is_none()
    }

    /// The node's parent, with the legacy self-loop sentinel normalized
    /// away: a row whose `parent_id` equals its own `id` has no parent.
    pub fn effective_parent(&self) -> Option<&str> {
        match self.parent_id.as_deref() {
            Some(parent) if parent == self.id => None,
            other => other,
        }
    }
}

/// Split a legacy wire name into kind and sigil-free name.
pub(crate) fn split_wire_name(raw: &str) -> (NodeKind, &str) {
    match raw.strip_prefix(DOCUMENT_SIGIL) {
        Some(rest) => (NodeKind::Document, rest),
        None => (NodeKind::Folder, raw),
    }
}
