//! NodeStore Trait - Database Abstraction Layer
//!
//! This module defines the `NodeStore` trait, the sole I/O boundary
//! between the tree service and the persistence backend. Everything the
//! service needs is one bulk snapshot read, a handful of existence and
//! uniqueness probes, and single-row or batch mutations.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: all methods are async to support both embedded and
//!    network backends
//! 2. **Error Handling**: `anyhow::Result` for flexible error context;
//!    the service maps failures into its own taxonomy
//! 3. **Atomic batches**: `insert_many` is all-or-nothing so duplication
//!    can never leave a partial subtree behind

use crate::models::Node;
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for node persistence operations
///
/// Implementations must be `Send + Sync` to allow usage in async contexts
/// where futures may be moved between threads.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Fetch the full flat node list - the point-in-time snapshot every
    /// service operation validates and traverses against.
    async fn list_all(&self) -> Result<Vec<Node>>;

    /// Whether a node with this id exists
    async fn exists(&self, id: &str) -> Result<bool>;

    /// Whether a sibling with this name already exists under `parent_id`
    /// (`None` scopes the check to the root level)
    async fn is_name_taken(&self, name: &str, parent_id: Option<&str>) -> Result<bool>;

    /// Insert a single node
    ///
    /// # Returns
    ///
    /// The stored node, re-read for confirmation
    ///
    /// # Errors
    ///
    /// Returns error if the id already exists, the parent is missing
    /// (foreign key), or a sibling name collides (unique index)
    async fn insert(&self, node: Node) -> Result<Node>;

    /// Insert a batch of nodes atomically (all-or-nothing)
    ///
    /// Used by subtree duplication; the whole batch rolls back on any
    /// failure.
    async fn insert_many(&self, nodes: Vec<Node>) -> Result<()>;

    /// Update a node's name only
    ///
    /// # Errors
    ///
    /// Returns error if the node doesn't exist or the new name collides
    /// with a sibling at the storage level
    async fn rename_node(&self, id: &str, name: &str) -> Result<()>;

    /// Update a node's parent only
    ///
    /// # Errors
    ///
    /// Returns error if the node or the new parent doesn't exist
    async fn reparent_node(&self, id: &str, new_parent_id: &str) -> Result<()>;

    /// Delete a single node row
    ///
    /// Callers enforce the delete policy (no root, no non-leaf) first;
    /// the storage layer still refuses to orphan children.
    async fn delete_node(&self, id: &str) -> Result<()>;
}
