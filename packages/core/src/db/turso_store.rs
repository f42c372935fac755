//! TursoStore - NodeStore Implementation for the libsql Backend
//!
//! Thin wrapper around [`DatabaseService`]: delegates to the raw `db_*`
//! SQL operations and owns the libsql::Row to [`Node`] conversion. No
//! business logic lives here.
//!
//! # Examples
//!
//! ```rust,no_run
//! use arbor_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/arbor.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!     let nodes = store.list_all().await?;
//!     println!("{} nodes", nodes.len());
//!     Ok(())
//! }
//! ```

use crate::db::node_store::NodeStore;
use crate::db::{DatabaseService, DbNodeParams};
use crate::models::{Node, NodeKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;
use std::sync::Arc;

/// NodeStore implementation for the libsql backend
pub struct TursoStore {
    /// Underlying database service (raw SQL operations)
    db: Arc<DatabaseService>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Parse timestamp from database - handles both SQLite and RFC3339 formats
    ///
    /// SQLite CURRENT_TIMESTAMP returns: "YYYY-MM-DD HH:MM:SS"
    /// Imported data might use RFC3339: "YYYY-MM-DDTHH:MM:SSZ"
    fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(naive.and_utc());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(anyhow::anyhow!(
            "Unable to parse timestamp '{}' as SQLite or RFC3339 format",
            s
        ))
    }

    /// Convert libsql::Row to the Node model
    ///
    /// Expected columns (in order): id, name, kind, parent_id,
    /// created_at, modified_at.
    ///
    /// A legacy row whose parent_id equals its own id is normalized to
    /// `parent_id = None` here, so the self-loop sentinel never escapes
    /// the storage layer.
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let kind_str: String = row.get(2).context("Failed to get kind")?;
        let parent_id: Option<String> = row.get(3).context("Failed to get parent_id")?;
        let created_at_str: String = row.get(4).context("Failed to get created_at")?;
        let modified_at_str: String = row.get(5).context("Failed to get modified_at")?;

        let kind = NodeKind::parse(&kind_str)
            .with_context(|| format!("Unknown node kind '{}' for node {}", kind_str, id))?;

        let created_at =
            Self::parse_timestamp(&created_at_str).context("Failed to parse created_at")?;
        let modified_at =
            Self::parse_timestamp(&modified_at_str).context("Failed to parse modified_at")?;

        let parent_id = match parent_id {
            Some(parent) if parent == id => None,
            other => other,
        };

        Ok(Node {
            id,
            name,
            kind,
            parent_id,
            created_at,
            modified_at,
        })
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn list_all(&self) -> Result<Vec<Node>> {
        let mut rows = self
            .db
            .db_list_nodes()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list nodes: {}", e))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await.context("Failed to read node row")? {
            nodes.push(Self::row_to_node(&row)?);
        }

        Ok(nodes)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        self.db
            .db_node_exists(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check node existence: {}", e))
    }

    async fn is_name_taken(&self, name: &str, parent_id: Option<&str>) -> Result<bool> {
        self.db
            .db_is_name_taken(name, parent_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check sibling name: {}", e))
    }

    async fn insert(&self, node: Node) -> Result<Node> {
        let params = DbNodeParams {
            id: &node.id,
            name: &node.name,
            kind: node.kind.as_str(),
            parent_id: node.parent_id.as_deref(),
        };

        self.db
            .db_insert_node(params)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert node: {}", e))?;

        // Fetch and return the stored node (database-assigned timestamps)
        match self
            .db
            .db_get_node(&node.id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to re-read node: {}", e))?
        {
            Some(row) => Self::row_to_node(&row),
            None => Err(anyhow::anyhow!("Node not found after insertion")),
        }
    }

    async fn insert_many(&self, nodes: Vec<Node>) -> Result<()> {
        let params: Vec<DbNodeParams<'_>> = nodes
            .iter()
            .map(|node| DbNodeParams {
                id: &node.id,
                name: &node.name,
                kind: node.kind.as_str(),
                parent_id: node.parent_id.as_deref(),
            })
            .collect();

        self.db
            .db_batch_insert_nodes(params)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to batch insert nodes: {}", e))?;

        Ok(())
    }

    async fn rename_node(&self, id: &str, name: &str) -> Result<()> {
        let rows_affected = self
            .db
            .db_rename_node(id, name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to rename node: {}", e))?;

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("Node not found: {}", id));
        }

        Ok(())
    }

    async fn reparent_node(&self, id: &str, new_parent_id: &str) -> Result<()> {
        let rows_affected = self
            .db
            .db_reparent_node(id, new_parent_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to reparent node: {}", e))?;

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("Node not found: {}", id));
        }

        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<()> {
        let rows_affected = self
            .db
            .db_delete_node(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete node: {}", e))?;

        if rows_affected == 0 {
            tracing::warn!("delete_node: node {} was already gone", id);
        }

        Ok(())
    }
}
