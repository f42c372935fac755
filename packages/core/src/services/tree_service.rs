//! Tree Service - Directory Tree Operations
//!
//! This module provides the main business logic layer for the directory
//! tree:
//!
//! - Read operations (full tree, subtree views)
//! - Structural mutations (create, rename, move, duplicate, delete)
//!
//! # Snapshot Discipline
//!
//! Every operation reads the flat node list at most once and runs all
//! traversal and guard work purely in memory against that snapshot. I/O
//! happens exactly at the bulk read and at the final write, each under an
//! explicit deadline. Concurrent requests validated against the same
//! stale snapshot can race; the storage constraints (unique sibling
//! index, restricted foreign keys, transactional batch insert) are the
//! last line of defense, and the in-memory guards are the fast path.

use crate::db::NodeStore;
use crate::models::{validate_name, Node, NodeKind, TreeNode};
use crate::services::error::TreeServiceError;
use crate::tree;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Tuning knobs for the tree service.
#[derive(Debug, Clone)]
pub struct TreeServiceConfig {
    /// Deadline applied to every store call; exceeding it aborts the
    /// whole operation and surfaces as an internal timeout failure.
    pub store_timeout: Duration,
}

impl Default for TreeServiceConfig {
    fn default() -> Self {
        Self {
            // Mirrors the SQLite busy timeout so a locked database fails
            // through one path, not two
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// Orchestrates tree reads and mutations over a [`NodeStore`].
///
/// Holds no mutable state: each call owns its own snapshot and working
/// copies, so a service instance can be shared freely across requests.
///
/// # Examples
///
/// ```no_run
/// # use arbor_core::db::{DatabaseService, NodeStore, TursoStore};
/// # use arbor_core::services::TreeService;
/// # use std::path::PathBuf;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(DatabaseService::new(PathBuf::from("./data/arbor.db")).await?);
/// let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
/// let service = TreeService::new(store);
///
/// let tree = service.list_tree().await?;
/// println!("{} nodes", tree.len());
/// # Ok(())
/// # }
/// ```
pub struct TreeService {
    store: Arc<dyn NodeStore>,
    config: TreeServiceConfig,
}

impl TreeService {
    /// Create a service with default configuration
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, TreeServiceConfig::default())
    }

    /// Create a service with explicit configuration
    pub fn with_config(store: Arc<dyn NodeStore>, config: TreeServiceConfig) -> Self {
        Self { store, config }
    }

    //
    // READ OPERATIONS
    //

    /// Materialize the whole tree, level-ordered, enriched with path,
    /// depth and child count.
    pub async fn list_tree(&self) -> Result<Vec<TreeNode>, TreeServiceError> {
        let nodes = self.snapshot().await?;
        let root_id = Self::root_of(&nodes)?.id.clone();
        Ok(tree::materialize(&root_id, &nodes)?)
    }

    /// Materialize the subtree rooted at `id`.
    ///
    /// Depth and path are relative to `id` itself (depth 0, empty path),
    /// mirroring root materialization scoped to the subtree; the subtree
    /// root still reports its real parent.
    pub async fn get_subtree(&self, id: &str) -> Result<Vec<TreeNode>, TreeServiceError> {
        let nodes = self.snapshot().await?;
        Ok(tree::materialize(id, &nodes)?)
    }

    //
    // MUTATIONS
    //

    /// Create a node under `parent_id`.
    ///
    /// Guards: name validity, parent existence, sibling name uniqueness.
    /// Returns the enriched new node from a confirming re-read.
    pub async fn create_node(
        &self,
        name: &str,
        kind: NodeKind,
        parent_id: &str,
    ) -> Result<TreeNode, TreeServiceError> {
        validate_name(name)?;

        if !self.guarded("exists", self.store.exists(parent_id)).await? {
            return Err(TreeServiceError::parent_not_found(parent_id));
        }
        if self
            .guarded(
                "is_name_taken",
                self.store.is_name_taken(name, Some(parent_id)),
            )
            .await?
        {
            return Err(TreeServiceError::name_taken(name, parent_id));
        }

        let node = Node::new(name.to_string(), kind, Some(parent_id.to_string()));
        let created = self.guarded("insert", self.store.insert(node)).await?;

        tracing::debug!("created {} '{}' under {}", created.kind, name, parent_id);
        self.enriched_view(&created.id).await
    }

    /// Rename a node.
    ///
    /// Guards: name validity, node existence, root immutability, sibling
    /// name uniqueness (the node itself excluded, so renaming to the
    /// current name is a no-op rather than a self-collision).
    pub async fn rename_node(
        &self,
        id: &str,
        new_name: &str,
    ) -> Result<TreeNode, TreeServiceError> {
        validate_name(new_name)?;

        let nodes = self.snapshot().await?;
        let node = tree::find_node(id, &nodes)
            .ok_or_else(|| TreeServiceError::node_not_found(id))?;
        if node.is_root() {
            return Err(TreeServiceError::root_immutable("renamed"));
        }
        if tree::sibling_name_taken(new_name, node.effective_parent(), Some(id), &nodes) {
            return Err(TreeServiceError::name_taken(
                new_name,
                node.effective_parent().unwrap_or_default(),
            ));
        }

        self.guarded("rename_node", self.store.rename_node(id, new_name))
            .await?;

        self.enriched_view(id).await
    }

    /// Move a node under a new parent.
    ///
    /// Guards: node and destination existence, root immutability, cycle
    /// prevention (the destination must not be the node or any of its
    /// descendants), sibling name uniqueness at the destination.
    pub async fn move_node(
        &self,
        id: &str,
        new_parent_id: &str,
    ) -> Result<TreeNode, TreeServiceError> {
        let nodes = self.snapshot().await?;
        let node = tree::find_node(id, &nodes)
            .ok_or_else(|| TreeServiceError::node_not_found(id))?;
        if node.is_root() {
            return Err(TreeServiceError::root_immutable("moved"));
        }
        if tree::find_node(new_parent_id, &nodes).is_none() {
            return Err(TreeServiceError::parent_not_found(new_parent_id));
        }
        // A node may never become its own ancestor
        if tree::is_descendant(new_parent_id, id, &nodes)? {
            return Err(TreeServiceError::circular_reference(format!(
                "cannot move node {} under its descendant {}",
                id, new_parent_id
            )));
        }
        if tree::sibling_name_taken(&node.name, Some(new_parent_id), Some(id), &nodes) {
            return Err(TreeServiceError::name_taken(&node.name, new_parent_id));
        }

        self.guarded(
            "reparent_node",
            self.store.reparent_node(id, new_parent_id),
        )
        .await?;

        tracing::debug!("moved node {} under {}", id, new_parent_id);
        self.enriched_view(id).await
    }

    /// Duplicate the subtree rooted at `source_id` under
    /// `dest_parent_id`, optionally renaming the copy's top node.
    ///
    /// The source subtree is collected from the snapshot, reissued under
    /// fresh identities (structure and names preserved), re-anchored at
    /// the destination, and batch-inserted atomically. Returns the
    /// materialized views of the inserted subtree.
    pub async fn duplicate_node(
        &self,
        source_id: &str,
        dest_parent_id: &str,
        new_name: Option<&str>,
    ) -> Result<Vec<TreeNode>, TreeServiceError> {
        if let Some(name) = new_name {
            validate_name(name)?;
        }

        let nodes = self.snapshot().await?;
        let source = tree::find_node(source_id, &nodes)
            .ok_or_else(|| TreeServiceError::node_not_found(source_id))?;
        if source.is_root() {
            return Err(TreeServiceError::root_immutable("duplicated"));
        }
        if tree::find_node(dest_parent_id, &nodes).is_none() {
            return Err(TreeServiceError::parent_not_found(dest_parent_id));
        }

        let effective_name = new_name.unwrap_or(&source.name);
        if tree::sibling_name_taken(effective_name, Some(dest_parent_id), None, &nodes) {
            return Err(TreeServiceError::name_taken(effective_name, dest_parent_id));
        }

        let mut copy = tree::reissue_subtree(source_id, &nodes)?;
        copy[0].parent_id = Some(dest_parent_id.to_string());
        copy[0].name = effective_name.to_string();
        let copy_root_id = copy[0].id.clone();
        let copy_len = copy.len();

        if let Err(insert_err) = self
            .guarded("insert_many", self.store.insert_many(copy.clone()))
            .await
        {
            // The libsql store rolls the batch back itself; a non-atomic
            // backend may still have applied a prefix, so compensate
            // children-first and keep the original failure.
            for node in copy.iter().rev() {
                if let Err(e) = self.store.delete_node(&node.id).await {
                    tracing::warn!("compensating delete of {} failed: {}", node.id, e);
                }
            }
            return Err(insert_err);
        }

        tracing::info!(
            "duplicated {} nodes from {} under {} as '{}'",
            copy_len,
            source_id,
            dest_parent_id,
            effective_name
        );

        // Confirming re-read of the inserted subtree
        let nodes = self.snapshot().await?;
        Ok(tree::materialize(&copy_root_id, &nodes)?)
    }

    /// Delete a node.
    ///
    /// Policy: only leaves are deletable. The root and any node that
    /// still has children are rejected; callers empty a folder (or move
    /// its contents) before deleting it.
    pub async fn delete_node(&self, id: &str) -> Result<(), TreeServiceError> {
        let nodes = self.snapshot().await?;
        let node = tree::find_node(id, &nodes)
            .ok_or_else(|| TreeServiceError::node_not_found(id))?;
        if node.is_root() {
            return Err(TreeServiceError::root_immutable("deleted"));
        }
        if nodes.iter().any(|n| n.effective_parent() == Some(id)) {
            return Err(TreeServiceError::not_empty(id));
        }

        self.guarded("delete_node", self.store.delete_node(id))
            .await?;

        tracing::debug!("deleted node {}", id);
        Ok(())
    }

    //
    // HELPERS
    //

    /// Run a store call under the configured deadline.
    async fn guarded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, TreeServiceError> {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(TreeServiceError::store_failed(format!(
                "{}: {}",
                operation, e
            ))),
            Err(_) => Err(TreeServiceError::StoreTimeout {
                operation,
                timeout: self.config.store_timeout,
            }),
        }
    }

    /// Fetch the point-in-time snapshot all validation runs against.
    async fn snapshot(&self) -> Result<Vec<Node>, TreeServiceError> {
        self.guarded("list_all", self.store.list_all()).await
    }

    /// The single root of the stored tree.
    ///
    /// Zero or multiple parentless nodes means the storage is corrupt;
    /// both are reported, never papered over.
    fn root_of(nodes: &[Node]) -> Result<&Node, TreeServiceError> {
        let mut roots = nodes.iter().filter(|n| n.is_root());
        let root = roots
            .next()
            .ok_or_else(|| TreeServiceError::inconsistent("no root node in storage"))?;
        if let Some(extra) = roots.next() {
            return Err(TreeServiceError::inconsistent(format!(
                "multiple root nodes in storage: {} and {}",
                root.id, extra.id
            )));
        }
        Ok(root)
    }

    /// Re-read the tree and return the enriched view of one node.
    async fn enriched_view(&self, id: &str) -> Result<TreeNode, TreeServiceError> {
        let nodes = self.snapshot().await?;
        let root_id = Self::root_of(&nodes)?.id.clone();
        let materialized = tree::materialize(&root_id, &nodes)?;
        materialized
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| {
                TreeServiceError::inconsistent(format!(
                    "node {} missing from materialized tree after write",
                    id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TursoStore};
    use crate::services::error::ErrorKind;
    use tempfile::TempDir;

    async fn create_test_service() -> (TreeService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
        (TreeService::new(store), temp_dir)
    }

    async fn root_id(service: &TreeService) -> String {
        service.list_tree().await.unwrap()[0].id.clone()
    }

    #[tokio::test]
    async fn test_fresh_database_has_only_the_root() {
        let (service, _temp) = create_test_service().await;

        let tree = service.list_tree().await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].depth, 0);
        assert_eq!(tree[0].path, "");
        assert_eq!(tree[0].parent_id, None);
        assert_eq!(tree[0].child_count, 0);
    }

    #[tokio::test]
    async fn test_create_node_returns_enriched_view() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let docs = service
            .create_node("docs", NodeKind::Folder, &root)
            .await
            .unwrap();
        assert_eq!(docs.depth, 1);
        assert_eq!(docs.path, "docs");
        assert_eq!(docs.parent_id.as_deref(), Some(root.as_str()));

        let report = service
            .create_node("report", NodeKind::Document, &docs.id)
            .await
            .unwrap();
        assert_eq!(report.depth, 2);
        assert_eq!(report.path, "docs/report");
        assert_eq!(report.kind, NodeKind::Document);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_parent() {
        let (service, _temp) = create_test_service().await;

        let err = service
            .create_node("orphan", NodeKind::Folder, "ghost")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_rejects_sibling_name_collision() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        service
            .create_node("docs", NodeKind::Folder, &root)
            .await
            .unwrap();
        let err = service
            .create_node("docs", NodeKind::Document, &root)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // different case is a different name
        service
            .create_node("Docs", NodeKind::Folder, &root)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_names() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        for bad in ["", "a/b", "_sigil"] {
            let err = service
                .create_node(bad, NodeKind::Folder, &root)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidOperation, "name {:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_rename_node() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let docs = service
            .create_node("docs", NodeKind::Folder, &root)
            .await
            .unwrap();
        let renamed = service.rename_node(&docs.id, "papers").await.unwrap();
        assert_eq!(renamed.name, "papers");
        assert_eq!(renamed.path, "papers");

        // renaming to the current name is not a self-collision
        service.rename_node(&docs.id, "papers").await.unwrap();
    }

    #[tokio::test]
    async fn test_rename_rejects_collision_and_root() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let a = service
            .create_node("a", NodeKind::Folder, &root)
            .await
            .unwrap();
        service
            .create_node("b", NodeKind::Folder, &root)
            .await
            .unwrap();

        let err = service.rename_node(&a.id, "b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = service.rename_node(&root, "newroot").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_move_node_recomputes_paths() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let a = service
            .create_node("a", NodeKind::Folder, &root)
            .await
            .unwrap();
        let b = service
            .create_node("b", NodeKind::Folder, &root)
            .await
            .unwrap();
        let child = service
            .create_node("child", NodeKind::Document, &a.id)
            .await
            .unwrap();

        let moved = service.move_node(&a.id, &b.id).await.unwrap();
        assert_eq!(moved.path, "b/a");
        assert_eq!(moved.depth, 2);

        let subtree = service.get_subtree(&b.id).await.unwrap();
        let child_view = subtree.iter().find(|n| n.id == child.id).unwrap();
        assert_eq!(child_view.path, "a/child");
    }

    #[tokio::test]
    async fn test_move_into_own_subtree_is_rejected_and_tree_unchanged() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let x = service
            .create_node("x", NodeKind::Folder, &root)
            .await
            .unwrap();
        let y = service
            .create_node("y", NodeKind::Folder, &x.id)
            .await
            .unwrap();

        let before = service.list_tree().await.unwrap();

        // direct self-parenting
        let err = service.move_node(&x.id, &x.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        // into a descendant
        let err = service.move_node(&x.id, &y.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        assert_eq!(service.list_tree().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_move_rejects_destination_name_collision() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let a = service
            .create_node("a", NodeKind::Folder, &root)
            .await
            .unwrap();
        let b = service
            .create_node("b", NodeKind::Folder, &root)
            .await
            .unwrap();
        service
            .create_node("a", NodeKind::Folder, &b.id)
            .await
            .unwrap();

        let err = service.move_node(&a.id, &b.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_duplicate_subtree() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let docs = service
            .create_node("docs", NodeKind::Folder, &root)
            .await
            .unwrap();
        service
            .create_node("report", NodeKind::Document, &docs.id)
            .await
            .unwrap();

        let copy = service
            .duplicate_node(&docs.id, &root, Some("docs_copy"))
            .await
            .unwrap();

        assert_eq!(copy.len(), 2);
        assert_eq!(copy[0].name, "docs_copy");
        assert_eq!(copy[0].parent_id.as_deref(), Some(root.as_str()));
        assert_eq!(copy[1].name, "report");
        assert_eq!(copy[1].kind, NodeKind::Document);

        // fresh identities, both trees present
        let all = service.list_tree().await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(copy.iter().all(|c| c.id != docs.id));
    }

    #[tokio::test]
    async fn test_duplicate_rejects_name_collision_at_destination() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let docs = service
            .create_node("docs", NodeKind::Folder, &root)
            .await
            .unwrap();

        let err = service
            .duplicate_node(&docs.id, &root, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_delete_policy() {
        let (service, _temp) = create_test_service().await;
        let root = root_id(&service).await;

        let folder = service
            .create_node("folder", NodeKind::Folder, &root)
            .await
            .unwrap();
        let leaf = service
            .create_node("leaf", NodeKind::Document, &folder.id)
            .await
            .unwrap();

        // non-leaf rejected
        let err = service.delete_node(&folder.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        // root rejected
        let err = service.delete_node(&root).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        // leaf deletes fine, after which the folder is deletable
        service.delete_node(&leaf.id).await.unwrap();
        service.delete_node(&folder.id).await.unwrap();

        let err = service.delete_node(&leaf.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_get_subtree_missing_node() {
        let (service, _temp) = create_test_service().await;
        let err = service.get_subtree("ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
