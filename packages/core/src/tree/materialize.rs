//! Tree materialization.
//!
//! Turns the flat adjacency list into an enriched, level-ordered view.
//! Works for the whole tree (start at the root) or any subtree (start at
//! an inner node, whose depth collapses to 0 and path to "").

use crate::models::{Node, TreeNode, PATH_SEPARATOR};
use crate::tree::{child_index, TreeError};
use std::collections::{HashMap, HashSet, VecDeque};

/// Materialize the tree reachable from `root_id`.
///
/// Breadth-first: every node is enriched strictly after its parent, so a
/// child's path and depth derive from already-computed values. Output is
/// level-ordered (shallower nodes first); sibling order is unspecified
/// and callers must not rely on it.
///
/// The start node gets `depth = 0` and an empty path regardless of where
/// it sits in the stored tree; its reported parent is its real parent
/// (`None` for the tree root).
///
/// # Errors
///
/// - [`TreeError::NotFound`] when `root_id` is not in `nodes`
/// - [`TreeError::Inconsistent`] when the input breaks traversal
///   invariants (a dequeued node whose parent was never enriched, or a
///   cycle that revisits a node) - these are reported, never guessed over
pub fn materialize(root_id: &str, nodes: &[Node]) -> Result<Vec<TreeNode>, TreeError> {
    let root = find(root_id, nodes).ok_or_else(|| TreeError::not_found(root_id))?;

    let children = child_index(nodes);
    let mut enriched: HashMap<&str, (String, u32)> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    let mut queue: VecDeque<&Node> = VecDeque::new();
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.id.as_str()) {
            return Err(TreeError::inconsistent(format!(
                "node {} reached twice during materialization (cycle in input)",
                node.id
            )));
        }

        let (path, depth) = if node.id == root.id {
            (String::new(), 0)
        } else {
            // BFS guarantees parents are enriched before their children;
            // a miss here is a bug or corrupted input, not a default case.
            let parent = node.effective_parent().ok_or_else(|| {
                TreeError::inconsistent(format!(
                    "node {} has no parent but is not the traversal root",
                    node.id
                ))
            })?;
            let (parent_path, parent_depth) = enriched.get(parent).cloned().ok_or_else(|| {
                TreeError::inconsistent(format!(
                    "parent {} of node {} dequeued before enrichment",
                    parent, node.id
                ))
            })?;
            (join_path(&parent_path, &node.name), parent_depth + 1)
        };

        enriched.insert(node.id.as_str(), (path.clone(), depth));
        out.push(TreeNode {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            parent_id: node.effective_parent().map(str::to_string),
            path,
            depth,
            child_count: children.get(node.id.as_str()).map_or(0, Vec::len),
            created_at: node.created_at,
            modified_at: node.modified_at,
        });

        if let Some(kids) = children.get(node.id.as_str()) {
            queue.extend(kids.iter().copied());
        }
    }

    Ok(out)
}

fn find<'a>(id: &str, nodes: &'a [Node]) -> Option<&'a Node> {
    nodes.iter().find(|n| n.id == id)
}

fn join_path(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", parent_path, PATH_SEPARATOR, name)
    }
}
