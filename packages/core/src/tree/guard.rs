//! Mutation preconditions.
//!
//! Every structural write is validated against the current snapshot
//! before anything is committed: cycle prevention for moves, sibling name
//! uniqueness for create/rename/move/duplicate, existence for everything.
//! Guard failures short-circuit before any store call, so they never
//! leave partial state behind.

use crate::models::Node;
use crate::tree::{collect_subtree, TreeError};

/// Look up a node in the snapshot.
pub fn find_node<'a>(id: &str, nodes: &'a [Node]) -> Option<&'a Node> {
    nodes.iter().find(|n| n.id == id)
}

/// Whether `candidate` lies within the subtree rooted at `node_id`
/// (including `node_id` itself).
///
/// Used before a reparent: moving N under P must fail when
/// `is_descendant(P, N)` holds, otherwise N would become its own
/// ancestor.
pub fn is_descendant(candidate: &str, node_id: &str, nodes: &[Node]) -> Result<bool, TreeError> {
    let subtree = collect_subtree(node_id, nodes)?;
    Ok(subtree.iter().any(|n| n.id == candidate))
}

/// Case-sensitive sibling name collision check, scoped to one parent.
///
/// `exclude_id` lets rename and move skip the node being mutated, so a
/// node never collides with itself.
pub fn sibling_name_taken(
    name: &str,
    parent_id: Option<&str>,
    exclude_id: Option<&str>,
    nodes: &[Node],
) -> bool {
    nodes.iter().any(|n| {
        n.effective_parent() == parent_id
            && n.name == name
            && Some(n.id.as_str()) != exclude_id
    })
}
