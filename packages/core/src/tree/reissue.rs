//! Identity reissue for subtree duplication.
//!
//! Copying a subtree's rows as-is would collide with the originals on
//! `id`. Reissuing first produces an insertable, collision-free copy with
//! the same topology and names.

use crate::models::Node;
use crate::tree::{collect_subtree, TreeError};
use uuid::Uuid;

/// Produce a copy of the subtree rooted at `node_id` in which every node
/// carries a fresh identity and every intra-subtree parent edge is
/// preserved under the new identity space.
///
/// Works on the level-ordered subtree from [`collect_subtree`]. For each
/// visited node, children in the working set are re-pointed at the fresh
/// id *before* the node's own id is overwritten; since children sit after
/// their parent in level order, each node's `parent_id` is already
/// corrected by the time it is visited.
///
/// The copy's root keeps its original `parent_id`; callers re-anchor it
/// at the duplication destination.
pub fn reissue_subtree(node_id: &str, nodes: &[Node]) -> Result<Vec<Node>, TreeError> {
    let mut working = collect_subtree(node_id, nodes)?;

    for visit in 0..working.len() {
        let old_id = working[visit].id.clone();
        let new_id = Uuid::new_v4().to_string();

        for other in 0..working.len() {
            if other != visit && working[other].parent_id.as_deref() == Some(old_id.as_str()) {
                working[other].parent_id = Some(new_id.clone());
            }
        }

        working[visit].id = new_id;
    }

    Ok(working)
}
