//! Tree Algorithms
//!
//! Pure, in-memory algorithms over the flat adjacency list. Nothing in
//! this module performs I/O or suspends: each function takes a
//! point-in-time snapshot of the node list and either derives a view or
//! checks an invariant.
//!
//! - [`materialize`] - enrich a tree (or subtree) with path/depth/child count
//! - [`collect_subtree`] - level-order enumeration of a node and its descendants
//! - [`reissue_subtree`] - structurally identical copy under fresh identities
//! - [`guard`] - mutation preconditions (cycle prevention, sibling names)

mod error;
mod guard;
mod materialize;
mod reissue;
mod subtree;

pub use error::TreeError;
pub use guard::{find_node, is_descendant, sibling_name_taken};
pub use materialize::materialize;
pub use reissue::reissue_subtree;
pub use subtree::collect_subtree;

use crate::models::Node;
use std::collections::HashMap;

/// Build the children relation for one traversal.
///
/// Keyed by parent id. A legacy self-referencing row is a "no parent"
/// sentinel, not an edge, so [`Node::effective_parent`] keeps a node from
/// ever being indexed as its own child.
pub(crate) fn child_index(nodes: &[Node]) -> HashMap<&str, Vec<&Node>> {
    let mut children: HashMap<&str, Vec<&Node>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.effective_parent() {
            children.entry(parent).or_default().push(node);
        }
    }
    children
}
