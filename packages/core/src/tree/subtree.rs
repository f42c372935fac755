//! Subtree enumeration.

use crate::models::Node;
use crate::tree::{child_index, TreeError};
use std::collections::{HashSet, VecDeque};

/// Collect `node_id` and all of its descendants, level order, each once.
///
/// This is the input set for duplication and the membership oracle for
/// the cycle guard.
///
/// # Errors
///
/// - [`TreeError::NotFound`] when `node_id` is not in `nodes`
/// - [`TreeError::Inconsistent`] when the input contains a cycle
pub fn collect_subtree(node_id: &str, nodes: &[Node]) -> Result<Vec<Node>, TreeError> {
    let start = nodes
        .iter()
        .find(|n| n.id == node_id)
        .ok_or_else(|| TreeError::not_found(node_id))?;

    let children = child_index(nodes);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    let mut queue: VecDeque<&Node> = VecDeque::new();
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        if !seen.insert(node.id.as_str()) {
            return Err(TreeError::inconsistent(format!(
                "node {} reached twice during subtree walk (cycle in input)",
                node.id
            )));
        }
        out.push(node.clone());
        if let Some(kids) = children.get(node.id.as_str()) {
            queue.extend(kids.iter().copied());
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;

    fn node(id: &str, name: &str, parent: Option<&str>) -> Node {
        let mut n = Node::new(name.to_string(), NodeKind::Folder, parent.map(str::to_string));
        n.id = id.to_string();
        n
    }

    fn sample_tree() -> Vec<Node> {
        vec![
            node("root", "/", None),
            node("a", "docs", Some("root")),
            node("b", "reports", Some("a")),
            node("c", "archive", Some("a")),
            node("d", "old", Some("c")),
            node("e", "misc", Some("root")),
        ]
    }

    #[test]
    fn test_exact_membership() {
        let nodes = sample_tree();
        let subtree = collect_subtree("a", &nodes).unwrap();
        let mut ids: Vec<&str> = subtree.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_each_node_exactly_once() {
        let nodes = sample_tree();
        let subtree = collect_subtree("root", &nodes).unwrap();
        assert_eq!(subtree.len(), nodes.len());
        let unique: HashSet<&str> = subtree.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(unique.len(), subtree.len());
    }

    #[test]
    fn test_leaf_subtree_is_just_the_leaf() {
        let nodes = sample_tree();
        let subtree = collect_subtree("d", &nodes).unwrap();
        assert_eq!(subtree.len(), 1);
        assert_eq!(subtree[0].id, "d");
    }

    #[test]
    fn test_level_order_starts_at_the_node() {
        let nodes = sample_tree();
        let subtree = collect_subtree("a", &nodes).unwrap();
        assert_eq!(subtree[0].id, "a");
        // children of "a" precede the grandchild
        let pos = |id: &str| subtree.iter().position(|n| n.id == id).unwrap();
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn test_missing_node_is_not_found() {
        let nodes = sample_tree();
        assert_eq!(
            collect_subtree("ghost", &nodes),
            Err(TreeError::not_found("ghost"))
        );
    }
}
