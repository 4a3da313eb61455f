//! Pure algorithms over the category forest.
//!
//! Both walks operate on id indexes derived from `parent_id` pointers alone —
//! the stored `children` mirror is never trusted here. Both carry a visited
//! set so that malformed data already present in the store (a cycle written by
//! hand, a parent pointing at a missing row) terminates instead of looping.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::category::Category;

/// Maps each category id to its parent id (`None` for root categories).
pub fn parent_index(categories: &[Category]) -> HashMap<Uuid, Option<Uuid>> {
    categories.iter().map(|c| (c.id, c.parent_id)).collect()
}

/// Maps each category id to the ids whose `parent_id` points at it.
pub fn child_index(categories: &[Category]) -> HashMap<Uuid, Vec<Uuid>> {
    let mut index: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for category in categories {
        if let Some(parent_id) = category.parent_id {
            index.entry(parent_id).or_default().push(category.id);
        }
    }
    index
}

/// Returns true if assigning `candidate_parent` as the parent of `category_id`
/// would create a cycle in the parent pointer graph.
///
/// Walks upward from the candidate parent. The walk stops at a root, at an id
/// missing from the index, at `category_id` (cycle) or at a node already seen
/// in this walk (pre-existing corruption, reported as a cycle so the write is
/// refused).
pub fn would_create_cycle(
    category_id: Uuid,
    candidate_parent: Uuid,
    parents: &HashMap<Uuid, Option<Uuid>>,
) -> bool {
    let mut visited = HashSet::new();
    let mut current = Some(candidate_parent);

    while let Some(node) = current {
        if node == category_id {
            return true;
        }
        if !visited.insert(node) {
            return true;
        }
        current = parents.get(&node).copied().flatten();
    }

    false
}

/// Collects `root` and every transitive descendant by following child links.
///
/// Order is traversal order (root first); callers treat the result as a set.
pub fn collect_subtree_ids(root: Uuid, children: &HashMap<Uuid, Vec<Uuid>>) -> Vec<Uuid> {
    let mut collected = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            continue;
        }
        collected.push(node);
        if let Some(child_ids) = children.get(&node) {
            stack.extend(child_ids.iter().copied());
        }
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parents(edges: &[(Uuid, Option<Uuid>)]) -> HashMap<Uuid, Option<Uuid>> {
        edges.iter().copied().collect()
    }

    #[test]
    fn test_reparent_under_descendant_is_a_cycle() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        // a <- b <- c
        let index = parents(&[(a, None), (b, Some(a)), (c, Some(b))]);
        assert!(would_create_cycle(a, c, &index));
        assert!(would_create_cycle(a, b, &index));
    }

    #[test]
    fn test_reparent_to_self_is_a_cycle() {
        let a = Uuid::new_v4();
        let index = parents(&[(a, None)]);
        assert!(would_create_cycle(a, a, &index));
    }

    #[test]
    fn test_reparent_to_sibling_is_not_a_cycle() {
        let (root, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let index = parents(&[(root, None), (b, Some(root)), (c, Some(root))]);
        assert!(!would_create_cycle(b, c, &index));
    }

    #[test]
    fn test_reparent_to_unknown_id_terminates() {
        let (a, ghost) = (Uuid::new_v4(), Uuid::new_v4());
        let index = parents(&[(a, None)]);
        assert!(!would_create_cycle(a, ghost, &index));
    }

    #[test]
    fn test_cycle_guard_terminates_on_corrupt_data() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        // b and c already point at each other: corruption written outside the
        // service. The walk must terminate and refuse the write.
        let index = parents(&[(a, None), (b, Some(c)), (c, Some(b))]);
        assert!(would_create_cycle(a, b, &index));
    }

    #[test]
    fn test_subtree_includes_root_and_all_descendants() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut children = HashMap::new();
        children.insert(a, vec![b, c]);
        children.insert(b, vec![d]);

        let collected = collect_subtree_ids(a, &children);
        assert_eq!(collected.len(), 4);
        for id in [a, b, c, d] {
            assert!(collected.contains(&id));
        }
    }

    #[test]
    fn test_subtree_of_leaf_is_just_the_leaf() {
        let leaf = Uuid::new_v4();
        let collected = collect_subtree_ids(leaf, &HashMap::new());
        assert_eq!(collected, vec![leaf]);
    }

    #[test]
    fn test_subtree_terminates_on_cyclic_child_links() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut children = HashMap::new();
        children.insert(a, vec![b]);
        children.insert(b, vec![a]);

        let collected = collect_subtree_ids(a, &children);
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn test_indexes_derived_from_parent_pointers() {
        let root_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let root = Category::test_fixture(root_id, "Root", None);
        // The stored children mirror is intentionally left empty: the indexes
        // must come from parent_id alone.
        let child = Category::test_fixture(child_id, "Child", Some(root_id));

        let categories = vec![root, child];
        let parents = parent_index(&categories);
        let children = child_index(&categories);

        assert_eq!(parents[&child_id], Some(root_id));
        assert_eq!(children[&root_id], vec![child_id]);
        assert!(!children.contains_key(&child_id));
    }
}
