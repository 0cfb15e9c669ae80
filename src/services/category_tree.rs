//! Hierarchical queries over the category forest.
//!
//! Categories form a forest via parent pointers. The forest is handed to
//! these functions as a flat edge map (category id -> parent id or `None`)
//! rebuilt from the store on each call, so there are no live references to
//! chase and no locking. Every parent mutation is gated by
//! [`would_create_cycle`] before commit, which keeps the forest acyclic; the
//! read-path walks are still bounded by the map size so a corrupted edge map
//! cannot loop forever.
//!
//! All functions are pure: they signal through return values and never fail.

use std::collections::{HashMap, HashSet};

/// Parent-edge mapping for one user's categories.
pub type EdgeMap = HashMap<i64, Option<i64>>;

/// Returns true if setting `proposed_parent_id` as the parent of
/// `category_id` would create a cycle or self-reference.
///
/// Walks upward from the proposed parent. Reaching `category_id` means the
/// category would become its own ancestor; revisiting a node means the map is
/// already corrupted and the mutation is rejected. A `None` parent or a
/// parent id missing from `edges` ends the walk safely: an orphaned reference
/// is a pre-existing data issue, not a new cycle.
pub fn would_create_cycle(category_id: i64, proposed_parent_id: Option<i64>, edges: &EdgeMap) -> bool {
    let Some(proposed) = proposed_parent_id else {
        // Moving to root is always safe
        return false;
    };
    if proposed == category_id {
        return true;
    }

    let mut visited: HashSet<i64> = HashSet::new();
    let mut current = Some(proposed);
    while let Some(cid) = current {
        if cid == category_id {
            return true;
        }
        if !visited.insert(cid) {
            return true;
        }
        current = edges.get(&cid).copied().flatten();
    }
    false
}

/// Returns the root-most ancestor of a category.
///
/// Follows parent links until a `None` parent is reached or a referenced
/// parent is absent from `edges` (treated as the effective root). The walk is
/// bounded by the map size so it terminates even on an undetected cycle.
pub fn find_top_level_ancestor(category_id: i64, edges: &EdgeMap) -> i64 {
    let mut current = category_id;
    for _ in 0..=edges.len() {
        match edges.get(&current) {
            Some(Some(parent)) => current = *parent,
            _ => return current,
        }
    }
    current
}

/// Returns true if `category_id` equals `ancestor_id` or lies in its subtree.
pub fn is_descendant_of(category_id: i64, ancestor_id: i64, edges: &EdgeMap) -> bool {
    let mut current = category_id;
    for _ in 0..=edges.len() {
        if current == ancestor_id {
            return true;
        }
        match edges.get(&current) {
            Some(Some(parent)) => current = *parent,
            _ => return false,
        }
    }
    false
}
