//! Category forest built from the flat ERP category list.
//!
//! The ERP exports every category as a row with a `categorypath` such as
//! `"Fahrräder - E-Bikes - Trekking"`. [`build_category_tree`] turns the flat
//! list into a forest for navigation, stored as an arena: nodes own their
//! children by index and keep a parent index for breadcrumbs.
//!
//! Parent resolution is by *name*, not by path. Two categories with the same
//! name under different parents are indistinguishable to the name lookup;
//! the later one wins the name slot. The path-suffix fallback then picks the
//! first registered node whose path ends with the wanted parent path. Rows
//! whose parent cannot be resolved become roots instead of being dropped.

use std::collections::HashMap;

use crate::catalog::Category;
use crate::types::CategoryId;

/// Separator between ancestor names in `categorypath`.
pub const PATH_SEPARATOR: &str = " - ";

/// Name used by the ERP for placeholder rows.
const SENTINEL_NAME: &str = "0";

/// Index of a node inside a [`CategoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A category together with its position in the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub category: Category,
    /// Number of path segments; 0 when the row has no path.
    pub level: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Forest of categories. Built once from a flat list and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    roots: Vec<NodeId>,
}

/// Build the category forest from a flat list.
///
/// Rows with an empty name or the `"0"` sentinel are discarded. Rows are
/// processed shallowest first (stable for equal depth) so parents are
/// registered before their children.
#[must_use]
pub fn build_category_tree(categories: &[Category]) -> CategoryTree {
    let mut ordered: Vec<&Category> = categories
        .iter()
        .filter(|c| !c.category.is_empty() && c.category != SENTINEL_NAME)
        .collect();
    ordered.sort_by_key(|c| raw_depth(c));

    let mut tree = CategoryTree::default();
    // Name -> node. Later rows with the same name overwrite earlier ones but
    // keep the slot's original registration position in `registration`.
    let mut by_name: HashMap<&str, NodeId> = HashMap::new();
    let mut registration: Vec<&str> = Vec::new();

    for category in ordered {
        let parts: Vec<&str> = category
            .categorypath
            .as_deref()
            .map(|path| {
                path.split(PATH_SEPARATOR)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let parent = match parts.as_slice() {
            [] | [_] => None,
            [ancestors @ .., parent_name, _] => {
                let parent_path = ancestors
                    .iter()
                    .chain(std::iter::once(parent_name))
                    .copied()
                    .collect::<Vec<_>>()
                    .join(PATH_SEPARATOR);
                by_name.get(parent_name).copied().or_else(|| {
                    registration
                        .iter()
                        .filter_map(|name| by_name.get(name).copied())
                        .find(|id| {
                            tree.node(*id)
                                .category
                                .categorypath
                                .as_deref()
                                .is_some_and(|p| p.ends_with(&parent_path))
                        })
                })
            }
        };

        let id = NodeId(tree.nodes.len());
        tree.nodes.push(CategoryNode {
            category: category.clone(),
            level: parts.len(),
            parent,
            children: Vec::new(),
        });
        match parent.and_then(|p| tree.nodes.get_mut(p.0)) {
            Some(parent_node) => parent_node.children.push(id),
            None => tree.roots.push(id),
        }

        if by_name.insert(category.category.as_str(), id).is_none() {
            registration.push(category.category.as_str());
        }
    }

    tree
}

/// Segment count by a plain split, as used for ordering. A missing path
/// counts as zero.
fn raw_depth(category: &Category) -> usize {
    category
        .categorypath
        .as_deref()
        .map_or(0, |path| path.split(PATH_SEPARATOR).count())
}

impl CategoryTree {
    /// Root nodes in processing order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    #[allow(clippy::indexing_slicing)]
    pub fn node(&self, id: NodeId) -> &CategoryNode {
        &self.nodes[id.0]
    }

    /// Child nodes of `id`.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &CategoryNode> {
        self.nodes
            .get(id.0)
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter_map(|child| self.nodes.get(child.0))
    }

    /// Roots that sit at the top of a path (level 0 or 1). Demoted orphans
    /// with deeper paths are excluded.
    pub fn top_level(&self) -> impl Iterator<Item = (NodeId, &CategoryNode)> {
        self.roots
            .iter()
            .filter_map(|id| self.nodes.get(id.0).map(|node| (*id, node)))
            .filter(|(_, node)| node.level <= 1)
    }

    /// Depth-first search for a category id, visiting roots in order.
    #[must_use]
    pub fn find_by_id(&self, categoryid: CategoryId) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(id.0)?;
            if node.category.categoryid == categoryid {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Chain of categories from the root down to `categoryid` (inclusive).
    /// Empty when the id is not in the tree.
    #[must_use]
    pub fn breadcrumb(&self, categoryid: CategoryId) -> Vec<&Category> {
        let mut trail = Vec::new();
        let mut current = self.find_by_id(categoryid);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.0) else {
                break;
            };
            trail.push(&node.category);
            current = node.parent;
        }
        trail.reverse();
        trail
    }

    /// All nodes in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CategoryNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cat(id: i64, name: &str, path: Option<&str>) -> Category {
        Category {
            categoryid: CategoryId::new(id),
            category: name.to_string(),
            categorypath: path.map(str::to_string),
            categoryimageurl: None,
            product_count: None,
        }
    }

    fn names(tree: &CategoryTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| tree.node(*id).category.category.clone())
            .collect()
    }

    #[test]
    fn test_builds_nested_tree_regardless_of_input_order() {
        let tree = build_category_tree(&[
            cat(3, "Trekking", Some("Fahrräder - E-Bikes - Trekking")),
            cat(2, "E-Bikes", Some("Fahrräder - E-Bikes")),
            cat(1, "Fahrräder", Some("Fahrräder")),
        ]);

        assert_eq!(names(&tree, tree.roots()), vec!["Fahrräder"]);
        let root = tree.node(tree.roots()[0]);
        assert_eq!(root.level, 1);
        assert_eq!(names(&tree, &root.children), vec!["E-Bikes"]);
        let ebikes = tree.node(root.children[0]);
        assert_eq!(names(&tree, &ebikes.children), vec!["Trekking"]);
        assert_eq!(tree.node(ebikes.children[0]).level, 3);
    }

    #[test]
    fn test_discards_empty_and_sentinel_names() {
        let tree = build_category_tree(&[
            cat(1, "", Some("X")),
            cat(2, "0", Some("0")),
            cat(3, "Zubehör", Some("Zubehör")),
        ]);
        assert_eq!(tree.len(), 1);
        assert_eq!(names(&tree, tree.roots()), vec!["Zubehör"]);
    }

    #[test]
    fn test_missing_path_is_level_zero_root() {
        let tree = build_category_tree(&[cat(5, "Sale", None)]);
        let node = tree.node(tree.roots()[0]);
        assert_eq!(node.level, 0);
        assert!(node.parent.is_none());
    }

    #[test]
    fn test_orphan_is_demoted_to_root() {
        let tree = build_category_tree(&[cat(9, "Ventile", Some("Teile - Schläuche - Ventile"))]);
        assert_eq!(names(&tree, tree.roots()), vec!["Ventile"]);
        assert_eq!(tree.node(tree.roots()[0]).level, 3);
        // Deep orphans are roots but not top-level entries.
        assert_eq!(tree.top_level().count(), 0);
    }

    #[test]
    fn test_every_surviving_row_appears_exactly_once() {
        let input = vec![
            cat(1, "A", Some("A")),
            cat(2, "B", Some("A - B")),
            cat(3, "C", Some("A - B - C")),
            cat(4, "D", Some("X - D")),
            cat(5, "E", None),
        ];
        let tree = build_category_tree(&input);

        let mut seen: Vec<i64> = Vec::new();
        let mut stack: Vec<NodeId> = tree.roots().to_vec();
        while let Some(id) = stack.pop() {
            let node = tree.node(id);
            seen.push(node.category.categoryid.as_i64());
            stack.extend(node.children.iter().copied());
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_trims_segments_and_ignores_empty_ones() {
        let tree = build_category_tree(&[
            cat(1, "Räder", Some("Räder")),
            cat(2, "Gravel", Some(" Räder  -  - Gravel ")),
        ]);
        let root = tree.node(tree.roots()[0]);
        assert_eq!(names(&tree, &root.children), vec!["Gravel"]);
        assert_eq!(tree.node(root.children[0]).level, 2);
    }

    #[test]
    fn test_duplicate_names_resolve_to_last_registered() {
        // Both "Zubehör" rows are registered; the later one owns the name slot,
        // so "Licht" attaches there even though its path names the first one.
        let tree = build_category_tree(&[
            cat(1, "Fahrräder", Some("Fahrräder")),
            cat(2, "Teile", Some("Teile")),
            cat(10, "Zubehör", Some("Fahrräder - Zubehör")),
            cat(11, "Zubehör", Some("Teile - Zubehör")),
            cat(20, "Licht", Some("Fahrräder - Zubehör - Licht")),
        ]);

        let licht = tree.find_by_id(CategoryId::new(20)).unwrap();
        let parent = tree.node(licht).parent.unwrap();
        assert_eq!(tree.node(parent).category.categoryid, CategoryId::new(11));
    }

    #[test]
    fn test_suffix_fallback_when_parent_name_differs() {
        // The parent row is named differently from its last path segment, so
        // the name lookup misses and the path suffix scan finds it.
        let tree = build_category_tree(&[
            cat(1, "Bikes", Some("Bikes")),
            cat(2, "E-Bikes (alle)", Some("Bikes - E-Bikes")),
            cat(3, "Akkus", Some("Bikes - E-Bikes - Akkus")),
        ]);

        let akkus = tree.find_by_id(CategoryId::new(3)).unwrap();
        let parent = tree.node(akkus).parent.unwrap();
        assert_eq!(tree.node(parent).category.categoryid, CategoryId::new(2));
    }

    #[test]
    fn test_find_by_id_and_breadcrumb() {
        let tree = build_category_tree(&[
            cat(1, "Fahrräder", Some("Fahrräder")),
            cat(2, "E-Bikes", Some("Fahrräder - E-Bikes")),
            cat(3, "Trekking", Some("Fahrräder - E-Bikes - Trekking")),
        ]);

        let crumbs: Vec<&str> = tree
            .breadcrumb(CategoryId::new(3))
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(crumbs, vec!["Fahrräder", "E-Bikes", "Trekking"]);
        assert!(tree.find_by_id(CategoryId::new(99)).is_none());
        assert!(tree.breadcrumb(CategoryId::new(99)).is_empty());
    }

    #[test]
    fn test_top_level_and_children() {
        let tree = build_category_tree(&[
            cat(1, "Fahrräder", Some("Fahrräder")),
            cat(2, "Sale", None),
            cat(3, "Gravel", Some("Fahrräder - Gravel")),
        ]);
        let top: Vec<&str> = tree
            .top_level()
            .map(|(_, n)| n.category.category.as_str())
            .collect();
        assert_eq!(top, vec!["Sale", "Fahrräder"]);

        let (fahrraeder, _) = tree
            .top_level()
            .find(|(_, n)| n.category.category == "Fahrräder")
            .unwrap();
        let kids: Vec<&str> = tree
            .children(fahrraeder)
            .map(|n| n.category.category.as_str())
            .collect();
        assert_eq!(kids, vec!["Gravel"]);
    }
}
