//! Subtree-width tree layout.
//!
//! A leaf takes one column slot; an inner node takes the sum of its children's slots and sits at
//! `leftmost + width / 2`. Both passes walk an explicit stack, so deep chains cannot overflow and
//! a manager cycle surfaces as [`CycleError`] instead of a hang.

use crate::model::{ForestLayout, GridPos, TreeLayout};
use crate::{Error, Result};
use indexmap::IndexMap;
use orgchart_core::CycleError;
use rustc_hash::{FxHashMap, FxHashSet};

/// Lays out the subtree reachable from `root`. `children` must have an entry for `root`;
/// child names without an entry are treated as leaves.
pub fn layout_tree(children: &IndexMap<String, Vec<String>>, root: &str) -> Result<TreeLayout> {
    if !children.contains_key(root) {
        return Err(Error::UnknownRoot {
            root: root.to_string(),
        });
    }

    let order = preorder(children, root)?;

    let mut widths: FxHashMap<&str, usize> = FxHashMap::default();
    for &node in order.iter().rev() {
        let width: usize = kids(children, node)
            .iter()
            .map(|c| widths.get(c.as_str()).copied().unwrap_or(1))
            .sum();
        widths.insert(node, width.max(1));
    }

    // Leftmost column and depth are pushed down from parent to child.
    let mut slot: FxHashMap<&str, (usize, usize)> = FxHashMap::default();
    slot.insert(root, (0, 0));
    let mut positions = IndexMap::with_capacity(order.len());
    let mut columns = 0usize;
    let mut levels = 0usize;
    for &node in &order {
        let (left, depth) = slot.get(node).copied().unwrap_or((0, 0));
        let width = widths.get(node).copied().unwrap_or(1);
        let column = left + width / 2;
        positions.insert(node.to_string(), GridPos::new(column, depth));
        columns = columns.max(column + 1);
        levels = levels.max(depth + 1);

        let mut running = left;
        for child in kids(children, node) {
            slot.insert(child.as_str(), (running, depth + 1));
            running += widths.get(child.as_str()).copied().unwrap_or(1);
        }
    }

    let widths = order
        .iter()
        .map(|n| (n.to_string(), widths.get(n).copied().unwrap_or(1)))
        .collect();

    Ok(TreeLayout {
        root: root.to_string(),
        positions,
        widths,
        columns,
        levels,
    })
}

/// Lays out each root independently and places the trees side by side.
pub fn layout_forest(
    children: &IndexMap<String, Vec<String>>,
    roots: &[String],
) -> Result<ForestLayout> {
    let mut trees = Vec::with_capacity(roots.len());
    let mut offsets = Vec::with_capacity(roots.len());
    let mut columns = 0usize;
    let mut levels = 0usize;
    for root in roots {
        let tree = layout_tree(children, root)?;
        offsets.push(columns);
        columns += tree.columns;
        levels = levels.max(tree.levels);
        trees.push(tree);
    }
    Ok(ForestLayout {
        trees,
        offsets,
        columns,
        levels,
    })
}

fn kids<'a>(children: &'a IndexMap<String, Vec<String>>, node: &str) -> &'a [String] {
    children.get(node).map(Vec::as_slice).unwrap_or(&[])
}

/// Pre-order walk (children left to right). Reaching a node twice is reported as a cycle whose
/// members are listed in manager-link order starting at the revisited node.
fn preorder<'a>(
    children: &'a IndexMap<String, Vec<String>>,
    root: &'a str,
) -> Result<Vec<&'a str>> {
    let mut order = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut via: FxHashMap<&str, &str> = FxHashMap::default();
    let mut stack = vec![root];
    seen.insert(root);

    while let Some(node) = stack.pop() {
        order.push(node);
        let list = kids(children, node);
        for child in list {
            if !seen.insert(child.as_str()) {
                return Err(cycle_through(child, node, &via).into());
            }
            via.insert(child.as_str(), node);
        }
        stack.extend(list.iter().rev().map(String::as_str));
    }
    Ok(order)
}

fn cycle_through(revisited: &str, from: &str, via: &FxHashMap<&str, &str>) -> CycleError {
    let mut members = vec![revisited.to_string()];
    let mut cur = Some(from);
    while let Some(node) = cur {
        if node == revisited {
            break;
        }
        members.push(node.to_string());
        cur = via.get(node).copied();
    }
    CycleError { members }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "parent>child,child" per entry.
    fn map(edges: &[&str]) -> IndexMap<String, Vec<String>> {
        edges
            .iter()
            .map(|e| {
                let (k, v) = e.split_once('>').unwrap_or((*e, ""));
                let kids = v
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                (k.to_string(), kids)
            })
            .collect()
    }

    #[test]
    fn single_node_sits_in_column_zero() {
        let children = map(&["solo>"]);
        let t = layout_tree(&children, "solo").unwrap();
        assert_eq!(t.position("solo"), Some(GridPos::new(0, 0)));
        assert_eq!((t.columns, t.levels), (1, 1));
    }

    #[test]
    fn unknown_root_is_rejected() {
        let children = map(&["a>"]);
        assert!(matches!(
            layout_tree(&children, "zz"),
            Err(Error::UnknownRoot { .. })
        ));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let names: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
        let mut children = IndexMap::new();
        for pair in names.windows(2) {
            children.insert(pair[0].clone(), vec![pair[1].clone()]);
        }
        children.insert(names[names.len() - 1].clone(), Vec::new());
        let t = layout_tree(&children, "n0").unwrap();
        assert_eq!(t.levels, 50_000);
        assert_eq!(t.columns, 1);
    }

    #[test]
    fn revisit_reports_cycle_in_link_order() {
        // top -> a -> b -> c -> a
        let children = map(&["top>a", "a>b", "b>c", "c>a"]);
        let err = layout_tree(&children, "top").unwrap_err();
        let Error::Cycle(cycle) = err else {
            panic!("expected cycle, got {err:?}");
        };
        // a reports to c, c to b, b to a.
        assert_eq!(cycle.members, vec!["a", "c", "b"]);
    }
}
