//! Text rendering of a tree's shape.
//!
//! The renderer only reads the public node interface (key, children), so any
//! other renderer can be built the same way outside this crate.

use std::fmt::Display;

use crate::node::Node;
use crate::tree::Tree;

const ABSENT: &str = "∅";

/// Renders the tree as an outline, one node per line, root first:
///
/// ```text
/// 30
/// ├─ 20
/// │  ├─ 10
/// │  └─ 25
/// └─ 40
///    ├─ ∅
///    └─ 50
/// ```
///
/// A node with one child shows the missing side as `∅`. An empty tree renders as `∅`.
pub fn render_tree<K: Display>(tree: &Tree<K>) -> String {
    match tree.root() {
        None => ABSENT.to_string(),
        Some(root) => render_node(root, ""),
    }
}

fn render_node<K: Display>(node: &Node<K>, tab: &str) -> String {
    let mut out = node.key().to_string();
    if node.left().is_none() && node.right().is_none() {
        return out;
    }

    let children = [node.left(), node.right()];
    let last = children.len() - 1;
    for (i, child) in children.into_iter().enumerate() {
        let is_last = i == last;
        let child_tab = format!("{tab}{}  ", if is_last { " " } else { "│" });

        out.push('\n');
        out.push_str(tab);
        out.push_str(if is_last { "└─ " } else { "├─ " });
        match child {
            Some(child) => out.push_str(&render_node(child, &child_tab)),
            None => out.push_str(ABSENT),
        }
    }
    out
}
