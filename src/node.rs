use std::cmp;

#[cfg(feature = "serde")]
use serde::Serialize;

pub(crate) type Link<K> = Option<Box<Node<K>>>;

/// A tree node: a key, the cached height of the subtree rooted here and the
/// two exclusively owned child subtrees.
///
/// Nodes are passive. They can be inspected through a shared reference but
/// only [`Tree`](crate::Tree) restructures them.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Node<K> {
    pub(crate) key: K,
    pub(crate) left: Link<K>,
    pub(crate) right: Link<K>,
    pub(crate) height: usize,
}

impl<K> Node<K> {
    pub(crate) fn leaf(key: K) -> Box<Self> {
        Box::new(Node {
            key,
            left: None,
            right: None,
            height: 1,
        })
    }

    /// Returns the key stored in this node.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the left subtree, holding keys less than this node's key.
    pub fn left(&self) -> Option<&Node<K>> {
        self.left.as_deref()
    }

    /// Returns the right subtree, holding keys not less than this node's key.
    pub fn right(&self) -> Option<&Node<K>> {
        self.right.as_deref()
    }

    /// Returns the height of the subtree rooted at this node. A leaf has height 1.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns left height minus right height.
    /// Positive means left-heavy, negative means right-heavy.
    pub fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }

    pub(crate) fn adjust_height(&mut self) {
        self.height = cmp::max(height(&self.left), height(&self.right)) + 1;
    }
}

pub(crate) fn height<K>(link: &Link<K>) -> usize {
    match link {
        None => 0,
        Some(node) => node.height,
    }
}

pub(crate) fn balance_factor<K>(link: &Link<K>) -> isize {
    match link {
        None => 0,
        Some(node) => node.balance_factor(),
    }
}
