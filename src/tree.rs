use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::fmt;
use std::mem;

#[cfg(feature = "serde")]
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::ConsistencyError;
use crate::node::{self, Link, Node};

/// An ordered collection of keys stored in an AVL tree.
///
/// Every public mutation leaves each node with a balance factor of -1, 0 or 1,
/// so lookups, insertions and removals take O(log n) steps.
///
/// Inserting a key that is already present adds another node for it, placed
/// to the right of the existing one. Use [`Tree::insert_unique`] to keep keys distinct.
///
/// With the `serde` feature a tree serializes as `{"root": node}`, each node
/// as `{"key", "left", "right", "height"}` with `null` for an absent child.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Tree<K> {
    root: Link<K>,
    #[cfg_attr(feature = "serde", serde(skip))]
    num_nodes: usize,
}

/// Direction a key descends from a node: strictly less goes left, anything else right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn of<K: Ord>(key: &K, node_key: &K) -> Self {
        if key < node_key {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// The four ways of restoring balance at a node, named after the rotation
/// applied to the node itself (double rotations first rotate the heavy child).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rotation {
    Right,
    LeftRight,
    Left,
    RightLeft,
}

impl Rotation {
    /// Chooses the rotation after an insertion below `node`.
    /// `child_side` is the direction the inserted key took at the root of the
    /// heavy subtree, i.e. its comparison with that child's key.
    pub(crate) fn after_insert<K>(node: &Node<K>, child_side: Option<Side>) -> Option<Self> {
        let balance = node.balance_factor();
        if balance > 1 {
            debug_assert!(child_side.is_some());
            match child_side {
                Some(Side::Left) => Some(Rotation::Right),
                _ => Some(Rotation::LeftRight),
            }
        } else if balance < -1 {
            debug_assert!(child_side.is_some());
            match child_side {
                Some(Side::Left) => Some(Rotation::RightLeft),
                _ => Some(Rotation::Left),
            }
        } else {
            None
        }
    }

    /// Chooses the rotation after a removal below `node`.
    /// After a removal there is no single key that explains the imbalance,
    /// so the heavy child's own balance factor decides.
    pub(crate) fn after_remove<K>(node: &Node<K>) -> Option<Self> {
        let balance = node.balance_factor();
        if balance > 1 {
            if node::balance_factor(&node.left) >= 0 {
                Some(Rotation::Right)
            } else {
                Some(Rotation::LeftRight)
            }
        } else if balance < -1 {
            if node::balance_factor(&node.right) <= 0 {
                Some(Rotation::Left)
            } else {
                Some(Rotation::RightLeft)
            }
        } else {
            None
        }
    }

    pub(crate) fn apply<K>(self, mut node: Box<Node<K>>) -> Box<Node<K>> {
        match self {
            Rotation::Right => rotate_right(node),
            Rotation::LeftRight => {
                node.left = node.left.take().map(rotate_left);
                rotate_right(node)
            }
            Rotation::Left => rotate_left(node),
            Rotation::RightLeft => {
                node.right = node.right.take().map(rotate_right);
                rotate_left(node)
            }
        }
    }
}

// Promotes the right child. Heights are adjusted bottom-up: demoted node first.
pub(crate) fn rotate_left<K>(mut node: Box<Node<K>>) -> Box<Node<K>> {
    let Some(mut pivot) = node.right.take() else {
        unreachable!("left rotation requires a right child");
    };
    node.right = pivot.left.take();
    node.adjust_height();
    pivot.left = Some(node);
    pivot.adjust_height();
    trace!(direction = "left", height = pivot.height, "rotation");
    pivot
}

// Promotes the left child. Heights are adjusted bottom-up: demoted node first.
pub(crate) fn rotate_right<K>(mut node: Box<Node<K>>) -> Box<Node<K>> {
    let Some(mut pivot) = node.left.take() else {
        unreachable!("right rotation requires a left child");
    };
    node.left = pivot.right.take();
    node.adjust_height();
    pivot.right = Some(node);
    pivot.adjust_height();
    trace!(direction = "right", height = pivot.height, "rotation");
    pivot
}

impl<K> Tree<K> {
    /// Creates an empty tree.
    /// No memory is allocated until the first key is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Returns true if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of keys in the tree, duplicates included.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree: 0 when empty, 1 for a single node.
    pub fn height(&self) -> usize {
        node::height(&self.root)
    }

    /// Returns the root node, the entry point for walking the tree structure.
    pub fn root(&self) -> Option<&Node<K>> {
        self.root.as_deref()
    }

    /// Removes all keys, deallocating all nodes.
    pub fn clear(&mut self) {
        self.root = None;
        self.num_nodes = 0;
    }

    /// Returns the smallest key.
    pub fn first(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.key)
    }

    /// Returns the largest key.
    pub fn last(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.key)
    }

    /// Counts the nodes by walking every subtree.
    /// Agrees with [`Tree::len`], which is tracked on each mutation instead.
    pub fn count_nodes(&self) -> usize {
        fn count<K>(link: &Link<K>) -> usize {
            match link {
                None => 0,
                Some(node) => 1 + count(&node.left) + count(&node.right),
            }
        }
        count(&self.root)
    }

    /// Checks the balance factor of every node against the AVL condition.
    pub fn is_balanced(&self) -> bool {
        fn balanced<K>(link: &Link<K>) -> bool {
            match link {
                None => true,
                Some(node) => {
                    node.balance_factor().abs() <= 1
                        && balanced(&node.left)
                        && balanced(&node.right)
                }
            }
        }
        balanced(&self.root)
    }

    /// Returns all keys in ascending order.
    pub fn inorder(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.num_nodes);
        self.traverse(|_| {}, |node| keys.push(&node.key), |_| {});
        keys
    }

    /// Returns all keys, each node before its subtrees.
    pub fn preorder(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.num_nodes);
        self.traverse(|node| keys.push(&node.key), |_| {}, |_| {});
        keys
    }

    /// Returns all keys, each node after its subtrees.
    pub fn postorder(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.num_nodes);
        self.traverse(|_| {}, |_| {}, |node| keys.push(&node.key));
        keys
    }

    /// Walks the whole tree depth first, calling `preorder` when a node is
    /// entered, `inorder` between its left and right subtree and `postorder`
    /// when it is left.
    pub fn traverse<'a, Pre, In, Post>(
        &'a self,
        mut preorder: Pre,
        mut inorder: In,
        mut postorder: Post,
    ) where
        Pre: FnMut(&'a Node<K>),
        In: FnMut(&'a Node<K>),
        Post: FnMut(&'a Node<K>),
    {
        fn walk<'a, K, Pre, In, Post>(
            node: &'a Node<K>,
            preorder: &mut Pre,
            inorder: &mut In,
            postorder: &mut Post,
        ) where
            Pre: FnMut(&'a Node<K>),
            In: FnMut(&'a Node<K>),
            Post: FnMut(&'a Node<K>),
        {
            preorder(node);
            if let Some(left) = node.left.as_deref() {
                walk(left, preorder, inorder, postorder);
            }
            inorder(node);
            if let Some(right) = node.right.as_deref() {
                walk(right, preorder, inorder, postorder);
            }
            postorder(node);
        }

        if let Some(root) = self.root.as_deref() {
            walk(root, &mut preorder, &mut inorder, &mut postorder);
        }
    }
}

impl<K: Ord> Tree<K> {
    /// Returns the node holding a key equal to the given one.
    pub fn find<Q>(&self, key: &Q) -> Option<&Node<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.key.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            }
        }
        current
    }

    /// Returns a reference to the stored key equal to the given one.
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(Node::key)
    }

    /// Returns true if the tree holds a key equal to the given one.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Inserts a key. A key equal to one already present is added as another node.
    pub fn insert(&mut self, key: K) {
        let (root, _) = Self::insert_node(self.root.take(), key);
        self.root = Some(root);
        self.num_nodes += 1;

        #[cfg(feature = "consistency_check")]
        self.check_consistency();
    }

    /// Inserts a key unless an equal key is already present.
    /// Returns whether the key was inserted.
    pub fn insert_unique(&mut self, key: K) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.insert(key);
        true
    }

    /// Removes one key equal to the given one.
    /// Returns whether a key was removed; removing an absent key leaves the tree untouched.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key).is_some()
    }

    /// Removes one key equal to the given one and returns it.
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (root, removed) = Self::remove_node(self.root.take(), key);
        self.root = root;
        match removed {
            Some(_) => {
                debug_assert!(self.num_nodes >= 1);
                self.num_nodes -= 1;
            }
            None => debug!("key not present, nothing removed"),
        }

        #[cfg(feature = "consistency_check")]
        self.check_consistency();

        removed
    }

    /// Verifies the structure of the tree: key order, cached heights, the
    /// AVL condition at every node and the recorded number of keys.
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        let mut index = 0;
        Self::validate_node(&self.root, &mut index)?;

        let mut previous: Option<&K> = None;
        let mut position = 0;
        let mut unordered = None;
        self.traverse(
            |_| {},
            |node| {
                if let Some(previous) = previous {
                    if node.key < *previous && unordered.is_none() {
                        unordered = Some(position);
                    }
                }
                previous = Some(&node.key);
                position += 1;
            },
            |_| {},
        );
        if let Some(position) = unordered {
            return Err(ConsistencyError::Unordered { position });
        }

        let counted = self.count_nodes();
        if counted != self.num_nodes {
            return Err(ConsistencyError::CountMismatch {
                counted,
                recorded: self.num_nodes,
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(root: Link<K>, num_nodes: usize) -> Self {
        Self { root, num_nodes }
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        if let Err(err) = self.validate() {
            panic!("inconsistent tree: {err}");
        }
    }

    // Returns the new subtree root and the side the key took at the old one.
    fn insert_node(link: Link<K>, key: K) -> (Box<Node<K>>, Option<Side>) {
        let Some(mut node) = link else {
            return (Node::leaf(key), None);
        };

        let side = Side::of(&key, &node.key);
        let child_side = match side {
            Side::Left => {
                let (left, child_side) = Self::insert_node(node.left.take(), key);
                node.left = Some(left);
                child_side
            }
            Side::Right => {
                let (right, child_side) = Self::insert_node(node.right.take(), key);
                node.right = Some(right);
                child_side
            }
        };
        node.adjust_height();

        let node = match Rotation::after_insert(&node, child_side) {
            Some(rotation) => rotation.apply(node),
            None => node,
        };
        (node, Some(side))
    }

    fn remove_node<Q>(link: Link<K>, key: &Q) -> (Link<K>, Option<K>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(mut node) = link else {
            return (None, None);
        };

        let removed = match key.cmp(node.key.borrow()) {
            Ordering::Less => {
                let (left, removed) = Self::remove_node(node.left.take(), key);
                node.left = left;
                removed
            }
            Ordering::Greater => {
                let (right, removed) = Self::remove_node(node.right.take(), key);
                node.right = right;
                removed
            }
            Ordering::Equal => match (node.left.take(), node.right.take()) {
                (None, right) => return (right, Some(node.key)),
                (left, None) => return (left, Some(node.key)),
                (left, Some(right)) => {
                    // In-order successor takes the place of the removed key
                    let (right, successor) = Self::take_min(right);
                    node.left = left;
                    node.right = right;
                    Some(mem::replace(&mut node.key, successor.key))
                }
            },
        };
        if removed.is_none() {
            return (Some(node), None);
        }

        node.adjust_height();
        (Some(Self::rebalance_after_remove(node)), removed)
    }

    // Detaches the leftmost node, returning the remaining subtree and the detached node.
    fn take_min(mut node: Box<Node<K>>) -> (Link<K>, Box<Node<K>>) {
        match node.left.take() {
            None => {
                let right = node.right.take();
                (right, node)
            }
            Some(left) => {
                let (left, min) = Self::take_min(left);
                node.left = left;
                node.adjust_height();
                (Some(Self::rebalance_after_remove(node)), min)
            }
        }
    }

    fn rebalance_after_remove(node: Box<Node<K>>) -> Box<Node<K>> {
        match Rotation::after_remove(&node) {
            Some(rotation) => rotation.apply(node),
            None => node,
        }
    }

    // Recomputes the height of every subtree without trusting the cache.
    fn validate_node(link: &Link<K>, index: &mut usize) -> Result<usize, ConsistencyError> {
        let Some(node) = link else {
            return Ok(0);
        };
        let this = *index;
        *index += 1;

        let left_height = Self::validate_node(&node.left, index)?;
        let right_height = Self::validate_node(&node.right, index)?;
        let actual = cmp::max(left_height, right_height) + 1;
        if node.height != actual {
            return Err(ConsistencyError::StaleHeight {
                node: this,
                cached: node.height,
                actual,
            });
        }

        let balance = left_height as isize - right_height as isize;
        if balance.abs() > 1 {
            return Err(ConsistencyError::Unbalanced { node: this, balance });
        }
        Ok(actual)
    }
}

impl<K> Default for Tree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for Tree<K> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_set().entries(self.inorder()).finish()
    }
}

impl<K: Ord> FromIterator<K> for Tree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord> Extend<K> for Tree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K> Extend<&'a K> for Tree<K>
where
    K: 'a + Ord + Copy,
{
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}
