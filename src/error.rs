use thiserror::Error;

/// A structural defect found by [`Tree::validate`](crate::Tree::validate).
///
/// Nodes are identified by their index in pre-order traversal, starting at 0 for the root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("in-order traversal decreases at position {position}")]
    Unordered { position: usize },

    #[error("node {node} caches height {cached}, subtree height is {actual}")]
    StaleHeight {
        node: usize,
        cached: usize,
        actual: usize,
    },

    #[error("node {node} has balance factor {balance}")]
    Unbalanced { node: usize, balance: isize },

    #[error("tree counts {counted} nodes but records {recorded}")]
    CountMismatch { counted: usize, recorded: usize },
}
