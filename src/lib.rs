//! An ordered key collection backed by an AVL tree.
//!
//! Every node owns its two subtrees outright. Insertion and removal hand a
//! subtree down the recursion and get back its (possibly rotated) new root,
//! restoring the AVL condition on the way up.
//!
//! ```
//! use avl_core::Tree;
//!
//! let mut tree = Tree::new();
//! for key in [10, 20, 30, 40, 50, 25] {
//!     tree.insert(key);
//! }
//! assert_eq!(tree.inorder(), [&10, &20, &25, &30, &40, &50]);
//! assert!(tree.is_balanced());
//!
//! tree.remove(&30);
//! assert!(!tree.contains(&30));
//! assert_eq!(tree.len(), 5);
//! ```

mod error;
mod node;
pub mod render;
mod tree;

pub use error::ConsistencyError;
pub use node::Node;
pub use tree::Tree;
