//! # Arbor
//!
//! Arbor is a small family of in-memory hierarchical stores: a set of records linked by
//! parent/child relationships, with traversal, lookup and ancestry queries on top.
//!
//! Three storage policies share one query surface, [`tree::Tree`]:
//! an ordered binary search tree, an N-ary tree filled by naming each node's parent, and a
//! flat-record store built in one pass from `{id, parent, fields}` records.

pub mod tree;

pub use tree::{
    AdjacencyMatrix, BinarySearchTree, ClassicTree, DuplicatePolicy, Record, StackOrder, Tree,
    TreeConfig, TreeError, TreeStore,
};
