//! Core data structures and traits for in-memory hierarchical node stores.
//!
//! A store holds exactly one rooted tree. How the nodes are laid out is decided by the
//! storage policy, each with different trade-offs for insertion and lookup:
//!
//! *   [`BinaryStore`]: ordered binary nodes, insert position decided by comparison.
//!     Lookup descends from the root.
//! *   [`ChildVecStore`]: N-ary nodes with an explicit `Vec` of children, inserted under a
//!     caller-chosen parent. Lookup is a full walk from the root.
//! *   [`RecordStore`]: flat records keyed by id in an insertion-ordered map, with the
//!     children lists materialized in one pass. Lookup is O(1).
//!
//! The core components are:
//! *   [`Tree<N>`]: the store itself. It owns the node storage `N`, a [`TreeConfig`] and a
//!     lazily built [`AdjacencyMatrix`], and implements the query operations shared by all
//!     policies.
//! *   [`NodeStore`] trait: the basic interface for node storage (root, keys, parent links,
//!     lookup by key).
//! *   [`NodeStoreDown`] trait: extends `NodeStore` with downward traversal (children).
//! *   [`NodeStoreAncestors`], [`NodeStorePreorder`], [`NodeStoreBfs`], [`NodeStoreStackDfs`]:
//!     traversal traits, blanket-implemented through the iterators in [`iterato`].
//! *   [`TreeNodeId`], [`ParentId`]: typed arena indices and parent links.

use std::{
    cell::OnceCell,
    fmt::{Debug, Write},
    hash::Hash,
    ops::Index,
};

use itertools::Itertools;
use thiserror::Error;

pub mod adjacency;
pub mod binary;
pub mod child_vec;
pub mod config;
pub mod iterato;
pub mod record;

#[cfg(test)]
mod test;

pub use adjacency::AdjacencyMatrix;
pub use binary::{BinarySearchTree, BinaryStore};
pub use child_vec::{ChildVecStore, ClassicTree, NaryNode};
pub use config::{DuplicatePolicy, StackOrder, TreeConfig};
pub use record::{ParentRef, RawRecord, Record, RecordStore, TreeStore};

use iterato::{AncestorsIter, BfsIter, StackDfsIter};

/// A type-safe identifier for a node within a store.
/// Wraps a `usize` index into the underlying node storage.
#[derive(
    Clone,
    Debug,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::From,
    derive_more::Display,
)]
#[display(fmt = "{}", _0)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNodeId(pub(crate) usize);

/// Parent link of a stored node. The root points at the sentinel.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParentId {
    Root,
    Node(TreeNodeId),
}

impl ParentId {
    pub fn is_root(&self) -> bool {
        match self {
            ParentId::Root => true,
            ParentId::Node(_) => false,
        }
    }

    pub fn is_node(&self) -> bool {
        !self.is_root()
    }

    pub fn node(&self) -> Option<TreeNodeId> {
        match self {
            ParentId::Root => None,
            ParentId::Node(n) => Some(*n),
        }
    }
}

/// Bounds every record identifier has to satisfy.
pub trait NodeKey: Clone + Eq + Hash + Debug {}

impl<K: Clone + Eq + Hash + Debug> NodeKey for K {}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError<K> {
    #[error("Missing parent: no node with id {0:?}")]
    MissingParent(K),
    #[error("Missing node: no node with id {0:?}")]
    MissingNode(K),
    #[error("Missing root: no record points at the root sentinel")]
    MissingRoot,
    #[error("Record id {0:?} collides with the root sentinel")]
    SentinelCollision(K),
    #[error("Duplicate key: {0:?} is already stored")]
    DuplicateKey(K),
    #[error("Ambiguous root: store already has a root, rejecting root record {0:?}")]
    AmbiguousRoot(K),
    #[error("Record {0:?} is not connected to any root")]
    Disconnected(K),
}

// --- Core Traits ---

/// The core trait defining the interface for node storage within a [`Tree`].
pub trait NodeStore:
    for<'a> Index<&'a TreeNodeId, Output = ParentId> // `store[&node_id]` -> ParentId
    + Index<TreeNodeId, Output = Self::Item>         // `store[node_id]` -> Item
{
    /// Identifier the store is queried by.
    type Key: NodeKey;
    /// What queries hand back for a node.
    type Item;

    fn n_nodes(&self) -> usize;

    fn root_node(&self) -> TreeNodeId;

    fn key(&self, node_id: TreeNodeId) -> &Self::Key;

    /// Resolves a key to its node, using whatever lookup the policy supports.
    fn find(&self, key: &Self::Key) -> Option<TreeNodeId>;

    fn iter_node_id(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        (0..self.n_nodes()).map(TreeNodeId)
    }
}

/// Trait extension for `NodeStore` providing downward traversal capabilities.
pub trait NodeStoreDown: NodeStore {
    /// Returns an iterator over the direct children of `node_id`, in insertion order.
    fn iter_children(&self, node_id: TreeNodeId) -> impl Iterator<Item = TreeNodeId> + '_;

    /// Returns an iterator over all leaf nodes in the store.
    fn iter_leaves(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.iter_node_id()
            .filter(move |&n| self.iter_children(n).next().is_none())
    }
}

// --- Traversal Traits ---

/// Trait for stores supporting ancestor iteration (upward traversal).
pub trait NodeStoreAncestors: NodeStore + Sized {
    /// Returns an iterator from `start_node` up to the root (inclusive on both ends).
    fn iter_ancestors(&self, start_node: TreeNodeId) -> AncestorsIter<'_, Self>;
}

/// Trait for stores supporting pre-order traversal.
pub trait NodeStorePreorder: NodeStoreDown + Sized {
    /// Returns a pre-order DFS iterator starting from `start`, siblings left to right.
    fn iter_preorder(&self, start: TreeNodeId) -> StackDfsIter<'_, Self>;
}

/// Trait for stores supporting depth-first traversal through an explicit stack.
pub trait NodeStoreStackDfs: NodeStoreDown + Sized {
    /// Returns a stack-driven DFS iterator starting from `start`.
    fn iter_stack_dfs(&self, start: TreeNodeId, order: StackOrder) -> StackDfsIter<'_, Self>;
}

/// Trait for stores supporting breadth-first traversal.
pub trait NodeStoreBfs: NodeStoreDown + Sized {
    /// Returns a BFS iterator starting from `start`.
    fn iter_bfs(&self, start: TreeNodeId) -> BfsIter<'_, Self>;
}

// --- Default Trait Implementations ---

impl<N: NodeStore> NodeStoreAncestors for N {
    fn iter_ancestors(&self, start_node: TreeNodeId) -> AncestorsIter<'_, Self> {
        AncestorsIter::new(self, start_node)
    }
}

impl<N: NodeStoreDown> NodeStorePreorder for N {
    fn iter_preorder(&self, start: TreeNodeId) -> StackDfsIter<'_, Self> {
        StackDfsIter::new(self, start, StackOrder::LeftToRight)
    }
}

impl<N: NodeStoreDown> NodeStoreStackDfs for N {
    fn iter_stack_dfs(&self, start: TreeNodeId, order: StackOrder) -> StackDfsIter<'_, Self> {
        StackDfsIter::new(self, start, order)
    }
}

impl<N: NodeStoreDown> NodeStoreBfs for N {
    fn iter_bfs(&self, start: TreeNodeId) -> BfsIter<'_, Self> {
        BfsIter::new(self, start)
    }
}

/// A single rooted tree over the node storage `N`.
///
/// `N` is one of [`BinaryStore<T>`], [`ChildVecStore<K, V>`] or [`RecordStore<K, F>`];
/// the aliases [`BinarySearchTree`], [`ClassicTree`] and [`TreeStore`] name the three
/// combinations. Inserting is policy specific and lives next to each store; everything
/// that only reads is implemented here once.
///
/// Every query returns freshly collected values borrowing from the tree. The
/// [`AdjacencyMatrix`] is built on first use and dropped by every successful insert.
#[derive(Debug, Clone)]
pub struct Tree<N: NodeStore> {
    pub(crate) nodes: N,
    pub(crate) config: TreeConfig,
    adjacency: OnceCell<AdjacencyMatrix<N::Key>>,
}

impl<N: NodeStore> Tree<N> {
    pub(crate) fn from_nodes(nodes: N, config: TreeConfig) -> Self {
        Tree {
            nodes,
            config,
            adjacency: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn nodes(&self) -> &N {
        &self.nodes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.n_nodes()
    }

    pub fn root(&self) -> &N::Item {
        &self.nodes[self.nodes.root_node()]
    }

    pub fn root_key(&self) -> &N::Key {
        self.nodes.key(self.nodes.root_node())
    }

    /// Drops the cached adjacency matrix. Called after every successful mutation.
    pub(crate) fn invalidate(&mut self) {
        if self.adjacency.take().is_some() {
            log::trace!("adjacency matrix invalidated");
        }
    }

    fn node_of(&self, key: &N::Key) -> Result<TreeNodeId, TreeError<N::Key>> {
        self.nodes
            .find(key)
            .ok_or_else(|| TreeError::MissingNode(key.clone()))
    }

    /// Returns the item stored under `key`.
    pub fn get_item(&self, key: &N::Key) -> Result<&N::Item, TreeError<N::Key>> {
        self.node_of(key).map(|n| &self.nodes[n])
    }

    /// Ancestor chain of `key`: nearest parent first, root last. Empty for the root.
    #[doc(alias = "get_all_parents")]
    pub fn ancestors(&self, key: &N::Key) -> Result<Vec<&N::Item>, TreeError<N::Key>> {
        let start = self.node_of(key)?;
        Ok(self
            .nodes
            .iter_ancestors(start)
            .skip(1)
            .map(|n| &self.nodes[n])
            .collect())
    }
}

impl<N: NodeStoreDown> Tree<N> {
    fn keys(&self, nodes: impl Iterator<Item = TreeNodeId>) -> Vec<&N::Key> {
        nodes.map(|n| self.nodes.key(n)).collect()
    }

    /// Parent first, then every child subtree left to right.
    pub fn pre_order(&self) -> Vec<&N::Key> {
        self.keys(self.nodes.iter_preorder(self.nodes.root_node()))
    }

    /// Depth-first walk driven by an explicit stack.
    ///
    /// With the default [`StackOrder::RightToLeft`] children are pushed in order and
    /// therefore popped last child first.
    pub fn depth_first_search_by_stack(&self) -> Vec<&N::Key> {
        self.keys(
            self.nodes
                .iter_stack_dfs(self.nodes.root_node(), self.config.stack_order),
        )
    }

    /// Level-order walk, children enqueued in insertion order.
    pub fn breadth_first_search(&self) -> Vec<&N::Key> {
        self.keys(self.nodes.iter_bfs(self.nodes.root_node()))
    }

    /// All items in the order [`Tree::depth_first_search_by_stack`] visits them.
    pub fn get_all_by_stack(&self) -> Vec<&N::Item> {
        self.nodes
            .iter_stack_dfs(self.nodes.root_node(), self.config.stack_order)
            .map(|n| &self.nodes[n])
            .collect()
    }

    /// Child-list view of the tree, built on first use.
    pub fn adjacency_matrix(&self) -> &AdjacencyMatrix<N::Key> {
        self.adjacency.get_or_init(|| {
            log::trace!("building adjacency matrix over {} nodes", self.n_nodes());
            AdjacencyMatrix::from_store(&self.nodes)
        })
    }

    /// Membership test against the adjacency matrix.
    pub fn contains(&self, key: &N::Key) -> bool {
        self.adjacency_matrix().contains(key)
    }

    /// Membership test by walking the nodes with an explicit stack, without the matrix.
    pub fn contains_by_walk(&self, key: &N::Key) -> bool {
        self.nodes
            .iter_stack_dfs(self.nodes.root_node(), StackOrder::RightToLeft)
            .any(|n| self.nodes.key(n) == key)
    }

    /// Direct children of `key` in insertion order.
    ///
    /// A leaf gives an empty vector, an unknown key gives [`TreeError::MissingNode`].
    pub fn children(&self, key: &N::Key) -> Result<Vec<&N::Item>, TreeError<N::Key>> {
        let node = self.node_of(key)?;
        Ok(self
            .nodes
            .iter_children(node)
            .map(|c| &self.nodes[c])
            .collect())
    }

    /// Same answer as [`Tree::children`] read from the adjacency matrix, as keys.
    pub fn children_by_adjacency(&self, key: &N::Key) -> Result<Vec<&N::Key>, TreeError<N::Key>> {
        self.adjacency_matrix()
            .children(key)
            .map(|children| children.iter().collect())
            .ok_or_else(|| TreeError::MissingNode(key.clone()))
    }

    /// Every descendant of `key` in pre-order, excluding `key` itself.
    pub fn subtree(&self, key: &N::Key) -> Result<Vec<&N::Item>, TreeError<N::Key>> {
        let node = self.node_of(key)?;
        Ok(self
            .nodes
            .iter_preorder(node)
            .skip(1)
            .map(|n| &self.nodes[n])
            .collect())
    }

    /// Box-drawing rendering of the tree, one node per line.
    pub fn debug_draw(&self, mut format_item: impl FnMut(&N::Item) -> String) -> String {
        let mut output = String::new();
        let root = self.nodes.root_node();
        let _ = writeln!(output, "{}", format_item(&self.nodes[root]));

        let mut stack: Vec<(TreeNodeId, String, bool)> = vec![];
        let push_children = |stack: &mut Vec<(TreeNodeId, String, bool)>, node: TreeNodeId, prefix: String| {
            let children = self.nodes.iter_children(node).collect_vec();
            let last = children.len().saturating_sub(1);
            for (i, child) in children.into_iter().enumerate().rev() {
                stack.push((child, prefix.clone(), i == last));
            }
        };
        push_children(&mut stack, root, String::new());

        while let Some((node, prefix, is_last_child)) = stack.pop() {
            let connector = if is_last_child {
                "└── "
            } else {
                "├── "
            };
            let _ = writeln!(
                output,
                "{prefix}{connector}{}",
                format_item(&self.nodes[node])
            );
            let child_prefix = format!("{}{}", prefix, if is_last_child { "    " } else { "│   " });
            push_children(&mut stack, node, child_prefix);
        }

        output
    }
}
