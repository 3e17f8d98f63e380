use std::{cmp::Ordering, ops::Index};

use super::{
    NodeKey, NodeStore, NodeStoreDown, ParentId, Tree, TreeConfig, TreeError, TreeNodeId,
};
use crate::tree::config::DuplicatePolicy;

/// Which child slot of a binary node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// A node in the BinaryStore: value, parent link and at most two children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BNode<T> {
    pub(crate) parent: ParentId,
    pub(crate) value: T,
    pub(crate) left: Option<TreeNodeId>,
    pub(crate) right: Option<TreeNodeId>,
}

impl<T> BNode<T> {
    fn leaf(value: T, parent: ParentId) -> Self {
        BNode {
            parent,
            value,
            left: None,
            right: None,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<TreeNodeId> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Arena of binary nodes ordered as a search tree. Node 0 is the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryStore<T> {
    pub(crate) nodes: Vec<BNode<T>>,
}

impl<T: Ord> BinaryStore<T> {
    fn new(root: T) -> Self {
        BinaryStore {
            nodes: vec![BNode::leaf(root, ParentId::Root)],
        }
    }

    pub fn left(&self, node_id: TreeNodeId) -> Option<TreeNodeId> {
        self.nodes[node_id.0].left
    }

    pub fn right(&self, node_id: TreeNodeId) -> Option<TreeNodeId> {
        self.nodes[node_id.0].right
    }

    /// Descends from the root comparing against `value`.
    ///
    /// Returns the node holding an equal value, or the node and side of the empty slot the
    /// value belongs in.
    pub fn search(&self, value: &T) -> Result<TreeNodeId, (TreeNodeId, Side)> {
        let mut current = TreeNodeId(0);
        loop {
            let node = &self.nodes[current.0];
            let (next, side) = match value.cmp(&node.value) {
                Ordering::Less => (node.left, Side::Left),
                Ordering::Greater => (node.right, Side::Right),
                Ordering::Equal => return Ok(current),
            };
            match next {
                Some(child) => current = child,
                None => return Err((current, side)),
            }
        }
    }

    /// Attaches `value` as a new leaf in the given (empty) slot of `parent`.
    fn add_child(&mut self, value: T, parent: TreeNodeId, side: Side) -> TreeNodeId {
        let node_id = TreeNodeId(self.nodes.len());
        self.nodes.push(BNode::leaf(value, ParentId::Node(parent)));
        *self.nodes[parent.0].slot_mut(side) = Some(node_id);
        node_id
    }

    pub fn iter_inorder(&self) -> InorderIter<'_, T> {
        InorderIter {
            store: self,
            stack: vec![],
            current: Some(TreeNodeId(0)),
        }
    }

    pub fn iter_postorder(&self) -> PostorderIter<'_, T> {
        PostorderIter {
            store: self,
            stack: vec![(TreeNodeId(0), false)],
        }
    }
}

impl<T> Index<&TreeNodeId> for BinaryStore<T> {
    type Output = ParentId;
    fn index(&self, index: &TreeNodeId) -> &Self::Output {
        &self.nodes[index.0].parent
    }
}

impl<T> Index<TreeNodeId> for BinaryStore<T> {
    type Output = T;
    fn index(&self, index: TreeNodeId) -> &Self::Output {
        &self.nodes[index.0].value
    }
}

impl<T: Ord + NodeKey> NodeStore for BinaryStore<T> {
    type Key = T;
    type Item = T;

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn root_node(&self) -> TreeNodeId {
        TreeNodeId(0)
    }

    fn key(&self, node_id: TreeNodeId) -> &T {
        &self.nodes[node_id.0].value
    }

    fn find(&self, key: &T) -> Option<TreeNodeId> {
        self.search(key).ok()
    }
}

impl<T: Ord + NodeKey> NodeStoreDown for BinaryStore<T> {
    fn iter_children(&self, node_id: TreeNodeId) -> impl Iterator<Item = TreeNodeId> + '_ {
        let node = &self.nodes[node_id.0];
        node.left.into_iter().chain(node.right)
    }
}

/// In-order (left, node, right) iterator with an explicit stack.
pub struct InorderIter<'a, T> {
    store: &'a BinaryStore<T>,
    stack: Vec<TreeNodeId>,
    current: Option<TreeNodeId>,
}

impl<T: Ord> Iterator for InorderIter<'_, T> {
    type Item = TreeNodeId;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.current {
            self.stack.push(node);
            self.current = self.store.left(node);
        }
        let node = self.stack.pop()?;
        self.current = self.store.right(node);
        Some(node)
    }
}

/// Post-order (left, right, node) iterator. A node is yielded on its second pop,
/// after both subtrees were pushed above it.
pub struct PostorderIter<'a, T> {
    store: &'a BinaryStore<T>,
    stack: Vec<(TreeNodeId, bool)>,
}

impl<T: Ord> Iterator for PostorderIter<'_, T> {
    type Item = TreeNodeId;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, expanded) = self.stack.pop()?;
            if expanded {
                return Some(node);
            }
            self.stack.push((node, true));
            if let Some(right) = self.store.right(node) {
                self.stack.push((right, false));
            }
            if let Some(left) = self.store.left(node) {
                self.stack.push((left, false));
            }
        }
    }
}

/// Ordered binary tree: every left subtree holds smaller values, every right subtree
/// larger ones.
pub type BinarySearchTree<T> = Tree<BinaryStore<T>>;

impl<T: Ord + NodeKey> Tree<BinaryStore<T>> {
    pub fn new(value: T) -> Self {
        Self::with_config(value, TreeConfig::default())
    }

    pub fn with_config(value: T, config: TreeConfig) -> Self {
        Tree::from_nodes(BinaryStore::new(value), config)
    }

    /// Inserts `value` as a new leaf at the first empty slot along its search path.
    ///
    /// A value that is already stored is handled by [`TreeConfig::duplicates`].
    pub fn insert(&mut self, value: T) -> Result<TreeNodeId, TreeError<T>> {
        match self.nodes.search(&value) {
            Ok(existing) => match self.config.duplicates {
                DuplicatePolicy::Reject => Err(TreeError::DuplicateKey(value)),
                DuplicatePolicy::Ignore => {
                    log::debug!("ignoring duplicate value {value:?}");
                    Ok(existing)
                }
            },
            Err((parent, side)) => {
                let node_id = self.nodes.add_child(value, parent, side);
                self.invalidate();
                Ok(node_id)
            }
        }
    }

    /// Left subtree, node, right subtree. Ascending order.
    pub fn in_order(&self) -> Vec<&T> {
        self.nodes
            .iter_inorder()
            .map(|n| &self.nodes[n])
            .collect()
    }

    /// Left subtree, right subtree, node.
    pub fn post_order(&self) -> Vec<&T> {
        self.nodes
            .iter_postorder()
            .map(|n| &self.nodes[n])
            .collect()
    }

    pub fn min(&self) -> &T {
        let mut current = self.nodes.root_node();
        while let Some(left) = self.nodes.left(current) {
            current = left;
        }
        &self.nodes[current]
    }

    pub fn max(&self) -> &T {
        let mut current = self.nodes.root_node();
        while let Some(right) = self.nodes.right(current) {
            current = right;
        }
        &self.nodes[current]
    }
}
