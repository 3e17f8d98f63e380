use std::ops::Index;

use super::{
    NodeKey, NodeStore, NodeStoreDown, NodeStoreStackDfs, ParentId, StackOrder, Tree, TreeConfig,
    TreeError, TreeNodeId,
};

/// What an N-ary node exposes to callers: its id and payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NaryNode<K, V> {
    pub id: K,
    pub payload: V,
}

/// A node in the ChildVecStore: parent link, item, and an ordered vector of children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CVNode<K, V> {
    pub(crate) parent: ParentId,
    pub(crate) item: NaryNode<K, V>,
    pub(crate) children: Vec<TreeNodeId>,
}

/// The ChildVecStore itself. Node 0 is the root.
///
/// There is no id index: resolving an id walks the tree from the root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChildVecStore<K, V> {
    pub(crate) nodes: Vec<CVNode<K, V>>,
}

impl<K, V> ChildVecStore<K, V> {
    fn with_root(id: K, payload: V) -> Self {
        ChildVecStore {
            nodes: vec![CVNode {
                parent: ParentId::Root,
                item: NaryNode { id, payload },
                children: Vec::new(),
            }],
        }
    }

    /// Adds a new child node as the *last* child of `parent`.
    fn add_child(&mut self, id: K, payload: V, parent: TreeNodeId) -> TreeNodeId {
        let node_id = TreeNodeId(self.nodes.len());
        self.nodes.push(CVNode {
            parent: ParentId::Node(parent),
            item: NaryNode { id, payload },
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(node_id);
        node_id
    }
}

impl<K, V> Index<&TreeNodeId> for ChildVecStore<K, V> {
    type Output = ParentId;
    fn index(&self, index: &TreeNodeId) -> &Self::Output {
        &self.nodes[index.0].parent
    }
}

impl<K, V> Index<TreeNodeId> for ChildVecStore<K, V> {
    type Output = NaryNode<K, V>;
    fn index(&self, index: TreeNodeId) -> &Self::Output {
        &self.nodes[index.0].item
    }
}

impl<K: NodeKey, V> NodeStore for ChildVecStore<K, V> {
    type Key = K;
    type Item = NaryNode<K, V>;

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn root_node(&self) -> TreeNodeId {
        TreeNodeId(0)
    }

    fn key(&self, node_id: TreeNodeId) -> &K {
        &self.nodes[node_id.0].item.id
    }

    fn find(&self, key: &K) -> Option<TreeNodeId> {
        self.iter_stack_dfs(self.root_node(), StackOrder::RightToLeft)
            .find(|&n| self.key(n) == key)
    }
}

impl<K: NodeKey, V> NodeStoreDown for ChildVecStore<K, V> {
    fn iter_children(&self, node_id: TreeNodeId) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.nodes[node_id.0].children.iter().copied()
    }

    fn iter_leaves(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, node)| {
            if node.children.is_empty() {
                Some(TreeNodeId(i))
            } else {
                None
            }
        })
    }
}

/// Unordered N-ary tree: every node is inserted under an explicitly named parent.
pub type ClassicTree<K, V = ()> = Tree<ChildVecStore<K, V>>;

impl<K: NodeKey, V> Tree<ChildVecStore<K, V>> {
    pub fn new(id: K, payload: V) -> Self {
        Self::with_config(id, payload, TreeConfig::default())
    }

    pub fn with_config(id: K, payload: V, config: TreeConfig) -> Self {
        Tree::from_nodes(ChildVecStore::with_root(id, payload), config)
    }

    /// Appends a node under `parent`, found by walking the tree.
    ///
    /// Fails with [`TreeError::MissingParent`] if no node has id `parent`, and with
    /// [`TreeError::DuplicateKey`] if `id` is already in the tree.
    pub fn insert(&mut self, id: K, payload: V, parent: &K) -> Result<TreeNodeId, TreeError<K>> {
        let Some(parent_node) = self.nodes.find(parent) else {
            return Err(TreeError::MissingParent(parent.clone()));
        };
        if self.nodes.find(&id).is_some() {
            return Err(TreeError::DuplicateKey(id));
        }
        log::debug!("inserting {id:?} under {parent:?}");
        let node_id = self.nodes.add_child(id, payload, parent_node);
        self.invalidate();
        Ok(node_id)
    }

    /// Ids of every leaf, in insertion order.
    pub fn leaves(&self) -> Vec<&K> {
        self.nodes
            .iter_leaves()
            .map(|n| self.nodes.key(n))
            .collect()
    }
}
