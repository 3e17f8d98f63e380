use std::collections::VecDeque;

use ahash::RandomState;
use indexmap::IndexMap;

use super::{NodeKey, NodeStoreDown, NodeStorePreorder, StackOrder};

/// Mapping from every node key to the ordered keys of its direct children.
///
/// Keys are stored in the pre-order of the walk that produced the matrix; leaves map to an
/// empty list. Once built, the matrix is a standalone snapshot: the traversals below give the
/// same orderings as walking the owning tree, without touching its nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdjacencyMatrix<K: NodeKey> {
    root: K,
    children: IndexMap<K, Vec<K>, RandomState>,
}

impl<K: NodeKey> AdjacencyMatrix<K> {
    /// Derives the matrix with a single pre-order walk over `store`.
    pub fn from_store<N: NodeStoreDown<Key = K>>(store: &N) -> Self {
        let root = store.root_node();
        let mut children = IndexMap::with_capacity_and_hasher(store.n_nodes(), RandomState::new());
        for node in store.iter_preorder(root) {
            children.insert(
                store.key(node).clone(),
                store
                    .iter_children(node)
                    .map(|c| store.key(c).clone())
                    .collect(),
            );
        }
        AdjacencyMatrix {
            root: store.key(root).clone(),
            children,
        }
    }

    pub fn root(&self) -> &K {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.children.contains_key(key)
    }

    /// Children of `key`, `None` if the key is not part of the matrix.
    pub fn children(&self, key: &K) -> Option<&[K]> {
        self.children.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[K])> {
        self.children.iter().map(|(k, c)| (k, c.as_slice()))
    }

    fn children_or_leaf(&self, key: &K) -> &[K] {
        self.children(key).unwrap_or_default()
    }

    pub fn breadth_first_search(&self) -> Vec<&K> {
        let mut queue = VecDeque::from([&self.root]);
        let mut path = Vec::with_capacity(self.len());
        while let Some(key) = queue.pop_front() {
            path.push(key);
            queue.extend(self.children_or_leaf(key));
        }
        path
    }

    pub fn depth_first_search_by_stack(&self, order: StackOrder) -> Vec<&K> {
        let mut stack = vec![&self.root];
        let mut path = Vec::with_capacity(self.len());
        while let Some(key) = stack.pop() {
            path.push(key);
            let children = self.children_or_leaf(key);
            match order {
                StackOrder::RightToLeft => stack.extend(children),
                StackOrder::LeftToRight => stack.extend(children.iter().rev()),
            }
        }
        path
    }
}
