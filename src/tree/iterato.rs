//! Traversal iterators shared by every [`NodeStore`] policy.
//!
//! Each iterator owns its scratch stack or queue, so walks never share state.

use std::collections::VecDeque;

use itertools::Itertools;

use super::{NodeStore, NodeStoreDown, ParentId, StackOrder, TreeNodeId};

// --- Ancestors Iterator ---

/// An iterator that traverses upwards from a starting node to the root.
/// Yields the starting node first and the root last.
#[derive(Clone)]
pub struct AncestorsIter<'a, S: NodeStore> {
    store: &'a S,
    /// The next node ID to yield. `None` once the root has been yielded.
    current: Option<TreeNodeId>,
}

impl<'a, S: NodeStore> AncestorsIter<'a, S> {
    pub fn new(store: &'a S, start_node: TreeNodeId) -> Self {
        AncestorsIter {
            store,
            current: Some(start_node),
        }
    }
}

impl<S: NodeStore> Iterator for AncestorsIter<'_, S> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node_to_return = self.current?;
        self.current = match self.store[&node_to_return] {
            ParentId::Root => None,
            ParentId::Node(parent_id) => Some(parent_id),
        };
        Some(node_to_return)
    }
}

// --- BFS Iterator ---

/// A Breadth-First Search (BFS) iterator state.
pub struct BfsIter<'a, S: NodeStoreDown> {
    store: &'a S,
    queue: VecDeque<TreeNodeId>,
}

impl<S: NodeStoreDown> Clone for BfsIter<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            queue: self.queue.clone(),
        }
    }
}

impl<'a, S: NodeStoreDown> BfsIter<'a, S> {
    pub fn new(store: &'a S, start: TreeNodeId) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(start);
        BfsIter { store, queue }
    }
}

impl<S: NodeStoreDown> Iterator for BfsIter<'_, S> {
    type Item = TreeNodeId;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(self.store.iter_children(node));
        Some(node)
    }
}

// --- Stack DFS Iterator ---

/// A depth-first iterator driven by an explicit stack.
///
/// With [`StackOrder::LeftToRight`] children are pushed in reverse so the first child is
/// popped next, which is exactly pre-order. With [`StackOrder::RightToLeft`] children are
/// pushed as they come and popped last child first.
pub struct StackDfsIter<'a, S: NodeStoreDown> {
    store: &'a S,
    stack: Vec<TreeNodeId>,
    order: StackOrder,
}

impl<S: NodeStoreDown> Clone for StackDfsIter<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            stack: self.stack.clone(),
            order: self.order,
        }
    }
}

impl<'a, S: NodeStoreDown> StackDfsIter<'a, S> {
    pub fn new(store: &'a S, start: TreeNodeId, order: StackOrder) -> Self {
        StackDfsIter {
            store,
            stack: vec![start],
            order,
        }
    }
}

impl<S: NodeStoreDown> Iterator for StackDfsIter<'_, S> {
    type Item = TreeNodeId;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        match self.order {
            StackOrder::RightToLeft => self.stack.extend(self.store.iter_children(node)),
            StackOrder::LeftToRight => self
                .stack
                .extend(self.store.iter_children(node).collect_vec().into_iter().rev()),
        }
        Some(node)
    }
}
