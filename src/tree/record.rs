//! Flat-record storage: the tree is given as a list of `{id, parent, fields}` records.
//!
//! Records live in an insertion-ordered map keyed by id, so every lookup is O(1). The
//! position of a record in that map doubles as its [`TreeNodeId`].

use std::ops::Index;

use ahash::RandomState;
use bitvec::prelude::*;
use indexmap::IndexMap;

use super::{
    NodeKey, NodeStore, NodeStoreDown, NodeStorePreorder, ParentId, Tree, TreeConfig, TreeError,
    TreeNodeId,
};

/// Parent reference of a record: the root sentinel or another record's id.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParentRef<K> {
    Root,
    Node(K),
}

impl<K> ParentRef<K> {
    pub fn is_root(&self) -> bool {
        matches!(self, ParentRef::Root)
    }

    pub fn node(&self) -> Option<&K> {
        match self {
            ParentRef::Root => None,
            ParentRef::Node(k) => Some(k),
        }
    }
}

/// A stored record. `fields` carries whatever else the caller attaches to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record<K, F = ()> {
    pub id: K,
    pub parent: ParentRef<K>,
    pub fields: F,
}

impl<K, F> Record<K, F> {
    pub fn root(id: K, fields: F) -> Self {
        Record {
            id,
            parent: ParentRef::Root,
            fields,
        }
    }

    pub fn child(id: K, parent: K, fields: F) -> Self {
        Record {
            id,
            parent: ParentRef::Node(parent),
            fields,
        }
    }
}

/// Untyped input record: the parent is a plain id, and the root is marked by a sentinel
/// value chosen by the caller (e.g. `"root"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawRecord<K, F = ()> {
    pub id: K,
    pub parent: K,
    pub fields: F,
}

impl<K: NodeKey, F> RawRecord<K, F> {
    /// Resolves the sentinel. A record whose own id is the sentinel is rejected.
    pub fn into_record(self, sentinel: &K) -> Result<Record<K, F>, TreeError<K>> {
        if &self.id == sentinel {
            return Err(TreeError::SentinelCollision(self.id));
        }
        let parent = if &self.parent == sentinel {
            ParentRef::Root
        } else {
            ParentRef::Node(self.parent)
        };
        Ok(Record {
            id: self.id,
            parent,
            fields: self.fields,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct RNode<K, F> {
    record: Record<K, F>,
    parent: ParentId,
    children: Vec<TreeNodeId>,
}

/// Id-indexed record storage with materialized children lists.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordStore<K: NodeKey, F> {
    records: IndexMap<K, RNode<K, F>, RandomState>,
    root: TreeNodeId,
    detached: Vec<TreeNodeId>,
}

impl<K: NodeKey, F> RecordStore<K, F> {
    /// Builds the store in one pass over `records`, then links every record to its parent.
    ///
    /// The first root record in input order becomes the root. Later root records are kept
    /// as detached records: retrievable by id, but outside the tree.
    fn build(records: impl IntoIterator<Item = Record<K, F>>) -> Result<Self, TreeError<K>> {
        let records = records.into_iter();
        let mut nodes: IndexMap<K, RNode<K, F>, RandomState> =
            IndexMap::with_capacity_and_hasher(records.size_hint().0, RandomState::new());
        let mut root = None;
        let mut detached = vec![];

        for record in records {
            if nodes.contains_key(&record.id) {
                return Err(TreeError::DuplicateKey(record.id));
            }
            let node_id = TreeNodeId(nodes.len());
            if record.parent.is_root() {
                if root.is_none() {
                    root = Some(node_id);
                } else {
                    log::warn!(
                        "record {:?} is a second root, keeping it detached",
                        record.id
                    );
                    detached.push(node_id);
                }
            }
            nodes.insert(
                record.id.clone(),
                RNode {
                    record,
                    parent: ParentId::Root,
                    children: vec![],
                },
            );
        }
        let root = root.ok_or(TreeError::MissingRoot)?;

        for i in 0..nodes.len() {
            let parent = match &nodes[i].record.parent {
                ParentRef::Root => continue,
                ParentRef::Node(p) => nodes
                    .get_index_of(p)
                    .ok_or_else(|| TreeError::MissingParent(p.clone()))?,
            };
            nodes[i].parent = ParentId::Node(TreeNodeId(parent));
            nodes[parent].children.push(TreeNodeId(i));
        }

        let store = RecordStore {
            records: nodes,
            root,
            detached,
        };
        store.check_connected()?;
        log::debug!(
            "built record store with {} records, root {:?}",
            store.records.len(),
            store.key(root)
        );
        Ok(store)
    }

    /// Every record must hang below the root or a detached root. Parent links that close a
    /// cycle among themselves never reach one.
    fn check_connected(&self) -> Result<(), TreeError<K>> {
        let mut seen = bitvec![0; self.records.len()];
        for start in std::iter::once(self.root).chain(self.detached.iter().copied()) {
            for node in self.iter_preorder(start) {
                seen.set(node.0, true);
            }
        }
        match seen.first_zero() {
            Some(orphan) => Err(TreeError::Disconnected(self.key(TreeNodeId(orphan)).clone())),
            None => Ok(()),
        }
    }

    /// Validates before touching anything, so a rejected record leaves the store as it was.
    fn add_child(&mut self, record: Record<K, F>) -> Result<TreeNodeId, TreeError<K>> {
        let parent = match &record.parent {
            ParentRef::Root => return Err(TreeError::AmbiguousRoot(record.id)),
            ParentRef::Node(p) => self
                .records
                .get_index_of(p)
                .ok_or_else(|| TreeError::MissingParent(p.clone()))?,
        };
        if self.records.contains_key(&record.id) {
            return Err(TreeError::DuplicateKey(record.id));
        }
        let node_id = TreeNodeId(self.records.len());
        self.records.insert(
            record.id.clone(),
            RNode {
                record,
                parent: ParentId::Node(TreeNodeId(parent)),
                children: vec![],
            },
        );
        self.records[parent].children.push(node_id);
        Ok(node_id)
    }
}

impl<K: NodeKey, F> Index<&TreeNodeId> for RecordStore<K, F> {
    type Output = ParentId;
    fn index(&self, index: &TreeNodeId) -> &Self::Output {
        &self.records[index.0].parent
    }
}

impl<K: NodeKey, F> Index<TreeNodeId> for RecordStore<K, F> {
    type Output = Record<K, F>;
    fn index(&self, index: TreeNodeId) -> &Self::Output {
        &self.records[index.0].record
    }
}

impl<K: NodeKey, F> NodeStore for RecordStore<K, F> {
    type Key = K;
    type Item = Record<K, F>;

    fn n_nodes(&self) -> usize {
        self.records.len()
    }

    fn root_node(&self) -> TreeNodeId {
        self.root
    }

    fn key(&self, node_id: TreeNodeId) -> &K {
        &self.records[node_id.0].record.id
    }

    fn find(&self, key: &K) -> Option<TreeNodeId> {
        self.records.get_index_of(key).map(TreeNodeId)
    }
}

impl<K: NodeKey, F> NodeStoreDown for RecordStore<K, F> {
    fn iter_children(&self, node_id: TreeNodeId) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.records[node_id.0].children.iter().copied()
    }
}

/// Tree given as flat records, with O(1) access by id.
pub type TreeStore<K, F = ()> = Tree<RecordStore<K, F>>;

impl<K: NodeKey, F> Tree<RecordStore<K, F>> {
    pub fn new(records: impl IntoIterator<Item = Record<K, F>>) -> Result<Self, TreeError<K>> {
        Self::with_config(records, TreeConfig::default())
    }

    pub fn with_config(
        records: impl IntoIterator<Item = Record<K, F>>,
        config: TreeConfig,
    ) -> Result<Self, TreeError<K>> {
        Ok(Tree::from_nodes(RecordStore::build(records)?, config))
    }

    /// Builds from untyped records whose parent equals `sentinel` at the root.
    pub fn from_raw_records(
        records: impl IntoIterator<Item = RawRecord<K, F>>,
        sentinel: &K,
    ) -> Result<Self, TreeError<K>> {
        let records = records
            .into_iter()
            .map(|r| r.into_record(sentinel))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records)
    }

    /// Adds `record` below its parent in O(1). The parent must already be stored.
    pub fn insert(&mut self, record: Record<K, F>) -> Result<TreeNodeId, TreeError<K>> {
        let node_id = self.nodes.add_child(record)?;
        log::debug!("inserted record {:?}", self.nodes.key(node_id));
        self.invalidate();
        Ok(node_id)
    }

    pub fn insert_raw(
        &mut self,
        record: RawRecord<K, F>,
        sentinel: &K,
    ) -> Result<TreeNodeId, TreeError<K>> {
        self.insert(record.into_record(sentinel)?)
    }

    /// Every record in input order, followed by those inserted later.
    pub fn get_all(&self) -> Vec<&Record<K, F>> {
        self.nodes.records.values().map(|n| &n.record).collect()
    }

    /// Root records that lost the tie-break against the first one.
    pub fn detached_roots(&self) -> Vec<&Record<K, F>> {
        self.nodes
            .detached
            .iter()
            .map(|&n| &self.nodes[n])
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::tree::{ParentRef, RawRecord, Record, TreeError, TreeStore};

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Kind {
        Test,
        Untyped,
    }

    fn items() -> Vec<Record<u32, Option<Kind>>> {
        vec![
            Record::root(1, None),
            Record::child(2, 1, Some(Kind::Test)),
            Record::child(3, 1, Some(Kind::Test)),
            Record::child(4, 2, Some(Kind::Test)),
            Record::child(5, 2, Some(Kind::Test)),
            Record::child(6, 2, Some(Kind::Test)),
            Record::child(7, 4, None),
            Record::child(8, 4, None),
        ]
    }

    fn ids<F>(records: Vec<&Record<u32, F>>) -> Vec<u32> {
        records.into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn lookups() {
        let store = TreeStore::new(items()).unwrap();

        assert_eq!(store.get_all().into_iter().cloned().collect::<Vec<_>>(), items());
        assert_eq!(store.get_item(&7).unwrap(), &Record::child(7, 4, None));
        assert_eq!(store.get_item(&70), Err(TreeError::MissingNode(70)));
        assert_eq!(ids(store.children(&4).unwrap()), vec![7, 8]);
        assert_eq!(ids(store.children(&2).unwrap()), vec![4, 5, 6]);
        assert!(store.children(&5).unwrap().is_empty());
        assert_eq!(store.children(&50), Err(TreeError::MissingNode(50)));
        assert_eq!(ids(store.ancestors(&7).unwrap()), vec![4, 2, 1]);
        assert!(store.ancestors(&1).unwrap().is_empty());
        assert_eq!(store.ancestors(&9), Err(TreeError::MissingNode(9)));
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut shuffled = items();
        shuffled.reverse();
        let store = TreeStore::new(shuffled).unwrap();
        assert_eq!(store.root_key(), &1);
        assert_eq!(ids(store.children(&4).unwrap()), vec![8, 7]);
        assert_eq!(ids(store.ancestors(&7).unwrap()), vec![4, 2, 1]);
    }

    #[test]
    fn insert_appends_children() {
        let mut store = TreeStore::new(items()).unwrap();
        assert!(!store.contains(&9));
        store
            .insert(Record::child(9, 8, Some(Kind::Untyped)))
            .unwrap();
        assert!(store.contains(&9));
        assert_eq!(ids(store.children(&8).unwrap()), vec![9]);
        assert_eq!(ids(store.ancestors(&9).unwrap()), vec![8, 4, 2, 1]);
        assert_eq!(store.get_all().len(), 9);
    }

    #[test]
    fn insert_under_missing_parent_is_rejected() {
        let mut store = TreeStore::new(items()).unwrap();
        let before = store.get_all().into_iter().cloned().collect::<Vec<_>>();

        assert_eq!(
            store.insert(Record::child(11, 10, Some(Kind::Test))),
            Err(TreeError::MissingParent(10))
        );
        assert_eq!(
            store.insert(Record::child(3, 1, None)),
            Err(TreeError::DuplicateKey(3))
        );
        assert_eq!(
            store.insert(Record::root(12, None)),
            Err(TreeError::AmbiguousRoot(12))
        );
        assert_eq!(store.get_all().into_iter().cloned().collect::<Vec<_>>(), before);
        assert!(!store.contains(&11));
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            TreeStore::new(vec![Record::child(2, 1, ())]).err(),
            Some(TreeError::MissingRoot)
        );
        assert_eq!(
            TreeStore::new(vec![Record::root(1, ()), Record::child(2, 5, ())]).err(),
            Some(TreeError::MissingParent(5))
        );
        assert_eq!(
            TreeStore::new(vec![Record::root(1, ()), Record::child(1, 1, ())]).err(),
            Some(TreeError::DuplicateKey(1))
        );
        assert_eq!(
            TreeStore::new(vec![
                Record::root(1, ()),
                Record::child(2, 3, ()),
                Record::child(3, 2, ()),
            ])
            .err(),
            Some(TreeError::Disconnected(2))
        );
    }

    #[test]
    fn first_root_wins() {
        let store = TreeStore::new(vec![
            Record::root(1, ()),
            Record::root(2, ()),
            Record::child(3, 2, ()),
            Record::child(4, 1, ()),
        ])
        .unwrap();

        assert_eq!(store.root_key(), &1);
        assert_eq!(ids(store.detached_roots()), vec![2]);
        assert_eq!(store.breadth_first_search(), vec![&1, &4]);
        assert_eq!(ids(store.ancestors(&3).unwrap()), vec![2]);
        assert_eq!(store.get_item(&3).unwrap().parent, ParentRef::Node(2));
    }

    #[test]
    fn raw_records_with_string_sentinel() {
        let raw = |id: &str, parent: &str| RawRecord {
            id: id.to_string(),
            parent: parent.to_string(),
            fields: (),
        };
        let sentinel = "root".to_string();
        let mut store =
            TreeStore::from_raw_records(vec![raw("a", "root"), raw("b", "a")], &sentinel)
                .unwrap();

        assert_eq!(store.root_key(), "a");
        assert_eq!(
            store.insert_raw(raw("root", "b"), &sentinel),
            Err(TreeError::SentinelCollision("root".to_string()))
        );
        assert_eq!(
            TreeStore::from_raw_records(vec![raw("root", "root")], &sentinel).err(),
            Some(TreeError::SentinelCollision("root".to_string()))
        );
        store.insert_raw(raw("c", "b"), &sentinel).unwrap();
        assert_eq!(
            store.depth_first_search_by_stack(),
            vec!["a", "b", "c"]
        );
    }
}
