use proptest::prelude::*;
use similar_asserts::assert_eq;

use super::{
    AdjacencyMatrix, BinarySearchTree, ClassicTree, NodeStore, Record, StackOrder, TreeConfig,
    TreeError, TreeStore,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

//                 g
//               /   \
//             c       i
//            / \     / \
//           b   e   h   j
//          /   / \       \
//         a   d   f       k
const EDGES: [(char, char); 10] = [
    ('c', 'g'),
    ('i', 'g'),
    ('b', 'c'),
    ('e', 'c'),
    ('a', 'b'),
    ('d', 'e'),
    ('f', 'e'),
    ('h', 'i'),
    ('j', 'i'),
    ('k', 'j'),
];

fn classic(config: TreeConfig) -> ClassicTree<char> {
    let mut tree = ClassicTree::with_config('g', (), config);
    for (id, parent) in EDGES {
        tree.insert(id, (), &parent).unwrap();
    }
    tree
}

fn flat() -> TreeStore<char> {
    TreeStore::new(
        std::iter::once(Record::root('g', ()))
            .chain(EDGES.into_iter().map(|(id, parent)| Record::child(id, parent, ()))),
    )
    .unwrap()
}

fn binary() -> BinarySearchTree<char> {
    let mut tree = BinarySearchTree::new('g');
    for c in "cbaedfihjk".chars() {
        tree.insert(c).unwrap();
    }
    tree
}

fn text(path: Vec<&char>) -> String {
    path.into_iter().collect()
}

#[test]
fn stack_dfs_visits_right_to_left() {
    init();
    let tree = classic(TreeConfig::default());
    assert_eq!(text(tree.depth_first_search_by_stack()), "gijkhcefdba");
    assert_eq!(text(tree.breadth_first_search()), "gcibehjadfk");

    assert_eq!(text(flat().depth_first_search_by_stack()), "gijkhcefdba");
    assert_eq!(text(binary().depth_first_search_by_stack()), "gijkhcefdba");
}

#[test]
fn stack_dfs_left_to_right_is_preorder() {
    let tree = classic(TreeConfig::default().with_stack_order(StackOrder::LeftToRight));
    assert_eq!(text(tree.depth_first_search_by_stack()), "gcbaedfihjk");
    assert_eq!(tree.depth_first_search_by_stack(), tree.pre_order());
}

#[test]
fn all_variants_agree_on_the_same_shape() {
    let classic = classic(TreeConfig::default());
    let flat = flat();
    let binary = binary();

    assert_eq!(classic.breadth_first_search(), flat.breadth_first_search());
    assert_eq!(classic.breadth_first_search(), binary.breadth_first_search());
    assert_eq!(classic.pre_order(), binary.pre_order());
    assert_eq!(classic.adjacency_matrix(), flat.adjacency_matrix());
    assert_eq!(classic.adjacency_matrix(), binary.adjacency_matrix());
}

#[test]
fn adjacency_traversals_match_owned_walks() {
    let tree = classic(TreeConfig::default());
    let matrix = tree.adjacency_matrix();
    assert_eq!(matrix.breadth_first_search(), tree.breadth_first_search());
    assert_eq!(
        matrix.depth_first_search_by_stack(StackOrder::RightToLeft),
        tree.depth_first_search_by_stack()
    );
    assert_eq!(
        matrix.depth_first_search_by_stack(StackOrder::LeftToRight),
        tree.pre_order()
    );
}

#[test]
fn matrix_is_rebuilt_after_insert() {
    init();
    let mut tree = classic(TreeConfig::default());
    assert_eq!(tree.adjacency_matrix().len(), 11);
    assert!(!tree.contains(&'z'));

    tree.insert('z', (), &'k').unwrap();
    assert!(tree.contains(&'z'));
    assert_eq!(tree.adjacency_matrix().len(), 12);
    assert_eq!(tree.children_by_adjacency(&'k').unwrap(), vec![&'z']);

    // A failed insert keeps the cached matrix.
    let cached: *const AdjacencyMatrix<char> = tree.adjacency_matrix();
    assert_eq!(
        tree.insert('y', (), &'x'),
        Err(TreeError::MissingParent('x'))
    );
    assert!(std::ptr::eq(cached, tree.adjacency_matrix()));
}

#[test]
fn ancestor_chains_reach_the_root() {
    let tree = flat();
    for id in "abcdefghijk".chars() {
        let chain = tree.ancestors(&id).unwrap();
        let mut walked = vec![];
        let mut current = id;
        while let Some(parent) = tree.ancestors(&current).unwrap().first() {
            walked.push(parent.id);
            current = parent.id;
        }
        assert_eq!(chain.iter().map(|r| r.id).collect::<Vec<_>>(), walked);
        if id != 'g' {
            assert_eq!(walked.last(), Some(&'g'));
        }
    }
}

#[test]
fn reads_are_idempotent() {
    let tree = classic(TreeConfig::default());
    assert_eq!(tree.breadth_first_search(), tree.breadth_first_search());
    assert_eq!(tree.subtree(&'c'), tree.subtree(&'c'));
    assert_eq!(tree.ancestors(&'k'), tree.ancestors(&'k'));
    assert_eq!(
        tree.adjacency_matrix().clone(),
        *tree.adjacency_matrix()
    );
}

#[test]
fn get_all_by_stack_follows_stack_order() {
    let tree = flat();
    assert_eq!(
        tree.get_all_by_stack()
            .into_iter()
            .map(|r| r.id)
            .collect::<String>(),
        "gijkhcefdba"
    );
}

#[test]
fn debug_draw() {
    let tree = classic(TreeConfig::default());
    let drawing = tree.debug_draw(|n| n.id.to_string());
    insta::assert_snapshot!(drawing.trim_end(), @r"
    g
    ├── c
    │   ├── b
    │   │   └── a
    │   └── e
    │       ├── d
    │       └── f
    └── i
        ├── h
        └── j
            └── k
    ");
}

#[test]
fn error_messages() {
    assert_eq!(
        TreeError::MissingParent(10).to_string(),
        "Missing parent: no node with id 10"
    );
    assert_eq!(
        TreeError::<u8>::MissingRoot.to_string(),
        "Missing root: no record points at the root sentinel"
    );
    assert_eq!(
        TreeError::SentinelCollision("root").to_string(),
        "Record id \"root\" collides with the root sentinel"
    );
}

/// Random shapes: the i-th node (id i + 1) hangs below one of the nodes before it.
fn random_parents() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<prop::sample::Index>(), 0..64).prop_map(|picks| {
        picks
            .into_iter()
            .enumerate()
            .map(|(i, pick)| pick.index(i + 1))
            .collect()
    })
}

proptest! {
    #[test]
    fn binary_in_order_is_strictly_ascending(values in prop::collection::vec(any::<i16>(), 0..128)) {
        let mut tree = BinarySearchTree::new(0i16);
        for v in values {
            let _ = tree.insert(v);
        }
        let sorted = tree.in_order();
        prop_assert!(sorted.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(tree.pre_order().len(), tree.n_nodes());
        prop_assert_eq!(tree.post_order().len(), tree.n_nodes());
        prop_assert_eq!(sorted.len(), tree.n_nodes());
    }

    #[test]
    fn binary_matrix_bfs_matches(values in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut tree = BinarySearchTree::new(128u8);
        for v in values {
            let _ = tree.insert(v);
        }
        let matrix = tree.adjacency_matrix();
        prop_assert_eq!(matrix.breadth_first_search(), tree.breadth_first_search());
        prop_assert_eq!(matrix.len(), tree.n_nodes());
    }

    #[test]
    fn classic_and_flat_agree(parents in random_parents()) {
        let mut classic = ClassicTree::new(0usize, ());
        let mut records = vec![Record::root(0usize, ())];
        for (i, &parent) in parents.iter().enumerate() {
            classic.insert(i + 1, (), &parent).unwrap();
            records.push(Record::child(i + 1, parent, ()));
        }
        let flat = TreeStore::new(records).unwrap();

        prop_assert_eq!(classic.breadth_first_search(), flat.breadth_first_search());
        prop_assert_eq!(classic.depth_first_search_by_stack(), flat.depth_first_search_by_stack());
        prop_assert_eq!(
            classic.adjacency_matrix().breadth_first_search(),
            flat.breadth_first_search()
        );
        prop_assert_eq!(flat.nodes().n_nodes(), parents.len() + 1);

        for id in 0..=parents.len() {
            let chain: Vec<usize> = flat.ancestors(&id).unwrap().into_iter().map(|r| r.id).collect();
            let classic_chain: Vec<usize> = classic.ancestors(&id).unwrap().into_iter().map(|n| n.id).collect();
            prop_assert_eq!(&chain, &classic_chain);
            prop_assert!(chain.len() <= parents.len());
            prop_assert_eq!(chain.last().copied().unwrap_or(0), 0);

            let subtree = flat.subtree(&id).unwrap();
            prop_assert!(subtree.iter().all(|r| flat
                .ancestors(&r.id)
                .unwrap()
                .iter()
                .any(|a| a.id == id)));
        }
    }
}
