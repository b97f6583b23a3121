//! Ternary B-tree operations over a node store.
//!
//! The tree mutates at most the nodes on the path from root to leaf. An
//! insert that overfills a node splits it and hands the new right sibling
//! back up the call stack as an explicit return value; the caller either
//! absorbs the sibling into its own child sequence or, at the root, builds
//! a new root around it.
//!
//! # Root splits
//!
//! When the root splits, the new root holds exactly the promoted median
//! key and exactly three children: the old root, the new sibling, and a
//! freshly allocated empty third node reserved for the next split at that
//! level. The empty slot rides along at the tail of the child sequence
//! until a later promotion claims its position.

use crate::node::{Entry, Node, ORDER};
use crate::store::{NodeStore, StoreError};

/// A ternary B-tree backed by a node store.
///
/// Holds the in-memory root between operations; all other nodes are
/// re-resolved through the store within each call and discarded. Every
/// operation takes `&mut self`, so one operation runs at a time per tree
/// value; sharing a tree across threads requires external synchronization.
pub struct Tree<K, V, S> {
    store: S,
    root: Node<K, V>,
    order: usize,
}

impl<K, V, S> Tree<K, V, S>
where
    K: Ord + Clone,
    V: Clone,
    S: NodeStore<K, V>,
{
    /// Create a tree over the given store.
    ///
    /// Reads the order and the current root from the store. Fails with
    /// [`TreeError::UnsupportedOrder`] unless the store reports order 3.
    pub fn new(mut store: S) -> Result<Self, TreeError> {
        let order = store.max_keys();
        if order != ORDER {
            return Err(TreeError::UnsupportedOrder { got: order });
        }

        let root = store.root_node()?;
        Ok(Self { store, root, order })
    }

    /// The in-memory root node.
    #[must_use]
    pub fn root(&self) -> &Node<K, V> {
        &self.root
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Insert a key/value pair, or overwrite the value of an existing key.
    ///
    /// Overwrites change no structure. A new key lands in a leaf on the
    /// single root-to-leaf path covering it; any node the insertion
    /// overfills splits before the call returns.
    pub fn put(&mut self, key: K, value: V) -> Result<(), TreeError> {
        let mut root = std::mem::take(&mut self.root);

        let result = match self.insert_into(&mut root, key, value) {
            Ok(Some(sibling)) => match self.split_root(&mut root, sibling) {
                Ok(new_root) => {
                    root = new_root;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };

        self.root = root;
        result
    }

    /// Look up the entry with exactly this key.
    ///
    /// Descends exactly one child per level: the subtree whose bounding
    /// keys straddle the search key. Never mutates the tree.
    pub fn find(&mut self, key: &K) -> Result<Option<Entry<K, V>>, TreeError> {
        let root = std::mem::take(&mut self.root);
        let result = self.search(&root, key);
        self.root = root;
        result
    }

    /// All entries with `min <= key <= max`, in ascending key order.
    ///
    /// Fails with [`TreeError::InvalidRange`] if `min > max`; no partial
    /// result is returned.
    pub fn get_key_range(&mut self, min: &K, max: &K) -> Result<Vec<Entry<K, V>>, TreeError> {
        if min > max {
            return Err(TreeError::InvalidRange);
        }

        let root = self.store.root_node()?;
        let mut entries = Vec::new();
        self.collect_range(&root, min, max, &mut entries)?;
        Ok(entries)
    }

    /// Recursive insert. Returns the new right sibling if `node` split.
    fn insert_into(
        &mut self,
        node: &mut Node<K, V>,
        key: K,
        value: V,
    ) -> Result<Option<Node<K, V>>, TreeError> {
        // Existing key: overwrite in place, no structural change.
        if let Some(at) = node.entry_index(&key) {
            node.entries[at].value = value;
            self.store.write_node(node)?;
            return Ok(None);
        }

        if node.is_leaf() {
            let at = node.upper_bound(&key);
            node.entries.insert(at, Entry::new(key, value));
        } else {
            let at = node.upper_bound(&key);
            let mut child = self.store.child_node(node, at)?;

            if let Some(mut sibling) = self.insert_into(&mut child, key, value)? {
                // The child split: adopt the sibling as the next child and
                // pull the child's middle key up as the separator.
                let sibling_id = self.store.allocate_node(&mut sibling)?;
                node.children.insert(at + 1, sibling_id);

                debug_assert!(child.entries.len() == 2);
                let median = child.entries.remove(1);
                let promoted_at = node.upper_bound(&median.key);
                node.entries.insert(promoted_at, median);

                self.store.write_node(&child)?;
            }
        }

        if node.entries.len() == self.order {
            let sibling = node.split();
            self.store.write_node(node)?;
            tracing::debug!(node = ?node.id, "node split; promoting median to parent");
            Ok(Some(sibling))
        } else {
            self.store.write_node(node)?;
            Ok(None)
        }
    }

    /// Build a new root after the old root split.
    fn split_root(
        &mut self,
        left: &mut Node<K, V>,
        mut right: Node<K, V>,
    ) -> Result<Node<K, V>, TreeError> {
        self.store.allocate_node(&mut right)?;

        let mut third = Node::new();
        self.store.allocate_node(&mut third)?;

        let mut new_root = Node::new();
        new_root.entries.push(left.entries.remove(1));

        self.store.write_root_node(&mut new_root)?;
        self.store.write_child_node(&mut new_root, 0, left)?;
        self.store.write_child_node(&mut new_root, 1, &right)?;
        self.store.write_child_node(&mut new_root, 2, &third)?;

        tracing::debug!(root = ?new_root.id, "root split; tree height increased");
        self.store.root_node().map_err(TreeError::from)
    }

    fn search(&mut self, node: &Node<K, V>, key: &K) -> Result<Option<Entry<K, V>>, TreeError> {
        if let Some(at) = node.entry_index(key) {
            return Ok(Some(node.entries[at].clone()));
        }

        if node.is_leaf() {
            return Ok(None);
        }

        let child = self.store.child_node(node, node.upper_bound(key))?;
        self.search(&child, key)
    }

    /// Bounded in-order walk. Appends matches in ascending key order;
    /// results are concatenated in visit order, never re-sorted.
    fn collect_range(
        &mut self,
        node: &Node<K, V>,
        min: &K,
        max: &K,
        entries: &mut Vec<Entry<K, V>>,
    ) -> Result<(), TreeError> {
        let internal = !node.is_leaf();

        for (at, entry) in node.entries.iter().enumerate() {
            if entry.key >= *min {
                if internal {
                    let child = self.store.child_node(node, at)?;
                    self.collect_range(&child, min, max, entries)?;
                }
                if entry.key <= *max {
                    entries.push(entry.clone());
                }
            }
        }

        // The child past the last entry holds keys greater than all of
        // this node's keys; visit it unless the last key already reached
        // the upper bound.
        if internal {
            if let Some(last) = node.entries.last() {
                if last.key < *max {
                    let child = self.store.child_node(node, node.entries.len())?;
                    self.collect_range(&child, min, max, entries)?;
                }
            }
        }

        Ok(())
    }
}

/// Errors returned by tree operations.
#[derive(Debug)]
pub enum TreeError {
    /// `get_key_range` called with a minimum greater than the maximum.
    InvalidRange,
    /// The store reports an order this implementation does not support.
    UnsupportedOrder { got: usize },
    /// The store failed; propagated unchanged.
    Store(StoreError),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange => write!(f, "range minimum is greater than range maximum"),
            Self::UnsupportedOrder { got } => {
                write!(f, "store reports order {got}, only order {ORDER} is supported")
            }
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for TreeError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::store::memory::MemoryStore;

    fn new_tree() -> Tree<u32, String, MemoryStore<u32, String>> {
        Tree::new(MemoryStore::new()).expect("tree")
    }

    fn put_all(tree: &mut Tree<u32, String, MemoryStore<u32, String>>, keys: &[u32]) {
        for &key in keys {
            tree.put(key, format!("value-{key}")).expect("put");
        }
    }

    fn range_keys(
        tree: &mut Tree<u32, String, MemoryStore<u32, String>>,
        min: u32,
        max: u32,
    ) -> Vec<u32> {
        tree.get_key_range(&min, &max)
            .expect("range")
            .iter()
            .map(|entry| entry.key)
            .collect()
    }

    #[test]
    fn test_put_then_find_roundtrip() {
        let mut tree = new_tree();
        let keys = [10, 20, 5, 15, 25, 30, 1, 7, 3, 40, 35, 2];
        put_all(&mut tree, &keys);

        for &key in &keys {
            let entry = tree.find(&key).expect("find").expect("present");
            assert_eq!(entry.key, key);
            assert_eq!(entry.value, format!("value-{key}"));
        }
    }

    #[test]
    fn test_find_missing_returns_none() {
        let mut tree = new_tree();
        put_all(&mut tree, &[1, 2, 3]);

        assert!(tree.find(&99).expect("find").is_none());
    }

    #[test]
    fn test_empty_tree() {
        let mut tree = new_tree();

        assert!(tree.find(&1).expect("find").is_none());
        assert!(range_keys(&mut tree, 0, 100).is_empty());
    }

    #[test]
    fn test_overwrite_updates_in_place() {
        let mut tree = new_tree();
        put_all(&mut tree, &[10, 20, 5, 15, 25]);

        let nodes_before = tree.store_mut().node_count();
        tree.put(15, "replaced".to_string()).expect("overwrite");

        let entry = tree.find(&15).expect("find").expect("present");
        assert_eq!(entry.value, "replaced");
        // Overwrites never create nodes.
        assert_eq!(tree.store_mut().node_count(), nodes_before);
    }

    #[test]
    fn test_root_split_shape() {
        let mut tree = new_tree();
        put_all(&mut tree, &[1, 2, 3]);

        let root = tree.root().clone();
        assert_eq!(root.entries.len(), 1);
        assert_eq!(root.entries[0].key, 2);
        assert_eq!(root.children.len(), 3);

        let store = tree.store_mut();
        let left = store.child_node(&root, 0).expect("left");
        let right = store.child_node(&root, 1).expect("right");
        let third = store.child_node(&root, 2).expect("third");

        let left_keys: Vec<u32> = left.entries.iter().map(|e| e.key).collect();
        let right_keys: Vec<u32> = right.entries.iter().map(|e| e.key).collect();
        assert_eq!(left_keys, vec![1]);
        assert_eq!(right_keys, vec![3]);
        assert!(third.entries.is_empty());
        assert!(third.is_leaf());
    }

    #[test]
    fn test_larger_scenario_range() {
        let mut tree = new_tree();
        put_all(&mut tree, &[10, 20, 5, 15, 25, 30, 1]);

        assert_eq!(range_keys(&mut tree, 10, 25), vec![10, 15, 20, 25]);
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut tree = new_tree();
        put_all(&mut tree, &[1, 2, 3]);

        let err = tree.get_key_range(&5, &1).expect_err("should fail");
        assert!(matches!(err, TreeError::InvalidRange));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut tree = new_tree();
        put_all(&mut tree, &[10, 20, 30, 40, 50]);

        assert_eq!(range_keys(&mut tree, 20, 40), vec![20, 30, 40]);
        assert_eq!(range_keys(&mut tree, 15, 45), vec![20, 30, 40]);
        assert_eq!(range_keys(&mut tree, 30, 30), vec![30]);
        assert_eq!(range_keys(&mut tree, 51, 99), Vec::<u32>::new());
        assert_eq!(range_keys(&mut tree, 0, 9), Vec::<u32>::new());
    }

    #[test]
    fn test_sequential_inserts_stay_sorted() {
        let mut tree = new_tree();
        let keys: Vec<u32> = (1..=64).collect();
        put_all(&mut tree, &keys);

        assert_eq!(range_keys(&mut tree, 1, 64), keys);

        for &key in &keys {
            assert!(tree.find(&key).expect("find").is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_reverse_inserts_stay_sorted() {
        let mut tree = new_tree();
        let mut keys: Vec<u32> = (1..=64).rev().collect();
        put_all(&mut tree, &keys);

        keys.reverse();
        assert_eq!(range_keys(&mut tree, 0, 100), keys);
    }

    #[test]
    fn test_unsupported_order_rejected() {
        struct WideStore;

        impl NodeStore<u32, String> for WideStore {
            fn max_keys(&self) -> usize {
                5
            }
            fn root_node(&mut self) -> Result<Node<u32, String>, StoreError> {
                Ok(Node::new())
            }
            fn write_root_node(&mut self, _node: &mut Node<u32, String>) -> Result<(), StoreError> {
                Ok(())
            }
            fn write_node(&mut self, _node: &Node<u32, String>) -> Result<(), StoreError> {
                Ok(())
            }
            fn write_child_node(
                &mut self,
                _parent: &mut Node<u32, String>,
                _index: usize,
                _child: &Node<u32, String>,
            ) -> Result<(), StoreError> {
                Ok(())
            }
            fn allocate_node(&mut self, _node: &mut Node<u32, String>) -> Result<NodeId, StoreError> {
                Ok(0)
            }
            fn child_node(
                &mut self,
                _parent: &Node<u32, String>,
                _index: usize,
            ) -> Result<Node<u32, String>, StoreError> {
                Ok(Node::new())
            }
        }

        let err = match Tree::new(WideStore) {
            Ok(_) => panic!("order 5 should be rejected"),
            Err(e) => e,
        };
        assert!(matches!(err, TreeError::UnsupportedOrder { got: 5 }));
    }

    #[test]
    fn test_store_failure_propagates() {
        /// Delegates to a `MemoryStore` but fails writes on demand.
        struct FailingStore {
            inner: MemoryStore<u32, String>,
            fail_writes: bool,
        }

        impl FailingStore {
            fn injected() -> StoreError {
                StoreError::Io(std::io::Error::other("injected write failure"))
            }
        }

        impl NodeStore<u32, String> for FailingStore {
            fn max_keys(&self) -> usize {
                self.inner.max_keys()
            }
            fn root_node(&mut self) -> Result<Node<u32, String>, StoreError> {
                self.inner.root_node()
            }
            fn write_root_node(&mut self, node: &mut Node<u32, String>) -> Result<(), StoreError> {
                if self.fail_writes {
                    return Err(Self::injected());
                }
                self.inner.write_root_node(node)
            }
            fn write_node(&mut self, node: &Node<u32, String>) -> Result<(), StoreError> {
                if self.fail_writes {
                    return Err(Self::injected());
                }
                self.inner.write_node(node)
            }
            fn write_child_node(
                &mut self,
                parent: &mut Node<u32, String>,
                index: usize,
                child: &Node<u32, String>,
            ) -> Result<(), StoreError> {
                if self.fail_writes {
                    return Err(Self::injected());
                }
                self.inner.write_child_node(parent, index, child)
            }
            fn allocate_node(&mut self, node: &mut Node<u32, String>) -> Result<NodeId, StoreError> {
                self.inner.allocate_node(node)
            }
            fn child_node(
                &mut self,
                parent: &Node<u32, String>,
                index: usize,
            ) -> Result<Node<u32, String>, StoreError> {
                self.inner.child_node(parent, index)
            }
        }

        let store = FailingStore {
            inner: MemoryStore::new(),
            fail_writes: false,
        };
        let mut tree = Tree::new(store).expect("tree");
        tree.put(1, "one".to_string()).expect("put");

        tree.store_mut().fail_writes = true;
        let err = tree.put(2, "two".to_string()).expect_err("should fail");
        assert!(matches!(err, TreeError::Store(StoreError::Io(_))));
    }
}
