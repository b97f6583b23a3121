//! Structural invariant checking and a reference model for simulation.
//!
//! The checker walks every node reachable from the root and verifies the
//! structure the tree promises after each completed operation: sorted
//! unique entries, the order-3 branching bounds, and the key-ordering
//! relation between a node and its subtrees. Violations are collected and
//! reported, not panicked on, so a run can show everything that is wrong
//! at once.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::node::{Node, ORDER};
use crate::store::{NodeStore, StoreError};
use crate::tree::Tree;

/// A structural invariant violation found during a tree walk.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violation.
    pub description: String,
    /// Additional context (node identity, offending keys).
    pub context: String,
}

/// Walk the whole tree and collect structural invariant violations.
///
/// Checks every reachable node for:
/// - at most `ORDER - 1` entries, sorted strictly ascending;
/// - a child count of entries + 1 (internal) or 0 (leaf), allowing the
///   one trailing empty child left behind by a root split;
/// - every key lying strictly between the separator keys inherited from
///   the ancestors.
///
/// Returns an empty vector for a structurally sound tree. Store failures
/// abort the walk and propagate.
pub fn check_tree<K, V, S>(tree: &mut Tree<K, V, S>) -> Result<Vec<InvariantViolation>, StoreError>
where
    K: Ord + Clone + Debug,
    V: Clone,
    S: NodeStore<K, V>,
{
    let root = tree.store_mut().root_node()?;
    let mut violations = Vec::new();
    check_node(tree.store_mut(), &root, None, None, &mut violations)?;
    Ok(violations)
}

fn check_node<K, V, S>(
    store: &mut S,
    node: &Node<K, V>,
    lower: Option<&K>,
    upper: Option<&K>,
    violations: &mut Vec<InvariantViolation>,
) -> Result<(), StoreError>
where
    K: Ord + Clone + Debug,
    V: Clone,
    S: NodeStore<K, V>,
{
    let entry_count = node.entries.len();

    if entry_count > ORDER - 1 {
        violations.push(InvariantViolation {
            description: format!("node holds {entry_count} entries, maximum is {}", ORDER - 1),
            context: format!("node {:?}", node.id),
        });
    }

    for pair in node.entries.windows(2) {
        if pair[0].key >= pair[1].key {
            violations.push(InvariantViolation {
                description: "entries out of order".to_string(),
                context: format!(
                    "node {:?}: {:?} precedes {:?}",
                    node.id, pair[0].key, pair[1].key
                ),
            });
        }
    }

    for entry in &node.entries {
        if let Some(lo) = lower {
            if entry.key <= *lo {
                violations.push(InvariantViolation {
                    description: "entry below the subtree's lower bound".to_string(),
                    context: format!("node {:?}: {:?} <= {lo:?}", node.id, entry.key),
                });
            }
        }
        if let Some(hi) = upper {
            if entry.key >= *hi {
                violations.push(InvariantViolation {
                    description: "entry above the subtree's upper bound".to_string(),
                    context: format!("node {:?}: {:?} >= {hi:?}", node.id, entry.key),
                });
            }
        }
    }

    if node.is_leaf() {
        return Ok(());
    }

    let child_count = node.children.len();
    let spare_slot = child_count == entry_count + 2;
    if child_count != entry_count + 1 && !spare_slot {
        violations.push(InvariantViolation {
            description: "child count does not match entry count".to_string(),
            context: format!("node {:?}: {entry_count} entries, {child_count} children", node.id),
        });
        return Ok(());
    }

    for at in 0..=entry_count {
        let child = store.child_node(node, at)?;
        let lo = if at == 0 {
            lower
        } else {
            Some(&node.entries[at - 1].key)
        };
        let hi = if at == entry_count {
            upper
        } else {
            Some(&node.entries[at].key)
        };
        check_node(store, &child, lo, hi, violations)?;
    }

    if spare_slot {
        let spare = store.child_node(node, entry_count + 1)?;
        if !spare.entries.is_empty() || !spare.children.is_empty() {
            violations.push(InvariantViolation {
                description: "trailing spare child is not empty".to_string(),
                context: format!("node {:?}, spare {:?}", node.id, spare.id),
            });
        }
    }

    Ok(())
}

/// Reference model tracking the expected contents of a tree.
///
/// Backed by a sorted map, so lookups and range scans against the model
/// are the ground truth a simulation run compares the tree against.
#[derive(Debug, Default)]
pub struct ModelHistory<K, V> {
    expected: BTreeMap<K, V>,
}

impl<K: Ord + Clone, V: Clone> ModelHistory<K, V> {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expected: BTreeMap::new(),
        }
    }

    /// Record a put; later puts of the same key overwrite.
    pub fn record_put(&mut self, key: K, value: V) {
        self.expected.insert(key, value);
    }

    /// The value the tree should hold for `key`, if any.
    #[must_use]
    pub fn expected_value(&self, key: &K) -> Option<&V> {
        self.expected.get(key)
    }

    /// The `(key, value)` pairs the tree should report for an inclusive
    /// range, in ascending key order. Requires `min <= max`.
    #[must_use]
    pub fn expected_range(&self, min: &K, max: &K) -> Vec<(K, V)> {
        self.expected
            .range(min..=max)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of distinct keys written so far.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.expected.len()
    }
}
