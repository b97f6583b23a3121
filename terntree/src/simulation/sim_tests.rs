//! End-to-end simulation runs against the reference model.

use crate::simulation::{ModelHistory, Op, OpGenConfig, OpGenerator, SimConfig, check_tree};
use crate::store::NodeStore;
use crate::store::file::FileStore;
use crate::store::memory::MemoryStore;
use crate::tree::Tree;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drive a tree through a seeded operation stream, comparing every read
/// against the model and checking structural invariants periodically.
fn run_simulation<S: NodeStore<u32, String>>(
    tree: &mut Tree<u32, String, S>,
    seed: u64,
    operations: usize,
    key_space: u32,
) {
    let config = OpGenConfig {
        key_space,
        ..OpGenConfig::default()
    };
    let mut generator = OpGenerator::with_config(seed, config);
    let mut model = ModelHistory::new();

    for step in 0..operations {
        match generator.next_op() {
            Op::Put { key, value } => {
                tree.put(key, value.clone()).expect("put");
                model.record_put(key, value);
            }
            Op::Find { key } => {
                let found = tree.find(&key).expect("find").map(|entry| entry.value);
                assert_eq!(
                    found.as_ref(),
                    model.expected_value(&key),
                    "find mismatch for key {key} at step {step}"
                );
            }
            Op::Range { min, max } => {
                let found: Vec<(u32, String)> = tree
                    .get_key_range(&min, &max)
                    .expect("range")
                    .into_iter()
                    .map(|entry| (entry.key, entry.value))
                    .collect();
                assert_eq!(
                    found,
                    model.expected_range(&min, &max),
                    "range mismatch for [{min}, {max}] at step {step}"
                );
            }
        }

        if step % 512 == 0 {
            let violations = check_tree(tree).expect("invariant walk");
            assert!(
                violations.is_empty(),
                "invariant violations at step {step}: {violations:?}"
            );
        }
    }

    let violations = check_tree(tree).expect("invariant walk");
    assert!(
        violations.is_empty(),
        "invariant violations after run: {violations:?}"
    );

    // Everything the model holds must still be readable.
    for (key, value) in model.expected_range(&0, &u32::MAX) {
        let entry = tree.find(&key).expect("find").expect("present");
        assert_eq!(entry.value, value, "stale value for key {key}");
    }

    tracing::debug!(keys = model.key_count(), "simulation run complete");
}

#[test]
fn test_simulation_matches_model() {
    init_logging();
    let config = SimConfig::from_env().expect("sim config");

    let mut tree = Tree::new(MemoryStore::new()).expect("tree");
    run_simulation(&mut tree, config.seed, config.operations, config.key_space);
}

#[test]
fn test_simulation_second_seed() {
    init_logging();

    let mut tree = Tree::new(MemoryStore::new()).expect("tree");
    run_simulation(&mut tree, 0xDECAF, 2000, 64);
}

#[test]
fn test_simulation_on_file_store() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sim.db");

    let store = FileStore::create(&path).expect("create");
    let mut tree = Tree::new(store).expect("tree");
    run_simulation(&mut tree, 31337, 1000, 128);
    tree.store_mut().sync().expect("sync");
}
