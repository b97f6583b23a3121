//! Ternary (order-3) B-tree.
//!
//! An ordered associative container mapping unique keys to values, backed by
//! a pluggable node store. Every node holds at most 2 keys and 3 children;
//! inserting into a full node splits it and promotes the median key upward,
//! which keeps the tree height logarithmic in the number of entries.
//!
//! # Structure
//!
//! - [`Tree`] orchestrates lookup, insertion (with split propagation and
//!   root splitting) and range traversal.
//! - [`Node`] and [`Entry`] are the structural units: sorted entries plus
//!   child references resolved through the store.
//! - [`NodeStore`] is the storage contract. Two implementations ship with
//!   the crate: [`MemoryStore`] (arena-backed, the default for tests and
//!   transient trees) and [`FileStore`] (single-file, paged, checksummed).
//!
//! Deletion and compaction are not implemented.
//!
//! # Usage
//!
//! ```
//! use terntree::{MemoryStore, Tree, TreeError};
//!
//! # fn main() -> Result<(), TreeError> {
//! let mut tree = Tree::new(MemoryStore::new())?;
//!
//! tree.put(20u32, "twenty".to_string())?;
//! tree.put(10, "ten".to_string())?;
//! tree.put(30, "thirty".to_string())?;
//!
//! let entry = tree.find(&10)?;
//! assert_eq!(entry.map(|e| e.value), Some("ten".to_string()));
//!
//! let range = tree.get_key_range(&10, &20)?;
//! let keys: Vec<u32> = range.iter().map(|e| e.key).collect();
//! assert_eq!(keys, vec![10, 20]);
//! # Ok(())
//! # }
//! ```

pub mod node;
pub mod simulation;
pub mod store;
pub mod tree;

pub use node::{Entry, Node, NodeId, ORDER};
pub use store::codec::{Codec, CodecError};
pub use store::file::FileStore;
pub use store::memory::MemoryStore;
pub use store::{NodeStore, StoreError};
pub use tree::{Tree, TreeError};
