//! Arena-backed in-memory node store.

#![allow(clippy::cast_possible_truncation)]

use crate::node::{Node, NodeId, ORDER};
use crate::store::{NodeStore, StoreError};

/// In-memory node store.
///
/// Nodes live in a `Vec` arena; a [`NodeId`] is the node's index. The
/// store hands out owned copies on reads and copies content back in on
/// writes, so callers never hold references into the arena.
pub struct MemoryStore<K, V> {
    /// Nodes by identity (index = id).
    nodes: Vec<Node<K, V>>,
    /// Identity of the current root.
    root: NodeId,
}

impl<K: Clone, V: Clone> MemoryStore<K, V> {
    /// Create a store seeded with an empty root node.
    #[must_use]
    pub fn new() -> Self {
        let mut root = Node::new();
        root.id = Some(0);

        Self {
            nodes: vec![root],
            root: 0,
        }
    }

    /// Number of nodes ever allocated, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<K: Clone, V: Clone> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> NodeStore<K, V> for MemoryStore<K, V> {
    fn max_keys(&self) -> usize {
        ORDER
    }

    fn root_node(&mut self) -> Result<Node<K, V>, StoreError> {
        let id = self.root;
        self.nodes
            .get(id as usize)
            .cloned()
            .ok_or(StoreError::MissingNode(id))
    }

    fn write_root_node(&mut self, node: &mut Node<K, V>) -> Result<(), StoreError> {
        let id = match node.id {
            Some(id) => {
                self.write_node(node)?;
                id
            }
            None => self.allocate_node(node)?,
        };
        self.root = id;
        Ok(())
    }

    fn write_node(&mut self, node: &Node<K, V>) -> Result<(), StoreError> {
        let id = node.id.ok_or(StoreError::UnallocatedNode)?;
        let slot = self
            .nodes
            .get_mut(id as usize)
            .ok_or(StoreError::MissingNode(id))?;
        *slot = node.clone();
        Ok(())
    }

    fn write_child_node(
        &mut self,
        parent: &mut Node<K, V>,
        index: usize,
        child: &Node<K, V>,
    ) -> Result<(), StoreError> {
        let child_id = child.id.ok_or(StoreError::UnallocatedNode)?;

        if index < parent.children.len() {
            parent.children[index] = child_id;
        } else if index == parent.children.len() {
            parent.children.push(child_id);
        } else {
            return Err(StoreError::ChildOutOfBounds {
                index,
                children: parent.children.len(),
            });
        }

        self.write_node(child)?;
        self.write_node(parent)
    }

    fn allocate_node(&mut self, node: &mut Node<K, V>) -> Result<NodeId, StoreError> {
        let id = self.nodes.len() as NodeId;
        node.id = Some(id);
        self.nodes.push(node.clone());
        Ok(id)
    }

    fn child_node(&mut self, parent: &Node<K, V>, index: usize) -> Result<Node<K, V>, StoreError> {
        let id = *parent
            .children
            .get(index)
            .ok_or(StoreError::ChildOutOfBounds {
                index,
                children: parent.children.len(),
            })?;
        self.nodes
            .get(id as usize)
            .cloned()
            .ok_or(StoreError::MissingNode(id))
    }
}
