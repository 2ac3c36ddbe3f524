//! Compressed radix tree over the name alphabet.
//!
//! Keys arrive pre-encoded as slot sequences (see [`crate::alphabet`]);
//! each node's edge label holds the compressed run between branch points.
//! Insertion distinguishes four structural cases: claiming an empty node,
//! an exact match, descent past a fully matched label, and an edge split
//! at the first differing position. Removal is the inverse: a childless
//! valueless node is unlinked from its parent, and a valueless node left
//! with a single child is absorbed into that child.
//!
//! All routines here are infallible. Validation happens at the cache
//! boundary, before the first structural mutation, so the tree can never
//! be observed in a half-updated state.

use crate::alphabet::{self, ALPHABET_SIZE};
use crate::node::{Arena, Node, NodeId, NIL, NO_SLOT};

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Radix tree mapping encoded names to values.
#[derive(Debug)]
pub(crate) struct RadixTree {
    arena: Arena,
    root: NodeId,
}

impl RadixTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc();
        Self { arena, root }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn value(&self, id: NodeId) -> &str {
        &self.arena[id].value
    }

    /// Insert or update `key`, returning the node that received `value`.
    pub fn insert(&mut self, key: &[u8], value: &str) -> NodeId {
        debug_assert!(!key.is_empty() && !value.is_empty());
        let root = self.root;
        self.update_node(root, key, 0, value)
    }

    fn update_node(&mut self, id: NodeId, key: &[u8], pos: usize, value: &str) -> NodeId {
        let node = &self.arena[id];
        if node.has_label() {
            let prefix = common_prefix_len(&key[pos..], &node.label);
            let label_len = node.label.len();
            if prefix == label_len {
                if prefix == key.len() - pos {
                    // the whole remaining key matched this edge
                    self.arena[id].value = value.to_owned();
                    id
                } else {
                    self.insert_child(id, key, pos + prefix, value)
                }
            } else {
                // first difference inside the label, possibly at its start
                self.split(id, key, pos + prefix, value, prefix)
            }
        } else if !node.has_value() && !node.has_children() {
            // empty node, claim the rest of the key
            let node = &mut self.arena[id];
            node.label = key[pos..].to_vec();
            node.value = value.to_owned();
            id
        } else {
            self.insert_child(id, key, pos, value)
        }
    }

    /// Descend into the child slot for `key[pos]`, creating it if absent.
    fn insert_child(&mut self, id: NodeId, key: &[u8], pos: usize, value: &str) -> NodeId {
        let slot = key[pos] as usize;
        let pos = pos + 1;

        let child = match self.arena[id].children[slot] {
            NIL => {
                let child = self.arena.alloc();
                self.arena[child].parent = id;
                self.arena[child].parent_slot = slot;
                let node = &mut self.arena[id];
                node.children[slot] = child;
                node.child_count += 1;
                if slot < node.first_child {
                    node.first_child = slot;
                }
                child
            }
            child => child,
        };

        if pos == key.len() && !self.arena[child].has_label() {
            // the indexing symbol consumed the last position
            self.arena[child].value = value.to_owned();
            child
        } else {
            self.update_node(child, key, pos, value)
        }
    }

    /// Split the edge into `id` after `prefix_len` matched symbols: a new
    /// node takes the common prefix and `id` is demoted beneath it, keyed
    /// by the symbol at the split point. `pos` is already advanced past
    /// the prefix.
    fn split(&mut self, id: NodeId, key: &[u8], pos: usize, value: &str, prefix_len: usize) -> NodeId {
        let mid = self.arena.alloc();

        let label = std::mem::take(&mut self.arena[id].label);
        let branch_slot = label[prefix_len] as usize;
        self.arena[id].label = label[prefix_len + 1..].to_vec();

        let parent = self.arena[id].parent;
        let parent_slot = self.arena[id].parent_slot;

        {
            let node = &mut self.arena[mid];
            node.label = label[..prefix_len].to_vec();
            if pos == key.len() {
                // the inserted key ends exactly at the split point
                node.value = value.to_owned();
            }
            node.parent = parent;
            node.parent_slot = parent_slot;
            node.children[branch_slot] = id;
            node.child_count = 1;
            node.first_child = branch_slot;
        }

        if parent != NIL {
            self.arena[parent].children[parent_slot] = mid;
        } else {
            self.root = mid;
        }
        self.arena[id].parent = mid;
        self.arena[id].parent_slot = branch_slot;

        if pos == key.len() {
            mid
        } else {
            self.insert_child(mid, key, pos, value)
        }
    }

    /// Walk the tree for `key`. `Some` is returned for the node where the
    /// key ends, whether or not it holds a value.
    pub fn lookup(&self, key: &[u8]) -> Option<NodeId> {
        let mut id = self.root;
        let mut pos = 0;
        loop {
            let node = &self.arena[id];
            if pos == key.len() && !node.has_label() {
                return Some(id);
            }
            if node.has_label() {
                let prefix = common_prefix_len(&key[pos..], &node.label);
                if prefix < node.label.len() {
                    return None;
                }
                if prefix == key.len() - pos {
                    return Some(id);
                }
                pos += prefix;
            }
            let child = node.children[key[pos] as usize];
            if child == NIL {
                return None;
            }
            pos += 1;
            id = child;
        }
    }

    /// Clear the value at `id` and compact the surrounding structure.
    ///
    /// The node must hold a value; recency-list bookkeeping is the
    /// caller's job.
    pub fn remove(&mut self, id: NodeId) {
        debug_assert!(self.arena[id].has_value());
        self.arena[id].value.clear();
        if !self.arena[id].has_children() {
            self.arena[id].label.clear();
        }

        let mut working = id;
        let mut slot = 0;
        if self.arena[working].parent != NIL {
            slot = self.arena[working].parent_slot;

            // a childless valueless node serves no purpose: unlink it
            if !self.arena[working].has_children() {
                let parent = self.arena[working].parent;
                self.arena[parent].children[slot] = NIL;
                self.arena[parent].child_count -= 1;
                if self.arena[parent].first_child == slot {
                    self.arena[parent].first_child = self.rescan_first_child(parent, slot);
                }
                self.arena.free(working);
                working = parent;
                if self.arena[working].parent != NIL {
                    slot = self.arena[working].parent_slot;
                }
            }
        }

        self.merge_single_child(working, slot);
    }

    /// The emptied slot was the memoized minimum, so the next occupied
    /// slot can only be at or after it.
    fn rescan_first_child(&self, id: NodeId, from: usize) -> usize {
        let node = &self.arena[id];
        (from..ALPHABET_SIZE)
            .find(|&slot| node.children[slot] != NIL)
            .unwrap_or(NO_SLOT)
    }

    /// Absorb the sole child of a valueless node into that child. `slot`
    /// is the position of `id` in its own parent; unused when `id` is the
    /// root.
    fn merge_single_child(&mut self, id: NodeId, slot: usize) {
        if self.arena[id].child_count != 1 || self.arena[id].has_value() {
            return;
        }

        let child_slot = self.arena[id].first_child;
        let child = self.arena[id].children[child_slot];

        // child label = absorbed label + branch symbol + child label
        let mut label = std::mem::take(&mut self.arena[id].label);
        label.push(child_slot as u8);
        label.extend_from_slice(&self.arena[child].label);
        self.arena[child].label = label;

        let parent = self.arena[id].parent;
        self.arena[child].parent = parent;
        if parent != NIL {
            self.arena[child].parent_slot = slot;
            self.arena[parent].children[slot] = child;
        } else {
            self.arena[child].parent_slot = 0;
            self.root = child;
        }
        self.arena.free(id);
    }

    /// Rebuild the complete key for a node by walking parent links.
    pub fn full_key(&self, id: NodeId) -> String {
        let mut slots = Vec::new();
        self.collect_key(id, &mut slots);
        alphabet::decode(&slots)
    }

    fn collect_key(&self, id: NodeId, out: &mut Vec<u8>) {
        let node = &self.arena[id];
        if node.parent != NIL {
            self.collect_key(node.parent, out);
            out.push(node.parent_slot as u8);
        }
        out.extend_from_slice(&node.label);
    }

    /// Render the structure, one indented line per edge label, branch
    /// symbol and terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_node(self.root, String::new(), 1, &mut out);
        out
    }

    fn render_node(&self, id: NodeId, mut name: String, depth: usize, out: &mut String) {
        use std::fmt::Write;

        let node = &self.arena[id];
        if node.has_label() {
            let label = alphabet::decode(&node.label);
            let _ = writeln!(out, "{}{}", "\t".repeat(depth), label);
            name.push_str(&label);
        }
        if node.has_value() {
            let _ = writeln!(out, "{}{}:{}", "\t".repeat(depth), name, node.value);
        }
        for slot in 0..ALPHABET_SIZE {
            let child = node.children[slot];
            if child != NIL {
                let symbol = alphabet::symbol_of(slot);
                let _ = writeln!(out, "{}{}", "\t".repeat(depth + 1), symbol);
                let mut child_name = name.clone();
                child_name.push(symbol);
                self.render_node(child, child_name, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
impl RadixTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// All stored `(name, value)` pairs, in slot order.
    pub fn collect_entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut slots = Vec::new();
        self.collect_from(self.root, &mut slots, &mut out);
        out
    }

    fn collect_from(&self, id: NodeId, slots: &mut Vec<u8>, out: &mut Vec<(String, String)>) {
        let node = &self.arena[id];
        slots.extend_from_slice(&node.label);
        if node.has_value() {
            out.push((alphabet::decode(slots), node.value.clone()));
        }
        for slot in 0..ALPHABET_SIZE {
            let child = node.children[slot];
            if child != NIL {
                slots.push(slot as u8);
                self.collect_from(child, slots, out);
                slots.pop();
            }
        }
        slots.truncate(slots.len() - node.label.len());
    }

    /// Ids of all nodes currently holding a value.
    pub fn valued_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            if node.has_value() {
                out.push(id);
            }
            stack.extend(node.children.iter().copied().filter(|&c| c != NIL));
        }
        out
    }

    /// Assert every structural invariant of the tree.
    pub fn check_invariants(&self) {
        let mut reachable = 0;
        self.check_node(self.root, &mut reachable);
        assert_eq!(reachable, self.arena.len(), "arena holds orphan nodes");
    }

    fn check_node(&self, id: NodeId, reachable: &mut usize) {
        *reachable += 1;
        let node = &self.arena[id];

        let occupied = node.children.iter().filter(|&&c| c != NIL).count();
        assert_eq!(node.child_count, occupied, "stale child_count at {id}");
        let first = node
            .children
            .iter()
            .position(|&c| c != NIL)
            .unwrap_or(NO_SLOT);
        assert_eq!(node.first_child, first, "stale first_child at {id}");

        if id == self.root {
            assert_eq!(node.parent, NIL);
            // a valueless root with a single child would have been merged
            assert!(node.has_value() || occupied != 1, "uncompacted root");
        } else {
            assert_eq!(self.arena[node.parent].children[node.parent_slot], id);
            assert!(
                node.has_value() || occupied >= 2,
                "valueless unary chain at {id}"
            );
        }

        for slot in 0..ALPHABET_SIZE {
            let child = node.children[slot];
            if child != NIL {
                assert_eq!(self.arena[child].parent, id);
                assert_eq!(self.arena[child].parent_slot, slot);
                self.check_node(child, reachable);
            }
        }
    }
}
