//! Flat, offset-linked encoding of a [`Trie`].
//!
//! The tree is laid out breadth-first into one contiguous buffer of
//! [`FlatNode`] records. All children of a node form a *sibling run*: a
//! contiguous block of entries in ascending byte order closed by a terminator
//! whose label is [`SENTINEL`](crate::SENTINEL). A node reaches the start of its
//! children's run by adding its `children_offset` to its own index. The root
//! has no entry of its own; its run starts at index 0.
//!
//! ```text
//! keys: "a", "ab", "b"
//!
//! idx  char  leaf  offset
//!  0    a     1      3     -> run at 3
//!  1    b     1     -1
//!  2    END
//!  3    b     1     -1
//!  4    END
//! ```

mod record;

pub use record::{FlatNode, NO_CHILDREN, RECORD_SIZE};

use std::collections::VecDeque;

use crate::tree::{NodeId, Trie};
use crate::{Config, Error, Result};

/// Most entries a flat trie can hold: every index, and so every forward
/// offset, must fit in the `i16` offset field.
pub const MAX_NODES: usize = i16::MAX as usize + 1;

/// Immutable membership set stored as a flat array of [`FlatNode`]s.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FlatTrie {
    nodes: Vec<FlatNode>,
    key_count: usize,
}

impl FlatTrie {
    /// Build the explicit trie for `keys` and flatten it with the default
    /// [`Config`]. The intermediate trie is dropped before returning.
    pub fn build<I, K>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self::build_with_config(keys, &Config::default())
    }

    /// Like [`FlatTrie::build`], flattening under `config`.
    pub fn build_with_config<I, K>(keys: I, config: &Config) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let trie = Trie::build(keys)?;
        Self::from_trie_with_config(&trie, config)
    }

    /// Flatten `trie` with the default [`Config`].
    pub fn from_trie(trie: &Trie) -> Result<Self> {
        Self::from_trie_with_config(trie, &Config::default())
    }

    /// Flatten `trie` breadth-first.
    ///
    /// Fails with [`Error::CapacityExceeded`] if the encoding would need more
    /// than `config.max_nodes` entries (never more than [`MAX_NODES`]).
    pub fn from_trie_with_config(trie: &Trie, config: &Config) -> Result<Self> {
        let limit = config.max_nodes.min(MAX_NODES);
        let reserve = if config.capacity_hint > 0 {
            config.capacity_hint
        } else {
            // One entry per non-root node plus at most one terminator each.
            trie.node_count().saturating_sub(1) * 2
        };
        let mut nodes: Vec<FlatNode> = Vec::with_capacity(reserve.min(limit));

        // (tree node, index of its own flat entry; None for the root)
        let mut queue: VecDeque<(NodeId, Option<usize>)> = VecDeque::new();
        queue.push_back((NodeId::ROOT, None));

        while let Some((id, own)) = queue.pop_front() {
            let children = trie.children(id);
            if children.is_empty() {
                continue;
            }

            if let Some(parent) = own {
                let distance = nodes.len() - parent;
                let offset =
                    i16::try_from(distance).map_err(|_| Error::CapacityExceeded { limit })?;
                nodes[parent].set_children_offset(offset);
            }

            for &(byte, child) in children {
                let entry = FlatNode::new(byte, trie.is_end_of_word(child));
                let index = push(&mut nodes, entry, limit)?;
                queue.push_back((child, Some(index)));
            }
            push(&mut nodes, FlatNode::TERMINATOR, limit)?;
        }

        tracing::debug!(
            keys = trie.len(),
            entries = nodes.len(),
            bytes = nodes.len() * RECORD_SIZE,
            "flattened trie"
        );
        Ok(Self {
            nodes,
            key_count: trie.len(),
        })
    }

    /// Load a flat trie from records produced by [`FlatTrie::nodes`].
    pub fn from_records(nodes: Vec<FlatNode>) -> Result<Self> {
        validate(&nodes)?;
        let key_count = nodes.iter().filter(|n| n.is_leaf()).count();
        Ok(Self { nodes, key_count })
    }

    /// Load a flat trie from the buffer produced by [`FlatTrie::as_bytes`].
    ///
    /// The buffer needs no particular alignment.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(Error::Truncated { len: bytes.len() });
        }
        let nodes = bytes
            .chunks_exact(RECORD_SIZE)
            .map(bytemuck::pod_read_unaligned::<FlatNode>)
            .collect();
        Self::from_records(nodes)
    }

    /// Returns `true` if `key` was one of the keys the trie was built from.
    ///
    /// Every step is bounds-checked, so this never panics, whatever the
    /// records hold.
    pub fn search(&self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }

        let mut current = 0usize;
        for (i, &byte) in key.iter().enumerate() {
            if i != 0 {
                let Some(start) = self
                    .nodes
                    .get(current)
                    .and_then(|n| n.children_start(current))
                else {
                    return false;
                };
                current = start;
            }

            loop {
                let Some(node) = self.nodes.get(current) else {
                    return false;
                };
                if node.is_sentinel() {
                    return false;
                }
                if node.character() == byte {
                    break;
                }
                current += 1;
            }
        }

        self.nodes.get(current).is_some_and(|n| n.is_leaf())
    }

    /// Number of entries, terminators included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the set holds no keys (and so no entries).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of keys in the set.
    pub fn key_count(&self) -> usize {
        self.key_count
    }

    /// The encoded records, in flat order.
    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }

    /// The records as a native-endian byte buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Heap bytes held by the record buffer.
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * RECORD_SIZE
    }

    /// Iterate over all keys in ascending byte order, decoded from the flat
    /// form alone.
    pub fn iter(&self) -> Iter<'_> {
        let stack = if self.nodes.is_empty() { Vec::new() } else { vec![0] };
        Iter {
            nodes: &self.nodes,
            stack,
            prefix: Vec::new(),
        }
    }
}

impl std::fmt::Debug for FlatTrie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatTrie")
            .field("keys", &self.key_count)
            .field("entries", &self.nodes.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a FlatTrie {
    type Item = Vec<u8>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[inline]
fn push(nodes: &mut Vec<FlatNode>, node: FlatNode, limit: usize) -> Result<usize> {
    let index = nodes.len();
    if index >= limit {
        tracing::warn!(limit, "flattened trie exceeds entry limit");
        return Err(Error::CapacityExceeded { limit });
    }
    nodes.push(node);
    Ok(index)
}

fn validate(nodes: &[FlatNode]) -> Result<()> {
    if nodes.len() > MAX_NODES {
        return Err(Error::CapacityExceeded { limit: MAX_NODES });
    }

    for (index, node) in nodes.iter().enumerate() {
        let corrupt = |reason| Err(Error::Corrupt { index, reason });
        if node.leaf_byte() > 1 {
            return corrupt("leaf flag is not 0 or 1");
        }
        if node.is_sentinel() {
            if node.has_children() || node.is_leaf() {
                return corrupt("terminator carries node data");
            }
            continue;
        }
        if node.has_children()
            && !node
                .children_start(index)
                .is_some_and(|start| start < nodes.len())
        {
            return corrupt("children offset out of range");
        }
    }

    match nodes.last() {
        Some(last) if !last.is_sentinel() => {
            return Err(Error::Corrupt {
                index: nodes.len() - 1,
                reason: "sequence does not end with a terminator",
            })
        }
        None => return Ok(()),
        Some(_) => {}
    }

    validate_runs(nodes)
}

/// Checks that the entries split into non-empty ascending sibling runs, each
/// reached from exactly one parent (the root's run from none).
fn validate_runs(nodes: &[FlatNode]) -> Result<()> {
    // Runs start at 0 and right after every terminator but the last.
    let mut run_start = vec![false; nodes.len()];
    run_start[0] = true;
    let mut prev: Option<u8> = None;
    for (index, node) in nodes.iter().enumerate() {
        if node.is_sentinel() {
            if prev.is_none() {
                return Err(Error::Corrupt {
                    index,
                    reason: "empty sibling run",
                });
            }
            prev = None;
            if index + 1 < nodes.len() {
                run_start[index + 1] = true;
            }
            continue;
        }
        if prev.is_some_and(|p| p >= node.character()) {
            return Err(Error::Corrupt {
                index,
                reason: "sibling run is not in ascending order",
            });
        }
        prev = Some(node.character());
    }

    let mut claimed = vec![false; nodes.len()];
    claimed[0] = true;
    for (index, node) in nodes.iter().enumerate() {
        let Some(start) = node.children_start(index) else {
            continue;
        };
        let corrupt = |reason| Err(Error::Corrupt { index, reason });
        if !run_start[start] {
            return corrupt("children offset does not start a sibling run");
        }
        if claimed[start] {
            return corrupt("sibling run has more than one parent");
        }
        claimed[start] = true;
    }

    match run_start.iter().zip(&claimed).position(|(&run, &seen)| run && !seen) {
        Some(index) => Err(Error::Corrupt {
            index,
            reason: "sibling run has no parent",
        }),
        None => Ok(()),
    }
}

/// Depth-first iterator over the keys of a [`FlatTrie`].
pub struct Iter<'a> {
    nodes: &'a [FlatNode],
    /// Next entry to visit in each open sibling run.
    stack: Vec<usize>,
    prefix: Vec<u8>,
}

impl Iterator for Iter<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.stack.last_mut()?;
            let idx = *cursor;
            let Some(&node) = self.nodes.get(idx) else {
                self.stack.clear();
                return None;
            };
            if node.is_sentinel() {
                // Run finished: drop the parent's label.
                self.stack.pop();
                self.prefix.pop();
                continue;
            }
            *cursor += 1;

            self.prefix.push(node.character());
            let key = node.is_leaf().then(|| self.prefix.clone());
            match node.children_start(idx) {
                Some(start) => self.stack.push(start),
                None => {
                    self.prefix.pop();
                }
            }
            if key.is_some() {
                return key;
            }
        }
    }
}
