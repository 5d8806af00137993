//! Explicit trie built from a fixed key set.
//!
//! Nodes live in a single arena and refer to each other by index. Every node
//! keeps its children sorted by edge byte, so both lookups and the
//! breadth-first flattening in [`crate::flat`] see them in ascending order.

use smallvec::SmallVec;

use crate::{Error, Result, SENTINEL};

/// Largest node index a [`Trie`] arena can address (the root is index 0).
pub const MAX_TREE_NODES: usize = u32::MAX as usize;

/// Index of a node in the trie arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// Fails once the arena outgrows the 32-bit index space.
    #[inline]
    fn new(idx: usize) -> Result<Self> {
        u32::try_from(idx).map(NodeId).map_err(|_| {
            tracing::warn!(nodes = idx, "trie exceeds node index space");
            Error::CapacityExceeded {
                limit: MAX_TREE_NODES,
            }
        })
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Default)]
struct Node {
    /// Sorted by edge byte, at most one entry per byte.
    children: SmallVec<[(u8, NodeId); 4]>,
    is_end_of_word: bool,
}

impl Node {
    #[inline]
    fn child(&self, byte: u8) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.children[i].1)
    }
}

/// A pointer-free trie answering exact-match membership queries.
///
/// The root stands for the empty prefix and is never terminal, so the empty
/// key is never a member.
#[derive(Clone)]
pub struct Trie {
    nodes: Vec<Node>,
    len: usize,
}

impl Trie {
    /// Create a trie holding no keys.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            len: 0,
        }
    }

    /// Build a trie from `keys`.
    ///
    /// Duplicates are ignored. Fails with [`Error::InvalidKey`] if any key
    /// contains [`SENTINEL`], and with [`Error::CapacityExceeded`] if the
    /// keys need node indices beyond [`MAX_TREE_NODES`].
    pub fn build<I, K>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut trie = Self::new();
        for (index, key) in keys.into_iter().enumerate() {
            let key = key.as_ref();
            if let Some(position) = key.iter().position(|&b| b == SENTINEL) {
                tracing::warn!(index, position, "rejecting key containing sentinel byte");
                return Err(Error::InvalidKey { index, position });
            }
            trie.insert(key)?;
        }
        tracing::debug!(
            keys = trie.len,
            nodes = trie.nodes.len(),
            "built trie"
        );
        Ok(trie)
    }

    /// Returns whether the key was not already present.
    fn insert(&mut self, key: &[u8]) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }

        let mut current = NodeId::ROOT;
        for &byte in key {
            let node = &self.nodes[current.index()];
            current = match node.children.binary_search_by_key(&byte, |&(b, _)| b) {
                Ok(i) => node.children[i].1,
                Err(i) => {
                    let child = NodeId::new(self.nodes.len())?;
                    self.nodes.push(Node::default());
                    self.nodes[current.index()].children.insert(i, (byte, child));
                    child
                }
            };
        }

        let end = &mut self.nodes[current.index()].is_end_of_word;
        let added = !*end;
        *end = true;
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// Returns `true` if `key` was one of the keys the trie was built from.
    pub fn search(&self, key: &[u8]) -> bool {
        let mut current = NodeId::ROOT;
        for &byte in key {
            match self.nodes[current.index()].child(byte) {
                Some(child) => current = child,
                None => return false,
            }
        }
        self.nodes[current.index()].is_end_of_word
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no keys were inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap bytes held by the arena.
    pub fn memory_usage(&self) -> usize {
        let spilled: usize = self
            .nodes
            .iter()
            .filter(|n| n.children.spilled())
            .map(|n| n.children.capacity() * std::mem::size_of::<(u8, NodeId)>())
            .sum();
        self.nodes.capacity() * std::mem::size_of::<Node>() + spilled
    }

    /// Iterate over all keys in ascending byte order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            trie: self,
            stack: vec![(NodeId::ROOT, 0)],
            prefix: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn children(&self, id: NodeId) -> &[(u8, NodeId)] {
        &self.nodes[id.index()].children
    }

    #[inline]
    pub(crate) fn is_end_of_word(&self, id: NodeId) -> bool {
        self.nodes[id.index()].is_end_of_word
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Trie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|k| String::from_utf8_lossy(&k).into_owned()))
            .finish()
    }
}

/// Depth-first iterator over the keys of a [`Trie`].
pub struct Iter<'a> {
    trie: &'a Trie,
    /// (node, next child to visit)
    stack: Vec<(NodeId, usize)>,
    prefix: Vec<u8>,
}

impl Iterator for Iter<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let trie = self.trie;
        loop {
            let (id, cursor) = self.stack.last_mut()?;
            let Some(&(byte, child)) = trie.children(*id).get(*cursor) else {
                self.stack.pop();
                self.prefix.pop();
                continue;
            };
            *cursor += 1;

            self.prefix.push(byte);
            self.stack.push((child, 0));
            if trie.is_end_of_word(child) {
                return Some(self.prefix.clone());
            }
        }
    }
}
