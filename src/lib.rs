//! # flat-trie
//!
//! Exact-match membership over a fixed set of byte strings, in two stages:
//!
//! 1. [`Trie`] builds an explicit trie from the key set.
//! 2. [`FlatTrie`] lays that trie out breadth-first into one contiguous array
//!    of 4-byte [`FlatNode`] records, linked by bounded `i16` offsets and
//!    sentinel-terminated sibling runs. Lookups walk the array directly.
//!
//! Both forms are immutable once built and answer every query identically.
//!
//! ## Example
//!
//! ```rust
//! use flat_trie::{FlatTrie, Trie};
//!
//! let trie = Trie::build(["cat", "car"]).unwrap();
//! let flat = FlatTrie::from_trie(&trie).unwrap();
//! drop(trie);
//!
//! assert!(flat.search(b"cat"));
//! assert!(flat.search(b"car"));
//! assert!(!flat.search(b"ca"));
//! assert!(!flat.search(b"dog"));
//! ```
//!
//! ## Limits
//!
//! - Keys must not contain [`SENTINEL`] (`b'\n'`); such keys are rejected with
//!   [`Error::InvalidKey`].
//! - The flat form holds at most [`MAX_NODES`] entries, terminators included.
//!   Larger sets fail with [`Error::CapacityExceeded`].
//! - The empty key is never a member.

mod error;
pub mod flat;
pub mod tree;

pub use error::{Error, Result};
pub use flat::{FlatNode, FlatTrie, MAX_NODES, NO_CHILDREN, RECORD_SIZE};
pub use tree::{Trie, MAX_TREE_NODES};

/// Byte reserved for terminating sibling runs in the flat form.
pub const SENTINEL: u8 = b'\n';

/// Configuration for flattening.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity of the record buffer. `0` sizes it from the trie.
    pub capacity_hint: usize,
    /// Most entries the flat form may hold. Clamped to [`MAX_NODES`].
    pub max_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_hint: 0,
            max_nodes: MAX_NODES,
        }
    }
}


#[cfg(test)]
mod proptests;
