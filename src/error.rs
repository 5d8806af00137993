/// Errors returned while building or loading a trie.
///
/// Lookups never fail; a missing key is just `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An input key contains the byte reserved for terminating sibling runs.
    #[error("key {index} contains the reserved sentinel byte at position {position}")]
    InvalidKey {
        /// Position of the key in the input sequence.
        index: usize,
        /// Byte offset of the sentinel inside the key.
        position: usize,
    },
    /// The flat form would need more entries than its offsets can address.
    #[error("flattened trie exceeds the limit of {limit} entries")]
    CapacityExceeded {
        /// Entry ceiling in effect.
        limit: usize,
    },
    /// A record buffer whose length is not a whole number of records.
    #[error("record buffer of {len} bytes is not a multiple of the record size")]
    Truncated {
        /// Length of the rejected buffer in bytes.
        len: usize,
    },
    /// Loaded records break the flat layout.
    #[error("corrupt record at index {index}: {reason}")]
    Corrupt {
        /// Index of the offending record.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for trie construction and loading.
pub type Result<T> = std::result::Result<T, Error>;
