//! Fixed-size record stored in the flat sequence.

use bytemuck::{Pod, Zeroable};

use crate::SENTINEL;

/// `children_offset` of an entry without children.
pub const NO_CHILDREN: i16 = -1;

/// Size in bytes of one [`FlatNode`].
pub const RECORD_SIZE: usize = std::mem::size_of::<FlatNode>();

/// One entry in a [`FlatTrie`](crate::FlatTrie).
///
/// Layout (4 bytes, no padding, native endian):
/// - `children_offset: i16`: forward distance to the first child, or `-1`
/// - `character: u8`: edge label, or [`SENTINEL`] for a run terminator
/// - `is_leaf: u8`: `1` if a key ends here, else `0`
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct FlatNode {
    children_offset: i16,
    character: u8,
    is_leaf: u8,
}

impl FlatNode {
    /// Terminator closing a sibling run.
    pub const TERMINATOR: FlatNode = FlatNode {
        children_offset: NO_CHILDREN,
        character: SENTINEL,
        is_leaf: 0,
    };

    #[inline]
    pub(crate) fn new(character: u8, is_leaf: bool) -> Self {
        Self {
            children_offset: NO_CHILDREN,
            character,
            is_leaf: u8::from(is_leaf),
        }
    }

    /// Edge label, [`SENTINEL`] for a terminator.
    #[inline]
    pub fn character(self) -> u8 {
        self.character
    }

    /// Whether a key ends at this entry.
    #[inline]
    pub fn is_leaf(self) -> bool {
        self.is_leaf != 0
    }

    /// Whether this entry closes a sibling run.
    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.character == SENTINEL
    }

    /// Raw offset field; [`NO_CHILDREN`] when there are none.
    #[inline]
    pub fn children_offset(self) -> i16 {
        self.children_offset
    }

    #[inline]
    pub fn has_children(self) -> bool {
        self.children_offset != NO_CHILDREN
    }

    /// Index of the first child, given this entry's own index.
    #[inline]
    pub(crate) fn children_start(self, own: usize) -> Option<usize> {
        usize::try_from(self.children_offset)
            .ok()
            .filter(|&d| d > 0)
            .map(|d| own + d)
    }

    #[inline]
    pub(crate) fn set_children_offset(&mut self, offset: i16) {
        debug_assert_eq!(self.children_offset, NO_CHILDREN, "offset is set once");
        self.children_offset = offset;
    }

    /// Raw leaf byte, for layout validation.
    #[inline]
    pub(crate) fn leaf_byte(self) -> u8 {
        self.is_leaf
    }
}

impl std::fmt::Debug for FlatNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_sentinel() {
            return f.write_str("FlatNode(END)");
        }
        f.debug_struct("FlatNode")
            .field("character", &char::from(self.character))
            .field("is_leaf", &self.is_leaf())
            .field("children_offset", &self.children_offset)
            .finish()
    }
}
