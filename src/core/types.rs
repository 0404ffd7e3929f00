// src/core/types.rs

/// A dense index into the word table.
pub type WordIndex = u32;

/// Context window depth, including the predicted leaf word. An n-gram path
/// through the trie is at most this many edges long.
pub const MAX_LAYERS: usize = 4;

/// Width of the word index field inside a 3-byte trie record.
pub const WORD_INDEX_BITS: u32 = 22;

/// Largest representable word index. The two remaining bits of the 24-bit
/// record carry the stem and return markers.
pub const MAX_WORD_INDEX: u32 = (1 << WORD_INDEX_BITS) - 1;

/// Set on a record whose edge was taken through the canonical stem of a
/// word rather than its literal form.
pub const STEM_MARKER: u32 = 1 << 22;

/// The zero-payload record that closes a sibling list during depth-first
/// serialization.
pub const RETURN_MARKER: u32 = 1 << 23;

/// One edge label in the trie. Stem edges and literal edges to the same
/// word index are distinct entries and never merge, including their
/// frequency accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrieKey {
    pub index: WordIndex,
    pub is_stem: bool,
}

impl TrieKey {
    pub fn literal(index: WordIndex) -> Self {
        Self { index, is_stem: false }
    }

    pub fn stem(index: WordIndex) -> Self {
        Self { index, is_stem: true }
    }
}
