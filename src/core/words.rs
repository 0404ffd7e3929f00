// src/core/words.rs
use crate::core::types::WordIndex;
use crate::error::{PredictorError, Result};
use std::collections::HashMap;

/// Bidirectional interning of word strings to dense 0-based indices,
/// assigned in insertion order.
///
/// Invariant: indices are contiguous and bijective with the word set for
/// the lifetime of one trie instance. Re-numbering only ever happens by
/// building a fresh table (the dump path does this after pruning).
#[derive(Debug, Clone, Default)]
pub struct WordTable {
    words: Vec<String>,
    index: HashMap<String, WordIndex>,
}

impl WordTable {
    /// Builds a table from an iterable of words, first occurrence winning.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for word in words {
            table.intern(word.into());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn word_to_index(&self, word: &str) -> Result<WordIndex> {
        self.index
            .get(word)
            .copied()
            .ok_or_else(|| PredictorError::UnknownWord(word.to_string()))
    }

    pub fn index_to_word(&self, index: WordIndex) -> Result<&str> {
        self.words
            .get(index as usize)
            .map(String::as_str)
            .ok_or(PredictorError::UnknownWordIndex(index))
    }

    /// Interns a word, returning its index. Existing words keep theirs.
    pub(crate) fn intern(&mut self, word: String) -> WordIndex {
        if let Some(&index) = self.index.get(&word) {
            return index;
        }
        let index = self.words.len() as WordIndex;
        self.index.insert(word.clone(), index);
        self.words.push(word);
        index
    }

    /// Appends a word that must not be present yet. Used when rebuilding a
    /// table from a dumped stream, where a duplicate means the stream is
    /// corrupt rather than merely redundant.
    pub(crate) fn push_unique(&mut self, word: String) -> Result<WordIndex> {
        if self.index.contains_key(&word) {
            return Err(PredictorError::CorruptIndex(
                "duplicate word in word list",
            ));
        }
        Ok(self.intern(word))
    }
}
