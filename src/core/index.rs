// src/core/index.rs
use crate::core::alphabet::Alphabet;
use crate::core::codec::{RecordReader, TrieRecord};
use crate::core::query::{self, ContextWalk, Prediction};
use crate::core::types::{TrieKey, MAX_LAYERS};
use crate::core::words::WordTable;
use crate::error::{PredictorError, Result};
use std::collections::HashMap;
use std::io::Read;

struct Node {
    key: TrieKey,
    /// Child node ids in stored order, which is rank order: the dump wrote
    /// siblings sorted by descending aggregated frequency.
    children: Vec<u32>,
}

/// A read-only prediction index rehydrated from the binary format.
///
/// Immutable after `load`; queries take `&self` and the structure can be
/// shared across concurrent readers without locking.
pub struct PredictionTrie {
    words: WordTable,
    nodes: Vec<Node>,
    /// Fast first-step lookup. Root fan-out is vocabulary-scale, while
    /// deeper nodes stay small after pruning, so only the root gets an
    /// edge map; deeper steps scan the (short) child list.
    root_edges: HashMap<TrieKey, u32>,
}

impl PredictionTrie {
    /// Reconstructs an index from a byte stream. Fails atomically with
    /// `CorruptIndex` on any truncation or inconsistent nesting; no
    /// partially loaded index is ever returned.
    ///
    /// Pass a buffered reader when loading from a file; the word list is
    /// decoded byte by byte.
    pub fn load<R: Read>(input: R) -> Result<Self> {
        let alphabet = Alphabet::default();
        let mut reader = RecordReader::new(input);

        let word_count = reader.read_word_count()?;
        let mut words = WordTable::default();
        for _ in 0..word_count {
            let word = reader.read_word(&alphabet)?;
            words.push_unique(word)?;
        }

        let mut nodes = vec![Node {
            key: TrieKey::literal(0),
            children: Vec::new(),
        }];
        // Explicit (node, depth) stack replaying the depth-first writer.
        let mut stack: Vec<(u32, usize)> = vec![(0, 0)];
        while let Some(record) = reader.read_record()? {
            let Some(&(parent, depth)) = stack.last() else {
                return Err(PredictorError::CorruptIndex(
                    "record after the root list was closed",
                ));
            };
            match record {
                TrieRecord::Return => {
                    stack.pop();
                }
                TrieRecord::Child(key) => {
                    if key.index >= word_count {
                        return Err(PredictorError::CorruptIndex(
                            "word index out of range",
                        ));
                    }
                    let id = nodes.len() as u32;
                    nodes.push(Node { key, children: Vec::new() });
                    nodes[parent as usize].children.push(id);
                    // The writer emits no sibling list for nodes on the
                    // deepest layer.
                    if depth + 1 < MAX_LAYERS {
                        stack.push((id, depth + 1));
                    }
                }
            }
        }
        if !stack.is_empty() {
            return Err(PredictorError::CorruptIndex(
                "unterminated sibling list",
            ));
        }

        let root_edges = nodes[0]
            .children
            .iter()
            .map(|&id| (nodes[id as usize].key, id))
            .collect();

        Ok(Self { words, nodes, root_edges })
    }

    pub fn word_table(&self) -> &WordTable {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Ranked next-word candidates for the given `(literal, stem)` context
    /// pairs, oldest first. Never fails; unknown context words simply
    /// produce fewer (or zero) candidates.
    pub fn fetch(
        &self,
        context: &[(&str, &str)],
        max_results: usize,
        verbose: bool,
    ) -> Vec<Prediction> {
        query::fetch(self, &self.words, context, max_results, verbose)
    }
}

impl ContextWalk for PredictionTrie {
    fn step(&self, node: usize, key: TrieKey) -> Option<usize> {
        if node == 0 {
            return self.root_edges.get(&key).map(|&id| id as usize);
        }
        self.nodes[node]
            .children
            .iter()
            .find(|&&id| self.nodes[id as usize].key == key)
            .map(|&id| id as usize)
    }

    fn completions(&self, node: usize) -> Vec<(TrieKey, u64)> {
        // Stored order is rank order; the format does not persist
        // frequencies.
        self.nodes[node]
            .children
            .iter()
            .map(|&id| (self.nodes[id as usize].key, 0))
            .collect()
    }
}
