// src/core/trie.rs
use crate::core::alphabet::Alphabet;
use crate::core::codec::RecordWriter;
use crate::core::query::{self, ContextWalk, Prediction};
use crate::core::types::{TrieKey, WordIndex, MAX_LAYERS, MAX_WORD_INDEX};
use crate::core::words::WordTable;
use crate::error::{PredictorError, Result};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;

const ROOT: usize = 0;

struct BuildNode {
    /// Own increment count while building; aggregated subtree count after
    /// the rollup pass of `dump`.
    freq: u64,
    children: HashMap<TrieKey, usize>,
}

impl BuildNode {
    fn new() -> Self {
        Self { freq: 0, children: HashMap::new() }
    }
}

/// The mutable, in-memory n-gram trie the build pipeline feeds.
///
/// Nodes live in a flat arena with node 0 as the root; edges are
/// `(is_stem, word index)` pairs. Depth is bounded by `MAX_LAYERS`, so a
/// single `add` touches at most `MAX_LAYERS * (MAX_LAYERS - 1) / 2` nodes.
///
/// Single-owner during the build phase; `dump` prunes destructively and
/// the builder is not meant to receive further `add` calls afterwards.
/// The stem map is borrowed read-only and consulted by `add` alone.
pub struct TrieBuilder<'a> {
    words: WordTable,
    stems: &'a HashMap<String, String>,
    nodes: Vec<BuildNode>,
    pruned: bool,
}

impl<'a> TrieBuilder<'a> {
    /// Creates a builder over the allowed vocabulary. Stem-map values not
    /// already in the vocabulary are appended (sorted, so the numbering is
    /// deterministic regardless of map iteration order).
    pub fn new<I, S>(allowed_words: I, stems: &'a HashMap<String, String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = WordTable::new(allowed_words);
        let missing: BTreeSet<&String> = stems
            .values()
            .filter(|stem| !words.contains(stem.as_str()))
            .collect();
        for stem in missing {
            words.intern(stem.clone());
        }
        Self {
            words,
            stems,
            nodes: vec![BuildNode::new()],
            pruned: false,
        }
    }

    pub fn word_table(&self) -> &WordTable {
        &self.words
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Records one sliding n-gram window (oldest word first).
    ///
    /// Never fails: windows shorter than 2 or longer than `MAX_LAYERS`
    /// words, an unknown final word, or any unresolvable context word make
    /// the whole call a no-op. Corpus noise is expected here.
    ///
    /// Every suffix of the window is inserted as its own context path, so
    /// queries with less lookback than the full window still get recall.
    pub fn add<S: AsRef<str>>(&mut self, window: &[S]) {
        if window.len() < 2 || window.len() > MAX_LAYERS {
            return;
        }
        let last = window[window.len() - 1].as_ref();
        if !self.words.contains(last) {
            return;
        }
        let keys: Vec<TrieKey> = match window
            .iter()
            .map(|word| self.resolve(word.as_ref()))
            .collect()
        {
            Some(keys) => keys,
            None => return,
        };

        for start in 0..keys.len() - 1 {
            let mut node = ROOT;
            for &key in &keys[start..] {
                node = self.child_or_insert(node, key);
            }
            self.nodes[node].freq += 1;
        }
    }

    /// Maps a word to its single trie key: through the stem when a real
    /// normalization exists, literally otherwise. `None` if neither path
    /// reaches the word table.
    fn resolve(&self, word: &str) -> Option<TrieKey> {
        if let Some(stem) = self.stems.get(word) {
            if stem != word {
                // Stem values are interned at construction time.
                return self.words.word_to_index(stem).ok().map(TrieKey::stem);
            }
        }
        self.words.word_to_index(word).ok().map(TrieKey::literal)
    }

    fn child_or_insert(&mut self, node: usize, key: TrieKey) -> usize {
        if let Some(&child) = self.nodes[node].children.get(&key) {
            return child;
        }
        let child = self.nodes.len();
        self.nodes.push(BuildNode::new());
        self.nodes[node].children.insert(key, child);
        child
    }

    /// Prunes the trie and serializes it into `out`.
    ///
    /// `min_freq` drops whole subtrees whose aggregated frequency falls
    /// below it; `max_results` caps how many leaf-only children survive
    /// per node (children with descendants of their own are exempt, since
    /// they carry longer contexts and depth already bounds their number).
    ///
    /// Pruning is destructive and runs once; calling `dump` again re-emits
    /// the already pruned tree byte-identically.
    pub fn dump<W: Write>(
        &mut self,
        out: W,
        min_freq: u64,
        max_results: usize,
    ) -> Result<()> {
        // Fatal before any byte is written.
        if self.words.len() > MAX_WORD_INDEX as usize {
            return Err(PredictorError::VocabularyOverflow(self.words.len()));
        }

        if !self.pruned {
            self.rollup_and_prune(ROOT, min_freq, max_results);
            self.drop_empty_top_level();
            self.pruned = true;
        }

        let surviving = self.surviving_indices();
        let remap: HashMap<WordIndex, WordIndex> = surviving
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as WordIndex))
            .collect();

        let alphabet = Alphabet::default();
        let mut writer = RecordWriter::new(out);
        writer.write_word_count(surviving.len())?;
        for &old in &surviving {
            writer.write_word(&alphabet, self.words.index_to_word(old)?)?;
        }
        self.write_children(&mut writer, ROOT, 0, &remap)
    }

    /// Post-order pass: roll descendant counts into each node, then apply
    /// the frequency floor and the leaf cap. Returns the node's aggregate.
    fn rollup_and_prune(&mut self, node: usize, min_freq: u64, max_results: usize) -> u64 {
        let child_ids: Vec<usize> = self.nodes[node].children.values().copied().collect();
        let mut aggregate = self.nodes[node].freq;
        for child in child_ids {
            aggregate += self.rollup_and_prune(child, min_freq, max_results);
        }
        self.nodes[node].freq = aggregate;

        let mut children = std::mem::take(&mut self.nodes[node].children);
        children.retain(|_, &mut child| self.nodes[child].freq >= min_freq);

        // Cap only the simple completions. The threshold is the
        // max_results-th largest leaf frequency; ties at the threshold
        // survive, strictly-below does not.
        let mut leaf_freqs: Vec<u64> = children
            .values()
            .filter(|&&child| self.nodes[child].children.is_empty())
            .map(|&child| self.nodes[child].freq)
            .collect();
        if leaf_freqs.len() > max_results {
            leaf_freqs.sort_unstable_by(|a, b| b.cmp(a));
            let threshold = leaf_freqs[max_results - 1];
            children.retain(|_, &mut child| {
                !self.nodes[child].children.is_empty()
                    || self.nodes[child].freq >= threshold
            });
        }
        self.nodes[node].children = children;
        aggregate
    }

    /// A context with no viable continuation is useless; drop top-level
    /// entries whose children were all pruned away.
    fn drop_empty_top_level(&mut self) {
        let mut top = std::mem::take(&mut self.nodes[ROOT].children);
        top.retain(|_, &mut child| !self.nodes[child].children.is_empty());
        self.nodes[ROOT].children = top;
    }

    /// Word indices reachable after pruning, ascending. Their position in
    /// this order is the compacted numbering the dump emits.
    fn surviving_indices(&self) -> Vec<WordIndex> {
        let mut set = BTreeSet::new();
        let mut stack = vec![ROOT];
        while let Some(node) = stack.pop() {
            for (key, &child) in &self.nodes[node].children {
                set.insert(key.index);
                stack.push(child);
            }
        }
        set.into_iter().collect()
    }

    /// Depth-first body: siblings in descending aggregate order (ties by
    /// ascending index, so re-encoding is byte-stable), each list closed
    /// by a single return record. Nodes on the deepest layer emit no list.
    fn write_children<W: Write>(
        &self,
        writer: &mut RecordWriter<W>,
        node: usize,
        depth: usize,
        remap: &HashMap<WordIndex, WordIndex>,
    ) -> Result<()> {
        let mut siblings: Vec<(TrieKey, usize)> = self.nodes[node]
            .children
            .iter()
            .map(|(&key, &child)| (key, child))
            .collect();
        siblings.sort_by_key(|&(key, child)| {
            (std::cmp::Reverse(self.nodes[child].freq), key.index, key.is_stem)
        });

        for (key, child) in siblings {
            let mapped = TrieKey { index: remap[&key.index], is_stem: key.is_stem };
            writer.write_child(mapped)?;
            if depth + 1 < MAX_LAYERS {
                self.write_children(writer, child, depth + 1, remap)?;
            }
        }
        writer.write_return()
    }

    /// Ranked next-word candidates for the given `(literal, stem)` context,
    /// oldest word first. Valid before `dump`; the loaded index answers the
    /// same query from disk order.
    pub fn fetch(
        &self,
        context: &[(&str, &str)],
        max_results: usize,
        verbose: bool,
    ) -> Vec<Prediction> {
        query::fetch(self, &self.words, context, max_results, verbose)
    }
}

impl ContextWalk for TrieBuilder<'_> {
    fn step(&self, node: usize, key: TrieKey) -> Option<usize> {
        self.nodes[node].children.get(&key).copied()
    }

    fn completions(&self, node: usize) -> Vec<(TrieKey, u64)> {
        let mut children: Vec<(TrieKey, u64)> = self.nodes[node]
            .children
            .iter()
            .map(|(&key, &child)| (key, self.nodes[child].freq))
            .collect();
        // Same order the dump emits.
        children.sort_by_key(|&(key, freq)| {
            (std::cmp::Reverse(freq), key.index, key.is_stem)
        });
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_stems() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn add_stores_every_suffix_path() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в"], &stems);
        trie.add(&["а", "б", "в"]);
        // Paths: а->б->в and б->в. 5 nodes plus the root.
        assert_eq!(trie.node_count(), 6);

        let a = trie.step(ROOT, TrieKey::literal(0)).unwrap();
        let ab = trie.step(a, TrieKey::literal(1)).unwrap();
        let abv = trie.step(ab, TrieKey::literal(2)).unwrap();
        assert_eq!(trie.nodes[abv].freq, 1);

        let b = trie.step(ROOT, TrieKey::literal(1)).unwrap();
        let bv = trie.step(b, TrieKey::literal(2)).unwrap();
        assert_eq!(trie.nodes[bv].freq, 1);
    }

    #[test]
    fn add_ignores_degenerate_windows() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г", "д"], &stems);
        trie.add(&["а"]);
        trie.add(&["а", "б", "в", "г", "д"]);
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn add_ignores_unknown_final_word() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а"], &stems);
        trie.add(&["а", "ь"]);
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn add_ignores_unresolvable_context_word() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["б"], &stems);
        trie.add(&["ь", "б"]);
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn stemmed_words_take_the_stem_edge() {
        let mut stems = HashMap::new();
        stems.insert("үйдө".to_string(), "үй".to_string());
        let mut trie = TrieBuilder::new(["компьютер", "үйдө"], &stems);
        trie.add(&["үйдө", "компьютер"]);

        let stem_index = trie.words.word_to_index("үй").unwrap();
        let node = trie.step(ROOT, TrieKey::stem(stem_index)).unwrap();
        let leaf_index = trie.words.word_to_index("компьютер").unwrap();
        assert!(trie.step(node, TrieKey::literal(leaf_index)).is_some());
        // No literal edge for the inflected form.
        let literal_index = trie.words.word_to_index("үйдө").unwrap();
        assert!(trie.step(ROOT, TrieKey::literal(literal_index)).is_none());
    }

    #[test]
    fn identity_stem_lines_mean_no_normalization() {
        let mut stems = HashMap::new();
        stems.insert("бар".to_string(), "бар".to_string());
        let mut trie = TrieBuilder::new(["бар", "жок"], &stems);
        trie.add(&["бар", "жок"]);
        assert!(trie.step(ROOT, TrieKey::literal(0)).is_some());
        assert!(trie.step(ROOT, TrieKey::stem(0)).is_none());
    }

    #[test]
    fn rollup_aggregates_bottom_up() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г"], &stems);
        for _ in 0..3 {
            trie.add(&["а", "б", "в"]);
        }
        trie.add(&["а", "б", "г"]);
        trie.rollup_and_prune(ROOT, 0, usize::MAX);

        let a = trie.step(ROOT, TrieKey::literal(0)).unwrap();
        let ab = trie.step(a, TrieKey::literal(1)).unwrap();
        assert_eq!(trie.nodes[ab].freq, 4);
        assert_eq!(trie.nodes[a].freq, 4);

        let b = trie.step(ROOT, TrieKey::literal(1)).unwrap();
        assert_eq!(trie.nodes[b].freq, 4);
    }

    #[test]
    fn min_freq_drops_weak_subtrees() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г"], &stems);
        for _ in 0..3 {
            trie.add(&["а", "б", "в"]);
        }
        trie.add(&["а", "б", "г"]);
        trie.rollup_and_prune(ROOT, 2, usize::MAX);

        let a = trie.step(ROOT, TrieKey::literal(0)).unwrap();
        let ab = trie.step(a, TrieKey::literal(1)).unwrap();
        assert!(trie.step(ab, TrieKey::literal(2)).is_some());
        assert!(trie.step(ab, TrieKey::literal(3)).is_none());
    }

    #[test]
    fn leaf_cap_keeps_highest_frequencies_and_ties() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г", "д"], &stems);
        for _ in 0..3 {
            trie.add(&["а", "б"]);
        }
        for _ in 0..2 {
            trie.add(&["а", "в"]);
        }
        for _ in 0..2 {
            trie.add(&["а", "г"]);
        }
        trie.add(&["а", "д"]);
        trie.rollup_and_prune(ROOT, 0, 2);

        let a = trie.step(ROOT, TrieKey::literal(0)).unwrap();
        // Threshold is the 2nd largest leaf frequency (2); both words at
        // that frequency stay, the singleton goes.
        assert!(trie.step(a, TrieKey::literal(1)).is_some());
        assert!(trie.step(a, TrieKey::literal(2)).is_some());
        assert!(trie.step(a, TrieKey::literal(3)).is_some());
        assert!(trie.step(a, TrieKey::literal(4)).is_none());
    }

    #[test]
    fn childless_top_level_entries_are_dropped() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в"], &stems);
        for _ in 0..5 {
            trie.add(&["а", "б"]);
        }
        trie.add(&["б", "в"]);
        trie.rollup_and_prune(ROOT, 3, usize::MAX);
        trie.drop_empty_top_level();

        assert!(trie.step(ROOT, TrieKey::literal(0)).is_some());
        assert!(trie.step(ROOT, TrieKey::literal(1)).is_none());
    }

    #[test]
    fn dump_is_deterministic() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г"], &stems);
        for _ in 0..3 {
            trie.add(&["а", "б", "в"]);
        }
        trie.add(&["б", "г"]);

        let mut first = Vec::new();
        trie.dump(&mut first, 0, usize::MAX).unwrap();
        let mut second = Vec::new();
        trie.dump(&mut second, 0, usize::MAX).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn dump_rejects_unencodable_words() {
        let stems = no_stems();
        let mut trie = TrieBuilder::new(["ok", "word!"], &stems);
        trie.add(&["ok", "word!"]);
        let mut out = Vec::new();
        assert!(matches!(
            trie.dump(&mut out, 0, usize::MAX),
            Err(PredictorError::Encoding('!'))
        ));
    }
}
