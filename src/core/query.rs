// src/core/query.rs
use crate::core::types::{TrieKey, MAX_LAYERS};
use crate::core::words::WordTable;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;

/// One ranked next-word candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub word: String,
    /// Window length of the context match, including the predicted word.
    /// Longer matches rank first.
    pub layers_used: usize,
    /// Aggregated count when fetching from a builder. The binary format
    /// persists rank order only, so a loaded index reports 0 here.
    pub frequency: u64,
    /// Whether the predicted word is a canonical stem rather than a
    /// literally observed form.
    pub is_stem: bool,
}

/// Read access shared by the build-phase trie and the loaded index, which
/// lets one `fetch` implementation serve both. Node 0 is the root.
pub(crate) trait ContextWalk {
    fn step(&self, node: usize, key: TrieKey) -> Option<usize>;

    /// Children of a node in rank order (descending frequency), with the
    /// frequency each structure knows about.
    fn completions(&self, node: usize) -> Vec<(TrieKey, u64)>;
}

struct RawCandidate {
    key: TrieKey,
    layers_used: usize,
    frequency: u64,
}

/// Multi-window lookback search over `(literal, stem candidate)` context
/// pairs, oldest first.
///
/// Longest windows are tried first; within a window both the stem edge and
/// the literal edge of every context word are explored. Missing words and
/// edges are dead ends, never errors. Results dedup by
/// `(is_stem, predicted word)`; literal predictions fill the result list
/// before any stem prediction is admitted.
pub(crate) fn fetch(
    trie: &impl ContextWalk,
    words: &WordTable,
    context: &[(&str, &str)],
    max_results: usize,
    verbose: bool,
) -> Vec<Prediction> {
    let mut raw = Vec::new();
    let widest = (context.len() + 1).min(MAX_LAYERS);
    for window in (2..=widest).rev() {
        let start = context.len() + 1 - window;
        descend(trie, words, 0, &context[start..], window, verbose, &mut raw);
    }

    let mut seen: HashSet<TrieKey> = HashSet::new();
    let mut results = Vec::new();
    for stem_pass in [false, true] {
        for candidate in raw.iter().filter(|c| c.key.is_stem == stem_pass) {
            if results.len() >= max_results {
                return results;
            }
            if !seen.insert(candidate.key) {
                continue;
            }
            let Ok(word) = words.index_to_word(candidate.key.index) else {
                continue;
            };
            results.push(Prediction {
                word: word.to_string(),
                layers_used: candidate.layers_used,
                frequency: candidate.frequency,
                is_stem: candidate.key.is_stem,
            });
        }
    }
    results
}

fn descend(
    trie: &impl ContextWalk,
    words: &WordTable,
    node: usize,
    remaining: &[(&str, &str)],
    layers_used: usize,
    verbose: bool,
    out: &mut Vec<RawCandidate>,
) {
    let Some(&(literal, stem)) = remaining.first() else {
        for (key, frequency) in trie.completions(node) {
            out.push(RawCandidate { key, layers_used, frequency });
        }
        return;
    };

    // Stem path first; the literal path is explored independently, since
    // either edge may lead to different completions.
    match words.word_to_index(stem) {
        Ok(index) => match trie.step(node, TrieKey::stem(index)) {
            Some(next) => descend(trie, words, next, &remaining[1..], layers_used, verbose, out),
            None if verbose => debug!("no stem edge for {stem:?}"),
            None => {}
        },
        Err(_) if verbose => debug!("stem candidate {stem:?} not in the word table"),
        Err(_) => {}
    }
    match words.word_to_index(literal) {
        Ok(index) => match trie.step(node, TrieKey::literal(index)) {
            Some(next) => descend(trie, words, next, &remaining[1..], layers_used, verbose, out),
            None if verbose => debug!("no literal edge for {literal:?}"),
            None => {}
        },
        Err(_) if verbose => debug!("context word {literal:?} not in the word table"),
        Err(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trie::TrieBuilder;
    use std::collections::HashMap;

    fn as_context(words: &[&'static str]) -> Vec<(&'static str, &'static str)> {
        words.iter().map(|&w| (w, w)).collect()
    }

    #[test]
    fn ranks_by_frequency_within_a_window() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г"], &stems);
        for _ in 0..3 {
            trie.add(&["а", "б", "в"]);
        }
        trie.add(&["а", "б", "г"]);

        let results = trie.fetch(&as_context(&["а", "б"]), 10, false);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].word, "в");
        assert_eq!(results[0].frequency, 3);
        assert_eq!(results[0].layers_used, 3);
        assert_eq!(results[1].word, "г");
        assert_eq!(results[1].frequency, 1);
    }

    #[test]
    fn longer_context_matches_rank_first() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г"], &stems);
        trie.add(&["а", "б", "в"]);
        for _ in 0..10 {
            trie.add(&["б", "г"]);
        }

        let results = trie.fetch(&as_context(&["а", "б"]), 10, false);
        // "в" matched a 3-wide window, "г" only the 2-wide fallback.
        assert_eq!(results[0].word, "в");
        assert_eq!(results[0].layers_used, 3);
        assert_eq!(results[1].word, "г");
        assert_eq!(results[1].layers_used, 2);
    }

    #[test]
    fn context_wider_than_the_trie_is_truncated() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г", "д"], &stems);
        trie.add(&["б", "в", "г", "д"]);

        let results = trie.fetch(&as_context(&["а", "б", "в", "г"]), 10, false);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].word, "д");
        assert_eq!(results[0].layers_used, MAX_LAYERS);
    }

    #[test]
    fn unknown_context_word_yields_empty_not_error() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б"], &stems);
        trie.add(&["а", "б"]);
        let results = trie.fetch(&as_context(&["ъ"]), 10, false);
        assert!(results.is_empty());
    }

    #[test]
    fn empty_context_yields_nothing() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б"], &stems);
        trie.add(&["а", "б"]);
        assert!(trie.fetch(&[], 10, false).is_empty());
    }

    #[test]
    fn max_results_caps_the_list() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б", "в", "г"], &stems);
        trie.add(&["а", "б"]);
        trie.add(&["а", "в"]);
        trie.add(&["а", "г"]);
        assert_eq!(trie.fetch(&as_context(&["а"]), 2, false).len(), 2);
    }

    #[test]
    fn duplicate_candidates_keep_the_widest_match() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б", "в"], &stems);
        trie.add(&["а", "б", "в"]);

        let results = trie.fetch(&as_context(&["а", "б"]), 10, false);
        // "в" is reachable through both the 3-window and the 2-window
        // suffix path; only the 3-window entry survives dedup.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].layers_used, 3);
    }

    #[test]
    fn stem_predictions_come_after_all_literal_ones() {
        let mut stems = HashMap::new();
        stems.insert("үйдө".to_string(), "үй".to_string());
        let mut trie = TrieBuilder::new(["мен", "үйдө", "бар"], &stems);
        // "үйдө" as final word is recorded under its stem key.
        for _ in 0..10 {
            trie.add(&["мен", "үйдө"]);
        }
        trie.add(&["мен", "бар"]);

        let results = trie.fetch(&[("мен", "мен")], 10, false);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].word, "бар");
        assert!(!results[0].is_stem);
        assert_eq!(results[1].word, "үй");
        assert!(results[1].is_stem);
        assert_eq!(results[1].frequency, 10);
    }

    #[test]
    fn stem_and_literal_context_edges_are_both_explored() {
        let mut stems = HashMap::new();
        stems.insert("үйдө".to_string(), "үй".to_string());
        let mut trie = TrieBuilder::new(["үй", "үйдө", "бар", "жок"], &stems);
        // A stem edge from the inflected form and a literal edge from the
        // bare stem, leading to different completions.
        trie.add(&["үйдө", "бар"]);
        trie.add(&["үй", "жок"]);

        let results = trie.fetch(&[("үй", "үй")], 10, false);
        assert_eq!(results.len(), 2);
        // The stem branch is walked first.
        assert_eq!(results[0].word, "бар");
        assert_eq!(results[1].word, "жок");
    }
}
