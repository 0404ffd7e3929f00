// src/input.rs
//
// Parsers for the two collaborator streams the external pipeline produces:
// a frequency-sorted word list and an optional stem map. Both formats are
// plain text, one entry per line, space-separated. Lines that do not parse
// are corpus noise and are skipped with a warning, not errors.

use crate::error::Result;
use log::warn;
use std::collections::HashMap;
use std::io::BufRead;

/// Reads `word count` lines, lowercasing words, aggregating repeated
/// entries and keeping only words whose total count reaches `min_freq`.
/// First-seen order is preserved, so the resulting vocabulary numbering is
/// deterministic for a given stream.
pub fn read_word_list<R: BufRead>(reader: R, min_freq: u64) -> Result<Vec<String>> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (word, count) = match (parts.next(), parts.next()) {
            (Some(word), Some(count)) => (word, count),
            _ => {
                warn!("skipping malformed word list line: {line:?}");
                continue;
            }
        };
        let count: u64 = match count.parse() {
            Ok(count) => count,
            Err(_) => {
                warn!("skipping word list line with bad count: {line:?}");
                continue;
            }
        };
        let word = word.to_lowercase();
        if !counts.contains_key(&word) {
            order.push(word.clone());
        }
        *counts.entry(word).or_insert(0) += count;
    }

    order.retain(|word| counts[word] >= min_freq);
    Ok(order)
}

/// Reads `word stem` lines, lowercased. A line whose stem equals the word
/// means "no normalization" and is dropped, so the resulting map only
/// contains real stem mappings.
pub fn read_stem_map<R: BufRead>(reader: R) -> Result<HashMap<String, String>> {
    let mut stems = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (word, stem) = match (parts.next(), parts.next()) {
            (Some(word), Some(stem)) => (word.to_lowercase(), stem.to_lowercase()),
            _ => {
                warn!("skipping malformed stem map line: {line:?}");
                continue;
            }
        };
        if word != stem {
            stems.insert(word, stem);
        }
    }
    Ok(stems)
}
