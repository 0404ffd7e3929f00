// src/persistence.rs
use crate::core::index::PredictionTrie;
use crate::core::trie::TrieBuilder;
use crate::error::{PredictorError, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Prunes the trie and writes the index to `path` atomically: the bytes go
/// to a temp file in the destination directory and only replace the final
/// path on full success. A failed dump leaves any previous index intact.
pub fn dump_to_disk(
    trie: &mut TrieBuilder,
    path: &Path,
    min_freq: u64,
    max_results: usize,
) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = BufWriter::new(&temp);
    trie.dump(&mut writer, min_freq, max_results)?;
    writer.flush()?;
    drop(writer);

    temp.persist(path)
        .map_err(|e| PredictorError::Io(e.error))?;
    Ok(())
}

pub fn load_from_disk(path: &Path) -> Result<PredictionTrie> {
    let file = File::open(path)?;
    PredictionTrie::load(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn round_trips_through_a_file() {
        let stems = HashMap::new();
        let mut trie = TrieBuilder::new(["а", "б"], &stems);
        trie.add(&["а", "б"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trie.bin");
        dump_to_disk(&mut trie, &path, 0, usize::MAX).unwrap();

        let index = load_from_disk(&path).unwrap();
        let results = index.fetch(&[("а", "а")], 5, false);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].word, "б");
    }

    #[test]
    fn failed_dump_preserves_the_previous_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trie.bin");

        let stems = HashMap::new();
        let mut good = TrieBuilder::new(["а", "б"], &stems);
        good.add(&["а", "б"]);
        dump_to_disk(&mut good, &path, 0, usize::MAX).unwrap();
        let before = fs::read(&path).unwrap();

        // "x!" cannot be alphabet-encoded, so this dump must fail.
        let mut bad = TrieBuilder::new(["а", "x!"], &stems);
        bad.add(&["а", "x!"]);
        assert!(dump_to_disk(&mut bad, &path, 0, usize::MAX).is_err());

        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
