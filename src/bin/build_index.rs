// src/bin/build_index.rs
//
// Drives the build pipeline end to end: vocabulary + stem map in,
// sentence stream through a sliding window, pruned binary index out.

use anyhow::Context;
use clap::Parser;
use log::info;
use predictor_core::input::{read_stem_map, read_word_list};
use predictor_core::persistence::dump_to_disk;
use predictor_core::{TrieBuilder, MAX_LAYERS};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

const LOG_EVERY_N_SENTENCES: u64 = 100_000;

#[derive(Parser)]
#[command(about = "Builds a next-word prediction index from a tokenized corpus")]
struct Cli {
    /// Word frequency table: `word count` per line
    #[arg(long, value_name = "FILE")]
    words: PathBuf,

    /// Stem map: `word stem` per line (optional)
    #[arg(long, value_name = "FILE")]
    stems: Option<PathBuf>,

    /// Pre-tokenized sentences, one per line, space-separated
    #[arg(long, value_name = "FILE")]
    sentences: PathBuf,

    /// Output index file
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Drop vocabulary words seen fewer times than this
    #[arg(long, default_value_t = 10)]
    min_word_freq: u64,

    /// Drop trie subtrees with aggregated frequency below this
    #[arg(long, default_value_t = 3)]
    min_freq: u64,

    /// Keep at most this many simple completions per node
    #[arg(long, default_value_t = 5)]
    max_results: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    info!("reading word list from {:?}", cli.words);
    let words = read_word_list(
        BufReader::new(File::open(&cli.words).context("opening word list")?),
        cli.min_word_freq,
    )?;
    info!("allowed words: {}", words.len());

    let stems = match &cli.stems {
        Some(path) => {
            let map = read_stem_map(BufReader::new(
                File::open(path).context("opening stem map")?,
            ))?;
            info!("stem map entries: {}", map.len());
            map
        }
        None => HashMap::new(),
    };

    let mut trie = TrieBuilder::new(words, &stems);

    info!("scanning sentences from {:?}", cli.sentences);
    let sentences = BufReader::new(File::open(&cli.sentences).context("opening sentences")?);
    let mut sentence_count: u64 = 0;
    for line in sentences.lines() {
        let line = line?;
        let mut window: Vec<String> = Vec::with_capacity(MAX_LAYERS);
        for word in line.split_whitespace() {
            if window.len() == MAX_LAYERS {
                window.remove(0);
            }
            window.push(word.to_lowercase());
            trie.add(&window);
        }
        sentence_count += 1;
        if sentence_count % LOG_EVERY_N_SENTENCES == 0 {
            info!(
                "processed {} sentences, {} trie nodes",
                sentence_count,
                trie.node_count()
            );
        }
    }
    info!(
        "done: {} sentences, {} trie nodes, {} words",
        sentence_count,
        trie.node_count(),
        trie.word_table().len()
    );

    dump_to_disk(&mut trie, &cli.output, cli.min_freq, cli.max_results)
        .context("writing index")?;
    let size = fs::metadata(&cli.output)?.len();
    println!(
        "Index written to {} ({} bytes)",
        cli.output.display(),
        size
    );
    Ok(())
}
