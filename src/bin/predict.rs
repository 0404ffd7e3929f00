// src/bin/predict.rs
//
// Loads a dumped index and answers next-word queries, one-shot from the
// command line or as an interactive loop.

use anyhow::Context;
use clap::Parser;
use crossterm::style::Stylize;
use predictor_core::input::read_stem_map;
use predictor_core::persistence::load_from_disk;
use predictor_core::{Prediction, PredictionTrie};
use std::collections::HashMap;
use std::fs::File;
use std::io::{stdin, stdout, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Queries a next-word prediction index")]
struct Cli {
    /// Index file produced by build_index
    #[arg(long, value_name = "FILE")]
    index: PathBuf,

    /// Stem map used at build time; without it queries are literal-only
    #[arg(long, value_name = "FILE")]
    stems: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    max_results: usize,

    /// Print predictions as JSON instead of styled text
    #[arg(long)]
    json: bool,

    /// Trace dead ends while walking the trie
    #[arg(long)]
    verbose: bool,

    /// Context words; omit to start an interactive loop
    query: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let index = load_from_disk(&cli.index).context("loading index")?;
    let stems = match &cli.stems {
        Some(path) => read_stem_map(BufReader::new(
            File::open(path).context("opening stem map")?,
        ))?,
        None => HashMap::new(),
    };

    if !cli.query.is_empty() {
        let request = cli.query.join(" ");
        answer(&index, &stems, &request, &cli)?;
        return Ok(());
    }

    println!(
        "Prediction index with {} words. Type a context, empty line to quit.",
        index.word_count()
    );
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        answer(&index, &stems, line, &cli)?;
    }
    Ok(())
}

fn answer(
    index: &PredictionTrie,
    stems: &HashMap<String, String>,
    request: &str,
    cli: &Cli,
) -> anyhow::Result<()> {
    let words: Vec<String> = request
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    let context: Vec<(&str, &str)> = words
        .iter()
        .map(|word| {
            let stem = stems.get(word).map(String::as_str).unwrap_or(word);
            (word.as_str(), stem)
        })
        .collect();

    let predictions = index.fetch(&context, cli.max_results, cli.verbose);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
        return Ok(());
    }

    if predictions.is_empty() {
        println!("{}", "no predictions".dark_grey());
        return Ok(());
    }
    for (i, prediction) in predictions.iter().enumerate() {
        print_prediction(i + 1, prediction);
    }
    Ok(())
}

fn print_prediction(rank: usize, prediction: &Prediction) {
    let word = if prediction.is_stem {
        prediction.word.clone().italic().yellow()
    } else {
        prediction.word.clone().bold()
    };
    let detail = format!(
        "(context {}{})",
        prediction.layers_used - 1,
        if prediction.is_stem { ", stem" } else { "" }
    );
    println!("  {}. {} {}", rank, word, detail.dark_grey());
}
