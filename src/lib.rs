// src/lib.rs

pub mod core;
pub mod error;
pub mod input;
pub mod persistence;

pub use crate::core::index::PredictionTrie;
pub use crate::core::query::Prediction;
pub use crate::core::trie::TrieBuilder;
pub use crate::core::types::MAX_LAYERS;
pub use crate::error::{PredictorError, Result};
