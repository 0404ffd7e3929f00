// src/core/mod.rs

pub mod alphabet;
pub mod codec;
pub mod index;
pub mod query;
pub mod trie;
pub mod types;
pub mod words;
