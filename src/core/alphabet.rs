// src/core/alphabet.rs
use crate::error::{PredictorError, Result};
use std::collections::HashMap;

/// The fixed character set of the on-disk word list, in byte-value order
/// (1-based; byte 0 terminates a word). The exact set and order are part
/// of the format contract.
pub const ALPHABET_TABLE: &str =
    ",.:0123456789abcdefghijklmnopqrstuvwxyz\
     абвгдеёжзийклмнопрстуфхцчшщъыьэюяңүө";

/// Per-character byte codec for the word list. Built from a fixed table
/// and injected into whoever encodes or decodes; not a process-wide
/// singleton, so tests can run it against small tables in isolation.
#[derive(Debug, Clone)]
pub struct Alphabet {
    to_byte: HashMap<char, u8>,
    from_byte: Vec<char>,
}

impl Alphabet {
    pub fn new(table: &str) -> Self {
        let from_byte: Vec<char> = table.chars().collect();
        debug_assert!(from_byte.len() < 256);
        let to_byte = from_byte
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, (i + 1) as u8))
            .collect();
        Self { to_byte, from_byte }
    }

    /// Encodes one character, or fails with `Encoding` if it is outside
    /// the table.
    pub fn encode_char(&self, c: char) -> Result<u8> {
        self.to_byte
            .get(&c)
            .copied()
            .ok_or(PredictorError::Encoding(c))
    }

    /// Decodes one byte. `None` for 0 (the terminator) and for anything
    /// past the end of the table.
    pub fn decode_byte(&self, byte: u8) -> Option<char> {
        if byte == 0 {
            return None;
        }
        self.from_byte.get(byte as usize - 1).copied()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new(ALPHABET_TABLE)
    }
}
