// src/core/codec.rs
//
// Cursor objects for the binary index format. The writer and reader own
// the positional state (the run of return markers closing nested sibling
// lists is inherently stateful), which keeps the codec testable without a
// trie in memory.
//
// Stream layout:
//   [3 bytes] word count, big-endian
//   word count times: alphabet-encoded characters, 0x00 terminator
//   trie body: fixed 3-byte records, depth-first (see trie.rs / index.rs)

use crate::core::alphabet::Alphabet;
use crate::core::types::{TrieKey, MAX_WORD_INDEX, RETURN_MARKER, STEM_MARKER};
use crate::error::{PredictorError, Result};
use std::io::{Read, Write};

/// One decoded 3-byte record from the trie body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieRecord {
    /// An edge to a child node.
    Child(TrieKey),
    /// Closes the current sibling list.
    Return,
}

pub struct RecordWriter<W: Write> {
    out: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes the 3-byte word count prefix. The overflow check happens
    /// before anything reaches the underlying writer.
    pub fn write_word_count(&mut self, count: usize) -> Result<()> {
        if count > MAX_WORD_INDEX as usize {
            return Err(PredictorError::VocabularyOverflow(count));
        }
        self.write_u24(count as u32)
    }

    /// Writes one word through the alphabet codec, followed by the 0x00
    /// terminator.
    pub fn write_word(&mut self, alphabet: &Alphabet, word: &str) -> Result<()> {
        for c in word.chars() {
            let byte = alphabet.encode_char(c)?;
            self.out.write_all(&[byte])?;
        }
        self.out.write_all(&[0])?;
        Ok(())
    }

    /// Writes a child record: 22-bit word index plus the stem marker.
    pub fn write_child(&mut self, key: TrieKey) -> Result<()> {
        debug_assert!(key.index <= MAX_WORD_INDEX);
        let mut value = key.index;
        if key.is_stem {
            value |= STEM_MARKER;
        }
        self.write_u24(value)
    }

    /// Writes the zero-payload record closing the current sibling list.
    pub fn write_return(&mut self) -> Result<()> {
        self.write_u24(RETURN_MARKER)
    }

    fn write_u24(&mut self, value: u32) -> Result<()> {
        debug_assert!(value < 1 << 24);
        let bytes = value.to_be_bytes();
        self.out.write_all(&bytes[1..4])?;
        Ok(())
    }
}

pub struct RecordReader<R: Read> {
    input: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    pub fn read_word_count(&mut self) -> Result<u32> {
        let count = match self.read_u24()? {
            Some(count) => count,
            None => return Err(PredictorError::CorruptIndex("missing word count")),
        };
        if count > MAX_WORD_INDEX {
            return Err(PredictorError::CorruptIndex(
                "word count exceeds the 22-bit index space",
            ));
        }
        Ok(count)
    }

    /// Reads one null-terminated word through the alphabet codec.
    pub fn read_word(&mut self, alphabet: &Alphabet) -> Result<String> {
        let mut word = String::new();
        loop {
            let mut byte = [0u8; 1];
            if self.input.read(&mut byte)? == 0 {
                return Err(PredictorError::CorruptIndex(
                    "unterminated word in word list",
                ));
            }
            if byte[0] == 0 {
                return Ok(word);
            }
            match alphabet.decode_byte(byte[0]) {
                Some(c) => word.push(c),
                None => {
                    return Err(PredictorError::CorruptIndex(
                        "byte outside the alphabet in word list",
                    ))
                }
            }
        }
    }

    /// Reads the next 3-byte record, or `None` at a clean end of stream.
    /// A partial record is a truncation error.
    pub fn read_record(&mut self) -> Result<Option<TrieRecord>> {
        let value = match self.read_u24()? {
            Some(value) => value,
            None => return Ok(None),
        };
        if value & RETURN_MARKER != 0 {
            if value != RETURN_MARKER {
                return Err(PredictorError::CorruptIndex(
                    "return marker with non-zero payload",
                ));
            }
            return Ok(Some(TrieRecord::Return));
        }
        Ok(Some(TrieRecord::Child(TrieKey {
            index: value & MAX_WORD_INDEX,
            is_stem: value & STEM_MARKER != 0,
        })))
    }

    /// Reads exactly 3 bytes; `None` only at a record boundary.
    fn read_u24(&mut self) -> Result<Option<u32>> {
        let mut bytes = [0u8; 3];
        let mut filled = 0;
        while filled < 3 {
            let n = self.input.read(&mut bytes[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(PredictorError::CorruptIndex("truncated record"));
            }
            filled += n;
        }
        Ok(Some(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])))
    }
}
