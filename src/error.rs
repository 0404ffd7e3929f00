// src/error.rs
use thiserror::Error;

/// Everything that can go wrong while building, persisting, loading or
/// querying a prediction index.
///
/// `add` and `fetch` never surface `UnknownWord` themselves: unresolvable
/// corpus or context words are expected noise and are skipped. The lookup
/// variants exist for callers that resolve words directly through the
/// word table.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("unknown word {0:?}")]
    UnknownWord(String),

    #[error("unknown word index {0}")]
    UnknownWordIndex(u32),

    /// A word contains a character outside the fixed index alphabet.
    /// Fatal for the whole dump call.
    #[error("character {0:?} cannot be encoded by the index alphabet")]
    Encoding(char),

    /// More words than the 22-bit index field can address.
    /// Raised before any bytes are written.
    #[error("vocabulary of {0} words exceeds the 22-bit index space")]
    VocabularyOverflow(usize),

    /// Malformed binary stream during load. The whole load fails; no
    /// partially built index is ever returned.
    #[error("corrupt index: {0}")]
    CorruptIndex(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PredictorError>;
