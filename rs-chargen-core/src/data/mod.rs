//! Text corpus and its vectorized form.
//!
//! - `Corpus`: the immutable training text, indexed by character
//! - `Vocabulary`: sorted distinct characters with a bijective index
//! - `windows`: sliding-window extraction of (window, next character) pairs
//! - `encoder`: index / one-hot encoding and the `TrainingSet` matrices

/// Immutable training text.
pub mod corpus;

/// Character <-> index bijection.
pub mod vocabulary;

/// Sliding windows over the corpus.
pub mod windows;

/// Window and target encoding.
pub mod encoder;

pub use corpus::Corpus;
pub use encoder::TrainingSet;
pub use vocabulary::Vocabulary;
pub use windows::Window;
