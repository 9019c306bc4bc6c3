//! Character-level text generation library.
//!
//! This crate provides the pieces needed to train a next-character model
//! on a text corpus and to sample new text from it:
//! - Corpus loading, vocabulary building and sliding-window vectorization
//! - A pluggable `Model` contract with two implementations
//! - Temperature-scaled categorical sampling
//! - A generation loop streaming text to any writer
//! - A training driver running train/sample cycles, and checkpoints
//!
//! Randomness is always injected by the caller, so every run can be
//! reproduced from a seeded `StdRng`.

/// Crate-wide error type.
pub mod error;

/// Training and model configuration.
pub mod config;

/// Corpus, vocabulary, window extraction and encoding.
pub mod data;

/// The `Model` contract and its implementations.
pub mod model;

/// Temperature-scaled categorical sampling.
pub mod sampler;

/// Generation parameters (temperature, length, start seed).
pub mod generation_input;

/// Character-by-character generation loop.
pub mod generator;

/// Outer train/sample cycle.
pub mod trainer;

/// Binary checkpoints of a trained session.
pub mod checkpoint;

/// I/O utilities (file loading, path helpers).
pub mod io;

pub use error::{ChargenError, ChargenResult};
