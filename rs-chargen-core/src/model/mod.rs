//! Next-character models.
//!
//! Everything downstream of vectorization only sees the `Model` trait:
//! - `train_step` on a batch of encoded windows and one-hot targets
//! - `predict` a probability distribution for one encoded window
//!
//! Two implementations are provided and wrapped in `CharModel` so that a
//! trained model can be checkpointed whatever its kind.

use ndarray::ArrayView2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, TrainingConfig};
use crate::error::{ChargenError, ChargenResult};

/// Count-based back-off n-gram model.
pub mod ngram_model;

/// Embedding + dense network trained by gradient descent.
pub mod embedding_model;

/// Adam optimizer state.
pub mod optimizer;

/// Internal representation of a single n-gram context.
/// This module is not exposed publicly.
mod state;

pub use embedding_model::EmbeddingModel;
pub use ngram_model::NGramModel;

/// Contract between the training/generation pipeline and a model.
///
/// Any classifier over the vocabulary satisfying this contract can be used.
pub trait Model {
	/// Number of classes of the output distribution.
	fn vocab_size(&self) -> usize;

	/// Updates the model on one batch and returns the batch loss.
	///
	/// - `inputs`: `(batch, window_len)` vocabulary indices
	/// - `targets`: `(batch, vocab_size)` one-hot rows
	///
	/// State accumulates across calls; nothing is reset between epochs.
	fn train_step(&mut self, inputs: ArrayView2<usize>, targets: ArrayView2<f32>) -> ChargenResult<f32>;

	/// Returns the next-character distribution for one encoded window.
	///
	/// The result has `vocab_size()` non-negative entries summing to 1.
	fn predict(&self, window: &[usize]) -> ChargenResult<Vec<f32>>;
}

/// Checks that a batch is consistent with the model before training on it.
pub(crate) fn check_batch(
	inputs: &ArrayView2<usize>,
	targets: &ArrayView2<f32>,
	vocab_size: usize,
) -> ChargenResult<()> {
	if inputs.nrows() == 0 {
		return Err(ChargenError::Model("empty batch".to_owned()));
	}
	if inputs.nrows() != targets.nrows() {
		return Err(ChargenError::Model(format!(
			"batch size mismatch: {} inputs, {} targets",
			inputs.nrows(),
			targets.nrows()
		)));
	}
	if targets.ncols() != vocab_size {
		return Err(ChargenError::Model(format!(
			"target width {} does not match the vocabulary size {}",
			targets.ncols(),
			vocab_size
		)));
	}
	check_indices(inputs.iter().copied(), vocab_size)
}

pub(crate) fn check_indices<I: IntoIterator<Item = usize>>(indices: I, vocab_size: usize) -> ChargenResult<()> {
	match indices.into_iter().find(|&i| i >= vocab_size) {
		Some(index) => Err(ChargenError::UnknownIndex { index, size: vocab_size }),
		None => Ok(()),
	}
}

/// Any of the available models, as stored in a checkpoint.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum CharModel {
	NGram(NGramModel),
	Embedding(EmbeddingModel),
}

impl CharModel {
	/// Builds an untrained model as described by `config.model`.
	///
	/// The RNG is only used to initialise weights.
	pub fn from_config<R: Rng + ?Sized>(
		config: &TrainingConfig,
		vocab_size: usize,
		rng: &mut R,
	) -> ChargenResult<Self> {
		match config.model {
			ModelConfig::NGram { order, smoothing } => {
				Ok(CharModel::NGram(NGramModel::new(order, vocab_size, smoothing)?))
			}
			ModelConfig::Embedding { embedding_dim, hidden, learning_rate } => Ok(CharModel::Embedding(
				EmbeddingModel::new(vocab_size, config.window_len, embedding_dim, hidden, learning_rate, rng)?,
			)),
		}
	}

	pub fn kind(&self) -> &'static str {
		match self {
			CharModel::NGram(_) => "n-gram",
			CharModel::Embedding(_) => "embedding",
		}
	}
}

impl Model for CharModel {
	fn vocab_size(&self) -> usize {
		match self {
			CharModel::NGram(m) => m.vocab_size(),
			CharModel::Embedding(m) => m.vocab_size(),
		}
	}

	fn train_step(&mut self, inputs: ArrayView2<usize>, targets: ArrayView2<f32>) -> ChargenResult<f32> {
		match self {
			CharModel::NGram(m) => m.train_step(inputs, targets),
			CharModel::Embedding(m) => m.train_step(inputs, targets),
		}
	}

	fn predict(&self, window: &[usize]) -> ChargenResult<Vec<f32>> {
		match self {
			CharModel::NGram(m) => m.predict(window),
			CharModel::Embedding(m) => m.predict(window),
		}
	}
}
