use std::collections::HashMap;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::state::State;
use super::{Model, check_batch, check_indices};
use crate::data::encoder::hot_index;
use crate::error::{ChargenError, ChargenResult};

/// Back-off n-gram model over vocabulary indices.
///
/// The `NGramModel` keeps one `State` per observed context of length
/// `0..order` (the trailing characters of a window) and predicts from the
/// longest context it has seen, falling back to shorter ones.
///
/// # Responsibilities
/// - Accumulate transition counts for every context length on each batch
/// - Produce a smoothed distribution that always sums to 1
///
/// # Invariants
/// - `order` is always >= 1 (order 1 is a unigram model)
/// - Each key in `states` has fewer than `order` indices
/// - `smoothing` is strictly positive, so no probability is ever 0
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// The order of the model (context length + 1)
	order: usize,

	vocab_size: usize,

	/// Additive smoothing applied to every count
	smoothing: f32,

	/// Mapping from a context to its corresponding state
	states: HashMap<Vec<usize>, State>,
}

impl NGramModel {
	/// Creates an empty n-gram model of order `order`.
	///
	/// # Errors
	/// Returns an error if `order < 1`, `vocab_size == 0` or `smoothing <= 0`.
	pub fn new(order: usize, vocab_size: usize, smoothing: f32) -> ChargenResult<Self> {
		if order < 1 {
			return Err(ChargenError::InvalidConfig("n-gram order must be >= 1".to_owned()));
		}
		if vocab_size == 0 {
			return Err(ChargenError::InvalidConfig("vocabulary is empty".to_owned()));
		}
		if !(smoothing > 0.0) {
			return Err(ChargenError::InvalidConfig("n-gram smoothing must be > 0".to_owned()));
		}
		Ok(Self { order, vocab_size, smoothing, states: HashMap::new() })
	}

	/// Number of distinct contexts observed so far.
	pub fn state_count(&self) -> usize {
		self.states.len()
	}

	/// Longest known context ending `window`, if any.
	fn best_state(&self, window: &[usize]) -> Option<&State> {
		let max_len = (self.order - 1).min(window.len());
		(0..=max_len)
			.rev()
			.find_map(|len| self.states.get(&window[window.len() - len..]).filter(|s| s.total() > 0))
	}

	/// Records `next` after every suffix of `window` shorter than `order`.
	fn add_window(&mut self, window: &[usize], next: usize) {
		let max_len = (self.order - 1).min(window.len());
		for len in 0..=max_len {
			let key = &window[window.len() - len..];
			match self.states.get_mut(key) {
				Some(state) => state.add_transition(next),
				None => {
					let mut state = State::default();
					state.add_transition(next);
					self.states.insert(key.to_vec(), state);
				}
			}
		}
	}
}

impl Model for NGramModel {
	fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	/// Loss is the mean cross-entropy of the batch measured before its
	/// counts are added.
	fn train_step(&mut self, inputs: ArrayView2<usize>, targets: ArrayView2<f32>) -> ChargenResult<f32> {
		check_batch(&inputs, &targets, self.vocab_size)?;

		let mut loss = 0.0f64;
		for (window, target) in inputs.rows().into_iter().zip(targets.rows()) {
			let window = window.to_vec();
			let next = hot_index(target);
			let p = match self.best_state(&window) {
				Some(state) => state.probability(next, self.vocab_size, self.smoothing),
				None => 1.0 / self.vocab_size as f32,
			};
			loss -= (p as f64).ln();
			self.add_window(&window, next);
		}

		Ok((loss / inputs.nrows() as f64) as f32)
	}

	fn predict(&self, window: &[usize]) -> ChargenResult<Vec<f32>> {
		check_indices(window.iter().copied(), self.vocab_size)?;
		Ok(match self.best_state(window) {
			Some(state) => state.distribution(self.vocab_size, self.smoothing),
			None => vec![1.0 / self.vocab_size as f32; self.vocab_size],
		})
	}
}
