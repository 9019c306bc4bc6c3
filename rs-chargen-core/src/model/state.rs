use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Represents one context of an n-gram model.
///
/// A `State` corresponds to a fixed sequence of preceding vocabulary
/// indices and stores every observed transition from it to the next index.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - Each transition occurrence count is strictly positive
/// - `total` is the sum of all occurrence counts
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct State {
	/// Outgoing transitions indexed by the next vocabulary index.
	/// Example: { 4 => 42, 0 => 3 }
	transitions: HashMap<usize, u64>,
	total: u64,
}

impl State {
	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: usize) {
		*self.transitions.entry(next).or_insert(0) += 1;
		self.total += 1;
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	/// Smoothed probability of `next`:
	/// `(count + smoothing) / (total + smoothing * vocab_size)`.
	pub fn probability(&self, next: usize, vocab_size: usize, smoothing: f32) -> f32 {
		let count = self.transitions.get(&next).copied().unwrap_or(0) as f64;
		let smoothing = smoothing as f64;
		((count + smoothing) / (self.total as f64 + smoothing * vocab_size as f64)) as f32
	}

	/// Full smoothed distribution over `0..vocab_size`.
	pub fn distribution(&self, vocab_size: usize, smoothing: f32) -> Vec<f32> {
		let smoothing = smoothing as f64;
		let denominator = self.total as f64 + smoothing * vocab_size as f64;
		let mut distribution = vec![(smoothing / denominator) as f32; vocab_size];
		for (&next, &count) in &self.transitions {
			if let Some(p) = distribution.get_mut(next) {
				*p = ((count as f64 + smoothing) / denominator) as f32;
			}
		}
		distribution
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_counts() {
		let mut state = State::default();
		state.add_transition(1);
		state.add_transition(1);
		state.add_transition(2);
		assert_eq!(state.total(), 3);
		assert!(state.probability(1, 3, 0.01) > state.probability(2, 3, 0.01));
		assert!(state.probability(0, 3, 0.01) > 0.0);
	}

	#[test]
	fn test_distribution_sums_to_one() {
		let mut state = State::default();
		for next in [0, 3, 3, 3, 7] {
			state.add_transition(next);
		}
		let distribution = state.distribution(8, 0.5);
		let sum: f32 = distribution.iter().sum();
		assert!((sum - 1.0).abs() < 1e-5);
		assert!((distribution[3] - state.probability(3, 8, 0.5)).abs() < 1e-7);
	}
}
