use serde::{Deserialize, Serialize};

use crate::error::{ChargenError, ChargenResult};

/// Which model to train, with its hyper-parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ModelConfig {
	/// Count-based Markov model over the trailing `order - 1` characters.
	NGram {
		order: usize,
		smoothing: f32,
	},
	/// Embedding + dense hidden layer + softmax, trained with Adam.
	Embedding {
		embedding_dim: usize,
		hidden: usize,
		learning_rate: f32,
	},
}

impl ModelConfig {
	pub fn default_ngram() -> Self {
		ModelConfig::NGram { order: 8, smoothing: 0.01 }
	}

	pub fn default_embedding() -> Self {
		ModelConfig::Embedding { embedding_dim: 16, hidden: 128, learning_rate: 0.001 }
	}
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self::default_embedding()
	}
}

/// Parameters of a full train/sample session.
///
/// Built once at startup and passed by reference to every component.
///
/// # Invariants (after `validate`)
/// - `window_len`, `step`, `batch_size` and `epochs` are non-zero
/// - `temperatures` is non-empty and every value is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingConfig {
	/// Number of characters in a window (model input).
	pub window_len: usize,
	/// Stride between two consecutive windows.
	pub step: usize,
	pub batch_size: usize,
	/// Passes over the training set per outer iteration.
	pub epochs: usize,
	/// Number of outer train/sample iterations.
	pub iterations: usize,
	/// Temperatures sampled after each iteration, in this order.
	pub temperatures: Vec<f64>,
	/// Characters generated per temperature run.
	pub generation_len: usize,
	/// Shuffle the batch order at every epoch.
	pub shuffle: bool,
	pub model: ModelConfig,
}

impl Default for TrainingConfig {
	fn default() -> Self {
		Self {
			window_len: 80,
			step: 3,
			batch_size: 128,
			epochs: 1,
			iterations: 99,
			temperatures: vec![0.2, 0.5, 1.0, 1.2],
			generation_len: 400,
			shuffle: true,
			model: ModelConfig::default(),
		}
	}
}

impl TrainingConfig {
	/// Checks every parameter before any data is processed.
	///
	/// # Errors
	/// - `InvalidTemperature` for a non-positive or non-finite temperature
	/// - `InvalidConfig` for anything else out of range
	pub fn validate(&self) -> ChargenResult<()> {
		if self.window_len == 0 {
			return Err(ChargenError::InvalidConfig("window_len must be > 0".to_owned()));
		}
		if self.step == 0 {
			return Err(ChargenError::InvalidConfig("step must be > 0".to_owned()));
		}
		if self.batch_size == 0 {
			return Err(ChargenError::InvalidConfig("batch_size must be > 0".to_owned()));
		}
		if self.epochs == 0 {
			return Err(ChargenError::InvalidConfig("epochs must be > 0".to_owned()));
		}
		if self.temperatures.is_empty() {
			return Err(ChargenError::InvalidConfig("at least one temperature is required".to_owned()));
		}
		if let Some(t) = self.temperatures.iter().find(|t| !(**t > 0.0) || !t.is_finite()) {
			return Err(ChargenError::InvalidTemperature(*t));
		}

		match self.model {
			ModelConfig::NGram { order, smoothing } => {
				if order < 1 {
					return Err(ChargenError::InvalidConfig("n-gram order must be >= 1".to_owned()));
				}
				if !(smoothing > 0.0) {
					return Err(ChargenError::InvalidConfig("n-gram smoothing must be > 0".to_owned()));
				}
			}
			ModelConfig::Embedding { embedding_dim, hidden, learning_rate } => {
				if embedding_dim == 0 || hidden == 0 {
					return Err(ChargenError::InvalidConfig(
						"embedding_dim and hidden must be > 0".to_owned(),
					));
				}
				if !(learning_rate > 0.0) {
					return Err(ChargenError::InvalidConfig("learning_rate must be > 0".to_owned()));
				}
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_valid() {
		let config = TrainingConfig::default();
		assert!(config.validate().is_ok());
		assert_eq!(config.window_len, 80);
		assert_eq!(config.step, 3);
		assert_eq!(config.temperatures, vec![0.2, 0.5, 1.0, 1.2]);
	}

	#[test]
	fn test_rejects_non_positive_temperature() {
		let config = TrainingConfig { temperatures: vec![0.5, 0.0], ..TrainingConfig::default() };
		assert!(matches!(config.validate(), Err(ChargenError::InvalidTemperature(t)) if t == 0.0));

		let config = TrainingConfig { temperatures: vec![-1.0], ..TrainingConfig::default() };
		assert!(matches!(config.validate(), Err(ChargenError::InvalidTemperature(_))));
	}

	#[test]
	fn test_rejects_zero_sizes() {
		let config = TrainingConfig { step: 0, ..TrainingConfig::default() };
		assert!(matches!(config.validate(), Err(ChargenError::InvalidConfig(_))));

		let config = TrainingConfig { batch_size: 0, ..TrainingConfig::default() };
		assert!(matches!(config.validate(), Err(ChargenError::InvalidConfig(_))));
	}

	#[test]
	fn test_rejects_bad_model() {
		let config = TrainingConfig {
			model: ModelConfig::NGram { order: 0, smoothing: 0.1 },
			..TrainingConfig::default()
		};
		assert!(config.validate().is_err());

		let config = TrainingConfig {
			model: ModelConfig::Embedding { embedding_dim: 8, hidden: 8, learning_rate: 0.0 },
			..TrainingConfig::default()
		};
		assert!(config.validate().is_err());
	}
}
