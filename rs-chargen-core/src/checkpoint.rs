use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::data::{Corpus, Vocabulary};
use crate::error::{ChargenError, ChargenResult};
use crate::model::{CharModel, Model};
use crate::trainer::Trainer;

/// A trained session, as written to disk.
///
/// The corpus is stored too, so that random seed windows can be drawn
/// without the training text file.
#[derive(Serialize, Deserialize, Debug)]
pub struct Checkpoint {
	/// Last completed outer iteration.
	pub iteration: usize,
	pub config: TrainingConfig,
	pub vocabulary: Vocabulary,
	pub corpus: Corpus,
	pub model: CharModel,
}

/// Borrowed view with the same `postcard` layout as `Checkpoint`.
#[derive(Serialize)]
struct CheckpointRef<'a> {
	iteration: usize,
	config: &'a TrainingConfig,
	vocabulary: &'a Vocabulary,
	corpus: &'a Corpus,
	model: &'a CharModel,
}

impl Checkpoint {
	/// Writes the trainer state and `model` to `path` without cloning them.
	pub fn save<P: AsRef<Path>>(path: P, iteration: usize, trainer: &Trainer, model: &CharModel) -> ChargenResult<()> {
		let checkpoint = CheckpointRef {
			iteration,
			config: trainer.config(),
			vocabulary: trainer.vocabulary(),
			corpus: trainer.corpus(),
			model,
		};
		let bytes = postcard::to_stdvec(&checkpoint)?;
		std::fs::write(&path, bytes)?;
		log::info!("checkpoint saved to {} (iteration {iteration})", path.as_ref().display());
		Ok(())
	}

	/// Reads a checkpoint and checks that its parts agree.
	pub fn load<P: AsRef<Path>>(path: P) -> ChargenResult<Self> {
		let bytes = std::fs::read(&path)?;
		let checkpoint: Checkpoint = postcard::from_bytes(&bytes)?;
		if checkpoint.model.vocab_size() != checkpoint.vocabulary.size() {
			return Err(ChargenError::InvalidConfig(format!(
				"checkpoint model has {} classes for a vocabulary of {}",
				checkpoint.model.vocab_size(),
				checkpoint.vocabulary.size()
			)));
		}
		if let CharModel::Embedding(model) = &checkpoint.model {
			if model.window_len() != checkpoint.config.window_len {
				return Err(ChargenError::InvalidConfig(format!(
					"checkpoint model reads windows of {} for a window length of {}",
					model.window_len(),
					checkpoint.config.window_len
				)));
			}
		}
		log::info!(
			"checkpoint loaded from {} ({} model, iteration {})",
			path.as_ref().display(),
			checkpoint.model.kind(),
			checkpoint.iteration
		);
		Ok(checkpoint)
	}

	/// Rebuilds a trainer over the stored corpus and configuration.
	pub fn trainer(&self) -> ChargenResult<Trainer> {
		Trainer::new(self.corpus.clone(), self.config.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ModelConfig;
	use crate::model::EmbeddingModel;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_save_and_load() {
		let config = TrainingConfig {
			window_len: 4,
			step: 1,
			batch_size: 8,
			iterations: 1,
			generation_len: 10,
			model: ModelConfig::Embedding { embedding_dim: 3, hidden: 8, learning_rate: 0.01 },
			..TrainingConfig::default()
		};
		let corpus = Corpus::from_text("hello world, hello rust").unwrap();
		let trainer = Trainer::new(corpus, config).unwrap();
		let mut rng = StdRng::seed_from_u64(4);
		let mut model = CharModel::from_config(trainer.config(), trainer.vocabulary().size(), &mut rng).unwrap();
		trainer.fit_epoch(&mut model, &mut rng).unwrap();

		let path = std::env::temp_dir().join(format!("rs-chargen-checkpoint-{}.bin", std::process::id()));
		Checkpoint::save(&path, 3, &trainer, &model).unwrap();
		let loaded = Checkpoint::load(&path).unwrap();
		std::fs::remove_file(&path).unwrap();

		assert_eq!(loaded.iteration, 3);
		assert_eq!(&loaded.config, trainer.config());
		assert_eq!(loaded.vocabulary.chars(), trainer.vocabulary().chars());
		assert_eq!(loaded.corpus.chars(), trainer.corpus().chars());

		let window = [0, 1, 2, 3];
		assert_eq!(loaded.model.predict(&window).unwrap(), model.predict(&window).unwrap());
		assert!(loaded.trainer().is_ok());
	}

	#[test]
	fn test_load_rejects_window_mismatch() {
		let config = TrainingConfig { window_len: 4, step: 1, ..TrainingConfig::default() };
		let corpus = Corpus::from_text("hello world, hello rust").unwrap();
		let trainer = Trainer::new(corpus, config).unwrap();
		let mut rng = StdRng::seed_from_u64(4);
		let embedding = EmbeddingModel::new(trainer.vocabulary().size(), 5, 3, 8, 0.01, &mut rng).unwrap();
		let model = CharModel::Embedding(embedding);

		let path = std::env::temp_dir().join(format!("rs-chargen-window-{}.bin", std::process::id()));
		Checkpoint::save(&path, 1, &trainer, &model).unwrap();
		let loaded = Checkpoint::load(&path);
		std::fs::remove_file(&path).unwrap();

		assert!(matches!(loaded, Err(ChargenError::InvalidConfig(_))));
	}

	#[test]
	fn test_load_missing_file() {
		assert!(matches!(Checkpoint::load("does/not/exist.bin"), Err(ChargenError::Io(_))));
	}
}
