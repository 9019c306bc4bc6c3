use std::io::Write;

use ndarray::Axis;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::TrainingConfig;
use crate::data::encoder::vectorize;
use crate::data::windows::extract_windows;
use crate::data::{Corpus, TrainingSet, Vocabulary};
use crate::error::{ChargenError, ChargenResult};
use crate::generator::Generation;
use crate::model::Model;

/// Text generated at one temperature.
#[derive(Clone, Debug)]
pub struct Sample {
	pub temperature: f64,
	/// Seed window followed by the generated characters.
	pub text: String,
}

/// Outcome of one outer iteration.
#[derive(Clone, Debug)]
pub struct IterationReport {
	pub iteration: usize,
	/// Mean batch loss of the last epoch.
	pub loss: f32,
	/// Corpus offset of the seed window shared by every sample.
	pub seed_offset: usize,
	pub samples: Vec<Sample>,
}

/// Drives the train/sample cycle over one corpus.
///
/// # Responsibilities
/// - Validate the configuration and the corpus before any work
/// - Build the vocabulary and the vectorized training set once
/// - Run epochs of mini-batch training on any `Model`
/// - Sample text at every configured temperature after each iteration
pub struct Trainer {
	config: TrainingConfig,
	corpus: Corpus,
	vocabulary: Vocabulary,
	training_set: TrainingSet,
}

impl Trainer {
	/// Vectorizes `corpus` according to `config`.
	///
	/// # Errors
	/// - Any `TrainingConfig::validate` error
	/// - `CorpusTooShort` if the corpus cannot hold a window and its target
	pub fn new(corpus: Corpus, config: TrainingConfig) -> ChargenResult<Self> {
		config.validate()?;
		corpus.ensure_fits(config.window_len)?;

		let vocabulary = Vocabulary::build(corpus.chars())?;
		let windows = extract_windows(corpus.chars(), config.window_len, config.step);
		if windows.is_empty() {
			return Err(ChargenError::CorpusTooShort { len: corpus.len(), window: config.window_len });
		}
		let training_set = vectorize(&vocabulary, &windows)?;

		log::info!(
			"corpus of {} characters, {} distinct, {} sequences",
			corpus.len(),
			vocabulary.size(),
			training_set.len()
		);

		Ok(Self { config, corpus, vocabulary, training_set })
	}

	pub fn config(&self) -> &TrainingConfig {
		&self.config
	}

	pub fn corpus(&self) -> &Corpus {
		&self.corpus
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn training_set(&self) -> &TrainingSet {
		&self.training_set
	}

	/// Prints the corpus statistics.
	pub fn write_summary<W: Write + ?Sized>(&self, out: &mut W) -> ChargenResult<()> {
		writeln!(out, "corpus length: {}", self.corpus.len())?;
		writeln!(out, "total chars: {}", self.vocabulary.size())?;
		writeln!(out, "nb sequences: {}", self.training_set.len())?;
		Ok(())
	}

	/// One pass over the training set in `batch_size` chunks.
	///
	/// Returns the mean batch loss.
	pub fn fit_epoch<M, R>(&self, model: &mut M, rng: &mut R) -> ChargenResult<f32>
	where
		M: Model + ?Sized,
		R: Rng + ?Sized,
	{
		let mut order: Vec<usize> = (0..self.training_set.len()).collect();
		if self.config.shuffle {
			order.shuffle(rng);
		}

		let mut total = 0.0f64;
		let mut batches = 0usize;
		for (batch, rows) in order.chunks(self.config.batch_size).enumerate() {
			let inputs = self.training_set.inputs.select(Axis(0), rows);
			let targets = self.training_set.targets.select(Axis(0), rows);

			let loss = model.train_step(inputs.view(), targets.view())?;
			if !loss.is_finite() {
				return Err(ChargenError::Model(format!("non-finite loss {loss} at batch {batch}")));
			}
			log::debug!("batch {batch}: loss {loss:.4}");

			total += loss as f64;
			batches += 1;
		}

		Ok((total / batches.max(1) as f64) as f32)
	}

	/// Trains for `epochs`, then samples from one random seed window at
	/// each temperature, streaming everything to `out`.
	pub fn run_iteration<M, R, W>(
		&self,
		iteration: usize,
		model: &mut M,
		rng: &mut R,
		out: &mut W,
	) -> ChargenResult<IterationReport>
	where
		M: Model + ?Sized,
		R: Rng + ?Sized,
		W: Write + ?Sized,
	{
		writeln!(out)?;
		writeln!(out, "{}", "-".repeat(50))?;
		writeln!(out, "Iteration {iteration}")?;

		let mut loss = 0.0;
		for epoch in 1..=self.config.epochs {
			loss = self.fit_epoch(model, rng)?;
			log::info!("iteration {iteration}, epoch {epoch}/{}: loss {loss:.4}", self.config.epochs);
		}

		let window_len = self.config.window_len;
		let (seed_offset, seed) = self.corpus.random_window(window_len, rng)?;
		let seed_text: String = seed.iter().collect();

		let mut samples = Vec::with_capacity(self.config.temperatures.len());
		for &temperature in &self.config.temperatures {
			writeln!(out)?;
			writeln!(out, "----- diversity: {temperature:?}")?;
			writeln!(out, "----- Generating with seed: \"{seed_text}\"")?;
			write!(out, "{seed_text}")?;

			let generation =
				Generation::new(&self.vocabulary, seed, window_len, temperature, self.config.generation_len)?;
			let text = generation.run(&*model, rng, out)?;
			writeln!(out)?;

			samples.push(Sample { temperature, text });
		}

		Ok(IterationReport { iteration, loss, seed_offset, samples })
	}

	/// Runs iterations `1..=iterations`.
	pub fn run<M, R, W>(&self, model: &mut M, rng: &mut R, out: &mut W) -> ChargenResult<Vec<IterationReport>>
	where
		M: Model + ?Sized,
		R: Rng + ?Sized,
		W: Write + ?Sized,
	{
		let mut reports = Vec::with_capacity(self.config.iterations);
		for iteration in 1..=self.config.iterations {
			reports.push(self.run_iteration(iteration, model, rng, out)?);
		}
		Ok(reports)
	}
}
