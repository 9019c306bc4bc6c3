use std::io::Write;

use rand::Rng;

use crate::data::encoder::encode_window;
use crate::data::{Corpus, Vocabulary};
use crate::error::{ChargenError, ChargenResult};
use crate::generation_input::{GenerationInput, StartSeed};
use crate::model::Model;
use crate::sampler::TemperatureSampler;

/// Lifecycle of a generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationState {
	/// Buffer holds the seed window, nothing generated yet.
	Seeded,
	/// At least one character generated, more to come.
	Generating,
	/// Requested length reached.
	Done,
}

/// Resolves a `StartSeed` into seed characters.
///
/// - `Random`: `window_len` characters of the corpus at a uniform offset
/// - `Custom`: the user text, unchanged
pub fn resolve_seed<R: Rng + ?Sized>(
	start_seed: &StartSeed,
	corpus: &Corpus,
	window_len: usize,
	rng: &mut R,
) -> ChargenResult<Vec<char>> {
	match start_seed {
		StartSeed::Random => {
			let (start, window) = corpus.random_window(window_len, rng)?;
			log::debug!("seed window at offset {start}");
			Ok(window.to_vec())
		}
		StartSeed::Custom(text) => Ok(text.chars().collect()),
	}
}

/// One generation run: a growing buffer extended one sampled character at
/// a time. The model always sees the trailing `window_len` characters.
///
/// # Invariants
/// - `buffer` holds at least `window_len` characters, all in the vocabulary
/// - `buffer.len() == seed_len + generated count`
pub struct Generation<'a> {
	vocabulary: &'a Vocabulary,
	sampler: TemperatureSampler,
	window_len: usize,
	remaining: usize,
	seed_len: usize,
	buffer: Vec<char>,
	state: GenerationState,
}

impl<'a> Generation<'a> {
	/// Starts a run from seed characters.
	///
	/// # Errors
	/// - `InvalidTemperature` for a non-positive temperature
	/// - `SeedTooShort` if the seed holds fewer than `window_len` characters
	/// - `UnknownSymbol` if the seed has a character outside the vocabulary
	pub fn new(
		vocabulary: &'a Vocabulary,
		seed: &[char],
		window_len: usize,
		temperature: f64,
		length: usize,
	) -> ChargenResult<Self> {
		let sampler = TemperatureSampler::new(temperature)?;
		if window_len == 0 || seed.len() < window_len {
			return Err(ChargenError::SeedTooShort { len: seed.len(), window: window_len });
		}
		if let Some(&c) = seed.iter().find(|c| !vocabulary.contains(**c)) {
			return Err(ChargenError::UnknownSymbol(c));
		}

		Ok(Self {
			vocabulary,
			sampler,
			window_len,
			remaining: length,
			seed_len: seed.len(),
			buffer: seed.to_vec(),
			state: GenerationState::Seeded,
		})
	}

	pub fn state(&self) -> GenerationState {
		self.state
	}

	pub fn seed(&self) -> &[char] {
		&self.buffer[..self.seed_len]
	}

	/// Characters produced so far (seed excluded).
	pub fn generated(&self) -> &[char] {
		&self.buffer[self.seed_len..]
	}

	/// Seed plus generated characters.
	pub fn text(&self) -> String {
		self.buffer.iter().collect()
	}

	/// Predicts, samples and appends one character.
	///
	/// Returns `None` once the requested length is reached.
	pub fn step<M, R>(&mut self, model: &M, rng: &mut R) -> ChargenResult<Option<char>>
	where
		M: Model + ?Sized,
		R: Rng + ?Sized,
	{
		if self.remaining == 0 {
			self.state = GenerationState::Done;
			return Ok(None);
		}

		let window = &self.buffer[self.buffer.len() - self.window_len..];
		let encoded = encode_window(self.vocabulary, window)?;
		let distribution = model.predict(&encoded)?;
		if distribution.len() != self.vocabulary.size() {
			return Err(ChargenError::InvalidDistribution(format!(
				"{} entries for a vocabulary of size {}",
				distribution.len(),
				self.vocabulary.size()
			)));
		}

		let index = self.sampler.sample(&distribution, rng)?;
		let next = self.vocabulary.char_at(index)?;
		self.buffer.push(next);
		self.remaining -= 1;
		self.state = if self.remaining == 0 { GenerationState::Done } else { GenerationState::Generating };

		Ok(Some(next))
	}

	/// Runs to completion, writing each character to `out` and flushing
	/// after every step. Returns the whole buffer.
	pub fn run<M, R, W>(mut self, model: &M, rng: &mut R, out: &mut W) -> ChargenResult<String>
	where
		M: Model + ?Sized,
		R: Rng + ?Sized,
		W: Write + ?Sized,
	{
		while let Some(c) = self.step(model, rng)? {
			write!(out, "{c}")?;
			out.flush()?;
		}
		Ok(self.text())
	}
}

/// Generates text in one call, without streaming.
///
/// Returns the seed followed by `input.length` generated characters.
pub fn generate<M, R>(
	model: &M,
	corpus: &Corpus,
	vocabulary: &Vocabulary,
	window_len: usize,
	input: &GenerationInput,
	rng: &mut R,
) -> ChargenResult<String>
where
	M: Model + ?Sized,
	R: Rng + ?Sized,
{
	let seed = resolve_seed(&input.start_seed, corpus, window_len, rng)?;
	let mut generation = Generation::new(vocabulary, &seed, window_len, input.temperature(), input.length)?;
	while generation.step(model, rng)?.is_some() {}
	Ok(generation.text())
}
