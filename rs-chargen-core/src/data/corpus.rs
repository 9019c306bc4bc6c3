use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ChargenError, ChargenResult};
use crate::io::read_text;

/// The full training text, stored as characters so that windows are
/// addressed by character offset rather than by byte.
///
/// # Invariants
/// - Never empty
/// - Never modified after construction
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Corpus {
	chars: Vec<char>,
}

impl Corpus {
	/// Builds a corpus from in-memory text.
	///
	/// # Errors
	/// Returns `EmptyCorpus` if `text` has no character.
	pub fn from_text(text: &str) -> ChargenResult<Self> {
		let chars: Vec<char> = text.chars().collect();
		if chars.is_empty() {
			return Err(ChargenError::EmptyCorpus);
		}
		Ok(Self { chars })
	}

	/// Reads a plain-text file once, as a raw character stream.
	pub fn load<P: AsRef<Path>>(filepath: P) -> ChargenResult<Self> {
		let text = read_text(filepath)?;
		Self::from_text(&text)
	}

	/// Number of characters (not bytes).
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	/// Fails unless the corpus holds at least one full window plus its target.
	pub fn ensure_fits(&self, window_len: usize) -> ChargenResult<()> {
		if self.chars.len() <= window_len {
			return Err(ChargenError::CorpusTooShort { len: self.chars.len(), window: window_len });
		}
		Ok(())
	}

	/// Picks a seed window uniformly among offsets `[0, len - window_len - 1]`.
	///
	/// Returns the offset and the `window_len` characters starting there.
	pub fn random_window<R: Rng + ?Sized>(&self, window_len: usize, rng: &mut R) -> ChargenResult<(usize, &[char])> {
		self.ensure_fits(window_len)?;
		let start = rng.random_range(0..self.chars.len() - window_len);
		Ok((start, &self.chars[start..start + window_len]))
	}
}
