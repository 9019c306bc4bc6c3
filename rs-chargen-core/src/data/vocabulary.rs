//! Character vocabulary built from the corpus.
//!
//! Characters are sorted by code point, so the same corpus always yields
//! the same indices.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{ChargenError, ChargenResult};

/// Bijection between the distinct characters of a corpus and `0..size`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vocabulary {
	/// Ordered list of characters; the position is the index.
	chars: Vec<char>,
	/// Reverse mapping from character to index.
	char_to_idx: HashMap<char, usize>,
}

impl Vocabulary {
	/// Builds the sorted vocabulary of `text`.
	///
	/// # Errors
	/// Returns `EmptyCorpus` if `text` is empty.
	pub fn build(text: &[char]) -> ChargenResult<Self> {
		if text.is_empty() {
			return Err(ChargenError::EmptyCorpus);
		}
		let chars: Vec<char> = text.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
		let char_to_idx = chars.iter().enumerate().map(|(i, &c)| (c, i)).collect();
		Ok(Self { chars, char_to_idx })
	}

	/// Number of characters in the vocabulary.
	pub fn size(&self) -> usize {
		self.chars.len()
	}

	pub fn chars(&self) -> &[char] {
		&self.chars
	}

	/// # Errors
	/// Returns `UnknownSymbol` if `c` never appeared in the corpus.
	pub fn index_of(&self, c: char) -> ChargenResult<usize> {
		self.char_to_idx.get(&c).copied().ok_or(ChargenError::UnknownSymbol(c))
	}

	/// # Errors
	/// Returns `UnknownIndex` if `idx >= size()`.
	pub fn char_at(&self, idx: usize) -> ChargenResult<char> {
		self.chars
			.get(idx)
			.copied()
			.ok_or(ChargenError::UnknownIndex { index: idx, size: self.chars.len() })
	}

	pub fn contains(&self, c: char) -> bool {
		self.char_to_idx.contains_key(&c)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vocab(text: &str) -> Vocabulary {
		let chars: Vec<char> = text.chars().collect();
		Vocabulary::build(&chars).unwrap()
	}

	#[test]
	fn test_sorted_and_distinct() {
		let v = vocab("hello world");
		assert_eq!(v.chars(), &[' ', 'd', 'e', 'h', 'l', 'o', 'r', 'w']);
		assert_eq!(v.size(), 8);
	}

	#[test]
	fn test_bijection() {
		let text = "The quick brown fox, jumps; over the lazy dog!\n";
		let v = vocab(text);
		for c in text.chars() {
			assert_eq!(v.char_at(v.index_of(c).unwrap()).unwrap(), c);
		}
		for i in 0..v.size() {
			assert_eq!(v.index_of(v.char_at(i).unwrap()).unwrap(), i);
		}
	}

	#[test]
	fn test_deterministic() {
		assert_eq!(vocab("zyxabc").chars(), vocab("abczyx").chars());
	}

	#[test]
	fn test_unknown() {
		let v = vocab("abc");
		assert!(matches!(v.index_of('z'), Err(ChargenError::UnknownSymbol('z'))));
		assert!(matches!(v.char_at(3), Err(ChargenError::UnknownIndex { index: 3, size: 3 })));
	}

	#[test]
	fn test_empty() {
		assert!(matches!(Vocabulary::build(&[]), Err(ChargenError::EmptyCorpus)));
	}
}
