use ndarray::{Array1, Array2, ArrayView1};

use crate::data::vocabulary::Vocabulary;
use crate::data::windows::Window;
use crate::error::{ChargenError, ChargenResult};

/// Vectorized training data.
///
/// - `inputs`: `(n_windows, window_len)` matrix of vocabulary indices
/// - `targets`: `(n_windows, vocab_size)` one-hot matrix of next characters
#[derive(Clone, Debug)]
pub struct TrainingSet {
	pub inputs: Array2<usize>,
	pub targets: Array2<f32>,
}

impl TrainingSet {
	pub fn len(&self) -> usize {
		self.inputs.nrows()
	}

	pub fn is_empty(&self) -> bool {
		self.inputs.nrows() == 0
	}
}

/// Encodes a sequence of characters as vocabulary indices.
///
/// # Errors
/// Returns `UnknownSymbol` on the first character outside the vocabulary.
pub fn encode_window(vocabulary: &Vocabulary, window: &[char]) -> ChargenResult<Vec<usize>> {
	window.iter().map(|&c| vocabulary.index_of(c)).collect()
}

/// One-hot encodes a single character as a vector of length `vocabulary.size()`.
pub fn one_hot(vocabulary: &Vocabulary, c: char) -> ChargenResult<Array1<f32>> {
	let mut v = Array1::zeros(vocabulary.size());
	v[vocabulary.index_of(c)?] = 1.0;
	Ok(v)
}

/// Index of the hot entry of a one-hot row (argmax for soft rows).
pub fn hot_index(row: ArrayView1<f32>) -> usize {
	row.iter()
		.enumerate()
		.fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
		.0
}

/// Builds the training matrices from extracted windows.
///
/// # Errors
/// - `InvalidConfig` if `windows` is empty
/// - `UnknownSymbol` if a window holds a character outside `vocabulary`
pub fn vectorize(vocabulary: &Vocabulary, windows: &[Window]) -> ChargenResult<TrainingSet> {
	let window_len = match windows.first() {
		Some(w) => w.chars.len(),
		None => return Err(ChargenError::InvalidConfig("no window to vectorize".to_owned())),
	};

	let mut inputs = Array2::zeros((windows.len(), window_len));
	let mut targets = Array2::zeros((windows.len(), vocabulary.size()));

	for (row, window) in windows.iter().enumerate() {
		for (t, &c) in window.chars.iter().enumerate() {
			inputs[[row, t]] = vocabulary.index_of(c)?;
		}
		targets[[row, vocabulary.index_of(window.target)?]] = 1.0;
	}

	Ok(TrainingSet { inputs, targets })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::windows::extract_windows;

	fn setup(text: &str) -> (Vec<char>, Vocabulary) {
		let chars: Vec<char> = text.chars().collect();
		let vocab = Vocabulary::build(&chars).unwrap();
		(chars, vocab)
	}

	#[test]
	fn test_encode_window() {
		let (_, vocab) = setup("abc");
		assert_eq!(encode_window(&vocab, &['c', 'a', 'b']).unwrap(), vec![2, 0, 1]);
	}

	#[test]
	fn test_encode_unknown_symbol() {
		let (_, vocab) = setup("abc");
		assert!(matches!(encode_window(&vocab, &['a', '?']), Err(ChargenError::UnknownSymbol('?'))));
	}

	#[test]
	fn test_one_hot() {
		let (_, vocab) = setup("abcd");
		let v = one_hot(&vocab, 'c').unwrap();
		assert_eq!(v.len(), 4);
		assert_eq!(v[2], 1.0);
		assert_eq!(v.sum(), 1.0);
		assert_eq!(hot_index(v.view()), 2);
	}

	#[test]
	fn test_vectorize() {
		let (chars, vocab) = setup("abcabcabca");
		let windows = extract_windows(&chars, 3, 1);
		let set = vectorize(&vocab, &windows).unwrap();

		assert_eq!(set.len(), 7);
		assert_eq!(set.inputs.shape(), &[7, 3]);
		assert_eq!(set.targets.shape(), &[7, 3]);
		assert_eq!(set.inputs.row(0).to_vec(), vec![0, 1, 2]);
		// "abc" is followed by 'a'
		assert_eq!(hot_index(set.targets.row(0)), 0);
		for row in set.targets.rows() {
			assert_eq!(row.sum(), 1.0);
		}
	}

	#[test]
	fn test_vectorize_nothing() {
		let (_, vocab) = setup("abc");
		assert!(vectorize(&vocab, &[]).is_err());
	}
}
