/// A window of the corpus and the character that follows it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window<'a> {
	/// Offset of the first character in the corpus.
	pub start: usize,
	pub chars: &'a [char],
	pub target: char,
}

/// Cuts `text` into semi-redundant windows of `window_len` characters,
/// starting every `step` characters.
///
/// A window starting at `i` is kept while `i + window_len < text.len()`, so
/// that it always has a target. Windows come out in increasing `start`
/// order. The result is empty when `text.len() <= window_len`.
///
/// `step` must be non-zero (checked by `TrainingConfig::validate`).
pub fn extract_windows(text: &[char], window_len: usize, step: usize) -> Vec<Window<'_>> {
	if text.len() <= window_len || step == 0 {
		return Vec::new();
	}

	(0..text.len() - window_len)
		.step_by(step)
		.map(|i| Window {
			start: i,
			chars: &text[i..i + window_len],
			target: text[i + window_len],
		})
		.collect()
}

/// Number of windows `extract_windows` would return.
pub fn window_count(text_len: usize, window_len: usize, step: usize) -> usize {
	if text_len <= window_len || step == 0 {
		return 0;
	}
	(text_len - window_len).div_ceil(step)
}
