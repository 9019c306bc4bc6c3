use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::io;

/// Reads a whole text file as a single string.
///
/// The content is kept verbatim: no line splitting, no normalization.
pub fn read_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_build_output_path() {
		let path = build_output_path("data/magic_cards.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/magic_cards.bin"));
	}

	#[test]
	fn test_build_output_path_without_parent() {
		let path = build_output_path("corpus.txt", "bin").unwrap();
		assert_eq!(path, PathBuf::from("corpus.bin"));
	}

	#[test]
	fn test_build_output_path_rejects_empty() {
		assert!(build_output_path("", "bin").is_err());
	}
}
