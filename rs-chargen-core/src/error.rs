use thiserror::Error;

/// Every failure the library can report.
///
/// All of them are fatal to a training run: nothing is retried and nothing
/// is swallowed.
#[derive(Debug, Error)]
pub enum ChargenError {
	#[error("corpus is empty")]
	EmptyCorpus,

	#[error("corpus too short: {len} characters, the window length is {window}")]
	CorpusTooShort { len: usize, window: usize },

	#[error("unknown symbol {0:?}: not in the vocabulary")]
	UnknownSymbol(char),

	#[error("unknown index {index} for a vocabulary of size {size}")]
	UnknownIndex { index: usize, size: usize },

	#[error("invalid temperature {0}: must be strictly positive")]
	InvalidTemperature(f64),

	#[error("invalid distribution: {0}")]
	InvalidDistribution(String),

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("seed too short: {len} characters, the window length is {window}")]
	SeedTooShort { len: usize, window: usize },

	#[error("model error: {0}")]
	Model(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("checkpoint error: {0}")]
	Checkpoint(#[from] postcard::Error),
}

pub type ChargenResult<T> = Result<T, ChargenError>;
