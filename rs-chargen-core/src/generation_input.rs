use crate::error::{ChargenError, ChargenResult};

/// Strategy used to select the seed window when generating a sequence.
///
/// # Variants
/// - `Random`: a window of the corpus starting at a uniformly drawn offset.
/// - `Custom(String)`: user text; its trailing window is used as the first
///   model input, and every character must be in the vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub enum StartSeed {
	Random,
	Custom(String),
}

/// Input parameters of one generation run.
///
/// # Invariants
/// - `temperature` is finite and strictly positive
pub struct GenerationInput {
	/// Number of characters appended to the seed.
	pub length: usize,

	pub start_seed: StartSeed,

	temperature: f64,
}

impl GenerationInput {
	/// # Errors
	/// Returns `InvalidTemperature` if `temperature` is not strictly positive.
	pub fn new(temperature: f64, length: usize, start_seed: StartSeed) -> ChargenResult<Self> {
		let mut input = Self { length, start_seed, temperature: 1.0 };
		input.set_temperature(temperature)?;
		Ok(input)
	}

	/// Returns the current temperature.
	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	/// Sets the sampling temperature.
	///
	/// # Errors
	/// Returns an error if the value is not finite and strictly positive.
	pub fn set_temperature(&mut self, temperature: f64) -> ChargenResult<()> {
		if !(temperature > 0.0) || !temperature.is_finite() {
			return Err(ChargenError::InvalidTemperature(temperature));
		}
		self.temperature = temperature;
		Ok(())
	}
}

impl StartSeed {
	/// Parses the textual form used by the HTTP API.
	///
	/// Accepted values: `random` and `custom:<text>` (prefixes are case-insensitive).
	pub fn parse(value: &str) -> ChargenResult<Self> {
		const CUSTOM: &str = "custom:";

		if value.eq_ignore_ascii_case("random") {
			return Ok(StartSeed::Random);
		}
		match value.get(..CUSTOM.len()) {
			Some(prefix) if prefix.eq_ignore_ascii_case(CUSTOM) => {
				let text = &value[CUSTOM.len()..];
				if text.is_empty() {
					Err(ChargenError::InvalidConfig("custom seed cannot be empty".to_owned()))
				} else {
					Ok(StartSeed::Custom(text.to_owned()))
				}
			}
			_ => Err(ChargenError::InvalidConfig("seed must be 'random' or start with 'custom:'".to_owned())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_temperature_validation() {
		assert!(GenerationInput::new(0.0, 10, StartSeed::Random).is_err());
		let mut input = GenerationInput::new(0.5, 10, StartSeed::Random).unwrap();
		assert_eq!(input.temperature(), 0.5);
		assert!(input.set_temperature(-1.0).is_err());
		assert_eq!(input.temperature(), 0.5);
		assert!(input.set_temperature(1.2).is_ok());
		assert_eq!(input.temperature(), 1.2);
	}

	#[test]
	fn test_parse_seed() {
		assert_eq!(StartSeed::parse("random").unwrap(), StartSeed::Random);
		assert_eq!(StartSeed::parse("RANDOM").unwrap(), StartSeed::Random);
		assert_eq!(StartSeed::parse("custom:Hello").unwrap(), StartSeed::Custom("Hello".to_owned()));
		assert_eq!(StartSeed::parse("Custom:a:b").unwrap(), StartSeed::Custom("a:b".to_owned()));
		assert!(StartSeed::parse("custom:").is_err());
		assert!(StartSeed::parse("whatever").is_err());
	}
}
