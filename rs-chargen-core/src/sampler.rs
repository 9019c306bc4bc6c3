//! Temperature-scaled categorical sampling.
//!
//! A model distribution `p` is reshaped by a temperature `t`:
//! `q[i] = exp(ln(p[i]) / t) / sum_j exp(ln(p[j]) / t)`, then one index is
//! drawn from `q`. `t < 1` sharpens toward the arg-max, `t > 1` flattens
//! toward uniform and `t = 1` keeps `p` unchanged.

use rand::Rng;

use crate::error::{ChargenError, ChargenResult};

/// Maximum accepted distance between the sum of a distribution and 1.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Checks that `p` is a probability distribution.
///
/// Entries must be finite and non-negative and sum to 1 within
/// `DISTRIBUTION_TOLERANCE`. A failing model output is reported, never
/// silently renormalized.
pub fn check_distribution(p: &[f32]) -> ChargenResult<()> {
	if p.is_empty() {
		return Err(ChargenError::InvalidDistribution("empty distribution".to_owned()));
	}
	if let Some((i, x)) = p.iter().enumerate().find(|(_, x)| !x.is_finite() || **x < 0.0) {
		return Err(ChargenError::InvalidDistribution(format!("entry {i} is {x}")));
	}
	let sum: f64 = p.iter().map(|&x| x as f64).sum();
	if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
		return Err(ChargenError::InvalidDistribution(format!("entries sum to {sum}")));
	}
	Ok(())
}

/// Draws indices from model distributions at a fixed temperature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureSampler {
	temperature: f64,
}

impl TemperatureSampler {
	/// # Errors
	/// Returns `InvalidTemperature` unless `temperature` is finite and > 0.
	pub fn new(temperature: f64) -> ChargenResult<Self> {
		if !(temperature > 0.0) || !temperature.is_finite() {
			return Err(ChargenError::InvalidTemperature(temperature));
		}
		Ok(Self { temperature })
	}

	/// Returns the temperature-adjusted distribution `q`.
	///
	/// Zero entries map to `ln(0) = -inf` and come back as exactly 0.
	/// Log-probabilities are shifted by their maximum before the division,
	/// so the arg-max always maps to `exp(0)` however small `t` is.
	pub fn reweight(&self, p: &[f32]) -> ChargenResult<Vec<f64>> {
		check_distribution(p)?;

		let logs: Vec<f64> = p
			.iter()
			.map(|&x| if x > 0.0 { (x as f64).ln() } else { f64::NEG_INFINITY })
			.collect();

		let max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
		if max == f64::NEG_INFINITY {
			return Err(ChargenError::InvalidDistribution("all entries are zero".to_owned()));
		}

		let mut q: Vec<f64> = logs.iter().map(|&l| ((l - max) / self.temperature).exp()).collect();
		let sum: f64 = q.iter().sum();
		q.iter_mut().for_each(|x| *x /= sum);
		Ok(q)
	}

	/// Draws one index from `p` reshaped by the temperature.
	///
	/// Entries whose adjusted probability is 0 are never selected.
	pub fn sample<R: Rng + ?Sized>(&self, p: &[f32], rng: &mut R) -> ChargenResult<usize> {
		let q = self.reweight(p)?;

		let mut r: f64 = rng.random::<f64>();
		let mut fallback = None;
		for (i, &weight) in q.iter().enumerate() {
			if weight <= 0.0 {
				continue;
			}
			if r < weight {
				return Ok(i);
			}
			r -= weight;
			fallback = Some(i);
		}

		// Rounding left `r` slightly above the last bucket
		fallback.ok_or_else(|| ChargenError::InvalidDistribution("nothing to sample".to_owned()))
	}
}

/// One-shot helper: `TemperatureSampler::new(temperature)?.sample(p, rng)`.
pub fn sample<R: Rng + ?Sized>(p: &[f32], temperature: f64, rng: &mut R) -> ChargenResult<usize> {
	TemperatureSampler::new(temperature)?.sample(p, rng)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn frequencies(p: &[f32], temperature: f64, trials: usize, seed: u64) -> Vec<f64> {
		let mut rng = StdRng::seed_from_u64(seed);
		let mut counts = vec![0usize; p.len()];
		for _ in 0..trials {
			counts[sample(p, temperature, &mut rng).unwrap()] += 1;
		}
		counts.into_iter().map(|c| c as f64 / trials as f64).collect()
	}

	#[test]
	fn test_invalid_temperature() {
		let p = [0.5, 0.5];
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(sample(&p, 0.0, &mut rng), Err(ChargenError::InvalidTemperature(_))));
		assert!(matches!(sample(&p, -0.5, &mut rng), Err(ChargenError::InvalidTemperature(_))));
		assert!(TemperatureSampler::new(f64::NAN).is_err());
		assert!(TemperatureSampler::new(f64::INFINITY).is_err());
	}

	#[test]
	fn test_rejects_bad_distribution() {
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(sample(&[0.5, 0.2], 1.0, &mut rng), Err(ChargenError::InvalidDistribution(_))));
		assert!(matches!(sample(&[f32::NAN, 1.0], 1.0, &mut rng), Err(ChargenError::InvalidDistribution(_))));
		assert!(matches!(sample(&[1.5, -0.5], 1.0, &mut rng), Err(ChargenError::InvalidDistribution(_))));
		assert!(matches!(sample(&[], 1.0, &mut rng), Err(ChargenError::InvalidDistribution(_))));
	}

	#[test]
	fn test_zero_entries_never_drawn() {
		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..2000 {
			assert_eq!(sample(&[1.0, 0.0, 0.0], 0.5, &mut rng).unwrap(), 0);
		}
		for _ in 0..2000 {
			assert_ne!(sample(&[0.0, 0.5, 0.5], 3.0, &mut rng).unwrap(), 0);
		}
	}

	#[test]
	fn test_deterministic_under_seed() {
		let p = [0.1, 0.2, 0.3, 0.4];
		let a: Vec<usize> = {
			let mut rng = StdRng::seed_from_u64(1234);
			(0..50).map(|_| sample(&p, 0.7, &mut rng).unwrap()).collect()
		};
		let b: Vec<usize> = {
			let mut rng = StdRng::seed_from_u64(1234);
			(0..50).map(|_| sample(&p, 0.7, &mut rng).unwrap()).collect()
		};
		assert_eq!(a, b);
	}

	#[test]
	fn test_unit_temperature_keeps_distribution() {
		let p = [0.1, 0.2, 0.3, 0.4];
		let q = TemperatureSampler::new(1.0).unwrap().reweight(&p).unwrap();
		for (a, b) in p.iter().zip(&q) {
			assert!((*a as f64 - b).abs() < 1e-6);
		}

		let freq = frequencies(&p, 1.0, 20_000, 5);
		for (a, b) in p.iter().zip(&freq) {
			assert!((*a as f64 - b).abs() < 0.02, "expected {a}, got {b}");
		}
	}

	#[test]
	fn test_low_temperature_sharpens() {
		let p = [0.1, 0.6, 0.3];
		let cold = TemperatureSampler::new(0.05).unwrap().reweight(&p).unwrap();
		assert!(cold[1] > 0.999);

		let freq = frequencies(&p, 0.05, 2000, 9);
		assert!(freq[1] > 0.99);
	}

	#[test]
	fn test_tiny_temperature_picks_argmax() {
		let mut rng = StdRng::seed_from_u64(8);
		for temperature in [1e-300, 1e-309, f64::MIN_POSITIVE / 4.0] {
			let q = TemperatureSampler::new(temperature).unwrap().reweight(&[0.3, 0.7]).unwrap();
			assert_eq!(q, vec![0.0, 1.0]);
			assert_eq!(sample(&[0.3, 0.7], temperature, &mut rng).unwrap(), 1);
		}
	}

	#[test]
	fn test_high_temperature_flattens() {
		let p = [0.1, 0.6, 0.3];
		let warm = TemperatureSampler::new(1.2).unwrap().reweight(&p).unwrap();
		let hot = TemperatureSampler::new(50.0).unwrap().reweight(&p).unwrap();
		assert!(warm[1] < 0.6);
		assert!(hot[1] < warm[1]);
		for x in hot {
			assert!((x - 1.0 / 3.0).abs() < 0.05);
		}
	}
}
