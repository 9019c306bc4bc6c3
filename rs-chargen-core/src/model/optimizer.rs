use ndarray::{Array, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Adam hyper-parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct AdamConfig {
	pub learning_rate: f32,
	pub beta1: f32,
	pub beta2: f32,
	pub epsilon: f32,
}

impl AdamConfig {
	/// Standard Adam constants with the given learning rate.
	pub fn with_learning_rate(learning_rate: f32) -> Self {
		Self { learning_rate, beta1: 0.9, beta2: 0.999, epsilon: 1e-7 }
	}
}

/// First and second moment estimates of one parameter tensor.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Moment<D: Dimension> {
	m: Array<f32, D>,
	v: Array<f32, D>,
}

impl<D: Dimension> Moment<D> {
	pub fn zeros(dim: D) -> Self {
		Self { m: Array::zeros(dim.clone()), v: Array::zeros(dim) }
	}

	/// Applies one bias-corrected Adam update to `param`.
	///
	/// `step` starts at 1. Shapes of `param` and `grad` must match the moment.
	pub fn update(&mut self, param: &mut Array<f32, D>, grad: &Array<f32, D>, config: &AdamConfig, step: i32) {
		let m_correction = 1.0 - config.beta1.powi(step);
		let v_correction = 1.0 - config.beta2.powi(step);

		Zip::from(param)
			.and(&mut self.m)
			.and(&mut self.v)
			.and(grad)
			.for_each(|p, m, v, &g| {
				*m = config.beta1 * *m + (1.0 - config.beta1) * g;
				*v = config.beta2 * *v + (1.0 - config.beta2) * g * g;
				let m_hat = *m / m_correction;
				let v_hat = *v / v_correction;
				*p -= config.learning_rate * m_hat / (v_hat.sqrt() + config.epsilon);
			});
	}
}
