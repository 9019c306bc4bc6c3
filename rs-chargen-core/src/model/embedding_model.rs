use ndarray::{Array1, Array2, ArrayView2, Axis, Ix1, Ix2, Zip, s};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::optimizer::{AdamConfig, Moment};
use super::{Model, check_batch, check_indices};
use crate::error::{ChargenError, ChargenResult};

/// Adam state for every parameter of an `EmbeddingModel`.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct Optimizer {
	config: AdamConfig,
	step: i32,
	embedding: Moment<Ix2>,
	w1: Moment<Ix2>,
	b1: Moment<Ix1>,
	w2: Moment<Ix2>,
	b2: Moment<Ix1>,
}

/// Gradients of one batch.
struct Gradients {
	embedding: Array2<f32>,
	w1: Array2<f32>,
	b1: Array1<f32>,
	w2: Array2<f32>,
	b2: Array1<f32>,
}

/// Small feed-forward character classifier.
///
/// Topology: embedding table → flatten over the window → dense ReLU
/// hidden layer → dense softmax over the vocabulary. Trained with
/// categorical cross-entropy and Adam.
///
/// # Invariants
/// - `embedding` is `(vocab_size, embedding_dim)`
/// - `w1` is `(window_len * embedding_dim, hidden)`, `w2` is `(hidden, vocab_size)`
/// - inputs are always exactly `window_len` indices long
///
/// Adam moments and the step counter are serialized with the weights, so a
/// restored model continues training exactly where it stopped.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EmbeddingModel {
	vocab_size: usize,
	window_len: usize,
	embedding_dim: usize,
	learning_rate: f32,

	embedding: Array2<f32>,
	w1: Array2<f32>,
	b1: Array1<f32>,
	w2: Array2<f32>,
	b2: Array1<f32>,

	optimizer: Option<Optimizer>,
}

/// Glorot-uniform initialised matrix.
fn glorot<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
	let limit = (6.0 / (rows + cols) as f32).sqrt();
	Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..limit))
}

/// Row-wise softmax, in place.
fn softmax_rows(logits: &mut Array2<f32>) {
	for mut row in logits.rows_mut() {
		let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
		row.mapv_inplace(|x| (x - max).exp());
		let sum = row.sum();
		row.mapv_inplace(|x| x / sum);
	}
}

impl EmbeddingModel {
	/// Creates a randomly initialised model.
	///
	/// # Errors
	/// Returns `InvalidConfig` if any dimension is zero or the learning rate
	/// is not strictly positive.
	pub fn new<R: Rng + ?Sized>(
		vocab_size: usize,
		window_len: usize,
		embedding_dim: usize,
		hidden: usize,
		learning_rate: f32,
		rng: &mut R,
	) -> ChargenResult<Self> {
		if vocab_size == 0 || window_len == 0 || embedding_dim == 0 || hidden == 0 {
			return Err(ChargenError::InvalidConfig("embedding model dimensions must be > 0".to_owned()));
		}
		if !(learning_rate > 0.0) {
			return Err(ChargenError::InvalidConfig("learning_rate must be > 0".to_owned()));
		}

		let embedding = Array2::from_shape_fn((vocab_size, embedding_dim), |_| rng.random_range(-0.05..0.05));
		let w1 = glorot(window_len * embedding_dim, hidden, rng);
		let w2 = glorot(hidden, vocab_size, rng);

		Ok(Self {
			vocab_size,
			window_len,
			embedding_dim,
			learning_rate,
			embedding,
			w1,
			b1: Array1::zeros(hidden),
			w2,
			b2: Array1::zeros(vocab_size),
			optimizer: None,
		})
	}

	pub fn window_len(&self) -> usize {
		self.window_len
	}

	/// Looks up and concatenates the embeddings of each window.
	///
	/// Returns shape `(batch, window_len * embedding_dim)`.
	fn embed(&self, inputs: &ArrayView2<usize>) -> Array2<f32> {
		let d = self.embedding_dim;
		let mut flat = Array2::zeros((inputs.nrows(), inputs.ncols() * d));
		for ((b, t), &idx) in inputs.indexed_iter() {
			flat.slice_mut(s![b, t * d..(t + 1) * d]).assign(&self.embedding.row(idx));
		}
		flat
	}

	/// Returns the hidden pre-activations, the hidden activations and the
	/// output probabilities.
	fn forward(&self, flat: &Array2<f32>) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
		let z1 = flat.dot(&self.w1) + &self.b1;
		let a1 = z1.mapv(|x| x.max(0.0));
		let mut probabilities = a1.dot(&self.w2) + &self.b2;
		softmax_rows(&mut probabilities);
		(z1, a1, probabilities)
	}

	fn backward(
		&self,
		inputs: &ArrayView2<usize>,
		targets: &ArrayView2<f32>,
		flat: &Array2<f32>,
		z1: &Array2<f32>,
		a1: &Array2<f32>,
		probabilities: &Array2<f32>,
	) -> Gradients {
		let batch = inputs.nrows() as f32;
		let d = self.embedding_dim;

		// softmax + cross-entropy
		let d_logits = (probabilities - targets) / batch;
		let w2 = a1.t().dot(&d_logits);
		let b2 = d_logits.sum_axis(Axis(0));

		let mut d_z1 = d_logits.dot(&self.w2.t());
		Zip::from(&mut d_z1).and(z1).for_each(|g, &z| {
			if z <= 0.0 {
				*g = 0.0;
			}
		});
		let w1 = flat.t().dot(&d_z1);
		let b1 = d_z1.sum_axis(Axis(0));

		let d_flat = d_z1.dot(&self.w1.t());
		let mut embedding = Array2::zeros(self.embedding.raw_dim());
		for ((b, t), &idx) in inputs.indexed_iter() {
			let mut row = embedding.row_mut(idx);
			row += &d_flat.slice(s![b, t * d..(t + 1) * d]);
		}

		Gradients { embedding, w1, b1, w2, b2 }
	}

	fn apply(&mut self, gradients: &Gradients) {
		let optimizer = self.optimizer.get_or_insert_with(|| Optimizer {
			config: AdamConfig::with_learning_rate(self.learning_rate),
			step: 0,
			embedding: Moment::zeros(self.embedding.raw_dim()),
			w1: Moment::zeros(self.w1.raw_dim()),
			b1: Moment::zeros(self.b1.raw_dim()),
			w2: Moment::zeros(self.w2.raw_dim()),
			b2: Moment::zeros(self.b2.raw_dim()),
		});

		optimizer.step += 1;
		let config = optimizer.config;
		let step = optimizer.step;
		optimizer.embedding.update(&mut self.embedding, &gradients.embedding, &config, step);
		optimizer.w1.update(&mut self.w1, &gradients.w1, &config, step);
		optimizer.b1.update(&mut self.b1, &gradients.b1, &config, step);
		optimizer.w2.update(&mut self.w2, &gradients.w2, &config, step);
		optimizer.b2.update(&mut self.b2, &gradients.b2, &config, step);
	}
}

impl Model for EmbeddingModel {
	fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	fn train_step(&mut self, inputs: ArrayView2<usize>, targets: ArrayView2<f32>) -> ChargenResult<f32> {
		check_batch(&inputs, &targets, self.vocab_size)?;
		if inputs.ncols() != self.window_len {
			return Err(ChargenError::Model(format!(
				"window length {} does not match the model input length {}",
				inputs.ncols(),
				self.window_len
			)));
		}

		let flat = self.embed(&inputs);
		let (z1, a1, probabilities) = self.forward(&flat);

		let loss = -Zip::from(&probabilities)
			.and(&targets)
			.fold(0.0f32, |acc, &p, &y| if y > 0.0 { acc + y * p.max(1e-12).ln() } else { acc })
			/ inputs.nrows() as f32;
		if !loss.is_finite() {
			return Err(ChargenError::Model(format!("non-finite loss {loss}")));
		}

		let gradients = self.backward(&inputs, &targets, &flat, &z1, &a1, &probabilities);
		self.apply(&gradients);

		Ok(loss)
	}

	fn predict(&self, window: &[usize]) -> ChargenResult<Vec<f32>> {
		if window.len() != self.window_len {
			return Err(ChargenError::Model(format!(
				"window length {} does not match the model input length {}",
				window.len(),
				self.window_len
			)));
		}
		check_indices(window.iter().copied(), self.vocab_size)?;

		let inputs = ArrayView2::from_shape((1, window.len()), window)
			.map_err(|e| ChargenError::Model(e.to_string()))?;
		let flat = self.embed(&inputs);
		let (_, _, probabilities) = self.forward(&flat);
		Ok(probabilities.row(0).to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ndarray::array;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn model(vocab_size: usize, window_len: usize, seed: u64) -> EmbeddingModel {
		let mut rng = StdRng::seed_from_u64(seed);
		EmbeddingModel::new(vocab_size, window_len, 4, 16, 0.01, &mut rng).unwrap()
	}

	#[test]
	fn test_new_rejects_invalid() {
		let mut rng = StdRng::seed_from_u64(0);
		assert!(EmbeddingModel::new(0, 3, 4, 4, 0.01, &mut rng).is_err());
		assert!(EmbeddingModel::new(3, 3, 4, 4, 0.0, &mut rng).is_err());
	}

	#[test]
	fn test_predict_is_a_distribution() {
		let model = model(5, 3, 1);
		let p = model.predict(&[0, 4, 2]).unwrap();
		assert_eq!(p.len(), 5);
		assert!(p.iter().all(|&x| x > 0.0));
		let sum: f32 = p.iter().sum();
		assert!((sum - 1.0).abs() < 1e-5);
	}

	#[test]
	fn test_same_seed_same_weights() {
		assert_eq!(model(5, 3, 7).predict(&[1, 2, 3]).unwrap(), model(5, 3, 7).predict(&[1, 2, 3]).unwrap());
	}

	#[test]
	fn test_predict_checks_window() {
		let model = model(5, 3, 1);
		assert!(matches!(model.predict(&[0, 1]), Err(ChargenError::Model(_))));
		assert!(matches!(model.predict(&[0, 1, 9]), Err(ChargenError::UnknownIndex { index: 9, size: 5 })));
	}

	#[test]
	fn test_learns_a_mapping() {
		let mut model = model(3, 2, 42);
		// next character is determined by the last one: 0 -> 1, 1 -> 2, 2 -> 0
		let inputs = array![[2usize, 0], [0, 1], [1, 2], [0, 0], [2, 1], [1, 2]];
		let targets = array![
			[0.0f32, 1.0, 0.0],
			[0.0, 0.0, 1.0],
			[1.0, 0.0, 0.0],
			[0.0, 1.0, 0.0],
			[0.0, 0.0, 1.0],
			[1.0, 0.0, 0.0]
		];

		let first = model.train_step(inputs.view(), targets.view()).unwrap();
		let mut last = first;
		for _ in 0..500 {
			last = model.train_step(inputs.view(), targets.view()).unwrap();
		}
		assert!(last < first);
		assert!(last < 0.2);

		let p = model.predict(&[2, 0]).unwrap();
		assert!(p[1] > 0.7);
	}

	#[test]
	fn test_restored_model_continues_training() {
		let mut model = model(3, 2, 5);
		let inputs = array![[2usize, 0], [0, 1], [1, 2]];
		let targets = array![[0.0f32, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
		for _ in 0..50 {
			model.train_step(inputs.view(), targets.view()).unwrap();
		}

		let bytes = postcard::to_stdvec(&model).unwrap();
		let mut restored: EmbeddingModel = postcard::from_bytes(&bytes).unwrap();
		let mut continued = model.clone();

		restored.train_step(inputs.view(), targets.view()).unwrap();
		continued.train_step(inputs.view(), targets.view()).unwrap();

		assert_eq!(restored.w1, continued.w1);
		assert_eq!(restored.embedding, continued.embedding);
		assert_eq!(restored.predict(&[2, 0]).unwrap(), continued.predict(&[2, 0]).unwrap());
	}

	#[test]
	fn test_train_step_checks_width() {
		let mut model = model(3, 2, 0);
		let inputs = array![[0usize, 1, 2]];
		let targets = array![[1.0f32, 0.0, 0.0]];
		assert!(matches!(model.train_step(inputs.view(), targets.view()), Err(ChargenError::Model(_))));
	}
}
