use std::io;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_chargen_core::checkpoint::Checkpoint;
use rs_chargen_core::config::{ModelConfig, TrainingConfig};
use rs_chargen_core::data::Corpus;
use rs_chargen_core::io::build_output_path;
use rs_chargen_core::model::CharModel;
use rs_chargen_core::trainer::Trainer;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelKind {
    /// Back-off n-gram counts
    Ngram,
    /// Embedding + dense network trained with Adam
    Embedding,
}

#[derive(Parser, Debug)]
#[command(
    name = "rs-chargen-train",
    about = "Train a character-level text generator and sample from it after every iteration"
)]
struct Args {
    /// Plain-text training corpus
    corpus: PathBuf,

    /// Characters per input window
    #[arg(long, default_value_t = 80)]
    window_len: usize,

    /// Stride between two windows
    #[arg(long, default_value_t = 3)]
    step: usize,

    #[arg(long, default_value_t = 128)]
    batch_size: usize,

    /// Epochs per iteration
    #[arg(long, default_value_t = 1)]
    epochs: usize,

    #[arg(long, default_value_t = 99)]
    iterations: usize,

    /// Sampling temperatures, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [0.2, 0.5, 1.0, 1.2])]
    temperatures: Vec<f64>,

    /// Characters generated per temperature
    #[arg(long, default_value_t = 400)]
    generation_len: usize,

    /// Keep the training set order instead of shuffling every epoch
    #[arg(long)]
    no_shuffle: bool,

    #[arg(long, value_enum, default_value_t = ModelKind::Embedding)]
    model: ModelKind,

    /// N-gram order (n-gram model only)
    #[arg(long, default_value_t = 8)]
    order: usize,

    /// Additive smoothing (n-gram model only)
    #[arg(long, default_value_t = 0.01)]
    smoothing: f32,

    /// Embedding width (embedding model only)
    #[arg(long, default_value_t = 16)]
    embedding_dim: usize,

    /// Hidden layer width (embedding model only)
    #[arg(long, default_value_t = 128)]
    hidden: usize,

    /// Adam learning rate (embedding model only)
    #[arg(long, default_value_t = 0.001)]
    learning_rate: f32,

    /// Random seed; omit for a non-reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Checkpoint file (default: corpus path with a .bin extension)
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Do not write checkpoints
    #[arg(long, conflicts_with = "resume")]
    no_checkpoint: bool,

    /// Continue from the checkpoint if it exists
    #[arg(long)]
    resume: bool,
}

impl Args {
    fn config(&self) -> TrainingConfig {
        let model = match self.model {
            ModelKind::Ngram => ModelConfig::NGram { order: self.order, smoothing: self.smoothing },
            ModelKind::Embedding => ModelConfig::Embedding {
                embedding_dim: self.embedding_dim,
                hidden: self.hidden,
                learning_rate: self.learning_rate,
            },
        };

        TrainingConfig {
            window_len: self.window_len,
            step: self.step,
            batch_size: self.batch_size,
            epochs: self.epochs,
            iterations: self.iterations,
            temperatures: self.temperatures.clone(),
            generation_len: self.generation_len,
            shuffle: !self.no_shuffle,
            model,
        }
    }

    fn checkpoint_path(&self) -> io::Result<Option<PathBuf>> {
        if self.no_checkpoint {
            return Ok(None);
        }
        match &self.checkpoint {
            Some(path) => Ok(Some(path.clone())),
            None => build_output_path(&self.corpus, "bin").map(Some),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let checkpoint_path = args.checkpoint_path()?;

    // Reuse the checkpoint if asked to, the way a cached .bin model is reused
    let (trainer, mut model, first_iteration) = match &checkpoint_path {
        Some(path) if args.resume && path.exists() => {
            let checkpoint = Checkpoint::load(path)?;
            log::warn!("resuming from {}: training options come from the checkpoint", path.display());
            let trainer = checkpoint.trainer()?;
            (trainer, checkpoint.model, checkpoint.iteration + 1)
        }
        _ => {
            let corpus = Corpus::load(&args.corpus)?;
            let trainer = Trainer::new(corpus, args.config())?;
            let model = CharModel::from_config(trainer.config(), trainer.vocabulary().size(), &mut rng)?;
            (trainer, model, 1)
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    trainer.write_summary(&mut out)?;
    log::info!("training a {} model", model.kind());

    for iteration in first_iteration..=trainer.config().iterations {
        let report = trainer.run_iteration(iteration, &mut model, &mut rng, &mut out)?;
        log::info!("iteration {} done, loss {:.4}", report.iteration, report.loss);

        if let Some(path) = &checkpoint_path {
            Checkpoint::save(path, iteration, &trainer, &model)?;
        }
    }

    Ok(())
}
