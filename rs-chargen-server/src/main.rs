use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use rs_chargen_core::ChargenError;
use rs_chargen_core::checkpoint::Checkpoint;
use rs_chargen_core::generation_input::{GenerationInput, StartSeed};
use rs_chargen_core::generator::generate;

/// Upper bound on the `length` query parameter.
const MAX_LENGTH: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "rs-chargen-server", about = "Serve text generated from a trained checkpoint")]
struct Args {
	/// Checkpoint written by rs-chargen-train
	checkpoint: PathBuf,

	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Random seed; omit for a non-reproducible server
	#[arg(long)]
	seed: Option<u64>,
}

/// Query parameters of the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	temperature: Option<f64>,
	length: Option<usize>,
	seed: Option<String> // "random" or "custom:<text>"
}

struct SharedData {
	checkpoint: Checkpoint,
	rng: StdRng,
}

impl GenerateParams {
	fn input(&self, default_length: usize) -> Result<GenerationInput, ChargenError> {
		let start_seed = match &self.seed {
			None => StartSeed::Random,
			Some(s) => StartSeed::parse(s)?,
		};
		let length = self.length.unwrap_or(default_length);
		if length > MAX_LENGTH {
			return Err(ChargenError::InvalidConfig(format!("length must be <= {MAX_LENGTH}")));
		}
		GenerationInput::new(self.temperature.unwrap_or(1.0), length, start_seed)
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Returns the seed followed by the generated characters.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let input = match query.input(shared_data.checkpoint.config.generation_len) {
		Ok(input) => input,
		Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
	};

	let SharedData { checkpoint, rng } = &mut *shared_data;
	match generate(
		&checkpoint.model,
		&checkpoint.corpus,
		&checkpoint.vocabulary,
		checkpoint.config.window_len,
		&input,
		rng,
	) {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e @ (ChargenError::UnknownSymbol(_) | ChargenError::SeedTooShort { .. })) => {
			HttpResponse::BadRequest().body(e.to_string())
		}
		Err(e) => {
			log::error!("generation failed: {e}");
			HttpResponse::InternalServerError().body(e.to_string())
		}
	}
}

#[get("/v1/vocabulary")]
async fn get_vocabulary(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.checkpoint.vocabulary.chars().iter().collect::<String>())
}

#[get("/v1/config")]
async fn get_config(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(&shared_data.checkpoint.config)
}

/// Main entry point for the server.
///
/// Loads the checkpoint, wraps it in a `Mutex` with the random source,
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let checkpoint = Checkpoint::load(&args.checkpoint).map_err(|e| io::Error::other(e.to_string()))?;
	let rng = match args.seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};
	let shared_data = web::Data::new(Mutex::new(SharedData { checkpoint, rng }));

	log::info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_vocabulary)
			.service(get_config)
	})
		.workers(num_cpus::get())
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
