//! Fakelog - A synthetic HTTP access log generator
//!
//! Fakelog produces realistic looking access log lines at a configurable
//! cadence, for feeding log pipelines, dashboards and ingestion load tests
//! without a real traffic source. It can be used as a command-line tool or
//! embedded as a library.
//!
//! # Example
//!
//! ```rust,no_run
//! use fakelog::{BuiltinCorpus, EmitOptions, Settings};
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 20 events per second, deviating up to 10ms from the average delay
//!     let config = Settings {
//!         rate: "20".to_string(),
//!         jitter: "10ms".to_string(),
//!         status_ok_percent: 95,
//!         ..Settings::default()
//!     }
//!     .validate()?;
//!
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!     let options = EmitOptions {
//!         count: Some(100),
//!         ..EmitOptions::default()
//!     };
//!
//!     let summary = fakelog::run(config, BuiltinCorpus, options, shutdown_rx).await?;
//!     eprintln!("Wrote {} records", summary.records);
//!
//!     Ok(())
//! }
//! ```

mod config;
mod corpus;
mod emit;
mod format;
mod generator;
mod models;
mod scheduler;
mod utils;

// Re-export the main types for library users
pub use config::{normalize_path_bounds, ConfigError, Settings, MAX_STICKY_ADDRESSES};
pub use corpus::{BuiltinCorpus, Corpus};
pub use emit::{run, run_with_writer, EmitOptions, EmitSummary};
pub use format::{format_combined, format_json, write_record, OutputFormat, TIMESTAMP_FORMAT};
pub use generator::{
    method_for_roll, sample_address, sample_body_bytes, sample_method, sample_path,
    sample_status, status_for_roll, EventGenerator, FALLBACK_STATUS_CODES, PATH_DELIMITERS,
    PATH_EXTENSIONS,
};
pub use models::{
    GenerationConfig, HttpMethod, LogRecord, MethodWeights, PathBounds, MAX_DELAY,
};
pub use scheduler::{
    fuzzy_delay, spawn_fire_signals, FuzzyScheduler, Scheduler, UniformScheduler,
    FIRE_SIGNAL_BUFFER,
};
pub use utils::{parse_jitter, parse_rate};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Helper function to generate a batch of records without any scheduling
pub fn sample_records(config: GenerationConfig, count: usize, seed: u64) -> Vec<LogRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let generator = EventGenerator::new(config, BuiltinCorpus, &mut rng);
    (0..count)
        .map(|_| generator.generate(&mut rng, Utc::now().fixed_offset()))
        .collect()
}
