use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::format::{write_record, OutputFormat};
use crate::generator::EventGenerator;
use crate::models::GenerationConfig;
use crate::scheduler::{spawn_fire_signals, Scheduler};
use crate::utils::get_writer;

/// Where and how long to emit records
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Output file, or "stdout"
    pub output: String,
    /// Line format
    pub format: OutputFormat,
    /// Stop after this many records
    pub count: Option<u64>,
    /// Stop after this much time
    pub duration: Option<Duration>,
    /// Seed for a reproducible stream
    pub seed: Option<u64>,
    /// Stamp records in UTC instead of local time
    pub utc: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            output: "stdout".to_string(),
            format: OutputFormat::Combined,
            count: None,
            duration: None,
            seed: None,
            utc: false,
        }
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitSummary {
    /// Records written
    pub records: u64,
    /// Wall time spent emitting
    pub elapsed: Duration,
}

/// Emit records to the configured output until a limit is hit or `shutdown` fires
pub async fn run<C: Corpus>(
    config: GenerationConfig,
    corpus: C,
    options: EmitOptions,
    shutdown: broadcast::Receiver<()>,
) -> Result<EmitSummary> {
    let writer = get_writer(&options.output)?;

    let progress_bar = match options.count {
        Some(count) if options.output != "stdout" => {
            let pb = ProgressBar::new(count);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")?
                    .progress_chars("##-"),
            );
            Some(pb)
        }
        _ => None,
    };

    let summary = run_with_writer(config, corpus, &options, writer, shutdown, progress_bar.as_ref())
        .await
        .context(format!("Failed to write records to {}", options.output))?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Generation completed");
    }

    Ok(summary)
}

/// Emit records to `writer`, see [`run`]
pub async fn run_with_writer<C: Corpus, W: Write>(
    config: GenerationConfig,
    corpus: C,
    options: &EmitOptions,
    mut writer: W,
    mut shutdown: broadcast::Receiver<()>,
    progress_bar: Option<&ProgressBar>,
) -> Result<EmitSummary> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let scheduler = Scheduler::from_config(&config, StdRng::seed_from_u64(rng.r#gen()));

    info!(
        event = "generation_started",
        rate = config.events_per_second,
        jitter_seconds = config.jitter_seconds,
        scheduler = scheduler.kind(),
        sticky_addresses = config.sticky_address_pool_size,
        format = ?options.format,
        message = "Starting access log generation"
    );

    let generator = EventGenerator::new(config, corpus, &mut rng);
    let (mut fire_signals, producer) = spawn_fire_signals(scheduler, shutdown.resubscribe());

    let started = Instant::now();
    let deadline = options.duration.map(|d| started + d);
    let mut records = 0u64;

    loop {
        if options.count.is_some_and(|count| records >= count) {
            debug!(event = "count_reached", records, message = "Record limit reached");
            break;
        }

        let fired = tokio::select! {
            biased;
            _ = shutdown.recv() => {
                info!(event = "shutdown", message = "Received shutdown signal");
                break;
            }
            _ = wait_for(deadline) => {
                debug!(event = "duration_elapsed", records, message = "Run duration elapsed");
                break;
            }
            fired = fire_signals.recv() => match fired {
                Some(fired) => fired,
                None => break,
            },
        };

        let record = generator.generate(&mut rng, timestamp(options.utc));
        write_record(&mut writer, options.format, &record)?;
        records += 1;

        if let Some(pb) = progress_bar {
            pb.inc(1);
        }

        debug!(
            event = "record_emitted",
            lag_us = fired.elapsed().as_micros() as u64,
            status_code = record.status_code
        );
    }

    producer.abort();
    writer.flush()?;

    let elapsed = started.elapsed();
    info!(
        event = "generation_completed",
        records,
        elapsed = %humantime::format_duration(elapsed),
        message = "Access log generation completed"
    );

    Ok(EmitSummary { records, elapsed })
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn timestamp(utc: bool) -> DateTime<FixedOffset> {
    if utc {
        Utc::now().fixed_offset()
    } else {
        Local::now().fixed_offset()
    }
}
