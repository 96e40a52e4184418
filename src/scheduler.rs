//! Decides when the next record fires.
//!
//! Two strategies exist, picked once from the config: a uniform ticker with a
//! fixed period, and a fuzzy one that draws every delay uniformly from
//! `[average - jitter, average + jitter]`.

use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::models::{GenerationConfig, MAX_DELAY};

/// Slots in the handoff channel between the timing task and the consumer.
/// The producer waits when the slot is taken.
pub const FIRE_SIGNAL_BUFFER: usize = 1;

/// Fires at a fixed period, anchored to the first tick so delays do not accumulate
#[derive(Debug)]
pub struct UniformScheduler {
    period: Duration,
    interval: Option<Interval>,
}

impl UniformScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            // tokio intervals reject a zero period
            period: period.max(Duration::from_nanos(1)),
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn next_fire(&mut self) -> Instant {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            // Late ticks are delivered back to back rather than skipped
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            interval
        });
        interval.tick().await
    }
}

/// Fires after a freshly randomized delay each time
#[derive(Debug)]
pub struct FuzzyScheduler {
    average_secs: f64,
    jitter_secs: f64,
    rng: StdRng,
}

impl FuzzyScheduler {
    pub fn new(average: Duration, jitter_secs: f64, rng: StdRng) -> Self {
        Self {
            average_secs: average.as_secs_f64(),
            jitter_secs,
            rng,
        }
    }

    /// Draw the delay until the next fire
    pub fn next_delay(&mut self) -> Duration {
        let scale = self.rng.gen_range(-1.0..=1.0);
        fuzzy_delay(self.average_secs, self.jitter_secs, scale)
    }

    pub async fn next_fire(&mut self) -> Instant {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Instant::now()
    }
}

/// `average + scale * jitter` seconds, where zero or negative means fire immediately.
///
/// Delays longer than [`MAX_DELAY`] are capped.
pub fn fuzzy_delay(average_secs: f64, jitter_secs: f64, scale: f64) -> Duration {
    let secs = average_secs + scale * jitter_secs;
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
}

/// Timing strategy
#[derive(Debug)]
pub enum Scheduler {
    Uniform(UniformScheduler),
    Fuzzy(FuzzyScheduler),
}

impl Scheduler {
    /// Fuzzy when the config carries jitter, uniform otherwise
    pub fn from_config(config: &GenerationConfig, rng: StdRng) -> Self {
        let average = config.average_delay();
        if config.jitter_seconds > 0.0 {
            Scheduler::Fuzzy(FuzzyScheduler::new(average, config.jitter_seconds, rng))
        } else {
            Scheduler::Uniform(UniformScheduler::new(average))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scheduler::Uniform(_) => "uniform",
            Scheduler::Fuzzy(_) => "fuzzy",
        }
    }

    /// Wait until the next fire and return its instant
    pub async fn next_fire(&mut self) -> Instant {
        match self {
            Scheduler::Uniform(scheduler) => scheduler.next_fire().await,
            Scheduler::Fuzzy(scheduler) => scheduler.next_fire().await,
        }
    }
}

/// Run the scheduler on its own task, handing fire instants over a bounded channel.
///
/// The task ends when `shutdown` fires or the receiver is dropped.
pub fn spawn_fire_signals(
    mut scheduler: Scheduler,
    mut shutdown: broadcast::Receiver<()>,
) -> (mpsc::Receiver<Instant>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(FIRE_SIGNAL_BUFFER);

    let handle = tokio::spawn(async move {
        loop {
            let fired = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                fired = scheduler.next_fire() => fired,
            };

            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                sent = tx.send(fired) => {
                    if sent.is_err() {
                        debug!(event = "scheduler_stopped", message = "Fire signal receiver dropped");
                        return;
                    }
                }
            }
        }
        debug!(event = "scheduler_stopped", message = "Scheduler received shutdown");
    });

    (rx, handle)
}
