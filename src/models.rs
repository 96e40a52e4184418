use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Head,
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    /// Every method the fallback branch may pick from
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Head,
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
    ];

    /// Methods that carry a configurable weight, in evaluation order
    pub const WEIGHTED: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-method percentages for GET, POST, PUT, PATCH and DELETE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodWeights {
    pub get: u8,
    pub post: u8,
    pub put: u8,
    pub patch: u8,
    pub delete: u8,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            get: 60,
            post: 30,
            put: 0,
            patch: 0,
            delete: 0,
        }
    }
}

impl MethodWeights {
    /// Sum of every explicit weight
    pub fn total(&self) -> u32 {
        self.as_array().iter().map(|w| *w as u32).sum()
    }

    /// Running totals of the weights, paired with their method, in evaluation order.
    ///
    /// A single roll is compared against these thresholds one after another;
    /// the first threshold that is not below the roll wins.
    pub fn thresholds(&self) -> [(HttpMethod, u32); 5] {
        let weights = self.as_array();
        let mut running = 0u32;
        let mut thresholds = [(HttpMethod::Get, 0u32); 5];
        for (i, method) in HttpMethod::WEIGHTED.iter().enumerate() {
            running += weights[i] as u32;
            thresholds[i] = (*method, running);
        }
        thresholds
    }

    fn as_array(&self) -> [u8; 5] {
        [self.get, self.post, self.put, self.patch, self.delete]
    }
}

/// Inclusive path segment count bounds, always `1 <= min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PathBounds {
    pub min: u32,
    pub max: u32,
}

/// Validated generation parameters
///
/// Built once by [`crate::Settings::validate`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationConfig {
    /// Rate of fire signals (events per second)
    pub events_per_second: f64,
    /// Scheduling jitter in seconds, zero means perfectly periodic
    pub jitter_seconds: f64,
    /// Chance (0-100) that a fresh address is IPv4
    pub ipv4_percent: u8,
    /// Sticky address pool size, zero disables pooling
    pub sticky_address_pool_size: usize,
    /// Chance (0-100) that a record gets status 200
    pub status_ok_percent: u8,
    /// Path segment count bounds
    pub path: PathBounds,
    /// Method weights
    pub method_weights: MethodWeights,
    /// Emit the historical `.hmtl` extension instead of `.html`
    pub legacy_extensions: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            events_per_second: 1.0,
            jitter_seconds: 0.0,
            ipv4_percent: 100,
            sticky_address_pool_size: 0,
            status_ok_percent: 80,
            path: PathBounds { min: 1, max: 5 },
            method_weights: MethodWeights::default(),
            legacy_extensions: false,
        }
    }
}

impl GenerationConfig {
    /// Average delay between two fire signals, capped at [`MAX_DELAY`]
    pub fn average_delay(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.events_per_second)
            .map_or(MAX_DELAY, |delay| delay.min(MAX_DELAY))
    }
}

/// Longest delay between two fire signals, and the largest accepted jitter
pub const MAX_DELAY: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// A single synthetic access log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// IPv4 or IPv6 client address in textual form
    pub client_address: String,
    /// When the record was generated
    pub timestamp: DateTime<FixedOffset>,
    /// Request method
    pub method: HttpMethod,
    /// Request path, always starting with `/`
    pub path: String,
    /// Protocol version, always `HTTP/1.1`
    pub protocol_version: &'static str,
    /// Response status code
    pub status_code: u16,
    /// Response body size in bytes
    pub body_bytes: u32,
    /// Referrer, always `-`
    pub referrer: &'static str,
    /// Client user agent
    pub user_agent: String,
}
