//! Configuration surface and its validation into a [`GenerationConfig`].
//!
//! Every knob can be set either as a command-line flag or through the
//! environment variable named next to it. Absence means default, never error.

use clap::Args;
use std::time::Duration;
use thiserror::Error;

use crate::models::{GenerationConfig, MethodWeights, PathBounds, MAX_DELAY};
use crate::utils::{parse_jitter, parse_rate};

/// Errors that make a configuration unusable
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// Rate could not be parsed or is not a positive finite number
    #[error("invalid rate '{value}': {reason}")]
    InvalidRate { value: String, reason: String },

    /// Jitter could not be parsed or is negative
    #[error("invalid jitter '{value}': {reason}")]
    InvalidJitter { value: String, reason: String },

    /// A percentage outside 0..=100
    #[error("{name} must be between 0 and 100, got {value}")]
    PercentOutOfRange { name: &'static str, value: i64 },

    /// Sticky pool size below zero
    #[error("sticky address pool size must not be negative, got {0}")]
    NegativePoolSize(i64),

    /// Sticky pool size above [`MAX_STICKY_ADDRESSES`]
    #[error("sticky address pool size must be at most {max}, got {value}")]
    PoolTooLarge { value: i64, max: usize },

    /// Method weights leave no room for the remaining methods
    #[error("HTTP method percentages add up to {0}, they must stay below 100")]
    MethodWeightsExceeded(u32),
}

/// Largest accepted sticky address pool size
pub const MAX_STICKY_ADDRESSES: usize = 65_536;

/// Raw, unvalidated generation settings
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Events per second, either a number ("10", "0.5") or "<count>/<duration>" ("50/1s")
    #[arg(long, env = "RATE", default_value = "1")]
    pub rate: String,

    /// Random deviation around the average delay, in seconds or as a duration ("250ms") [0 = periodic]
    #[arg(long, env = "JITTER", default_value = "0")]
    pub jitter: String,

    /// Percentage of IPv4 client addresses, the rest are IPv6
    #[arg(long = "ipv4-percent", env = "IPV4_PERCENT", default_value = "100")]
    pub ipv4_percent: i64,

    /// Reuse a pool of this many (+1) client addresses [0 = fresh address per event]
    #[arg(long = "same-ip-addresses", env = "SAME_IP_ADDRESSES", default_value = "0")]
    pub same_ip_addresses: i64,

    /// Percentage of responses with status 200
    #[arg(long = "status-ok-percent", env = "STATUS_OK_PERCENT", default_value = "80")]
    pub status_ok_percent: i64,

    /// Minimum number of path segments
    #[arg(long = "path-min", env = "PATH_MIN", default_value = "1", allow_negative_numbers = true)]
    pub path_min: i64,

    /// Maximum number of path segments
    #[arg(long = "path-max", env = "PATH_MAX", default_value = "5", allow_negative_numbers = true)]
    pub path_max: i64,

    /// Percentage of GET requests
    #[arg(long = "get-percent", env = "GET_PERCENT", default_value = "60")]
    pub get_percent: i64,

    /// Percentage of POST requests
    #[arg(long = "post-percent", env = "POST_PERCENT", default_value = "30")]
    pub post_percent: i64,

    /// Percentage of PUT requests
    #[arg(long = "put-percent", env = "PUT_PERCENT", default_value = "0")]
    pub put_percent: i64,

    /// Percentage of PATCH requests
    #[arg(long = "patch-percent", env = "PATCH_PERCENT", default_value = "0")]
    pub patch_percent: i64,

    /// Percentage of DELETE requests
    #[arg(long = "delete-percent", env = "DELETE_PERCENT", default_value = "0")]
    pub delete_percent: i64,

    /// Use the historical ".hmtl" file extension instead of ".html"
    #[arg(long = "legacy-extensions", env = "LEGACY_EXTENSIONS")]
    pub legacy_extensions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate: "1".to_string(),
            jitter: "0".to_string(),
            ipv4_percent: 100,
            same_ip_addresses: 0,
            status_ok_percent: 80,
            path_min: 1,
            path_max: 5,
            get_percent: 60,
            post_percent: 30,
            put_percent: 0,
            patch_percent: 0,
            delete_percent: 0,
            legacy_extensions: false,
        }
    }
}

impl Settings {
    /// Check and normalize the settings into an immutable generation config
    pub fn validate(&self) -> Result<GenerationConfig, ConfigError> {
        let events_per_second = parse_rate(&self.rate).map_err(|e| ConfigError::InvalidRate {
            value: self.rate.clone(),
            reason: format!("{:#}", e),
        })?;
        if !fits_delay(1.0 / events_per_second) {
            return Err(ConfigError::InvalidRate {
                value: self.rate.clone(),
                reason: format!(
                    "average delay must not exceed {}",
                    humantime::format_duration(MAX_DELAY)
                ),
            });
        }

        let jitter_seconds = parse_jitter(&self.jitter).map_err(|e| ConfigError::InvalidJitter {
            value: self.jitter.clone(),
            reason: format!("{:#}", e),
        })?;
        if !fits_delay(jitter_seconds) {
            return Err(ConfigError::InvalidJitter {
                value: self.jitter.clone(),
                reason: format!("jitter must not exceed {}", humantime::format_duration(MAX_DELAY)),
            });
        }

        let ipv4_percent = percent("ipv4 percent", self.ipv4_percent)?;
        let status_ok_percent = percent("status ok percent", self.status_ok_percent)?;

        let method_weights = MethodWeights {
            get: percent("GET percent", self.get_percent)?,
            post: percent("POST percent", self.post_percent)?,
            put: percent("PUT percent", self.put_percent)?,
            patch: percent("PATCH percent", self.patch_percent)?,
            delete: percent("DELETE percent", self.delete_percent)?,
        };
        let total = method_weights.total();
        if total >= 100 {
            return Err(ConfigError::MethodWeightsExceeded(total));
        }

        if self.same_ip_addresses < 0 {
            return Err(ConfigError::NegativePoolSize(self.same_ip_addresses));
        }
        if self.same_ip_addresses as u64 > MAX_STICKY_ADDRESSES as u64 {
            return Err(ConfigError::PoolTooLarge {
                value: self.same_ip_addresses,
                max: MAX_STICKY_ADDRESSES,
            });
        }

        Ok(GenerationConfig {
            events_per_second,
            jitter_seconds,
            ipv4_percent,
            sticky_address_pool_size: self.same_ip_addresses as usize,
            status_ok_percent,
            path: normalize_path_bounds(self.path_min, self.path_max),
            method_weights,
            legacy_extensions: self.legacy_extensions,
        })
    }
}

/// Clamp both bounds to at least 1, then swap them if they are inverted
pub fn normalize_path_bounds(min: i64, max: i64) -> PathBounds {
    let clamp = |v: i64| v.clamp(1, u32::MAX as i64) as u32;
    let (min, max) = (clamp(min), clamp(max));
    if min > max {
        PathBounds { min: max, max: min }
    } else {
        PathBounds { min, max }
    }
}

fn fits_delay(secs: f64) -> bool {
    Duration::try_from_secs_f64(secs).is_ok_and(|delay| delay <= MAX_DELAY)
}

fn percent(name: &'static str, value: i64) -> Result<u8, ConfigError> {
    if (0..=100).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ConfigError::PercentOutOfRange { name, value })
    }
}
