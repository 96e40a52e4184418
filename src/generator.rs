//! Field samplers and the event generator that combines them into records.

use chrono::{DateTime, FixedOffset};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::debug;

use crate::config::MAX_STICKY_ADDRESSES;
use crate::corpus::Corpus;
use crate::models::{GenerationConfig, HttpMethod, LogRecord, MethodWeights, PathBounds};

pub const PROTOCOL_VERSION: &str = "HTTP/1.1";
pub const REFERRER: &str = "-";

/// Path separators, "-" and "/" repeated on purpose to bias towards them
pub const PATH_DELIMITERS: [&str; 7] = ["-", "-", "_", "%20", "/", "/", "/"];

pub const PATH_EXTENSIONS: [&str; 9] = [
    ".html", ".php", ".htm", ".jpg", ".png", ".gif", ".svg", ".css", ".js",
];

/// Extension set found in historical output, note ".hmtl"
pub const LEGACY_PATH_EXTENSIONS: [&str; 9] = [
    ".hmtl", ".php", ".htm", ".jpg", ".png", ".gif", ".svg", ".css", ".js",
];

/// Status codes used when a record is not a 200
pub const FALLBACK_STATUS_CODES: [u16; 5] = [301, 302, 400, 404, 500];

pub const OK_BODY_BYTES: (u32, u32) = (800, 3100);
pub const ERROR_BODY_BYTES: (u32, u32) = (30, 120);

/// Draw a percentage roll in `0..=100`
pub fn roll_percent<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..=100)
}

/// Whether a roll selects IPv4
pub fn ip_version_for_roll(roll: u32, ipv4_percent: u8) -> IpVersion {
    if roll <= ipv4_percent as u32 {
        IpVersion::V4
    } else {
        IpVersion::V6
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

/// Sample a fresh client address, IPv4 or IPv6 depending on the weighting
pub fn sample_address<R: Rng + ?Sized>(rng: &mut R, ipv4_percent: u8) -> String {
    match ip_version_for_roll(roll_percent(rng), ipv4_percent) {
        IpVersion::V4 => Ipv4Addr::from(rng.r#gen::<[u8; 4]>()).to_string(),
        IpVersion::V6 => Ipv6Addr::from(rng.r#gen::<[u8; 16]>()).to_string(),
    }
}

/// Consecutive duplicate draws tolerated before a duplicate is kept in the pool
const MAX_DUPLICATE_DRAWS: u32 = 64;

/// Build `size + 1` addresses to be reused across events.
///
/// Addresses are distinct unless the address space runs out, and `size` is
/// capped at [`MAX_STICKY_ADDRESSES`].
pub fn build_address_pool<R: Rng + ?Sized>(
    rng: &mut R,
    size: usize,
    ipv4_percent: u8,
) -> Vec<String> {
    if size == 0 {
        return Vec::new();
    }

    let wanted = size.min(MAX_STICKY_ADDRESSES) + 1;
    let mut seen = HashSet::with_capacity(wanted);
    let mut pool = Vec::with_capacity(wanted);
    let mut duplicates = 0;
    while pool.len() < wanted {
        let address = sample_address(rng, ipv4_percent);
        if seen.insert(address.clone()) || duplicates >= MAX_DUPLICATE_DRAWS {
            duplicates = 0;
            pool.push(address);
        } else {
            duplicates += 1;
        }
    }
    pool
}

/// Map a roll onto the cumulative method thresholds.
///
/// Returns `None` when the roll is above every threshold, in which case the
/// caller falls back to a uniformly random method.
pub fn method_for_roll(roll: u32, weights: &MethodWeights) -> Option<HttpMethod> {
    weights
        .thresholds()
        .iter()
        .find(|(_, threshold)| roll <= *threshold)
        .map(|(method, _)| *method)
}

pub fn sample_method<R: Rng + ?Sized>(rng: &mut R, weights: &MethodWeights) -> HttpMethod {
    match method_for_roll(roll_percent(rng), weights) {
        Some(method) => method,
        None => HttpMethod::ALL[rng.gen_range(0..HttpMethod::ALL.len())],
    }
}

/// Build a request path of `bounds.min..=bounds.max` words
pub fn sample_path<R, C>(rng: &mut R, corpus: &C, bounds: PathBounds, legacy: bool) -> String
where
    R: Rng,
    C: Corpus + ?Sized,
{
    let length = rng.gen_range(bounds.min..=bounds.max);
    let mut path = String::from("/");

    for i in 0..length {
        if i > 0 {
            path.push_str(pick(&PATH_DELIMITERS, rng));
        }
        path.push_str(&corpus.word(&mut *rng));
    }

    let extensions = if legacy {
        &LEGACY_PATH_EXTENSIONS
    } else {
        &PATH_EXTENSIONS
    };
    path.push_str(pick(extensions, rng));

    path.replace(' ', "%20")
}

/// Map a roll onto a status code, 200 when the roll is within the ok share
pub fn status_for_roll<R: Rng + ?Sized>(roll: u32, status_ok_percent: u8, rng: &mut R) -> u16 {
    if roll <= status_ok_percent as u32 {
        200
    } else {
        FALLBACK_STATUS_CODES[rng.gen_range(0..FALLBACK_STATUS_CODES.len())]
    }
}

pub fn sample_status<R: Rng + ?Sized>(rng: &mut R, status_ok_percent: u8) -> u16 {
    let roll = roll_percent(rng);
    status_for_roll(roll, status_ok_percent, rng)
}

/// Successful responses are larger than error bodies
pub fn sample_body_bytes<R: Rng + ?Sized>(rng: &mut R, status_code: u16) -> u32 {
    let (low, high) = if status_code == 200 {
        OK_BODY_BYTES
    } else {
        ERROR_BODY_BYTES
    };
    rng.gen_range(low..=high)
}

fn pick<R: Rng + ?Sized>(list: &[&'static str], rng: &mut R) -> &'static str {
    list.choose(rng).copied().unwrap_or_default()
}

/// Produces one [`LogRecord`] per call from a validated config
pub struct EventGenerator<C: Corpus> {
    config: GenerationConfig,
    address_pool: Vec<String>,
    corpus: C,
}

impl<C: Corpus> EventGenerator<C> {
    /// Create a generator, drawing the sticky address pool up front when enabled
    pub fn new<R: Rng + ?Sized>(config: GenerationConfig, corpus: C, rng: &mut R) -> Self {
        let address_pool =
            build_address_pool(rng, config.sticky_address_pool_size, config.ipv4_percent);

        if !address_pool.is_empty() {
            debug!(
                event = "address_pool_built",
                size = address_pool.len(),
                message = "Built sticky client address pool"
            );
        }

        Self {
            config,
            address_pool,
            corpus,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Addresses reused across events, empty when pooling is disabled
    pub fn address_pool(&self) -> &[String] {
        &self.address_pool
    }

    /// Generate a record stamped with `timestamp`
    pub fn generate<R: Rng>(&self, rng: &mut R, timestamp: DateTime<FixedOffset>) -> LogRecord {
        let client_address = match self.address_pool.choose(rng) {
            Some(address) => address.clone(),
            None => sample_address(rng, self.config.ipv4_percent),
        };
        let method = sample_method(rng, &self.config.method_weights);
        let path = sample_path(
            rng,
            &self.corpus,
            self.config.path,
            self.config.legacy_extensions,
        );
        let status_code = sample_status(rng, self.config.status_ok_percent);
        let body_bytes = sample_body_bytes(rng, status_code);
        let user_agent = self.corpus.user_agent(&mut *rng);

        LogRecord {
            client_address,
            timestamp,
            method,
            path,
            protocol_version: PROTOCOL_VERSION,
            status_code,
            body_bytes,
            referrer: REFERRER,
            user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::BuiltinCorpus;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::collections::HashMap;

    fn now() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .unwrap()
            .fixed_offset()
    }

    /// Corpus whose words contain spaces, to exercise escaping
    struct SpacedCorpus;

    impl Corpus for SpacedCorpus {
        fn user_agent(&self, _rng: &mut dyn RngCore) -> String {
            "agent".to_string()
        }

        fn word(&self, _rng: &mut dyn RngCore) -> String {
            "two words".to_string()
        }
    }

    #[test]
    fn test_status_for_roll_boundaries() {
        let mut rng = StdRng::seed_from_u64(1);
        for ok in [0u8, 37, 80, 100] {
            for roll in 0..=100u32 {
                let status = status_for_roll(roll, ok, &mut rng);
                if roll <= ok as u32 {
                    assert_eq!(status, 200, "roll {roll} ok {ok}");
                } else {
                    assert_ne!(status, 200);
                    assert!(FALLBACK_STATUS_CODES.contains(&status));
                }
            }
        }
    }

    #[test]
    fn test_body_bytes_follow_status() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1000 {
            let ok = sample_body_bytes(&mut rng, 200);
            assert!((800..=3100).contains(&ok));

            let err = sample_body_bytes(&mut rng, 404);
            assert!((30..=120).contains(&err));
        }
    }

    #[test]
    fn test_method_thresholds_are_cumulative() {
        let weights = MethodWeights {
            get: 20,
            post: 10,
            put: 5,
            patch: 5,
            delete: 5,
        };
        assert_eq!(method_for_roll(0, &weights), Some(HttpMethod::Get));
        assert_eq!(method_for_roll(20, &weights), Some(HttpMethod::Get));
        assert_eq!(method_for_roll(21, &weights), Some(HttpMethod::Post));
        assert_eq!(method_for_roll(30, &weights), Some(HttpMethod::Post));
        assert_eq!(method_for_roll(35, &weights), Some(HttpMethod::Put));
        assert_eq!(method_for_roll(40, &weights), Some(HttpMethod::Patch));
        assert_eq!(method_for_roll(45, &weights), Some(HttpMethod::Delete));
        assert_eq!(method_for_roll(46, &weights), None);
        assert_eq!(method_for_roll(100, &weights), None);
    }

    #[test]
    fn test_zero_weight_methods_are_skipped() {
        let weights = MethodWeights::default();
        for roll in 61..=90 {
            assert_eq!(method_for_roll(roll, &weights), Some(HttpMethod::Post));
        }
        for roll in 91..=100 {
            assert_eq!(method_for_roll(roll, &weights), None);
        }
    }

    #[test]
    fn test_method_distribution() {
        let mut rng = StdRng::seed_from_u64(3);
        let weights = MethodWeights::default();
        let draws = 100_000;

        let mut counts: HashMap<HttpMethod, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(sample_method(&mut rng, &weights)).or_default() += 1;
        }

        let fraction = |m| *counts.get(&m).unwrap_or(&0) as f64 / draws as f64;
        // The fallback branch can also land on GET or POST, about 10% / 7 each
        let fallback_share = 10.0 / 101.0 / HttpMethod::ALL.len() as f64;
        assert!((fraction(HttpMethod::Get) - 0.60 - fallback_share).abs() < 0.02);
        assert!((fraction(HttpMethod::Post) - 0.30 - fallback_share).abs() < 0.02);
        assert!(fraction(HttpMethod::Put) > 0.0);
        assert!(fraction(HttpMethod::Head) > 0.0);
    }

    #[test]
    fn test_path_shape() {
        let mut rng = StdRng::seed_from_u64(4);
        let bounds = PathBounds { min: 1, max: 6 };
        for _ in 0..500 {
            let path = sample_path(&mut rng, &BuiltinCorpus, bounds, false);
            assert!(path.starts_with('/'));
            assert!(!path.contains(' '));
            assert!(PATH_EXTENSIONS.iter().any(|ext| path.ends_with(ext)));
        }
    }

    #[test]
    fn test_path_escapes_spaces_in_words() {
        let mut rng = StdRng::seed_from_u64(5);
        let bounds = PathBounds { min: 1, max: 1 };
        let path = sample_path(&mut rng, &SpacedCorpus, bounds, false);
        assert!(path.starts_with("/two%20words."));
    }

    #[test]
    fn test_path_segment_count() {
        let mut rng = StdRng::seed_from_u64(6);
        let bounds = PathBounds { min: 3, max: 3 };
        let path = sample_path(&mut rng, &SpacedCorpus, bounds, false);
        assert_eq!(path.matches("two%20words").count(), 3);
    }

    #[test]
    fn test_legacy_extensions() {
        let mut rng = StdRng::seed_from_u64(8);
        let bounds = PathBounds { min: 1, max: 2 };
        let mut seen_typo = false;
        for _ in 0..500 {
            let path = sample_path(&mut rng, &BuiltinCorpus, bounds, true);
            assert!(!path.ends_with(".html"));
            seen_typo |= path.ends_with(".hmtl");
        }
        assert!(seen_typo);
    }

    #[test]
    fn test_ip_version_weighting() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            assert!(sample_address(&mut rng, 100).parse::<Ipv4Addr>().is_ok());
        }
        assert_eq!(ip_version_for_roll(0, 0), IpVersion::V4);
        assert_eq!(ip_version_for_roll(1, 0), IpVersion::V6);
        assert_eq!(ip_version_for_roll(100, 100), IpVersion::V4);
    }

    #[test]
    fn test_sticky_pool_reuses_addresses() {
        let mut rng = StdRng::seed_from_u64(10);
        let config = GenerationConfig {
            sticky_address_pool_size: 2,
            ipv4_percent: 50,
            ..GenerationConfig::default()
        };
        let generator = EventGenerator::new(config, BuiltinCorpus, &mut rng);
        assert_eq!(generator.address_pool().len(), 3);

        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..300 {
            let record = generator.generate(&mut rng, now());
            *counts.entry(record.client_address).or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|c| *c > 1));
    }

    #[test]
    fn test_all_ok_ipv4_records() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = GenerationConfig {
            events_per_second: 10.0,
            status_ok_percent: 100,
            ipv4_percent: 100,
            ..GenerationConfig::default()
        };
        let generator = EventGenerator::new(config, BuiltinCorpus, &mut rng);

        for _ in 0..500 {
            let record = generator.generate(&mut rng, now());
            assert!(record.client_address.parse::<Ipv4Addr>().is_ok());
            assert_eq!(record.status_code, 200);
            assert!((800..=3100).contains(&record.body_bytes));
            assert_eq!(record.protocol_version, "HTTP/1.1");
            assert_eq!(record.referrer, "-");
            assert!(!record.user_agent.is_empty());
        }
    }

    #[test]
    fn test_address_pool_ends_when_addresses_repeat() {
        // Every draw yields 0.0.0.0
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let pool = build_address_pool(&mut rng, 3, 100);
        assert_eq!(pool.len(), 4);
        assert!(pool.iter().all(|address| address == "0.0.0.0"));
    }

    #[test]
    fn test_address_pool_size_is_capped() {
        let mut rng = StdRng::seed_from_u64(12);
        let pool = build_address_pool(&mut rng, usize::MAX, 100);
        assert_eq!(pool.len(), MAX_STICKY_ADDRESSES + 1);
    }
}
