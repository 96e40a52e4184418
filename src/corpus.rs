//! Word and user-agent sources used by the generator.

use rand::seq::SliceRandom;
use rand::RngCore;

/// Supplies the free-text parts of a record
pub trait Corpus {
    /// A client user agent string
    fn user_agent(&self, rng: &mut dyn RngCore) -> String;

    /// A single word used as a path segment, may contain spaces
    fn word(&self, rng: &mut dyn RngCore) -> String;
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51",
    "Opera/9.80 (Windows NT 6.1; U; en) Presto/2.12.388 Version/12.16",
    "Mozilla/5.0 (compatible; MSIE 10.0; Windows NT 6.2; Trident/6.0)",
    "Googlebot/2.1 (+http://www.google.com/bot.html)",
    "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
    "curl/8.5.0",
    "Wget/1.21.4",
    "python-requests/2.31.0",
];

const BUZZWORDS: &[&str] = &[
    "adaptive",
    "bandwidth",
    "benchmark",
    "client-server",
    "cohesive",
    "contingency",
    "customer loyalty",
    "dashboard",
    "data-warehouse",
    "dedicated",
    "encompassing",
    "framework",
    "functionalities",
    "groupware",
    "hierarchy",
    "holistic",
    "infrastructure",
    "intranet",
    "knowledge base",
    "leverage",
    "matrices",
    "methodology",
    "middleware",
    "migration",
    "mission-critical",
    "moratorium",
    "neural-net",
    "open architecture",
    "paradigm",
    "portal",
    "productivity",
    "protocol",
    "real-time",
    "responsive",
    "scalable",
    "secured line",
    "service-desk",
    "synergy",
    "system engine",
    "throughput",
    "toolset",
    "utilisation",
    "value-added",
    "web-enabled",
    "workforce",
    "zero tolerance",
];

/// Corpus backed by fixed built-in lists
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCorpus;

impl Corpus for BuiltinCorpus {
    fn user_agent(&self, rng: &mut dyn RngCore) -> String {
        pick(USER_AGENTS, rng).to_string()
    }

    fn word(&self, rng: &mut dyn RngCore) -> String {
        pick(BUZZWORDS, rng).to_string()
    }
}

fn pick(list: &[&'static str], rng: &mut dyn RngCore) -> &'static str {
    list.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_corpus_picks_from_lists() {
        let mut rng = StdRng::seed_from_u64(7);
        let corpus = BuiltinCorpus;

        for _ in 0..50 {
            let agent = corpus.user_agent(&mut rng);
            assert!(USER_AGENTS.contains(&agent.as_str()));

            let word = corpus.word(&mut rng);
            assert!(BUZZWORDS.contains(&word.as_str()));
        }
    }
}
