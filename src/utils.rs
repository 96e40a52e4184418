use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Parse a rate like "10", "0.5" or "50/1s" into events per second
pub fn parse_rate(rate_str: &str) -> Result<f64> {
    let rate_str = rate_str.trim();

    let rate = match rate_str.split_once('/') {
        Some((count, duration)) => {
            let count: f64 = count.trim().parse().context("Failed to parse event count")?;
            let duration = humantime::parse_duration(duration.trim())
                .context("Failed to parse duration")?;

            let duration_secs = duration.as_secs_f64();
            if duration_secs <= 0.0 {
                anyhow::bail!("Duration must be greater than 0");
            }
            count / duration_secs
        }
        None => rate_str.parse().context("Failed to parse events per second")?,
    };

    if !rate.is_finite() || rate <= 0.0 {
        anyhow::bail!("Rate must be a positive number");
    }

    Ok(rate)
}

/// Parse a jitter given as seconds ("0.2") or as a duration ("200ms") into seconds
pub fn parse_jitter(jitter_str: &str) -> Result<f64> {
    let jitter_str = jitter_str.trim();

    let seconds = match jitter_str.parse::<f64>() {
        Ok(seconds) => seconds,
        Err(_) => humantime::parse_duration(jitter_str)
            .context("Expected seconds or a duration such as 250ms")?
            .as_secs_f64(),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("Jitter must be zero or a positive number");
    }

    Ok(seconds)
}

/// Get a writer for a file or stdout
pub fn get_writer(path: &str) -> Result<Box<dyn Write + Send>> {
    if path == "stdout" {
        Ok(Box::new(BufWriter::new(io::stdout())))
    } else {
        let file = File::create(path).context(format!("Failed to create file: {}", path))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}
