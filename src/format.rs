use anyhow::Result;
use clap::ValueEnum;
use std::io::Write;

use crate::models::LogRecord;

/// Common Log Format date pattern with numeric UTC offset
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// How records are rendered on the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Access log line in combined log format
    #[default]
    Combined,
    /// One JSON object per line
    Json,
}

impl OutputFormat {
    /// Render a record without the trailing newline
    pub fn render(&self, record: &LogRecord) -> Result<String> {
        match self {
            OutputFormat::Combined => Ok(format_combined(record)),
            OutputFormat::Json => format_json(record),
        }
    }
}

/// `<addr> - - [<time>] "<METHOD> <path> HTTP/1.1" <status> <bytes> "-" "<agent>"`
pub fn format_combined(record: &LogRecord) -> String {
    format!(
        "{} - - [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
        record.client_address,
        record.timestamp.format(TIMESTAMP_FORMAT),
        record.method,
        record.path,
        record.protocol_version,
        record.status_code,
        record.body_bytes,
        record.referrer,
        record.user_agent,
    )
}

pub fn format_json(record: &LogRecord) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// Write a record followed by a newline
pub fn write_record<W: Write + ?Sized>(
    writer: &mut W,
    format: OutputFormat,
    record: &LogRecord,
) -> Result<()> {
    let line = format.render(record)?;
    writeln!(writer, "{}", line)?;
    Ok(())
}
