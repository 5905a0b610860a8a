use crate::Level;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Timestamp layout of formatted lines, microsecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Render one audit line: `<timestamp> <LEVEL>: [tag] [tag] message\n`.
///
/// The level is right-aligned to five columns so that messages line up.
pub fn format_line<Tz>(
    timestamp: &DateTime<Tz>,
    level: Level,
    tags: &[String],
    message: &str,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut line = format!("{} {:>5}: ", timestamp.format(TIMESTAMP_FORMAT), level);
    for tag in tags {
        line.push('[');
        line.push_str(tag);
        line.push_str("] ");
    }
    line.push_str(message);
    line.push('\n');
    line
}
