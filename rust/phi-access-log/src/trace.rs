use crate::{Level, LogSink};

/// Target used for every event emitted by [`TracingSink`].
pub const TRACING_TARGET: &str = "phi_access";

/// Forwards audit lines to the `tracing` ecosystem.
///
/// Tags are attached as a single `tags` field rendered `[a] [b]`, so any
/// subscriber the host application installs decides where lines end up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: Level, tags: &[String], message: &str) {
        let tags = tags
            .iter()
            .map(|tag| format!("[{tag}]"))
            .collect::<Vec<_>>()
            .join(" ");

        match level {
            Level::Debug => tracing::debug!(target: TRACING_TARGET, %tags, "{message}"),
            Level::Info => tracing::info!(target: TRACING_TARGET, %tags, "{message}"),
            Level::Warn => tracing::warn!(target: TRACING_TARGET, %tags, "{message}"),
            Level::Error => tracing::error!(target: TRACING_TARGET, %tags, "{message}"),
        }
    }
}
