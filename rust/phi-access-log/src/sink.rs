use crate::Level;
use std::fmt::Debug;
use std::sync::Arc;

/// Destination for audit lines.
///
/// Sinks own their failure handling: a sink that cannot write must not
/// propagate the failure, since logging never decides whether access is
/// granted.
pub trait LogSink: Debug + Send + Sync {
    /// Write one line carrying the accumulated `tags`.
    fn write(&self, level: Level, tags: &[String], message: &str);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn write(&self, level: Level, tags: &[String], message: &str) {
        (**self).write(level, tags, message)
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn write(&self, level: Level, tags: &[String], message: &str) {
        (**self).write(level, tags, message)
    }
}
