use crate::{Level, LogSink};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A cheaply cloned logger handle carrying a list of tags.
///
/// [`AuditLog::tagged`] returns a new handle with extra tags appended, which
/// is how nested tagged blocks are expressed: the outer handle is unaffected.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn LogSink>,
    tags: Vec<String>,
}

impl AuditLog {
    /// Create an untagged logger writing to `sink`.
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self::from_shared(Arc::new(sink))
    }

    /// Create an untagged logger from an already shared sink.
    pub fn from_shared(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            tags: Vec::new(),
        }
    }

    /// Return a handle whose lines carry `tags` after the current ones.
    pub fn tagged<I, T>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut all = self.tags.clone();
        all.extend(tags.into_iter().map(Into::into));
        Self {
            sink: self.sink.clone(),
            tags: all,
        }
    }

    /// Tags applied to every line written through this handle.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Write a line at `level`.
    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        self.sink.write(level, &self.tags, message.as_ref());
    }

    /// Write a [`Level::Debug`] line.
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Level::Debug, message)
    }

    /// Write a [`Level::Info`] line.
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message)
    }

    /// Write a [`Level::Warn`] line.
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::Warn, message)
    }

    /// Write a [`Level::Error`] line.
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message)
    }
}

impl Debug for AuditLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("sink", &self.sink)
            .field("tags", &self.tags)
            .finish()
    }
}
