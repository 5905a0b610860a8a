use crate::{Level, LogSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// A line captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Severity of the line.
    pub level: Level,
    /// Accumulated tags, outermost first.
    pub tags: Vec<String>,
    /// The message itself.
    pub message: String,
}

/// Keeps every line in memory. Clones share the same buffer, so one clone can
/// be handed to the code under test while another is inspected.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line captured so far.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Lines captured at `level`.
    pub fn at(&self, level: Level) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Messages captured at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.at(level)
            .into_iter()
            .map(|record| record.message)
            .collect()
    }

    /// Number of lines captured at `level`.
    pub fn count(&self, level: Level) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .count()
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, level: Level, tags: &[String], message: &str) {
        self.records.lock().push(Record {
            level,
            tags: tags.to_vec(),
            message: message.to_owned(),
        });
    }
}
