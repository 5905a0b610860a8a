#![warn(missing_docs)]

//! Audit logging for PHI access events.
//!
//! Every grant, revocation and first access of protected fields is written as
//! a single tagged line. Tags accumulate the way nested tagged blocks do, so a
//! denial logged while handling a record carries both the record's keys and
//! the `UNAUTHORIZED ACCESS` marker:
//!
//! ```rust
//! use phi_access_log::{AuditLog, Level, LogSink};
//!
//! #[derive(Debug)]
//! struct Stderr;
//!
//! impl LogSink for Stderr {
//!     fn write(&self, level: Level, tags: &[String], message: &str) {
//!         eprintln!("{level} {tags:?} {message}");
//!     }
//! }
//!
//! let log = AuditLog::new(Stderr).tagged(["PHI Access Log", "PatientInfo"]);
//! log.info("PHI Access Enabled for 'alice': audit");
//! ```
//!
//! Three sinks ship with the crate:
//!
//! - [`TracingSink`] forwards lines to `tracing` and is the default when no
//!   log destination is configured.
//! - [`FileSink`] appends formatted lines to a file, rotating it by size.
//! - `MemorySink` (feature `helpers`) keeps every line for assertions.

mod error;
pub use error::*;

mod level;
pub use level::*;

mod sink;
pub use sink::*;

mod tagged;
pub use tagged::*;

mod format;
pub use format::*;

mod file;
pub use file::*;

mod trace;
pub use trace::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
