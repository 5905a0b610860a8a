use std::fmt::{Display, Formatter};

/// Severity of an audit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Grants, revocations and first accesses.
    Info,
    /// Configuration drift, such as a missing reason translation.
    Warn,
    /// Unauthorized access attempts.
    Error,
}

impl Level {
    /// Upper-case name used in formatted lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // `pad` so that width specifiers in format strings apply
        f.pad(self.as_str())
    }
}
