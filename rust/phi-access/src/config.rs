use crate::PhiAccessError;
use phi_access_log::{DEFAULT_ROTATION_SIZE, Rotation};
use serde::Deserialize;
use std::path::PathBuf;

/// Prefix of translation keys used when no reason is given.
pub const DEFAULT_TRANSLATION_PREFIX: &str = "phi";

/// Process-wide settings.
///
/// Every field has a default, so configuration documents only need to
/// mention what they change:
///
/// ```rust
/// use phi_access::PhiConfig;
///
/// let config = PhiConfig::from_json(r#"{ "current_user_method": "phi_user" }"#).unwrap();
/// assert_eq!(config.current_user_method.as_deref(), Some("phi_user"));
/// assert_eq!(config.translation_prefix, "phi");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PhiConfig {
    /// Name of the controller accessor that yields the current user.
    pub current_user_method: Option<String>,
    /// Audit log file. When unset, lines are forwarded to `tracing`.
    pub log_path: Option<PathBuf>,
    /// Rotated log files to keep; `0` disables rotation.
    pub log_shift_age: usize,
    /// Bytes a log file may reach before rotation.
    pub log_shift_size: u64,
    /// First segment of reason translation keys.
    pub translation_prefix: String,
    /// Locale reported when a reason translation is missing.
    pub locale: String,
}

impl Default for PhiConfig {
    fn default() -> Self {
        Self {
            current_user_method: None,
            log_path: None,
            log_shift_age: 0,
            log_shift_size: DEFAULT_ROTATION_SIZE,
            translation_prefix: DEFAULT_TRANSLATION_PREFIX.to_owned(),
            locale: "en".to_owned(),
        }
    }
}

impl PhiConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, PhiAccessError> {
        serde_json::from_str(json).map_err(|error| PhiAccessError::Config(error.to_string()))
    }

    /// Rotation policy for the file sink.
    pub fn rotation(&self) -> Rotation {
        Rotation::new(self.log_shift_age, self.log_shift_size)
    }
}
