use phi_access_log::PhiAccessLogError;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum PhiAccessError {
    /// A guarded field was read without an active, allowing grant
    #[error("{message}")]
    AccessDenied {
        /// Record type whose field was read.
        model: String,
        /// Message that was also written to the audit log.
        message: String,
    },

    /// A grant resolved to an empty grantor or reason
    #[error("Grantor and reason cannot be blank when granting PHI access to {model}")]
    BlankGrant {
        /// Record type being granted.
        model: String,
    },

    /// A relation named for access extension does not exist on the model
    #[error("{model} cannot extend PHI access through undefined relation `{name}`")]
    UndefinedRelation {
        /// Record type being registered.
        model: String,
        /// The offending relation name.
        name: String,
    },

    /// Restricted grants need a collection of targets
    #[error("PHI access for {model} can only be restricted to a collection of records")]
    NotACollection {
        /// Record type being granted.
        model: String,
    },

    /// A restricted grant listed a record of another type
    #[error("PHI access for {model} cannot be restricted to a {found} record")]
    ForeignTarget {
        /// Record type being granted.
        model: String,
        /// Type of the offending target.
        found: String,
    },

    /// A guard was created for a type that was never registered
    #[error("{model} is not registered for PHI access control")]
    UnknownModel {
        /// The unregistered type name.
        model: String,
    },

    /// The configured audit log destination could not be opened
    #[error(transparent)]
    Log(#[from] PhiAccessLogError),

    /// Configuration could not be parsed
    #[error("Invalid PHI access configuration: {0}")]
    Config(String),
}

impl PhiAccessError {
    /// Whether this error is an access denial, as opposed to misuse.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, PhiAccessError::AccessDenied { .. })
    }
}
