use crate::{Grant, Guard, PhiAccessError};

/// A record type whose reads are guarded.
///
/// Implementors own a [`Guard`], route guarded reads through
/// [`Guard::read`] and relation accessors through [`Guard::relation`]:
///
/// ```rust
/// use phi_access::{Guard, GuardedRecord, PhiAccessError};
///
/// struct Address {
///     guard: Guard,
///     address: String,
/// }
///
/// impl GuardedRecord for Address {
///     const MODEL: &'static str = "Address";
///
///     fn guard(&self) -> &Guard {
///         &self.guard
///     }
/// }
///
/// impl Address {
///     fn address(&self) -> Result<String, PhiAccessError> {
///         self.guard.read("address", || self.address.clone())
///     }
/// }
/// ```
///
/// The remaining methods are the instance-level grant API.
pub trait GuardedRecord {
    /// Registered type name.
    const MODEL: &'static str;

    /// The record's guard.
    fn guard(&self) -> &Guard;

    /// See [`Guard::allow_phi`].
    fn allow_phi(&self, grant: impl Into<Grant>) -> Result<(), PhiAccessError> {
        self.guard().allow_phi(grant)
    }

    /// See [`Guard::with_phi`].
    fn with_phi<T, E>(
        &self,
        grant: impl Into<Grant>,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<PhiAccessError>,
    {
        self.guard().with_phi(grant, f)
    }

    /// See [`Guard::disallow_last_phi`].
    fn disallow_last_phi(&self) {
        self.guard().disallow_last_phi()
    }

    /// See [`Guard::disallow_phi`].
    fn disallow_phi(&self) {
        self.guard().disallow_phi()
    }

    /// See [`Guard::without_phi`].
    fn without_phi<T>(&self, f: impl FnOnce() -> T) -> T {
        self.guard().without_phi(f)
    }

    /// See [`Guard::phi_allowed`].
    fn phi_allowed(&self) -> bool {
        self.guard().phi_allowed()
    }

    /// See [`Guard::require_phi`].
    fn require_phi(&self) -> Result<(), PhiAccessError> {
        self.guard().require_phi()
    }

    /// See [`Guard::phi_allowed_by`].
    fn phi_allowed_by(&self) -> Option<String> {
        self.guard().phi_allowed_by()
    }

    /// See [`Guard::phi_access_reason`].
    fn phi_access_reason(&self) -> Option<String> {
        self.guard().phi_access_reason()
    }
}
