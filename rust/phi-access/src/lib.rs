#![warn(missing_docs)]

//! Scoped, audited access control for protected health information (PHI)
//! held in record fields.
//!
//! Record types register which of their members are guarded and which
//! relations extend access to related records. Every guarded read checks
//! the effective grant: the record's own access stack when it has one,
//! otherwise the type-level stack of the current [`Request`]. Reads without
//! an allowing grant fail with [`PhiAccessError::AccessDenied`]; the first
//! read under each new set of grants is written to the audit log.
//!
//! ```rust
//! use phi_access::{Guard, GuardedRecord, ModelBuilder, Phi, PhiAccessError, PhiConfig};
//!
//! struct PatientInfo {
//!     guard: Guard,
//!     first_name: String,
//! }
//!
//! impl GuardedRecord for PatientInfo {
//!     const MODEL: &'static str = "PatientInfo";
//!
//!     fn guard(&self) -> &Guard {
//!         &self.guard
//!     }
//! }
//!
//! impl PatientInfo {
//!     fn first_name(&self) -> Result<String, PhiAccessError> {
//!         self.guard.read("first_name", || self.first_name.clone())
//!     }
//! }
//!
//! # fn main() -> Result<(), PhiAccessError> {
//! let phi = Phi::new(PhiConfig::default())?;
//! phi.register(ModelBuilder::new("PatientInfo").attributes(["id", "first_name"]))?;
//!
//! let request = phi.request();
//! let patient = PatientInfo {
//!     guard: Guard::new(&request, "PatientInfo")?,
//!     first_name: "Jane".into(),
//! };
//!
//! assert!(patient.first_name().is_err());
//!
//! let name = request
//!     .model::<PatientInfo>()
//!     .with_phi(("alice@example.com", "chart review"), || patient.first_name())?;
//! assert_eq!(name, "Jane");
//!
//! assert!(patient.first_name().is_err());
//! request.end();
//! # Ok(())
//! # }
//! ```
//!
//! Scoped grants (`with_phi`, `with_phi_only`, `without_phi`) are undone on
//! every exit path, including early returns and panics. Persistent grants
//! (`allow_phi`) stay until revoked with `disallow_last_phi` or
//! `disallow_phi`, or until the request ends.

/// Tag carried by every audit line.
pub const PHI_ACCESS_LOG_TAG: &str = "PHI Access Log";

/// Additional tag carried by denials.
pub const UNAUTHORIZED_ACCESS_TAG: &str = "UNAUTHORIZED ACCESS";

/// Message of the error returned by [`Guard::require_phi`].
pub const REQUIRE_PHI_MESSAGE: &str = "PHI Access required, please call allow_phi or allow_phi! first";

mod error;
pub use error::*;

mod config;
pub use config::*;

mod frame;
pub use frame::*;

mod stack;
pub use stack::*;

mod grant;
pub use grant::*;

mod translate;
pub use translate::*;

mod model;
pub use model::*;

mod phi;
pub use phi::*;

mod request;
pub use request::*;

mod guard;
pub use guard::*;

mod access;
pub use access::*;

mod target;
pub use target::*;

mod record;
pub use record::*;

mod scope;
