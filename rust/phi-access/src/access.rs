use crate::frame::grantor_list;
use crate::scope::{TypeScope, TypeShadow};
use crate::{AccessFrame, Grant, PHI_ACCESS_LOG_TAG, PhiAccessError, PhiTarget, Relation, Request};
use phi_access_log::AuditLog;

/// Type-level access for one guarded record type within a [`Request`].
///
/// Grants made here apply to every record of the type served by the same
/// request, unless a record's own stack says otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ModelAccess<'a> {
    pub(crate) request: &'a Request,
    pub(crate) model: &'a str,
}

impl<'a> ModelAccess<'a> {
    pub(crate) fn new(request: &'a Request, model: &'a str) -> Self {
        Self { request, model }
    }

    /// The guarded type.
    pub fn name(&self) -> &str {
        self.model
    }

    fn log(&self) -> AuditLog {
        self.request
            .phi()
            .log()
            .tagged([PHI_ACCESS_LOG_TAG, self.model])
    }

    /// Whether the type-level stack allows access.
    pub fn phi_allowed(&self) -> bool {
        self.request
            .with_stack(self.model, |stack| stack.is_allowed())
    }

    /// Grant access to every record of this type until revoked.
    pub fn allow_phi(&self, grant: impl Into<Grant>) -> Result<(), PhiAccessError> {
        let (user_id, reason) = self.request.resolve_grant(self.model, grant.into())?;
        self.push_grant(&user_id, &reason);
        Ok(())
    }

    /// Grant access to every record of this type while `f` runs.
    ///
    /// On every exit path the grant is popped and every extension made by
    /// any record of the request while `f` ran is revoked.
    pub fn with_phi<T, E>(
        &self,
        grant: impl Into<Grant>,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<PhiAccessError>,
    {
        let (user_id, reason) = self.request.resolve_grant(self.model, grant.into())?;
        let snapshot = self.request.snapshot_extensions();
        self.push_grant(&user_id, &reason);

        let _scope = TypeScope::new(*self, snapshot, None);
        f()
    }

    /// Grant access to just the records in `targets` while `f` runs.
    ///
    /// `targets` must be a collection of records of this type. Each one gets
    /// its own instance-level grant, popped again on every exit path.
    pub fn with_phi_only<P, T, E>(
        &self,
        grant: impl Into<Grant>,
        targets: &P,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        P: PhiTarget + ?Sized,
        E: From<PhiAccessError>,
    {
        let Relation::Collection(targets) = targets.classify() else {
            return Err(PhiAccessError::NotACollection {
                model: self.model.to_owned(),
            }
            .into());
        };
        if let Some(foreign) = targets
            .iter()
            .find(|target| target.model().name() != self.model)
        {
            return Err(PhiAccessError::ForeignTarget {
                model: self.model.to_owned(),
                found: foreign.model().name().to_owned(),
            }
            .into());
        }

        let (user_id, reason) = self.request.resolve_grant(self.model, grant.into())?;
        let snapshot = self.request.snapshot_extensions();
        for target in &targets {
            target.push_grant(&user_id, &reason);
        }

        let _scope = TypeScope::new(*self, snapshot, Some(targets));
        f()
    }

    /// Pop the most recent type-level frame.
    pub fn disallow_last_phi(&self) {
        let removed = self.pop_frame();

        let message = match removed {
            Some(frame) => format!(
                "PHI access disabled for {}",
                frame.user_id().unwrap_or_default()
            ),
            None => "PHI access disabled. No class level access was granted.".to_owned(),
        };
        self.log().info(message);
    }

    /// Revoke every type-level grant. Instance-level grants are untouched.
    pub fn disallow_phi(&self) {
        let removed = self.request.with_stack(self.model, |stack| stack.reset());

        let message = if removed.is_empty() {
            "PHI access disabled. No class level access was granted.".to_owned()
        } else {
            format!("PHI access disabled for {}", grantor_list(&removed))
        };
        self.log().info(message);
    }

    /// Deny type-level access while `f` runs.
    ///
    /// Unlike the instance form this does not shadow records that were
    /// extended access, and a record's own grants still apply.
    pub fn without_phi<T>(&self, f: impl FnOnce() -> T) -> T {
        self.request
            .with_stack(self.model, |stack| stack.push(AccessFrame::deny()));

        let _shadow = TypeShadow::new(*self);
        f()
    }

    fn push_grant(&self, user_id: &str, reason: &str) {
        self.request.with_stack(self.model, |stack| {
            stack.push(AccessFrame::allow(user_id, reason))
        });
        self.log()
            .info(format!("PHI Access Enabled for '{user_id}': {reason}"));
    }

    pub(crate) fn pop_frame(&self) -> Option<AccessFrame> {
        self.request.with_stack(self.model, |stack| stack.pop())
    }
}
