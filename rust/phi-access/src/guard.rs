use crate::frame::grantor_list;
use crate::scope::{InstanceScope, Shadow};
use crate::{
    AccessFrame, AccessStack, Grant, PHI_ACCESS_LOG_TAG, PhiAccessError, PhiModel, PhiTarget,
    REQUIRE_PHI_MESSAGE, Request, UNAUTHORIZED_ACCESS_TAG,
};
use parking_lot::Mutex;
use phi_access_log::AuditLog;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// The access-control helper each guarded record owns.
///
/// A guard holds the record's instance-level access stack and the set of
/// related records it has extended access to. Records route every guarded
/// read through [`Guard::read`] and every relation accessor through
/// [`Guard::relation`]; the registered [`PhiModel`] decides which members
/// are actually guarded.
///
/// Clones share state, so a guard handed to another task keeps observing
/// the same grants. Extended records are held strongly; records that extend
/// to each other stay alive until [`Request::end`] or [`Guard::reload`].
#[derive(Clone)]
pub struct Guard {
    inner: Arc<GuardInner>,
}

struct GuardInner {
    object_id: u64,
    model: Arc<PhiModel>,
    request: Request,
    state: Mutex<GuardState>,
}

#[derive(Default)]
struct GuardState {
    stack: AccessStack,
    extended: Vec<Guard>,
    persisted_key: Option<String>,
}

enum Outcome {
    Denied,
    FirstAccess(String),
    Logged,
}

impl Guard {
    /// A fresh guard for a record of the registered type `model`, with no
    /// grants.
    pub fn new(request: &Request, model: &str) -> Result<Self, PhiAccessError> {
        let phi = request.phi();
        let model = phi
            .model(model)
            .ok_or_else(|| PhiAccessError::UnknownModel {
                model: model.to_owned(),
            })?;

        Ok(Self {
            inner: Arc::new(GuardInner {
                object_id: phi.next_object_id(),
                model,
                request: request.clone(),
                state: Mutex::new(GuardState::default()),
            }),
        })
    }

    /// The guarded type.
    pub fn model(&self) -> &PhiModel {
        &self.inner.model
    }

    /// The request this record was loaded in.
    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    /// Ephemeral identifier used in log lines until the record is persisted.
    pub fn object_id(&self) -> u64 {
        self.inner.object_id
    }

    /// Record the primary key value once the record is persisted.
    pub fn mark_persisted(&self, key: impl ToString) {
        self.inner.state.lock().persisted_key = Some(key.to_string());
    }

    /// Whether [`Guard::mark_persisted`] has been called.
    pub fn is_persisted(&self) -> bool {
        self.inner.state.lock().persisted_key.is_some()
    }

    /// Tags identifying this record in the audit log.
    pub fn log_keys(&self) -> Vec<String> {
        let key = match &self.inner.state.lock().persisted_key {
            Some(key) => format!("Key: {key}"),
            None => format!("Object: {}", self.inner.object_id),
        };
        vec![
            PHI_ACCESS_LOG_TAG.to_owned(),
            self.model().name().to_owned(),
            key,
        ]
    }

    fn log(&self) -> AuditLog {
        self.request().phi().log().tagged(self.log_keys())
    }

    /// Whether both handles belong to the same record.
    pub fn same(&self, other: &Guard) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Forget the related records this record extended access to. Their
    /// grants stay in place; the instance stack is kept.
    pub fn reload(&self) {
        self.inner.state.lock().extended.clear();
    }

    /// Related records currently extended by this record.
    pub fn extended(&self) -> Vec<Guard> {
        self.inner.state.lock().extended.clone()
    }

    /// Whether access has been extended to `other`.
    pub fn extends_to(&self, other: &Guard) -> bool {
        self.inner
            .state
            .lock()
            .extended
            .iter()
            .any(|extended| extended.same(other))
    }

    /// Instance frame, or the type frame when there is none.
    fn context(&self) -> Option<AccessFrame> {
        let instance = self.inner.state.lock().stack.top().cloned();
        instance.or_else(|| {
            self.request()
                .with_stack(self.model().name(), |stack| stack.top().cloned())
        })
    }

    /// Whether guarded members may be read right now.
    pub fn phi_allowed(&self) -> bool {
        self.context().is_some_and(|frame| frame.is_allowed())
    }

    /// Grantor of the effective grant.
    pub fn phi_allowed_by(&self) -> Option<String> {
        self.context()
            .and_then(|frame| frame.user_id().map(str::to_owned))
    }

    /// Reason of the effective grant.
    pub fn phi_access_reason(&self) -> Option<String> {
        self.context()
            .and_then(|frame| frame.reason().map(str::to_owned))
    }

    /// Fail unless access is currently allowed.
    pub fn require_phi(&self) -> Result<(), PhiAccessError> {
        if self.phi_allowed() {
            Ok(())
        } else {
            Err(self.deny(REQUIRE_PHI_MESSAGE))
        }
    }

    fn deny(&self, message: impl Into<String>) -> PhiAccessError {
        let message = message.into();
        self.log()
            .tagged([UNAUTHORIZED_ACCESS_TAG])
            .error(&message);
        PhiAccessError::AccessDenied {
            model: self.model().name().to_owned(),
            message,
        }
    }

    /// Read `member` through `accessor`.
    ///
    /// Unguarded members are read directly. Guarded members are denied,
    /// with an error logged, unless a grant is in effect; the first read
    /// under a new set of grants logs every active grantor.
    pub fn read<T>(&self, member: &str, accessor: impl FnOnce() -> T) -> Result<T, PhiAccessError> {
        if !self.model().wraps(member) {
            return Ok(accessor());
        }

        let model = self.model().name();
        let outcome = {
            let mut state = self.inner.state.lock();
            let instance = &mut state.stack;
            self.request().with_stack(model, |types| {
                let allowed = instance
                    .top()
                    .or(types.top())
                    .is_some_and(AccessFrame::is_allowed);
                if !allowed {
                    return Outcome::Denied;
                }
                if instance.iter().chain(types.iter()).all(AccessFrame::is_logged) {
                    return Outcome::Logged;
                }

                let grantors = grantor_list(instance.iter().chain(types.iter()));
                instance
                    .iter_mut()
                    .chain(types.iter_mut())
                    .for_each(AccessFrame::mark_logged);
                Outcome::FirstAccess(grantors)
            })
        };

        match outcome {
            Outcome::Denied => Err(self.deny(format!("Attempted PHI access for {model}"))),
            Outcome::FirstAccess(grantors) => {
                self.log().info(format!(
                    "{model} access by [{grantors}]. Triggered by method: {member}"
                ));
                Ok(accessor())
            }
            Outcome::Logged => Ok(accessor()),
        }
    }

    /// Pass `target`, the result of the relation accessor `relation`,
    /// through unchanged.
    ///
    /// When the relation extends access and this record is allowed, every
    /// guarded target not yet extended receives this record's effective
    /// grant.
    pub fn relation<T: PhiTarget>(&self, relation: &str, target: T) -> T {
        if !self.model().extends(relation) {
            return target;
        }
        let Some(context) = self.context().filter(AccessFrame::is_allowed) else {
            return target;
        };

        let targets = target.classify().into_guards();
        if targets.is_empty() {
            return target;
        }

        let fresh: Vec<Guard> = {
            let state = self.inner.state.lock();
            targets
                .iter()
                .filter(|candidate| !state.extended.iter().any(|extended| extended.same(candidate)))
                .cloned()
                .collect()
        };

        let user_id = context.user_id().unwrap_or_default();
        let reason = context.reason().unwrap_or_default();
        for guard in &fresh {
            guard.push_grant(user_id, reason);
        }

        {
            let mut state = self.inner.state.lock();
            for guard in fresh {
                if !state.extended.iter().any(|extended| extended.same(&guard)) {
                    state.extended.push(guard);
                }
            }
        }
        self.request().track(self);

        target
    }

    /// Grant access to this record until revoked.
    pub fn allow_phi(&self, grant: impl Into<Grant>) -> Result<(), PhiAccessError> {
        let (user_id, reason) = self
            .request()
            .resolve_grant(self.model().name(), grant.into())?;
        self.push_grant(&user_id, &reason);
        Ok(())
    }

    /// Grant access to this record while `f` runs.
    ///
    /// On every exit path the grant is popped and the related records first
    /// extended inside `f` are revoked. Extensions made before `f` are left
    /// as they were.
    pub fn with_phi<T, E>(
        &self,
        grant: impl Into<Grant>,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<PhiAccessError>,
    {
        let before = self.extended();
        self.allow_phi(grant)?;
        let _scope = InstanceScope::new(self, before);
        f()
    }

    /// Pop the most recent frame and revoke every extension.
    pub fn disallow_last_phi(&self) {
        self.disallow_last_phi_preserving(false);
    }

    pub(crate) fn disallow_last_phi_preserving(&self, preserve_extensions: bool) {
        let removed = self.pop_frame();
        if !preserve_extensions {
            self.revoke_extended(&self.extended());
        }

        let message = match removed {
            Some(frame) => format!(
                "PHI access disabled for {}",
                frame.user_id().unwrap_or_default()
            ),
            None => "PHI access disabled. No instance level access was granted.".to_owned(),
        };
        self.log().info(message);
    }

    /// Revoke every grant on this record and every extension it made.
    pub fn disallow_phi(&self) {
        self.revoke_extended(&self.extended());
        let removed = self.inner.state.lock().stack.reset();

        let message = if removed.is_empty() {
            "PHI access disabled. No instance level access was granted.".to_owned()
        } else {
            format!("PHI access disabled for {}", grantor_list(&removed))
        };
        self.log().info(message);
    }

    /// Deny access to this record, and to the records it currently extends
    /// to, while `f` runs.
    pub fn without_phi<T>(&self, f: impl FnOnce() -> T) -> T {
        let mut shadowed = vec![self.clone()];
        shadowed.extend(self.extended());
        for guard in &shadowed {
            guard.push_frame(AccessFrame::deny());
        }

        let _shadow = Shadow::new(shadowed);
        f()
    }

    pub(crate) fn push_grant(&self, user_id: &str, reason: &str) {
        self.push_frame(AccessFrame::allow(user_id, reason));
        self.log()
            .info(format!("PHI Access Enabled for '{user_id}': {reason}"));
    }

    fn push_frame(&self, frame: AccessFrame) {
        self.inner.state.lock().stack.push(frame);
    }

    pub(crate) fn pop_frame(&self) -> Option<AccessFrame> {
        self.inner.state.lock().stack.pop()
    }

    /// Extensions made since `before` was captured.
    pub(crate) fn extended_since(&self, before: &[Guard]) -> Vec<Guard> {
        self.inner
            .state
            .lock()
            .extended
            .iter()
            .filter(|extended| !before.iter().any(|earlier| earlier.same(extended)))
            .cloned()
            .collect()
    }

    /// Stop extending to `targets` and pop their most recent frame.
    pub(crate) fn revoke_extended(&self, targets: &[Guard]) {
        self.inner
            .state
            .lock()
            .extended
            .retain(|extended| !targets.iter().any(|target| target.same(extended)));

        for target in targets {
            target.disallow_last_phi();
        }
    }
}

impl Debug for Guard {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("model", &self.model().name())
            .field("object_id", &self.inner.object_id)
            .finish()
    }
}
