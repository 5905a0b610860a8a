use crate::grant::is_blank;
use crate::{AccessStack, Grant, Guard, GuardedRecord, ModelAccess, Phi, PhiAccessError, reason_key};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// The enclosing application's view of the code path being served.
pub trait Controller {
    /// Fully qualified controller name, e.g. `Namespace::NestedController`.
    fn name(&self) -> &str;

    /// Action being handled, e.g. `show`.
    fn action(&self) -> &str;

    /// Resolve the current user through the accessor called `accessor`.
    fn current_user(&self, accessor: &str) -> Option<String> {
        let _ = accessor;
        None
    }
}

/// Request-scoped PHI state: type-level access stacks, the controller
/// context used for default grants, and the records that extended access
/// to related records while this request was served.
///
/// Concurrent requests never observe each other's type-level grants. Call
/// [`Request::end`] at the request boundary: the request keeps every
/// extending record alive until then, so scoped grants can always revoke
/// what those records extended.
#[derive(Debug, Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

#[derive(Debug)]
struct RequestInner {
    phi: Phi,
    state: Mutex<RequestState>,
}

#[derive(Debug, Default)]
struct RequestState {
    stacks: HashMap<String, AccessStack>,
    extending: Vec<Guard>,
    controller: Option<String>,
    action: Option<String>,
    current_user: Option<String>,
}

impl Request {
    pub(crate) fn new(phi: Phi) -> Self {
        Self {
            inner: Arc::new(RequestInner {
                phi,
                state: Mutex::new(RequestState::default()),
            }),
        }
    }

    pub(crate) fn with_context(
        phi: Phi,
        controller: String,
        action: String,
        current_user: Option<String>,
    ) -> Self {
        let request = Self::new(phi);
        {
            let mut state = request.inner.state.lock();
            state.controller = Some(controller);
            state.action = Some(action);
            state.current_user = current_user;
        }
        request
    }

    /// The environment this request belongs to.
    pub fn phi(&self) -> &Phi {
        &self.inner.phi
    }

    /// Type-level access for record type `R`.
    pub fn model<R: GuardedRecord>(&self) -> ModelAccess<'_> {
        ModelAccess::new(self, R::MODEL)
    }

    /// Type-level access for the record type called `name`.
    pub fn model_named<'a>(&'a self, name: &'a str) -> ModelAccess<'a> {
        ModelAccess::new(self, name)
    }

    /// Controller serving this request, if any.
    pub fn controller(&self) -> Option<String> {
        self.inner.state.lock().controller.clone()
    }

    /// Action being handled, if any.
    pub fn action(&self) -> Option<String> {
        self.inner.state.lock().action.clone()
    }

    /// Default grantor.
    pub fn current_user(&self) -> Option<String> {
        self.inner.state.lock().current_user.clone()
    }

    /// Drop every type-level grant and the controller context, and release
    /// the extending records along with the related records they hold.
    pub fn end(&self) {
        let ended = std::mem::take(&mut *self.inner.state.lock());
        for guard in &ended.extending {
            guard.reload();
        }
    }

    pub(crate) fn with_stack<T>(&self, model: &str, f: impl FnOnce(&mut AccessStack) -> T) -> T {
        let mut state = self.inner.state.lock();
        let stack = state.stacks.entry(model.to_owned()).or_default();
        f(stack)
    }

    /// Fill in the grantor and reason `grant` leaves out, then reject blank
    /// results.
    pub(crate) fn resolve_grant(
        &self,
        model: &str,
        grant: Grant,
    ) -> Result<(String, String), PhiAccessError> {
        let (user_id, reason) = grant.into_parts();
        let user_id = user_id.or_else(|| self.current_user());
        let reason = reason.or_else(|| self.default_reason(model));

        match (user_id, reason) {
            (Some(user_id), Some(reason))
                if !is_blank(Some(user_id.as_str())) && !is_blank(Some(reason.as_str())) =>
            {
                Ok((user_id, reason))
            }
            _ => Err(PhiAccessError::BlankGrant {
                model: model.to_owned(),
            }),
        }
    }

    fn default_reason(&self, model: &str) -> Option<String> {
        let (controller, action) = {
            let state = self.inner.state.lock();
            (state.controller.clone(), state.action.clone())
        };
        let (controller, action) = match (controller, action) {
            (Some(controller), Some(action))
                if !is_blank(Some(controller.as_str())) && !is_blank(Some(action.as_str())) =>
            {
                (controller, action)
            }
            _ => return None,
        };

        let phi = self.phi();
        let key = reason_key(&phi.config().translation_prefix, &controller, &action, model);
        let reason = phi.translator().translate(&key);
        if reason.is_none() {
            phi.log().warn(format!(
                "No {} PHI Reason found for {key}",
                phi.translator().locale()
            ));
        }
        reason
    }

    /// Remember that `guard` extended access to related records.
    pub(crate) fn track(&self, guard: &Guard) {
        let mut state = self.inner.state.lock();
        if !state.extending.iter().any(|tracked| tracked.same(guard)) {
            state.extending.push(guard.clone());
        }
    }

    fn tracked(&self) -> Vec<Guard> {
        self.inner.state.lock().extending.clone()
    }

    /// What every tracked record has extended so far.
    pub(crate) fn snapshot_extensions(&self) -> ExtensionSnapshot {
        let entries = self
            .tracked()
            .into_iter()
            .map(|guard| {
                let extended = guard.extended();
                (guard, extended)
            })
            .collect();
        ExtensionSnapshot { entries }
    }

    /// Revoke every extension made after `snapshot` was taken. Records that
    /// started extending afterwards lose all of their extensions; the rest
    /// keep what they had extended before.
    pub(crate) fn revoke_since(&self, snapshot: &ExtensionSnapshot) {
        for guard in self.tracked() {
            let fresh = guard.extended_since(snapshot.extended_by(&guard));
            if !fresh.is_empty() {
                guard.revoke_extended(&fresh);
            }
        }
    }
}

/// Per-record extension sets captured when a type-level scope begins.
#[derive(Debug, Default)]
pub(crate) struct ExtensionSnapshot {
    entries: Vec<(Guard, Vec<Guard>)>,
}

impl ExtensionSnapshot {
    fn extended_by(&self, guard: &Guard) -> &[Guard] {
        self.entries
            .iter()
            .find(|(tracked, _)| tracked.same(guard))
            .map(|(_, extended)| extended.as_slice())
            .unwrap_or_default()
    }
}
