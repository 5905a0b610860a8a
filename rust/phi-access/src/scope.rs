//! Drop guards that unwind scoped grants on every exit path, panics
//! included.

use crate::request::ExtensionSnapshot;
use crate::{Guard, ModelAccess};

/// Ends [`Guard::with_phi`].
pub(crate) struct InstanceScope<'g> {
    guard: &'g Guard,
    before: Vec<Guard>,
}

impl<'g> InstanceScope<'g> {
    pub(crate) fn new(guard: &'g Guard, before: Vec<Guard>) -> Self {
        Self { guard, before }
    }
}

impl Drop for InstanceScope<'_> {
    fn drop(&mut self) {
        let fresh = self.guard.extended_since(&self.before);
        self.guard.disallow_last_phi_preserving(true);
        if !fresh.is_empty() {
            self.guard.revoke_extended(&fresh);
        }
    }
}

/// Ends [`ModelAccess::with_phi`] and [`ModelAccess::with_phi_only`].
pub(crate) struct TypeScope<'a> {
    access: ModelAccess<'a>,
    snapshot: ExtensionSnapshot,
    targets: Option<Vec<Guard>>,
}

impl<'a> TypeScope<'a> {
    pub(crate) fn new(
        access: ModelAccess<'a>,
        snapshot: ExtensionSnapshot,
        targets: Option<Vec<Guard>>,
    ) -> Self {
        Self {
            access,
            snapshot,
            targets,
        }
    }
}

impl Drop for TypeScope<'_> {
    fn drop(&mut self) {
        self.access.request.revoke_since(&self.snapshot);

        match self.targets.take() {
            Some(targets) => {
                for target in targets {
                    target.disallow_last_phi_preserving(true);
                }
            }
            None => self.access.disallow_last_phi(),
        }
    }
}

/// Ends [`Guard::without_phi`] by silently popping the deny frames it
/// pushed.
pub(crate) struct Shadow {
    guards: Vec<Guard>,
}

impl Shadow {
    pub(crate) fn new(guards: Vec<Guard>) -> Self {
        Self { guards }
    }
}

impl Drop for Shadow {
    fn drop(&mut self) {
        for guard in self.guards.iter().rev() {
            guard.pop_frame();
        }
    }
}

/// Ends [`ModelAccess::without_phi`].
pub(crate) struct TypeShadow<'a> {
    access: ModelAccess<'a>,
}

impl<'a> TypeShadow<'a> {
    pub(crate) fn new(access: ModelAccess<'a>) -> Self {
        Self { access }
    }
}

impl Drop for TypeShadow<'_> {
    fn drop(&mut self) {
        self.access.pop_frame();
    }
}
