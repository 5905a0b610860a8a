use convert_case::{Case, Casing};

/// Who is granted access, and why.
///
/// Either half may be omitted. Missing grantors fall back to the request's
/// current user and missing reasons to the translated reason for the current
/// controller action, see [`Request`](crate::Request).
///
/// ```rust
/// use phi_access::Grant;
///
/// let explicit = Grant::from(("alice@example.com", "quarterly audit"));
/// assert_eq!(explicit.user_id(), Some("alice@example.com"));
///
/// let inferred = Grant::by("alice@example.com");
/// assert_eq!(inferred.reason(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grant {
    user_id: Option<String>,
    reason: Option<String>,
}

impl Grant {
    /// A fully specified grant.
    pub fn new(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            reason: Some(reason.into()),
        }
    }

    /// A grant whose grantor and reason both come from the request.
    pub fn inferred() -> Self {
        Self::default()
    }

    /// A grant for `user_id` with an inferred reason.
    pub fn by(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            reason: None,
        }
    }

    /// Replace the reason.
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Explicit grantor, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Explicit reason, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Option<String>) {
        (self.user_id, self.reason)
    }
}

impl<U, R> From<(U, R)> for Grant
where
    U: Into<String>,
    R: Into<String>,
{
    fn from((user_id, reason): (U, R)) -> Self {
        Grant::new(user_id, reason)
    }
}

pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

/// Translation key of the default reason for `model` accessed while
/// handling `controller#action`, e.g. `phi.namespace.nested.show.patient_info`.
pub fn reason_key(prefix: &str, controller: &str, action: &str, model: &str) -> String {
    let mut path = vec![prefix.to_owned()];
    path.extend(controller_path(controller));
    path.push(action.to_owned());
    path.extend(type_path(model));
    path.join(".")
}

fn type_path(name: &str) -> Vec<String> {
    name.split("::")
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_case(Case::Snake))
        .collect()
}

fn controller_path(name: &str) -> Vec<String> {
    let mut path = type_path(name);
    if let Some(last) = path.last_mut() {
        if let Some(stripped) = last.strip_suffix("_controller") {
            *last = stripped.to_owned();
        }
    }
    path
}
