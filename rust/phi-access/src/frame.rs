/// One authorization decision on an access stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessFrame {
    allowed: bool,
    user_id: Option<String>,
    reason: Option<String>,
    logged: bool,
}

impl AccessFrame {
    /// A frame granting access on behalf of `user_id`.
    pub fn allow(user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            user_id: Some(user_id.into()),
            reason: Some(reason.into()),
            logged: false,
        }
    }

    /// A frame that shadows everything beneath it with a denial.
    pub fn deny() -> Self {
        Self {
            allowed: false,
            user_id: None,
            reason: None,
            logged: false,
        }
    }

    /// Whether this frame permits access.
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Who access was granted for.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Why access was granted.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether an access under this frame has been logged.
    pub fn is_logged(&self) -> bool {
        self.logged
    }

    pub(crate) fn mark_logged(&mut self) {
        self.logged = true;
    }
}

/// Renders grantors the way audit lines quote them: `'alice','bob'`.
pub(crate) fn grantor_list<'a>(frames: impl IntoIterator<Item = &'a AccessFrame>) -> String {
    frames
        .into_iter()
        .map(|frame| format!("'{}'", frame.user_id().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(",")
}
