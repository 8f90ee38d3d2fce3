use serde::{Deserialize, Serialize};

/// Operator information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
}

impl UserIdentity {
    /// Creates an operator identity for an authenticated subject.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    /// Returns the stable operator subject used for grants and audit rows.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }
}
