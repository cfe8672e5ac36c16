use time::OffsetDateTime;
use uuid::Uuid;

/// A contact-form entry accepted by the server.
///
/// `id` and `timestamp` are only ever assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: OffsetDateTime,
}

/// Validated, trimmed content fields waiting for an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) message: String,
}

impl NewSubmission {
    /// Builds the content of a submission from fields that already passed validation.
    #[must_use]
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self { name: name.trim().to_string(), email: email.trim().to_string(), message: message.trim().to_string() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Assigns identity and creation time, producing the stored entity.
    #[must_use]
    pub fn into_submission(self, id: Uuid, timestamp: OffsetDateTime) -> Submission {
        Submission { id, name: self.name, email: self.email, message: self.message, timestamp }
    }
}
