use crate::domain::submission::Submission;
use crate::domain::validation::Candidate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// Body of `POST /submit`.
///
/// Fields are kept as raw JSON so that a number or object in place of text is reported as a
/// validation error rather than rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl SubmitRequest {
    #[must_use]
    pub fn candidate(&self) -> Candidate<'_> {
        Candidate {
            name: self.name.as_ref().and_then(Value::as_str),
            email: self.email.as_ref().and_then(Value::as_str),
            message: self.message.as_ref().and_then(Value::as_str),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

impl Created {
    #[must_use]
    pub fn new(message: impl Into<String>, id: Uuid) -> Self {
        Self { success: true, message: message.into(), id }
    }
}

#[derive(Debug, Serialize)]
pub struct Failure {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Failure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), errors: Vec::new() }
    }

    #[must_use]
    pub fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self { success: false, message: message.into(), errors }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<Submission> for SubmissionView {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id,
            name: submission.name,
            email: submission.email,
            message: submission.message,
            timestamp: submission.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionList {
    pub success: bool,
    pub data: Vec<SubmissionView>,
    pub count: usize,
}

impl From<Vec<Submission>> for SubmissionList {
    fn from(submissions: Vec<Submission>) -> Self {
        let data: Vec<SubmissionView> = submissions.into_iter().map(SubmissionView::from).collect();
        Self { success: true, count: data.len(), data }
    }
}
