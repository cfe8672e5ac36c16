use crate::domain::submission::{NewSubmission, Submission};
use crate::domain::validation::{Candidate, ValidationRules, validate_submission};
use crate::error::{AppError, Result};
use crate::storage::SubmissionStore;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) submissions_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("contact-server");
        Self {
            submissions_total: meter
                .u64_counter("contact_submissions_total")
                .with_description("Submissions received, by outcome")
                .build(),
        }
    }

    fn record(&self, status: &'static str) {
        self.submissions_total.add(1, &[KeyValue::new("status", status)]);
    }
}

#[derive(Clone, Debug)]
pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    rules: ValidationRules,
    metrics: Metrics,
}

impl SubmissionService {
    #[must_use]
    pub fn new(store: Arc<dyn SubmissionStore>, rules: ValidationRules) -> Self {
        Self { store, rules, metrics: Metrics::new() }
    }

    /// Validates a candidate and, if acceptable, persists it.
    ///
    /// # Errors
    /// Returns `AppError::Validation` with every failing rule if the candidate is rejected;
    /// the store is not touched in that case.
    /// Returns `AppError::Storage` if the submission cannot be persisted.
    #[tracing::instrument(skip_all, fields(strict = self.rules.strict))]
    pub async fn create(&self, candidate: Candidate<'_>) -> Result<Submission> {
        let errors = validate_submission(&candidate, self.rules);
        if !errors.is_empty() {
            self.metrics.record("invalid");
            tracing::debug!(errors = errors.len(), "Submission rejected");
            return Err(AppError::Validation(errors.iter().map(ToString::to_string).collect()));
        }

        let (Some(name), Some(email), Some(message)) = (candidate.name, candidate.email, candidate.message) else {
            return Err(AppError::Internal);
        };

        match self.store.append(NewSubmission::new(name, email, message)).await {
            Ok(submission) => {
                tracing::info!(id = %submission.id, "Submission stored");
                self.metrics.record("success");
                Ok(submission)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to store submission");
                self.metrics.record("failure");
                Err(e.into())
            }
        }
    }

    /// Returns the full submission history in creation order.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the stored submissions cannot be read.
    #[tracing::instrument(err(level = "warn"), skip_all)]
    pub async fn list(&self) -> Result<Vec<Submission>> {
        let submissions = self.store.list().await?;
        tracing::debug!(count = submissions.len(), "Submissions loaded");
        Ok(submissions)
    }
}
