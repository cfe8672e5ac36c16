use crate::api::AppState;
use crate::api::schemas::submissions::{Created, SubmissionList, SubmitRequest};
use crate::error::{AppError, Result};
use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

pub const SUBMITTED: &str = "Form submitted successfully!";
pub const INVALID_BODY: &str = "Invalid request body";

/// Accepts a contact-form submission.
///
/// # Errors
/// Returns `AppError::BadRequest` if the body is not a JSON object.
/// Returns `AppError::Validation` if any field fails the acceptance rules.
/// Returns `AppError::Storage` if the submission cannot be persisted.
pub async fn submit(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Rejected submission body");
        AppError::BadRequest(INVALID_BODY.to_string())
    })?;

    let submission = state.submission_service.create(payload.candidate()).await?;

    Ok(Json(Created::new(SUBMITTED, submission.id)))
}

/// Lists every stored submission in creation order.
///
/// # Errors
/// Returns `AppError::Storage` if the stored submissions cannot be read.
pub async fn list_submissions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let submissions = state.submission_service.list().await?;
    Ok(Json(SubmissionList::from(submissions)))
}
