use crate::domain::submission::{NewSubmission, Submission};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

pub mod json_file;
pub mod records;

pub use json_file::JsonFileStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed submission data in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode submissions: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable, append-only collection of submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync + std::fmt::Debug {
    /// Assigns identity and creation time to `submission` and persists it after every
    /// previously stored record.
    ///
    /// # Errors
    /// Returns `StoreError` if the existing collection cannot be read or the updated
    /// collection cannot be written. Nothing is stored in that case.
    async fn append(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    /// Returns every stored submission in creation order.
    ///
    /// # Errors
    /// Returns `StoreError` if the stored collection exists but cannot be read.
    async fn list(&self) -> Result<Vec<Submission>, StoreError>;

    /// Checks that the store is reachable and readable.
    ///
    /// # Errors
    /// Returns the same errors as [`SubmissionStore::list`].
    async fn probe(&self) -> Result<(), StoreError>;
}
