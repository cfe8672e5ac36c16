use crate::config::CorruptDataPolicy;
use crate::domain::submission::{NewSubmission, Submission};
use crate::storage::records::SubmissionRecord;
use crate::storage::{StoreError, SubmissionStore};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

enum Contents {
    Records(Vec<SubmissionRecord>),
    Corrupt(serde_json::Error),
}

/// Keeps every submission in a single JSON array on disk.
///
/// Each call re-reads the file, so the file is always the source of truth. Appends hold an
/// in-process lock across the whole read-modify-write cycle and replace the file atomically
/// through a sibling temp file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    corrupt_data: CorruptDataPolicy,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, corrupt_data: CorruptDataPolicy) -> Self {
        Self { path: path.into(), corrupt_data, write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    async fn read(&self) -> Result<Contents, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Contents::Records(Vec::new())),
            Err(e) => return Err(self.io_error(e)),
        };

        // A zero-length file holds no records.
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Contents::Records(Vec::new()));
        }

        Ok(match serde_json::from_slice(&bytes) {
            Ok(records) => Contents::Records(records),
            Err(source) => Contents::Corrupt(source),
        })
    }

    /// Reads the collection for callers that do not hold `write_lock`.
    async fn load(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        match self.read().await? {
            Contents::Records(records) => Ok(records),
            Contents::Corrupt(source) => match self.corrupt_data {
                CorruptDataPolicy::Fail => Err(StoreError::Malformed { path: self.path.clone(), source }),
                CorruptDataPolicy::Quarantine => {
                    let _guard = self.write_lock.lock().await;
                    self.recover(&source).await
                }
            },
        }
    }

    /// Reads the collection while the caller holds `write_lock`.
    async fn load_locked(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        match self.read().await? {
            Contents::Records(records) => Ok(records),
            Contents::Corrupt(source) => match self.corrupt_data {
                CorruptDataPolicy::Fail => Err(StoreError::Malformed { path: self.path.clone(), source }),
                CorruptDataPolicy::Quarantine => self.quarantine(&source).await.map(|()| Vec::new()),
            },
        }
    }

    /// Handles a parse failure seen without the lock. Must be called with `write_lock` held.
    ///
    /// An append may have replaced the file since `stale` was observed, so the file is read
    /// again and only moved aside if it is still unreadable.
    async fn recover(&self, stale: &serde_json::Error) -> Result<Vec<SubmissionRecord>, StoreError> {
        match self.read().await? {
            Contents::Records(records) => {
                tracing::debug!(error = %stale, "Submission data was replaced while being read");
                Ok(records)
            }
            Contents::Corrupt(source) => self.quarantine(&source).await.map(|()| Vec::new()),
        }
    }

    async fn quarantine(&self, source: &serde_json::Error) -> Result<(), StoreError> {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let target = self.sibling(&format!(".corrupt-{millis}-{}", Uuid::new_v4().simple()));

        match fs::rename(&self.path, &target).await {
            // Removed from outside the process.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(self.io_error(e)),
            Ok(()) => {}
        }

        tracing::warn!(
            error = %source,
            path = %self.path.display(),
            quarantined = %target.display(),
            "Submission data was unreadable, continuing with an empty collection"
        );
        Ok(())
    }

    async fn persist(&self, records: &[SubmissionRecord]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.sibling(".tmp");
        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&payload).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &self.path).await
        };

        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.io_error(e));
        }

        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for JsonFileStore {
    #[tracing::instrument(err(level = "warn"), skip_all)]
    async fn append(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load_locked().await?;
        let created = submission.into_submission(Uuid::now_v7(), OffsetDateTime::now_utc());
        records.push(SubmissionRecord::from(&created));
        self.persist(&records).await?;

        tracing::debug!(id = %created.id, total = records.len(), "Submission appended");
        Ok(created)
    }

    #[tracing::instrument(err(level = "warn"), skip_all)]
    async fn list(&self) -> Result<Vec<Submission>, StoreError> {
        let records = self.load().await?;
        Ok(records.into_iter().map(Submission::from).collect())
    }

    async fn probe(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir, policy: CorruptDataPolicy) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("submissions.json"), policy)
    }

    fn ann() -> NewSubmission {
        NewSubmission::new("Ann", "ann@example.com", "Hello there, this works.")
    }

    #[tokio::test]
    async fn test_list_on_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Fail);

        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_append_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Fail);

        let created = store.append(ann()).await.unwrap();
        let listed = store.list().await.unwrap();

        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(created.name, "Ann");
        assert_eq!(created.message, "Hello there, this works.");
    }

    #[tokio::test]
    async fn test_append_is_additive_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Fail);

        let first = store.append(ann()).await.unwrap();
        let before = store.list().await.unwrap();

        let second = store.append(NewSubmission::new("Bo", "bo@example.org", "Second")).await.unwrap();
        let third = store.append(NewSubmission::new("Cy", "cy@example.net", "Third")).await.unwrap();
        let after = store.list().await.unwrap();

        assert_eq!(after.len(), before.len() + 2);
        assert_eq!(after[0], first);
        assert_eq!(after[1], second);
        assert_eq!(after[2], third);
    }

    #[tokio::test]
    async fn test_identical_content_gets_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Fail);

        let a = store.append(ann()).await.unwrap();
        let b = store.append(ann()).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reload_from_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let created = store_in(&dir, CorruptDataPolicy::Fail).append(ann()).await.unwrap();

        let reopened = store_in(&dir, CorruptDataPolicy::Fail);
        assert_eq!(reopened.list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir, CorruptDataPolicy::Fail));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.append(NewSubmission::new(&format!("User {i}"), "u@example.com", "Hello")).await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let listed = store.list().await.unwrap();
        let ids: HashSet<_> = listed.iter().map(|s| s.id).collect();
        assert_eq!(listed.len(), 20);
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/data/submissions.json"), CorruptDataPolicy::Fail);

        store.append(ann()).await.unwrap();

        assert!(store.path().exists());
        assert!(!dir.path().join("nested/data/submissions.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Fail);
        std::fs::write(store.path(), "").unwrap();

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_data_fails_and_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Fail);
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.list().await, Err(StoreError::Malformed { .. })));
        assert!(matches!(store.append(ann()).await, Err(StoreError::Malformed { .. })));
        assert!(matches!(store.probe().await, Err(StoreError::Malformed { .. })));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_malformed_data_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Quarantine);
        std::fs::write(store.path(), "[{\"id\": 1}]").unwrap();

        assert!(store.list().await.unwrap().is_empty());

        let quarantined = quarantined_files(&dir);
        assert_eq!(quarantined.len(), 1);
        assert_eq!(std::fs::read_to_string(&quarantined[0]).unwrap(), "[{\"id\": 1}]");

        let created = store.append(ann()).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![created]);
    }

    fn quarantined_files(dir: &tempfile::TempDir) -> Vec<PathBuf> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("submissions.json.corrupt-"))
            .map(|entry| entry.path())
            .collect()
    }

    #[tokio::test]
    async fn test_stale_parse_failure_keeps_replacement_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Quarantine);
        std::fs::write(store.path(), "{ not json").unwrap();

        // A reader sees the corrupt bytes, then an append recovers the file before it acts.
        let Contents::Corrupt(stale) = store.read().await.unwrap() else {
            panic!("expected corrupt contents");
        };
        let created = store.append(ann()).await.unwrap();

        let records = {
            let _guard = store.write_lock.lock().await;
            store.recover(&stale).await.unwrap()
        };

        assert_eq!(records.into_iter().map(Submission::from).collect::<Vec<_>>(), vec![created.clone()]);
        assert_eq!(store.list().await.unwrap(), vec![created]);
        assert_eq!(quarantined_files(&dir).len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_quarantines_keep_every_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, CorruptDataPolicy::Quarantine);

        for body in ["{ first", "{ second", "{ third"] {
            std::fs::write(store.path(), body).unwrap();
            assert!(store.list().await.unwrap().is_empty());
        }

        let mut contents: Vec<_> =
            quarantined_files(&dir).iter().map(|path| std::fs::read_to_string(path).unwrap()).collect();
        contents.sort();
        assert_eq!(contents, vec!["{ first", "{ second", "{ third"]);
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writers_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir, CorruptDataPolicy::Quarantine));
        std::fs::write(store.path(), "{ not json").unwrap();

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.append(NewSubmission::new(&format!("User {i}"), "u@example.com", "Hello")).await
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.list().await })
            })
            .collect();

        let mut created = Vec::new();
        for task in writers {
            created.push(task.await.unwrap().unwrap());
        }
        for task in readers {
            task.await.unwrap().unwrap();
        }

        let listed = store.list().await.unwrap();
        for submission in &created {
            assert!(listed.contains(submission));
        }
        assert_eq!(quarantined_files(&dir).len(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let store = JsonFileStore::new(blocker.join("submissions.json"), CorruptDataPolicy::Fail);

        assert!(matches!(store.append(ann()).await, Err(StoreError::Io { .. })));
    }
}
