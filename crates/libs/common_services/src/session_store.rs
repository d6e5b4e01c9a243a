use common_types::MetricEntry;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job already exists: {0}")]
    AlreadyExists(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("session log I/O failed")]
    Io(#[from] std::io::Error),

    #[error("session log row is malformed")]
    Csv(#[from] csv::Error),
}

const HEADER: &str =
    "timestamp,attentiveness_rating,comment,eye_contact_score,posture_score,focus_duration\n";

/// Append-only per-job metric log, one CSV file per job under `log_dir`.
///
/// Rows are never mutated or deleted; entries appear in the order their batch
/// was processed. Only a job's runner ever appends to that job's log, so
/// appends need no extra serialization.
#[derive(Clone, Debug)]
pub struct SessionStore {
    log_dir: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Resolve a job id to its log path. Ids are mapped onto a safe filename
    /// character set so a hostile id cannot escape the log directory.
    fn log_path(&self, job_id: &str) -> PathBuf {
        let safe: String = job_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.log_dir.join(format!("{safe}.csv"))
    }

    pub async fn exists(&self, job_id: &str) -> Result<bool, StoreError> {
        Ok(fs::try_exists(self.log_path(job_id)).await?)
    }

    /// Creates an empty log for the job. Fails if the job already has one.
    pub async fn create(&self, job_id: &str) -> Result<(), StoreError> {
        let path = self.log_path(job_id);
        if fs::try_exists(&path).await? {
            return Err(StoreError::AlreadyExists(job_id.to_string()));
        }
        fs::create_dir_all(&self.log_dir).await?;
        fs::write(&path, HEADER).await?;
        debug!(job_id, "created session log");
        Ok(())
    }

    /// Idempotent create for the implicit-creation path. Returns true when the
    /// log was created by this call.
    pub async fn ensure_created(&self, job_id: &str) -> Result<bool, StoreError> {
        match self.create(job_id).await {
            Ok(()) => Ok(true),
            Err(StoreError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Appends one entry to the job's log. Fails if the job was never created.
    pub async fn append(&self, job_id: &str, entry: &MetricEntry) -> Result<(), StoreError> {
        let path = self.log_path(job_id);
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound(job_id.to_string()));
        }

        let mut row = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut row);
            writer.serialize(entry)?;
            writer.flush()?;
        }

        let mut file = fs::OpenOptions::new().append(true).open(&path).await?;
        file.write_all(&row).await?;
        Ok(())
    }

    /// Reads every entry for the job, oldest first. Fails if the job was never
    /// created; a created job with no entries yields an empty vec.
    pub async fn read_all(&self, job_id: &str) -> Result<Vec<MetricEntry>, StoreError> {
        let path = self.log_path(job_id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(job_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn entry(rating: f64, comment: &str) -> MetricEntry {
        MetricEntry {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap(),
            attentiveness_rating: rating,
            comment: comment.to_string(),
            eye_contact_score: 6.0,
            posture_score: 4.0,
            focus_duration: 45,
        }
    }

    #[tokio::test]
    async fn create_then_duplicate_create_fails() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.create("s1").await.unwrap();
        let err = store.create("s1").await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == "s1"));
    }

    #[tokio::test]
    async fn ensure_created_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        assert!(store.ensure_created("s1").await.unwrap());
        assert!(!store.ensure_created("s1").await.unwrap());
    }

    #[tokio::test]
    async fn append_to_unknown_job_fails() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let err = store.append("ghost", &entry(5.0, "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn read_all_on_unknown_job_fails() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let err = store.read_all("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_log_reads_as_no_entries() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.create("s1").await.unwrap();
        assert!(store.read_all("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_round_trip_in_order() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.create("s1").await.unwrap();

        let first = entry(7.0, "looking at screen");
        let second = entry(3.0, "slouched, phone in hand");
        store.append("s1", &first).await.unwrap();
        store.append("s1", &second).await.unwrap();

        let entries = store.read_all("s1").await.unwrap();
        assert_eq!(entries, vec![first, second]);
    }

    #[tokio::test]
    async fn comments_with_commas_and_newlines_survive() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.create("s1").await.unwrap();

        let tricky = entry(5.0, "line one, with comma\nline two: \"quoted\"");
        store.append("s1", &tricky).await.unwrap();

        let entries = store.read_all("s1").await.unwrap();
        assert_eq!(entries[0].comment, tricky.comment);
    }

    #[tokio::test]
    async fn hostile_job_ids_stay_inside_the_log_dir() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.create("../../escape").await.unwrap();
        // The sanitized log landed inside the directory, not above it.
        let mut files = std::fs::read_dir(dir.path()).unwrap();
        let name = files.next().unwrap().unwrap().file_name();
        assert_eq!(name.to_string_lossy(), ".._.._escape.csv");
    }
}
