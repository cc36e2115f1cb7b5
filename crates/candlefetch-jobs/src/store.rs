//! Persistent job bookkeeping.

use crate::{JobId, JobRecord, StoreError};
use directories::ProjectDirs;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, warn};

/// File name of the job snapshot inside the storage folder.
pub const STORE_FILE_NAME: &str = "run_log.json";

type JobMap = HashMap<JobId, JobRecord>;

/// Thread-safe map of job records backed by a JSON snapshot file.
///
/// Every mutation rewrites the whole file as a pretty-printed JSON array while
/// the lock is still held, so concurrent writers can never interleave
/// snapshots. Write failures are logged and swallowed: the in-memory state
/// stays authoritative until the next successful write.
#[derive(Debug)]
pub struct JobStore {
    path: PathBuf,
    jobs: Mutex<JobMap>,
}

impl JobStore {
    /// Creates an empty store backed by `path` without touching the disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Opens the store at `path`, creating its parent directory and loading
    /// any existing snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        if let Some(parent) = store.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        store.load();
        Ok(store)
    }

    /// Returns the default root for candlefetch data.
    ///
    /// Uses the `directories` crate to find the appropriate location:
    /// - Linux: `~/.local/share/candlefetch/`
    /// - macOS: `~/Library/Application Support/candlefetch/`
    /// - Windows: `C:\Users\<User>\AppData\Roaming\candlefetch\`
    ///
    /// Falls back to `~/.candlefetch/` if the platform-specific location
    /// cannot be determined.
    #[must_use]
    pub fn default_root() -> PathBuf {
        ProjectDirs::from("", "", "candlefetch").map_or_else(dirs_fallback, |proj_dirs| {
            proj_dirs.data_dir().to_path_buf()
        })
    }

    /// Returns the snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads records from the snapshot file into memory.
    ///
    /// A missing file is not an error. An unreadable or corrupt file is
    /// logged and leaves the store unchanged. Entries that fail to decode are
    /// skipped individually. Returns the number of records loaded.
    pub fn load(&self) -> usize {
        let records = match self.read_snapshot() {
            Ok(Some(records)) => records,
            Ok(None) => return 0,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable job store");
                return 0;
            }
        };

        let mut jobs = self.lock();
        let mut loaded = 0;
        for (index, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<JobRecord>(value) {
                Ok(job) => {
                    jobs.insert(job.job_id, job);
                    loaded += 1;
                }
                Err(e) => warn!(index, error = %e, "skipping malformed job entry"),
            }
        }

        debug!(path = %self.path.display(), loaded, "loaded job store");
        loaded
    }

    /// Inserts or replaces a record and persists the snapshot.
    pub fn add_or_update(&self, job: JobRecord) {
        let mut jobs = self.lock();
        jobs.insert(job.job_id, job);
        self.persist(&jobs);
    }

    /// Replaces a record only if its id is still present, then persists.
    ///
    /// Returns false when the record was deleted in the meantime.
    pub fn update_existing(&self, job: JobRecord) -> bool {
        let mut jobs = self.lock();
        match jobs.get_mut(&job.job_id) {
            Some(slot) => {
                *slot = job;
                self.persist(&jobs);
                true
            }
            None => false,
        }
    }

    /// Returns a copy of the record with `job_id`.
    #[must_use]
    pub fn get(&self, job_id: &JobId) -> Option<JobRecord> {
        self.lock().get(job_id).cloned()
    }

    /// Removes and returns the record with `job_id`, persisting on success.
    pub fn delete(&self, job_id: &JobId) -> Option<JobRecord> {
        let mut jobs = self.lock();
        let removed = jobs.remove(job_id);
        if removed.is_some() {
            self.persist(&jobs);
        }
        removed
    }

    /// Returns copies of all records in no particular order.
    #[must_use]
    pub fn list_all(&self) -> Vec<JobRecord> {
        self.lock().values().cloned().collect()
    }

    /// Returns copies of all records, newest first.
    #[must_use]
    pub fn list_recent(&self) -> Vec<JobRecord> {
        let mut jobs = self.list_all();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, JobMap> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_snapshot(&self) -> Result<Option<Vec<Value>>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::ReadFile {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::ParseJson {
                path: self.path.clone(),
                source: e,
            })
    }

    fn persist(&self, jobs: &JobMap) {
        if let Err(e) = self.write_snapshot(jobs) {
            error!(error = %e, "failed to persist job store");
        }
    }

    fn write_snapshot(&self, jobs: &JobMap) -> Result<(), StoreError> {
        let mut records: Vec<&JobRecord> = jobs.values().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let json = serde_json::to_string_pretty(&records)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::WriteFile {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::WriteFile {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// Fallback for determining home directory.
fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".candlefetch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobRequest, JobStatus};
    use chrono::{TimeDelta, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_job(symbol: &str) -> JobRecord {
        JobRecord::new(JobRequest::new(symbol, "1DAY"))
    }

    fn store_in(dir: &TempDir) -> JobStore {
        JobStore::open(dir.path().join("local_storage").join(STORE_FILE_NAME)).unwrap()
    }

    #[test]
    fn test_open_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        assert!(temp_dir.path().join("local_storage").exists());
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_get_and_persist() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let job = create_test_job("BINANCE_SPOT_BTC_USDT");
        store.add_or_update(job.clone());

        assert_eq!(store.get(&job.job_id), Some(job.clone()));
        assert!(store.get(&uuid::Uuid::new_v4()).is_none());

        let on_disk: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0]["job_id"], job.job_id.to_string());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_snapshot_is_pretty_array() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.add_or_update(create_test_job("A"));

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("[\n"));
        assert!(content.contains("\n    \"job_id\""));
    }

    #[test]
    fn test_update_existing_ignores_deleted() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let mut job = create_test_job("A");
        store.add_or_update(job.clone());

        job.mark_started("CoinAPI").unwrap();
        assert!(store.update_existing(job.clone()));
        assert_eq!(store.get(&job.job_id).unwrap().status, JobStatus::Running);

        store.delete(&job.job_id);
        assert!(!store.update_existing(job.clone()));
        assert!(store.get(&job.job_id).is_none());
    }

    #[test]
    fn test_delete_twice() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let job = create_test_job("A");
        store.add_or_update(job.clone());

        assert_eq!(store.delete(&job.job_id).map(|j| j.job_id), Some(job.job_id));
        assert!(store.delete(&job.job_id).is_none());
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_reload_yields_same_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE_NAME);

        let store = JobStore::open(&path).unwrap();
        let mut jobs: Vec<JobRecord> = (0..5).map(|i| create_test_job(&format!("S{i}"))).collect();
        jobs[1].mark_started("CoinAPI").unwrap();
        jobs[1].mark_failed("boom").unwrap();
        for job in &jobs {
            store.add_or_update(job.clone());
        }
        drop(store);

        let reopened = JobStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 5);
        for job in &jobs {
            assert_eq!(reopened.get(&job.job_id).as_ref(), Some(job));
        }
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let store = JobStore::open(&path).unwrap();
        assert!(store.is_empty());

        store.add_or_update(create_test_job("A"));
        assert_eq!(JobStore::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(STORE_FILE_NAME);
        let good = create_test_job("A");
        let snapshot = serde_json::json!([
            good,
            {"job_id": "not-a-uuid", "symbol": "B", "period_id": "1DAY"},
            {"symbol": "C"}
        ]);
        fs::write(&path, snapshot.to_string()).unwrap();

        let store = JobStore::new(&path);
        assert_eq!(store.load(), 1);
        assert_eq!(store.get(&good.job_id), Some(good));
    }

    #[test]
    fn test_list_recent_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let now = Utc::now();
        for (i, symbol) in ["old", "new", "mid"].into_iter().enumerate() {
            let mut job = create_test_job(symbol);
            job.created_at = now
                - TimeDelta::minutes(match i {
                    0 => 30,
                    1 => 0,
                    _ => 10,
                });
            store.add_or_update(job);
        }

        let symbols: Vec<String> = store.list_recent().into_iter().map(|j| j.symbol).collect();
        assert_eq!(symbols, ["new", "mid", "old"]);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let temp_dir = TempDir::new().unwrap();
        // Parent directory never created, so every write fails.
        let store = JobStore::new(temp_dir.path().join("missing").join(STORE_FILE_NAME));

        let job = create_test_job("A");
        store.add_or_update(job.clone());
        assert_eq!(store.get(&job.job_id), Some(job));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_concurrent_writers() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&temp_dir));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.add_or_update(create_test_job(&format!("T{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 80);
        let reopened = JobStore::open(store.path()).unwrap();
        assert_eq!(reopened.len(), 80);
    }
}
