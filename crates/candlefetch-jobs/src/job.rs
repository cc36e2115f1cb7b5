//! Download job records and their lifecycle.

use candlefetch_provider::CandleRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::JobError;

/// Unique identifier for a download job.
pub type JobId = Uuid;

/// Message carried by a freshly created job.
pub const INITIAL_MESSAGE: &str = "Job created";

/// Highest progress value a job can report before it completes.
const MAX_RUNNING_PROGRESS: u8 = 99;

/// Status of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is recorded but its task has not started.
    #[default]
    Pending,
    /// Job is currently running.
    Running,
    /// Job completed successfully.
    Completed,
    /// Job failed with an error.
    Failed,
}

impl JobStatus {
    /// Returns true if the job is in a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the status as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns all statuses in lifecycle order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::Running, Self::Completed, Self::Failed]
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown job status '{s}'"))
    }
}

/// Parameters of a download request, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobRequest {
    /// Provider symbol identifier.
    #[serde(default)]
    pub symbol: String,
    /// Provider period identifier.
    #[serde(default)]
    pub period_id: String,
    /// Optional start date or timestamp.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Optional end date or timestamp.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Optional maximum number of candles. Accepts a number or a numeric string.
    #[serde(default, deserialize_with = "limit::deserialize")]
    pub limit: Option<u32>,
}

impl JobRequest {
    /// Creates a request for `symbol` at `period_id`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, period_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            period_id: period_id.into(),
            ..Default::default()
        }
    }

    /// Sets the start and end bounds.
    #[must_use]
    pub fn with_window(mut self, start_date: Option<String>, end_date: Option<String>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Sets the candle limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Checks required fields and returns a trimmed copy.
    ///
    /// Blank bounds are dropped. Bound formats are not checked here; a bad
    /// bound surfaces later as a failed job.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::MissingField`] when symbol or period is blank and
    /// [`JobError::InvalidLimit`] for a zero limit.
    pub fn validated(self) -> Result<Self, JobError> {
        let symbol = self.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(JobError::MissingField { field: "symbol" });
        }
        let period_id = self.period_id.trim().to_string();
        if period_id.is_empty() {
            return Err(JobError::MissingField { field: "period_id" });
        }
        if self.limit == Some(0) {
            return Err(JobError::InvalidLimit);
        }

        let non_blank = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Ok(Self {
            symbol,
            period_id,
            start_date: non_blank(self.start_date),
            end_date: non_blank(self.end_date),
            limit: self.limit,
        })
    }
}

/// State of one download request.
///
/// Request parameters never change after creation. Run state only moves
/// forward through the transition methods, which reject any other move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique identifier for this job.
    pub job_id: JobId,
    /// Provider symbol identifier.
    pub symbol: String,
    /// Provider period identifier.
    pub period_id: String,
    /// Requested candle limit.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Requested start bound.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Requested end bound.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Number of candles received or written.
    #[serde(default)]
    pub candle_count: usize,
    /// Current status.
    #[serde(default)]
    pub status: JobStatus,
    /// Progress percentage, 0 to 100.
    #[serde(default)]
    pub progress: u8,
    /// Human-readable status message.
    #[serde(default = "initial_message")]
    pub message: String,
    /// Output CSV path, set only once completed.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// Timestamp when the job was created.
    #[serde(default = "Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Timestamp when the job started running.
    #[serde(default, with = "timestamp::option")]
    pub started_at: Option<DateTime<Utc>>,
    /// Timestamp when the job reached a terminal state.
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Error detail for failed jobs.
    #[serde(default)]
    pub error: Option<String>,
}

fn initial_message() -> String {
    INITIAL_MESSAGE.to_string()
}

impl JobRecord {
    /// Creates a pending job for a validated request.
    #[must_use]
    pub fn new(request: JobRequest) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            symbol: request.symbol,
            period_id: request.period_id,
            limit: request.limit,
            start_date: request.start_date,
            end_date: request.end_date,
            candle_count: 0,
            status: JobStatus::Pending,
            progress: 0,
            message: initial_message(),
            file_path: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Returns true if the job is in a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Builds the provider request for this job.
    #[must_use]
    pub fn candle_request(&self) -> CandleRequest {
        CandleRequest::new(self.symbol.clone(), self.period_id.clone())
            .with_window(self.start_date.clone(), self.end_date.clone())
            .with_limit(self.limit)
    }

    /// Output file name for a run finishing at `at`.
    ///
    /// `{symbol}_{period}_{YYYYmmdd_HHMMSS}_{id8}.csv`, with characters other
    /// than ASCII alphanumerics, `.`, `_` and `-` replaced by `_`.
    #[must_use]
    pub fn output_file_name(&self, at: DateTime<Utc>) -> String {
        let id = self.job_id.simple().to_string();
        format!(
            "{}_{}_{}_{}.csv",
            sanitize(&self.symbol),
            sanitize(&self.period_id),
            at.format("%Y%m%d_%H%M%S"),
            &id[..8]
        )
    }

    /// Moves a pending job to running.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] unless the job is pending.
    pub fn mark_started(&mut self, platform: &str) -> Result<(), JobError> {
        self.transition(JobStatus::Pending, JobStatus::Running)?;
        self.started_at = Some(Utc::now());
        self.message = format!("Fetching data from {platform}...");
        Ok(())
    }

    /// Records an intermediate checkpoint on a running job.
    ///
    /// Progress never decreases and stays below 100 until completion.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] unless the job is running.
    pub fn checkpoint(&mut self, progress: u8, message: impl Into<String>) -> Result<(), JobError> {
        self.require(JobStatus::Running, JobStatus::Running)?;
        self.progress = self.progress.max(progress.min(MAX_RUNNING_PROGRESS));
        self.message = message.into();
        Ok(())
    }

    /// Completes a running job.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] unless the job is running.
    pub fn mark_completed(&mut self, file_path: PathBuf, candle_count: usize) -> Result<(), JobError> {
        self.transition(JobStatus::Running, JobStatus::Completed)?;
        self.progress = 100;
        self.candle_count = candle_count;
        self.file_path = Some(file_path);
        self.completed_at = Some(Utc::now());
        self.message = format!("Download completed: {candle_count} candles");
        Ok(())
    }

    /// Fails a running job. Progress stays where the run stopped.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] unless the job is running.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Running, JobStatus::Failed)?;
        let error = error.into();
        self.message = format!("Error: {error}");
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn require(&self, expected: JobStatus, to: JobStatus) -> Result<(), JobError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(JobError::InvalidTransition {
                from: self.status,
                to,
            })
        }
    }

    fn transition(&mut self, expected: JobStatus, to: JobStatus) -> Result<(), JobError> {
        self.require(expected, to)?;
        self.status = to;
        Ok(())
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Candle limits sent either as JSON numbers or as numeric strings.
mod limit {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let value = match Option::<Raw>::deserialize(d)? {
            None => return Ok(None),
            Some(Raw::Number(n)) => n,
            Some(Raw::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<i64>()
                    .map_err(|_| D::Error::custom(format!("limit must be a positive integer, got '{text}'")))?
            }
        };
        // Zero is left for validation to reject.
        u32::try_from(value)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("limit must be a positive integer, got {value}")))
    }
}

/// RFC 3339 timestamps that also read naive ISO timestamps as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
            .ok()
    }

    pub(super) mod option {
        use super::*;

        pub(in super::super) fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        pub(in super::super) fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_test_job() -> JobRecord {
        let request = JobRequest::new("BINANCE_SPOT_BTC_USDT", "1DAY")
            .with_window(Some("2024-01-01".into()), Some("2024-01-14".into()));
        JobRecord::new(request.validated().unwrap())
    }

    #[test]
    fn test_job_status_is_finished() {
        assert!(!JobStatus::Pending.is_finished());
        assert!(!JobStatus::Running.is_finished());
        assert!(JobStatus::Completed.is_finished());
        assert!(JobStatus::Failed.is_finished());
    }

    #[test]
    fn test_job_status_parse() {
        assert_eq!("Completed".parse::<JobStatus>().unwrap(), JobStatus::Completed);
        assert!("cancelled".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_request_validation() {
        assert!(matches!(
            JobRequest::new("  ", "1DAY").validated(),
            Err(JobError::MissingField { field: "symbol" })
        ));
        assert!(matches!(
            JobRequest::new("BTC", "").validated(),
            Err(JobError::MissingField { field: "period_id" })
        ));
        assert!(matches!(
            JobRequest::new("BTC", "1DAY").with_limit(Some(0)).validated(),
            Err(JobError::InvalidLimit)
        ));

        let ok = JobRequest::new(" BTC ", "1DAY")
            .with_window(Some(" ".into()), Some("2024-01-02".into()))
            .validated()
            .unwrap();
        assert_eq!(ok.symbol, "BTC");
        assert_eq!(ok.start_date, None);
        assert_eq!(ok.end_date.as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = create_test_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.message, INITIAL_MESSAGE);
        assert!(job.started_at.is_none());
        assert!(job.file_path.is_none());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = create_test_job();

        job.mark_started("CoinAPI").unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.message, "Fetching data from CoinAPI...");
        assert!(job.started_at.is_some());

        job.checkpoint(25, "Making API request...").unwrap();
        job.checkpoint(50, "Processing data...").unwrap();
        assert_eq!(job.progress, 50);

        job.mark_completed(PathBuf::from("/tmp/out.csv"), 14).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.candle_count, 14);
        assert_eq!(job.message, "Download completed: 14 candles");
        assert!(job.completed_at.is_some());
        assert!(job.is_finished());
    }

    #[test]
    fn test_progress_never_regresses_or_hits_100_early() {
        let mut job = create_test_job();
        job.mark_started("CoinAPI").unwrap();

        job.checkpoint(75, "late").unwrap();
        job.checkpoint(25, "early").unwrap();
        assert_eq!(job.progress, 75);

        job.checkpoint(100, "too far").unwrap();
        assert_eq!(job.progress, 99);
    }

    #[test]
    fn test_failure_keeps_progress() {
        let mut job = create_test_job();
        job.mark_started("CoinAPI").unwrap();
        job.checkpoint(25, "Making API request...").unwrap();

        job.mark_failed("API Error: 401 - Invalid API key").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 25);
        assert_eq!(job.error.as_deref(), Some("API Error: 401 - Invalid API key"));
        assert_eq!(job.message, "Error: API Error: 401 - Invalid API key");
        assert!(job.file_path.is_none());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut job = create_test_job();
        assert!(job.checkpoint(25, "x").is_err());
        assert!(job.mark_completed(PathBuf::from("x.csv"), 1).is_err());
        assert!(job.mark_failed("x").is_err());

        job.mark_started("CoinAPI").unwrap();
        assert!(matches!(
            job.mark_started("CoinAPI"),
            Err(JobError::InvalidTransition {
                from: JobStatus::Running,
                to: JobStatus::Running
            })
        ));

        job.mark_failed("boom").unwrap();
        assert!(job.mark_completed(PathBuf::from("x.csv"), 1).is_err());
        assert!(job.checkpoint(50, "x").is_err());
        assert!(job.mark_failed("again").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut job = create_test_job();
        job.mark_started("CoinAPI").unwrap();
        job.mark_completed(PathBuf::from("/data/out.csv"), 3).unwrap();

        let json = serde_json::to_string(&job).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_serialized_shape() {
        let job = create_test_job();
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["status"], "pending");
        assert_eq!(value["started_at"], serde_json::Value::Null);
        assert_eq!(value["file_path"], serde_json::Value::Null);
        assert!(value["created_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(value.as_object().unwrap().len(), 15);
    }

    #[test]
    fn test_deserialize_defaults_and_naive_timestamps() {
        let value = json!({
            "job_id": "5f0c6a36-8d43-4a4b-9d8e-0c1f2a3b4c5d",
            "symbol": "BINANCE_SPOT_ETH_USDT",
            "period_id": "1HRS",
            "created_at": "2024-03-01T12:30:45.123456",
            "started_at": null
        });

        let job: JobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.message, INITIAL_MESSAGE);
        assert_eq!(job.candle_count, 0);
        assert!(job.started_at.is_none());
        assert_eq!(
            job.created_at.timestamp(),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap().timestamp()
        );
    }

    #[test]
    fn test_request_limit_accepts_numeric_strings() {
        let request: JobRequest =
            serde_json::from_value(json!({"symbol": "BTC", "period_id": "1DAY", "limit": "14"}))
                .unwrap();
        assert_eq!(request.limit, Some(14));

        let request: JobRequest =
            serde_json::from_value(json!({"symbol": "BTC", "period_id": "1DAY", "limit": 7}))
                .unwrap();
        assert_eq!(request.limit, Some(7));

        let request: JobRequest =
            serde_json::from_value(json!({"symbol": "BTC", "limit": " "})).unwrap();
        assert_eq!(request.limit, None);

        let request: JobRequest =
            serde_json::from_value(json!({"symbol": "BTC", "limit": null})).unwrap();
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_request_limit_rejects_negative_and_garbage() {
        let err = serde_json::from_value::<JobRequest>(json!({"symbol": "BTC", "limit": -5}))
            .unwrap_err();
        assert!(err.to_string().contains("limit must be a positive integer"));

        let err = serde_json::from_value::<JobRequest>(json!({"symbol": "BTC", "limit": "ten"}))
            .unwrap_err();
        assert!(err.to_string().contains("ten"));

        // Zero parses; validation rejects it.
        let request: JobRequest =
            serde_json::from_value(json!({"symbol": "BTC", "period_id": "1DAY", "limit": 0}))
                .unwrap();
        assert!(matches!(request.validated(), Err(JobError::InvalidLimit)));
    }

    #[test]
    fn test_deserialize_rejects_bad_timestamp() {
        let value = json!({
            "job_id": "5f0c6a36-8d43-4a4b-9d8e-0c1f2a3b4c5d",
            "symbol": "X",
            "period_id": "1HRS",
            "created_at": "last tuesday"
        });
        assert!(serde_json::from_value::<JobRecord>(value).is_err());
    }

    #[test]
    fn test_output_file_name() {
        let mut job = JobRecord::new(JobRequest::new("HYPE/USDC.H", "1DAY"));
        job.job_id = Uuid::parse_str("5f0c6a36-8d43-4a4b-9d8e-0c1f2a3b4c5d").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 7).unwrap();

        assert_eq!(
            job.output_file_name(at),
            "HYPE_USDC.H_1DAY_20240115_090507_5f0c6a36.csv"
        );
    }

    #[test]
    fn test_candle_request() {
        let job = create_test_job();
        let request = job.candle_request();
        assert_eq!(request.symbol, "BINANCE_SPOT_BTC_USDT");
        assert_eq!(request.start_date.as_deref(), Some("2024-01-01"));
        assert_eq!(request.limit, None);
    }
}
