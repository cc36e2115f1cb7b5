//! Background download jobs for the candlefetch candle downloader.
//!
//! This crate provides job tracking and execution for candle downloads:
//!
//! - [`JobId`] - Unique identifier for download jobs
//! - [`JobStatus`] - Current status of a job
//! - [`JobRecord`] - One download request and its run state
//! - [`JobStore`] - Thread-safe record map with JSON snapshot persistence
//! - [`JobRunner`] - Spawns and drives one task per job
//! - [`JobEventBus`] - Broadcast [`NotificationSink`] for job snapshots

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod job;
mod notify;
mod runner;
mod store;

pub use error::{ExecutionError, JobError, StoreError};
pub use job::{INITIAL_MESSAGE, JobId, JobRecord, JobRequest, JobStatus};
pub use notify::{JobEvent, JobEventBus, NotificationSink};
pub use runner::JobRunner;
pub use store::{JobStore, STORE_FILE_NAME};
