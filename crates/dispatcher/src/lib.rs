//! # Dispatcher
//!
//! Bulk dispatch of test messages.
//!
//! Responsible for:
//! - Running `attempt_count` sends to one recipient on a background task
//! - Retrying each failed send once from the same sender
//! - Throttling between attempts and honouring cooperative cancellation
//! - Streaming progress events and appending to the per-run log file

pub mod controller;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod run_logger;
pub mod worker;

pub use contracts::{ProgressEvent, RunSummary, RunTermination, Transport};
pub use controller::{DispatchController, StartedRun};
pub use error::DispatchError;
pub use handle::{CollectedRun, RunEvent, RunHandle, RunReport};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use run_logger::RunLogger;
pub use worker::{DispatchWorker, StopHandle, WorkerConfig, WorkerState};
