//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the delivery tester.
//! All business crates depend on this crate; reverse dependencies are prohibited.
//!
//! ## Run Model
//! - A run performs `attempt_count` serial attempts against one recipient
//! - Each attempt ends in exactly one terminal `AttemptOutcome`
//! - `attempted_so_far` is 1-based and strictly increasing

mod channel;
mod error;
mod identity;
mod log_record;
mod progress;
mod request;
mod settings;
mod transport;

pub use channel::ChannelKind;
pub use error::*;
pub use identity::{MessageId, SenderIdentity};
pub use log_record::LogRecord;
pub use progress::*;
pub use request::*;
pub use settings::*;
pub use transport::{LocalTransport, Transport};
