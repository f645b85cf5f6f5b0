//! # Sender Pool
//!
//! Sender identity selection.
//!
//! Responsibilities:
//! - Hold the identities a run may send from
//! - Pick one per attempt according to a `RotationPolicy`
//! - Fabricate identities when no pool is configured

mod pool;
mod synthetic;

pub use contracts::{RotationPolicy, SenderIdentity};
pub use pool::SenderPool;
pub use synthetic::generate_identity;
