//! Command implementations.

mod run;
mod validate;

pub use run::{run_delivery, RunOutcome};
pub use validate::run_validate;
