//! # Transport
//!
//! Implementations of the `Transport` contract.
//!
//! - `SimulatedTransport`: seeded failure probability, no network
//! - `ScriptedTransport`: per-call scripted results with a call journal
//! - `TwilioTransport`: Twilio Programmable Messaging over HTTPS
//!
//! ## Feature Flags
//!
//! - `twilio`: Enable the Twilio transport (requires reqwest)

pub mod scripted;
pub mod simulated;

#[cfg(feature = "twilio")]
pub mod twilio;

pub use contracts::{Transport, TransportError};
pub use scripted::{ScriptedCall, ScriptedTransport};
pub use simulated::{SimulatedConfig, SimulatedTransport};

#[cfg(feature = "twilio")]
pub use twilio::{TwilioCredentials, TwilioTransport};
