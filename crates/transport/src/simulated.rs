//! Simulated transport
//!
//! Stands in for a live service: each send fails with a fixed probability.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::{ContractError, MessageId, MessagePayload, SenderIdentity, Transport, TransportError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{instrument, trace};

/// Carrier-style rejection reasons picked from on failure
const FAILURE_REASONS: &[&str] = &[
    "simulated carrier rejection (code 30008)",
    "simulated unreachable handset (code 30003)",
    "simulated queue overflow (code 30001)",
];

/// Simulated transport configuration
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Probability in [0, 1] that a send fails
    pub failure_rate: f64,
    /// Delay before each send resolves
    pub latency: Duration,
    /// Seed for reproducible outcomes; OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.05,
            latency: Duration::ZERO,
            seed: None,
        }
    }
}

/// Transport that never leaves the process
pub struct SimulatedTransport {
    config: SimulatedConfig,
    rng: Mutex<StdRng>,
    next_id: AtomicU64,
}

impl SimulatedTransport {
    /// Build a transport.
    ///
    /// # Errors
    /// Configuration error unless `failure_rate` is a finite number in [0, 1].
    pub fn new(config: SimulatedConfig) -> Result<Self, ContractError> {
        if !(0.0..=1.0).contains(&config.failure_rate) {
            return Err(ContractError::configuration(format!(
                "simulated failure_rate must be within [0, 1], got {}",
                config.failure_rate
            )));
        }
        Ok(Self::build(config))
    }

    /// Transport that always succeeds
    pub fn reliable() -> Self {
        Self::build(SimulatedConfig {
            failure_rate: 0.0,
            ..Default::default()
        })
    }

    fn build(config: SimulatedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of messages accepted so far
    pub fn accepted(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst) - 1
    }

    fn roll(&self) -> Result<(), &'static str> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.random_bool(self.config.failure_rate) {
            let reason = FAILURE_REASONS[rng.random_range(0..FAILURE_REASONS.len())];
            Err(reason)
        } else {
            Ok(())
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::build(SimulatedConfig::default())
    }
}

impl Transport for SimulatedTransport {
    fn name(&self) -> &str {
        "simulated"
    }

    #[instrument(
        name = "simulated_transport_send",
        skip(self, _payload),
        fields(sender = %sender, recipient = %recipient)
    )]
    async fn send(
        &self,
        sender: &SenderIdentity,
        recipient: &str,
        _payload: &MessagePayload,
    ) -> Result<MessageId, TransportError> {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        self.roll().map_err(TransportError::rejected)?;

        let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
        trace!(seq, "Simulated send accepted");
        Ok(MessageId::new(format!("SIM{seq:08}")))
    }
}
