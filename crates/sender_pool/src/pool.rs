//! SenderPool - per-attempt sender selection

use contracts::{ChannelKind, ContractError, RotationPolicy, SenderConfig, SenderIdentity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::synthetic::generate_identity;

/// Sender identities plus the policy for picking one per attempt.
///
/// Contents never change after construction. `next` takes `&mut self` only
/// because the random policies advance their random source.
#[derive(Debug)]
pub struct SenderPool {
    policy: RotationPolicy,
    channel: ChannelKind,
    identities: Vec<SenderIdentity>,
    rng: StdRng,
}

impl SenderPool {
    /// Build a pool.
    ///
    /// # Errors
    /// Configuration error when a pool-backed policy gets no identities, or
    /// when `SyntheticGenerate` is combined with explicit identities.
    pub fn new(
        policy: RotationPolicy,
        channel: ChannelKind,
        identities: Vec<SenderIdentity>,
        rng: StdRng,
    ) -> Result<Self, ContractError> {
        match policy {
            RotationPolicy::RoundRobin | RotationPolicy::RandomChoice if identities.is_empty() => {
                return Err(ContractError::configuration(format!(
                    "sender pool is empty; {policy:?} needs at least one sender identity"
                )));
            }
            RotationPolicy::SyntheticGenerate if !identities.is_empty() => {
                return Err(ContractError::configuration(
                    "SyntheticGenerate fabricates senders and cannot be combined with configured identities",
                ));
            }
            _ => {}
        }

        debug!(
            policy = ?policy,
            channel = %channel,
            pool_size = identities.len(),
            "Sender pool created"
        );

        Ok(Self {
            policy,
            channel,
            identities,
            rng,
        })
    }

    /// Round-robin pool
    pub fn round_robin(identities: Vec<SenderIdentity>) -> Result<Self, ContractError> {
        Self::new(
            RotationPolicy::RoundRobin,
            ChannelKind::default(),
            identities,
            StdRng::seed_from_u64(0),
        )
    }

    /// Uniform random pool drawing from `rng`
    pub fn random_choice(
        identities: Vec<SenderIdentity>,
        rng: StdRng,
    ) -> Result<Self, ContractError> {
        Self::new(
            RotationPolicy::RandomChoice,
            ChannelKind::default(),
            identities,
            rng,
        )
    }

    /// Identity generator for `channel`
    pub fn synthetic(channel: ChannelKind, rng: StdRng) -> Self {
        Self {
            policy: RotationPolicy::SyntheticGenerate,
            channel,
            identities: Vec::new(),
            rng,
        }
    }

    /// Build from settings and already-resolved identities.
    ///
    /// The random source is seeded from `config.seed` when present, from the
    /// OS otherwise.
    pub fn from_config(
        config: &SenderConfig,
        channel: ChannelKind,
        identities: Vec<SenderIdentity>,
    ) -> Result<Self, ContractError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(config.policy, channel, identities, rng)
    }

    /// Sender for 0-based attempt `attempt_index`
    pub fn next(&mut self, attempt_index: u32) -> SenderIdentity {
        match self.policy {
            RotationPolicy::RoundRobin => {
                let slot = attempt_index as usize % self.identities.len();
                self.identities[slot].clone()
            }
            RotationPolicy::RandomChoice => {
                let slot = self.rng.random_range(0..self.identities.len());
                self.identities[slot].clone()
            }
            RotationPolicy::SyntheticGenerate => generate_identity(self.channel, &mut self.rng),
        }
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn identities(&self) -> &[SenderIdentity] {
        &self.identities
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
