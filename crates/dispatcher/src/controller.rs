//! DispatchController - validates a request and starts a worker for it

use contracts::{ChannelKind, DispatchRequest, RotationPolicy, SenderIdentity, Transport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sender_pool::SenderPool;
use tracing::{info, instrument};

use crate::error::DispatchError;
use crate::handle::RunHandle;
use crate::worker::{DispatchWorker, StopHandle, WorkerConfig};

/// A worker that has been started, plus the handle to its run
pub struct StartedRun<T> {
    pub worker: DispatchWorker<T>,
    pub handle: RunHandle,
}

impl<T> StartedRun<T>
where
    T: Transport + Sync + 'static,
{
    pub fn stop_handle(&self) -> StopHandle {
        self.worker.stop_handle()
    }
}

/// Entry point used by front ends.
///
/// Rejects bad input before any run (or run log file) exists.
#[derive(Debug, Clone)]
pub struct DispatchController {
    config: WorkerConfig,
    policy: RotationPolicy,
    identities: Vec<SenderIdentity>,
    seed: Option<u64>,
    logging_enabled: bool,
}

impl DispatchController {
    pub fn new(
        config: WorkerConfig,
        policy: RotationPolicy,
        identities: Vec<SenderIdentity>,
        logging_enabled: bool,
    ) -> Self {
        Self {
            config,
            policy,
            identities,
            seed: None,
            logging_enabled,
        }
    }

    /// Fix the sender-selection random source
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn channel(&self) -> ChannelKind {
        self.config.channel
    }

    pub fn identities(&self) -> &[SenderIdentity] {
        &self.identities
    }

    /// Validate, build the sender pool and start a run.
    ///
    /// # Errors
    /// Validation error for a malformed recipient or zero attempts;
    /// configuration error when the sender pool cannot be built.
    #[instrument(
        name = "dispatch_controller_start",
        skip(self, transport),
        fields(channel = %self.config.channel, policy = ?self.policy)
    )]
    pub fn start<T>(
        &self,
        recipient: &str,
        attempt_count: u32,
        transport: T,
    ) -> Result<StartedRun<T>, DispatchError>
    where
        T: Transport + Sync + 'static,
    {
        let recipient = recipient.trim();
        self.config.channel.check_recipient(recipient)?;
        let request = DispatchRequest::new(recipient, attempt_count, self.logging_enabled)?;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let pool = SenderPool::new(self.policy, self.config.channel, self.identities.clone(), rng)?;

        let mut worker = DispatchWorker::new(pool, transport, self.config.clone());
        let handle = worker.start(request)?;
        info!(recipient, attempt_count, "Dispatch started");

        Ok(StartedRun { worker, handle })
    }
}
