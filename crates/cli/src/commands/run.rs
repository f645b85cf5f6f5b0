//! `run` command implementation.

use anyhow::{anyhow, Context};
use std::time::Duration;
use tracing::{info, warn};

use config_loader::{resolve_identities, ConfigLoader};
use contracts::{DeliverySettings, LoggingError, ProgressEvent, Transport, TransportKind};
use dispatcher::{DispatchController, RunEvent, RunHandle, StartedRun, WorkerConfig};
use transport::{SimulatedConfig, SimulatedTransport};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::stats::DeliveryStats;

/// How a started run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
}

/// Execute the `run` command
pub async fn run_delivery(args: &RunArgs) -> Result<RunOutcome, CliError> {
    let mut settings = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading settings");
            ConfigLoader::load_from_path(path)?
        }
        None => DeliverySettings::default(),
    };
    apply_overrides(&mut settings, args);
    ConfigLoader::validate(&settings)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let policy = settings.senders.policy;
    let extra = if policy.needs_pool() {
        args.sender_list.as_deref()
    } else {
        None
    };
    let identities = resolve_identities(&settings.senders, extra)?;

    info!(
        channel = %settings.message.channel,
        policy = ?policy,
        senders = identities.len(),
        transport = ?settings.transport.kind,
        attempts = args.count,
        "Settings resolved"
    );

    let controller = DispatchController::new(
        WorkerConfig::from_settings(&settings),
        policy,
        identities,
        settings.logging.enabled,
    )
    .with_seed(settings.senders.seed);

    match settings.transport.kind {
        TransportKind::Simulated => {
            let transport = SimulatedTransport::new(SimulatedConfig {
                failure_rate: settings.transport.failure_rate,
                latency: Duration::from_millis(settings.transport.latency_ms),
                seed: settings.transport.seed,
            })?;
            drive(&controller, args, transport).await
        }
        TransportKind::Twilio => {
            let transport = twilio::build(args, &settings)?;
            drive(&controller, args, transport).await
        }
    }
}

fn apply_overrides(settings: &mut DeliverySettings, args: &RunArgs) {
    if let Some(channel) = args.channel {
        settings.message.channel = channel.into();
    }
    if let Some(policy) = args.policy {
        settings.senders.policy = policy.into();
    }
    if args.seed.is_some() {
        settings.senders.seed = args.seed;
    }
    if let Some(path) = &args.senders_file {
        settings.senders.file = Some(path.clone());
    }
    if args.simulate {
        settings.transport.kind = TransportKind::Simulated;
    }
    if let Some(ms) = args.throttle_ms {
        settings.timing.throttle_ms = ms;
    }
    if let Some(ms) = args.retry_backoff_ms {
        settings.timing.retry_backoff_ms = ms;
    }
    if let Some(dir) = &args.log_dir {
        settings.logging.directory = dir.clone();
    }
    if args.no_log {
        settings.logging.enabled = false;
    }
}

#[cfg(feature = "twilio")]
mod twilio {
    use super::*;
    use transport::{TwilioCredentials, TwilioTransport};

    pub fn build(args: &RunArgs, settings: &DeliverySettings) -> Result<TwilioTransport, CliError> {
        let (Some(account_sid), Some(auth_token)) =
            (args.twilio.account_sid.clone(), args.twilio.auth_token.clone())
        else {
            return Err(CliError::configuration(
                "twilio transport needs TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN",
            ));
        };
        let credentials = TwilioCredentials {
            account_sid,
            auth_token,
        };
        let transport = match &settings.transport.base_url {
            Some(url) => TwilioTransport::with_base_url(credentials, url),
            None => TwilioTransport::new(credentials),
        };
        transport.map_err(|e| CliError::transport_setup(e.to_string()))
    }
}

#[cfg(not(feature = "twilio"))]
mod twilio {
    use super::*;

    pub fn build(_args: &RunArgs, _settings: &DeliverySettings) -> Result<SimulatedTransport, CliError> {
        Err(CliError::configuration(
            "this build has no twilio support; use --simulate",
        ))
    }
}

async fn drive<T>(
    controller: &DispatchController,
    args: &RunArgs,
    transport: T,
) -> Result<RunOutcome, CliError>
where
    T: Transport + Sync + 'static,
{
    let StartedRun { worker, mut handle } =
        controller.start(&args.recipient, args.count, transport)?;

    let stop = worker.stop_handle();
    let signal = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping run...");
        stop.stop();
    });

    let mut stats = DeliveryStats::new(args.count);
    let report = loop {
        match handle.next_event().await {
            Some(RunEvent::Progress(event)) => {
                stats.observe(&event);
                print_event(&event, args)?;
                drain_log_errors(&mut handle);
            }
            Some(RunEvent::Finished(report)) => break report,
            None => return Err(anyhow!("run ended without a final report").into()),
        }
    };
    signal.abort();
    drain_log_errors(&mut handle);

    stats.print_summary(&report, worker.metrics(), args.json)?;

    if report.was_cancelled() {
        Ok(RunOutcome::Stopped)
    } else {
        Ok(RunOutcome::Completed)
    }
}

fn print_event(event: &ProgressEvent, args: &RunArgs) -> anyhow::Result<()> {
    if args.json {
        let line = serde_json::to_string(event).context("Failed to serialize progress event")?;
        println!("{line}");
        return Ok(());
    }

    let mut line = format!(
        "[{}/{}] {:<12} {} -> {} (sent {})",
        event.attempted_so_far,
        args.count,
        event.outcome.status_label(),
        event.sender,
        event.recipient,
        event.sent_so_far
    );
    if let Some(reason) = &event.failure_reason {
        line.push_str(": ");
        line.push_str(reason);
    }
    if !event.outcome.is_terminal() {
        line.push_str(", retrying");
    }
    println!("{line}");
    Ok(())
}

fn drain_log_errors(handle: &mut RunHandle) {
    while let Some(err) = handle.try_next_log_error() {
        report_log_error(&err);
    }
}

fn report_log_error(err: &LoggingError) {
    eprintln!("warning: {err}");
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
