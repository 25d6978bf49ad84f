//! Binary entry point: run one relay cycle and exit
//!
//! Exit status 0 covers both a successful cycle and an intentionally skipped
//! one (invalid configuration); any other failure exits 1. The shared HTTP
//! transport is closed on every path.

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tweet_relay::config::{Config, StoragePaths, config_path};
use tweet_relay::discord::DiscordNotifier;
use tweet_relay::relay::Relay;
use tweet_relay::transport::{ProxySettings, Transport};
use tweet_relay::twitter::HttpTwitterClient;
use tweet_relay::types::RunOutcome;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(RunOutcome::ConfigRejected) => {
            tracing::warn!("Configuration rejected, nothing was done");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Bootstrapped { seeded }) => {
            tracing::info!(seeded, "Bootstrap run finished");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Completed { fetched, delivered }) => {
            tracing::info!(fetched, delivered, "Run finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> tweet_relay::Result<RunOutcome> {
    let config_path = config_path();
    tracing::debug!(path = %config_path.display(), "Loading configuration");
    let config = Config::load(&config_path)?;

    let violations = config.validate();
    if !violations.is_empty() {
        for violation in &violations {
            tracing::error!(violation = %violation, "Invalid configuration");
        }
        return Ok(RunOutcome::ConfigRejected);
    }

    let notifier = DiscordNotifier::from_config(&config.discord)?;
    let mut transport = Transport::new(ProxySettings::from_env()?);

    let outcome = {
        let client = HttpTwitterClient::new(&transport);
        let relay = Relay::new(config, StoragePaths::from_env());
        relay.run_once(&client, &notifier).await
    };

    // The transport is torn down whether the cycle succeeded or not
    transport.close();

    outcome
}
