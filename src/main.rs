use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use errsentry::cluster::{ClusterCapability, FakeCluster};
use errsentry::config::EngineConfig;
use errsentry::coordinator::Coordinator;
use errsentry::dispatcher::Dispatcher;
use errsentry::poller::{LokiClient, Poller, PollerConfig};
use errsentry::rules::{load_rule_file, RuleEngine};
use errsentry::store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "errsentry=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting errsentry");

    let config = EngineConfig::load().map_err(|e| {
        error!("failed to load configuration: {e}");
        e
    })?;

    let rules = match &config.rules_path {
        Some(path) => load_rule_file(Path::new(path)).map_err(|e| {
            error!("failed to load rule file {path}: {e}");
            e
        })?,
        None => {
            warn!("no rules_path configured, starting with only the default fallback rule");
            Vec::new()
        }
    };
    info!(count = rules.len(), "loaded rules");

    let log_source = LokiClient::new(
        config.log_source.base_url.clone(),
        config.log_source.tenant.clone(),
        config
            .log_source
            .basic_auth_user
            .clone()
            .zip(config.log_source.basic_auth_password.clone()),
        Duration::from_secs(config.log_source.timeout_secs),
    )?;

    let poller_config = PollerConfig {
        query: config.poll.query.clone(),
        poll_interval: Duration::from_secs(config.poll.interval_secs),
        lookback: Duration::from_secs(config.poll.lookback_secs),
        dedup_window: Duration::from_secs(config.poll.dedup_window_secs),
        sweep_interval: Duration::from_secs(config.poll.sweep_interval_secs),
        query_limit: config.poll.query_limit,
    };

    let poller = Poller::new(log_source, poller_config);
    let rule_engine = RuleEngine::new(rules);
    let store = Store::new(config.store.max_errors, config.store.max_logs);
    let dispatcher = Dispatcher::new(
        config.dispatcher.enabled,
        config.dispatcher.dry_run,
        config.dispatcher.max_actions_per_hour,
        config.dispatcher.excluded_namespaces.clone(),
    );

    // No groundable live cluster client exists in this workspace's
    // dependency set; FakeCluster stands in until one is wired in.
    let cluster: Arc<dyn ClusterCapability> = Arc::new(FakeCluster::new());

    let coordinator = Arc::new(Coordinator::new(poller, rule_engine, store, dispatcher, cluster));
    info!(
        dry_run = config.dispatcher.dry_run,
        max_actions_per_hour = config.dispatcher.max_actions_per_hour,
        "dispatcher ready"
    );

    // Run the poll loop on its own task so shutdown can signal it and await
    // its return, instead of `select!` dropping it mid-poll.
    let run_coordinator = coordinator.clone();
    let mut run_handle = tokio::spawn(async move { run_coordinator.run().await });

    tokio::select! {
        _ = &mut run_handle => {
            warn!("poll loop exited on its own");
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, stopping poll loop");
            coordinator.shutdown();
            if let Err(e) = run_handle.await {
                warn!(error = %e, "poll loop task did not shut down cleanly");
            }
        }
    }

    info!("errsentry stopped");
    Ok(())
}

/// Listens for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
