//! # Coordinator Runtime
//!
//! Owns the coordinator and its background tasks.
//!
//! ## Startup Sequence
//!
//! 1. Build the coordinator from `NodeConfig` (TCP delivery, system clock,
//!    Prometheus metrics)
//! 2. Bind the command listener
//! 3. Spawn the listener and compaction tasks, both watching one shutdown
//!    channel

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mc_01_coordinator::{
    CommandListener, ConfigProvider, Coordinator, CoordinatorApi, CoordinatorMetrics,
    DeliveryTransport, SystemTimeSource, TcpDeliveryTransport, TimeSource,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::adapters::PrometheusMetrics;
use crate::container::NodeConfig;

/// How long shutdown waits for background tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The coordinator process.
pub struct CoordinatorRuntime {
    config: NodeConfig,
    coordinator: Arc<Coordinator>,
    metrics: Arc<dyn CoordinatorMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CoordinatorRuntime {
    /// Production wiring: TCP delivery, wall clock, Prometheus metrics.
    pub fn new(config: NodeConfig) -> Self {
        let transport = Arc::new(TcpDeliveryTransport::new(config.delivery_config()));
        Self::with_parts(
            config,
            transport,
            Box::new(SystemTimeSource::new()),
            Arc::new(PrometheusMetrics::new()),
        )
    }

    /// Wire the runtime with explicit adapters.
    pub fn with_parts(
        config: NodeConfig,
        transport: Arc<dyn DeliveryTransport>,
        time_source: Box<dyn TimeSource>,
        metrics: Arc<dyn CoordinatorMetrics>,
    ) -> Self {
        let coordinator = Arc::new(Coordinator::from_config(
            &config,
            transport,
            time_source,
            Arc::clone(&metrics),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            coordinator,
            metrics,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Bind the listener and spawn background tasks.
    ///
    /// Returns the address the listener is bound to.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let api: Arc<dyn CoordinatorApi> = self.coordinator.clone();
        let listener = CommandListener::bind(
            self.config.listen_addr(),
            api,
            self.config.listener_config(),
        )
        .await
        .with_context(|| format!("Failed to bind {}", self.config.listen_addr()))?
        .with_metrics(Arc::clone(&self.metrics));
        let local_addr = listener
            .local_addr()
            .context("Failed to read listener address")?;

        self.tasks
            .push(tokio::spawn(listener.run(self.shutdown_rx.clone())));

        if self.config.compaction.enabled {
            self.tasks.push(tokio::spawn(run_compaction(
                Arc::clone(&self.coordinator),
                self.config.compaction_interval(),
                self.shutdown_rx.clone(),
            )));
        }

        info!(
            %local_addr,
            persistence_secs = self.config.retention.persistence_time_secs,
            compaction = self.config.compaction.enabled,
            "Coordinator running"
        );
        Ok(local_addr)
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        Arc::clone(&self.coordinator)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");

        if self.shutdown_tx.send(true).is_err() {
            warn!("No task was listening for shutdown");
        }

        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Background task failed"),
                Err(_) => warn!("Background task did not stop in time"),
            }
        }

        info!("Shutdown complete");
    }
}

/// Periodically drop messages that left the retention window.
async fn run_compaction(
    coordinator: Arc<Coordinator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                coordinator.compact();
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
