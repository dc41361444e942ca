//! TCP accept loop for protocol commands.
//!
//! One command per connection: read a single line, run it, answer with the
//! fixed acknowledgement, close. The ack is sent whatever the outcome;
//! failures are only logged here.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shared_types::{Command, ACK_LINE, MAX_LINE_LEN};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::CommandOutcome;
use crate::ports::{CoordinatorApi, CoordinatorMetrics, NoOpMetrics};

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    /// How long a client may take to send its command line.
    pub read_timeout: Duration,
    /// How long writing the ack may take.
    pub ack_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            ack_timeout: Duration::from_secs(2),
        }
    }
}

/// Accepts command connections and dispatches them to a [`CoordinatorApi`].
pub struct CommandListener {
    listener: TcpListener,
    api: Arc<dyn CoordinatorApi>,
    metrics: Arc<dyn CoordinatorMetrics>,
    config: ListenerConfig,
}

impl CommandListener {
    /// Bind the accept socket.
    ///
    /// # Errors
    ///
    /// Returns error if binding fails.
    pub async fn bind(
        addr: SocketAddr,
        api: Arc<dyn CoordinatorApi>,
        config: ListenerConfig,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            api,
            metrics: Arc::new(NoOpMetrics),
            config,
        })
    }

    /// Count received commands through `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn CoordinatorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` flips to true (or its sender is
    /// dropped). Each connection is served on its own task.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Command listener started");
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let api = Arc::clone(&self.api);
                        let metrics = Arc::clone(&self.metrics);
                        let config = self.config;
                        tokio::spawn(async move {
                            serve_connection(stream, peer, api, metrics, config).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "Accept failed"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Command listener stopped");
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    api: Arc<dyn CoordinatorApi>,
    metrics: Arc<dyn CoordinatorMetrics>,
    config: ListenerConfig,
) {
    let (read_half, mut write_half) = stream.split();
    // +2 leaves room for the line ending.
    let mut reader = BufReader::new(read_half).take(MAX_LINE_LEN as u64 + 2);
    let mut line = String::new();

    match timeout(config.read_timeout, reader.read_line(&mut line)).await {
        Err(_) => warn!(%peer, "Timed out waiting for command"),
        Ok(Err(e)) => warn!(%peer, error = %e, "Failed to read command"),
        Ok(Ok(0)) => debug!(%peer, "Connection closed without a command"),
        Ok(Ok(_)) => dispatch(&line, peer, api.as_ref(), metrics.as_ref()).await,
    }

    let ack = format!("{ACK_LINE}\n");
    let write = async {
        write_half.write_all(ack.as_bytes()).await?;
        write_half.shutdown().await
    };
    match timeout(config.ack_timeout, write).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(%peer, error = %e, "Failed to write ack"),
        Err(_) => debug!(%peer, "Timed out writing ack"),
    }
}

async fn dispatch(
    line: &str,
    peer: SocketAddr,
    api: &dyn CoordinatorApi,
    metrics: &dyn CoordinatorMetrics,
) {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            metrics.command_received("malformed");
            warn!(%peer, error = %e, "Rejected malformed command");
            return;
        }
    };

    let verb = command.verb();
    metrics.command_received(verb);
    let participant = command.participant().clone();
    match api.execute(command).await {
        Ok(CommandOutcome::Published(report)) => debug!(
            %peer,
            sender = %participant,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "msend handled"
        ),
        Ok(CommandOutcome::Reconnected(report)) => debug!(
            %peer,
            %participant,
            replayed = report.delivered,
            expired = report.expired,
            "reconnect handled"
        ),
        Ok(_) => debug!(%peer, %participant, command = verb, "Command handled"),
        Err(e) => warn!(%peer, %participant, command = verb, error = %e, "Command failed"),
    }
}
