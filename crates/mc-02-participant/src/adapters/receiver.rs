//! # Message Receiver
//!
//! TCP listener the coordinator delivers to. Each connection carries one
//! `msend <sender> <body>` line, which is appended to the message log and
//! forwarded to the session's inbox. Connections are handled one at a time
//! in accept order, so the log keeps the coordinator's delivery order.
//!
//! A receiver lives from register/reconnect until disconnect/deregister.
//! Stopping it closes the listening socket, so a later reconnect may reuse
//! the port.

use std::net::SocketAddr;
use std::time::Duration;

use shared_types::{DeliveryLine, MAX_LINE_LEN};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::log::{MessageLog, ReceivedMessage};
use crate::domain::ParticipantError;

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// A running receiver.
pub struct Receiver {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Receiver {
    /// Bind `addr` and start accepting deliveries.
    pub async fn start(
        addr: SocketAddr,
        log: MessageLog,
        inbox: mpsc::UnboundedSender<ReceivedMessage>,
    ) -> Result<Self, ParticipantError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ParticipantError::ReceiverBind {
                port: addr.port(),
                reason: e.to_string(),
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ParticipantError::ReceiverBind {
                port: addr.port(),
                reason: e.to_string(),
            })?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(%local_addr, "Message receiver started");
        let task = tokio::spawn(accept_loop(listener, log, inbox, shutdown_rx));

        Ok(Self {
            local_addr,
            shutdown_tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stop accepting and wait for the listener to close.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if tokio::time::timeout(STOP_TIMEOUT, self.task).await.is_err() {
            warn!(local_addr = %self.local_addr, "Receiver did not stop in time");
        }
        info!(local_addr = %self.local_addr, "Message receiver stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    log: MessageLog,
    inbox: mpsc::UnboundedSender<ReceivedMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => handle_delivery(stream, peer, &log, &inbox).await,
                Err(e) => warn!(error = %e, "Failed to accept delivery"),
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn handle_delivery(
    stream: TcpStream,
    peer: SocketAddr,
    log: &MessageLog,
    inbox: &mpsc::UnboundedSender<ReceivedMessage>,
) {
    let mut line = String::new();
    let mut reader = BufReader::new(stream).take(MAX_LINE_LEN as u64 + 2);
    match tokio::time::timeout(READ_TIMEOUT, reader.read_line(&mut line)).await {
        Ok(Ok(0)) => return,
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            warn!(%peer, error = %e, "Failed to read delivery");
            return;
        }
        Err(_) => {
            warn!(%peer, "Delivery read timed out");
            return;
        }
    }

    let delivery = match DeliveryLine::parse(&line) {
        Ok(delivery) => delivery,
        Err(e) => {
            warn!(%peer, error = %e, "Ignoring malformed delivery");
            return;
        }
    };

    let message = ReceivedMessage::new(delivery);
    if let Err(e) = log.record_message(&message).await {
        warn!(error = %e, "Failed to log message");
    }
    debug!(sender = %message.line.sender, "Message received");
    let _ = inbox.send(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn deliver(addr: SocketAddr, line: &str) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(line.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_receives_logs_and_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(dir.path().join("bob.log"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let receiver = Receiver::start("127.0.0.1:0".parse().unwrap(), log.clone(), tx)
            .await
            .unwrap();

        deliver(receiver.local_addr(), "msend alice hello there\n").await;

        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.line.sender.as_str(), "alice");
        assert_eq!(message.line.body, "hello there");

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.trim_end().ends_with("] alice: hello there"));

        receiver.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_delivery_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(dir.path().join("bob.log"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let receiver = Receiver::start("127.0.0.1:0".parse().unwrap(), log.clone(), tx)
            .await
            .unwrap();

        deliver(receiver.local_addr(), "register x 1.2.3.4 5\n").await;
        deliver(receiver.local_addr(), "msend alice ok\n").await;

        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.line.body, "ok");
        receiver.stop().await;
    }

    #[tokio::test]
    async fn test_stop_releases_port() {
        let dir = tempfile::tempdir().unwrap();
        let log = MessageLog::new(dir.path().join("bob.log"));
        let (tx, _rx) = mpsc::unbounded_channel();
        let receiver = Receiver::start("127.0.0.1:0".parse().unwrap(), log.clone(), tx.clone())
            .await
            .unwrap();
        let addr = receiver.local_addr();
        receiver.stop().await;

        assert!(TcpStream::connect(addr).await.is_err());
        let again = Receiver::start(addr, log, tx).await.unwrap();
        assert_eq!(again.local_addr(), addr);
        again.stop().await;
    }
}
