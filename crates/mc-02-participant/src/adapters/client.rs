//! Coordinator client: one connection per command.

use std::time::Duration;

use shared_types::{Command, ACK_LINE, MAX_LINE_LEN};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::domain::ParticipantError;

/// Sends protocol commands to the coordinator and waits for the ack.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    addr: String,
    ack_timeout: Duration,
}

impl CoordinatorClient {
    pub fn new(addr: impl Into<String>, ack_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            ack_timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Write `command` as one line and wait for the ack line.
    ///
    /// Connect, write and read all share the ack timeout.
    pub async fn send(&self, command: &Command) -> Result<(), ParticipantError> {
        let verb = command.verb();
        let exchange = async {
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(|e| self.unreachable(e))?;
            let (read_half, mut write_half) = stream.into_split();

            write_half
                .write_all(format!("{command}\n").as_bytes())
                .await
                .map_err(|e| self.unreachable(e))?;

            let mut reply = String::new();
            BufReader::new(read_half)
                .take(MAX_LINE_LEN as u64)
                .read_line(&mut reply)
                .await
                .map_err(|e| self.unreachable(e))?;
            Ok::<_, ParticipantError>(reply)
        };

        let reply = tokio::time::timeout(self.ack_timeout, exchange)
            .await
            .map_err(|_| ParticipantError::Timeout {
                addr: self.addr.clone(),
            })??;

        if reply.trim_end() != ACK_LINE {
            return Err(ParticipantError::NotAcknowledged {
                verb,
                reply: reply.trim_end().to_string(),
            });
        }
        debug!(coordinator = %self.addr, verb, "Command acknowledged");
        Ok(())
    }

    fn unreachable(&self, error: std::io::Error) -> ParticipantError {
        ParticipantError::CoordinatorUnreachable {
            addr: self.addr.clone(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ParticipantId;
    use tokio::net::TcpListener;

    /// Accept one connection, read the line, answer with `reply`.
    async fn one_shot_server(reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let task = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut line = String::new();
            BufReader::new(read_half).read_line(&mut line).await.unwrap();
            write_half.write_all(reply.as_bytes()).await.unwrap();
            line
        });
        (addr, task)
    }

    fn disconnect() -> Command {
        Command::Disconnect {
            id: ParticipantId::new("alice").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_send_waits_for_ack() {
        let (addr, server) = one_shot_server("ack\n").await;
        let client = CoordinatorClient::new(addr, Duration::from_secs(2));

        client.send(&disconnect()).await.unwrap();
        assert_eq!(server.await.unwrap(), "disconnect alice\n");
    }

    #[tokio::test]
    async fn test_unexpected_reply_is_rejected() {
        let (addr, _server) = one_shot_server("nope\n").await;
        let client = CoordinatorClient::new(addr, Duration::from_secs(2));

        let err = client.send(&disconnect()).await.unwrap_err();
        assert!(matches!(
            err,
            ParticipantError::NotAcknowledged { verb: "disconnect", .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_coordinator() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let client = CoordinatorClient::new(addr, Duration::from_secs(2));

        assert!(matches!(
            client.send(&disconnect()).await,
            Err(ParticipantError::CoordinatorUnreachable { .. })
        ));
    }

    #[tokio::test]
    async fn test_silent_coordinator_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        // Accept but never answer.
        let _server = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });
        let client = CoordinatorClient::new(addr, Duration::from_millis(100));

        assert!(matches!(
            client.send(&disconnect()).await,
            Err(ParticipantError::Timeout { .. })
        ));
    }
}
