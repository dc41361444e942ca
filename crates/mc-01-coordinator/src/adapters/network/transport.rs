use async_trait::async_trait;
use shared_types::{DeliveryLine, ParticipantAddr};

use crate::ports::{DeliveryError, DeliveryTransport};

// ============================================================================
// NoOpDeliveryTransport - Stub for testing without network
// ============================================================================

/// Transport that reports every delivery as successful without sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDeliveryTransport;

impl NoOpDeliveryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryTransport for NoOpDeliveryTransport {
    async fn deliver(
        &self,
        _addr: &ParticipantAddr,
        _line: &DeliveryLine,
    ) -> Result<(), DeliveryError> {
        Ok(())
    }
}

// ============================================================================
// TcpDeliveryTransport - Production TCP delivery (requires "network" feature)
// ============================================================================

#[cfg(feature = "network")]
mod tcp {
    use super::*;
    use crate::domain::DeliveryConfig;
    use std::io;
    use std::net::SocketAddr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{lookup_host, TcpStream};
    use tokio::time::timeout;

    /// Delivers each line over its own TCP connection.
    ///
    /// # Wire Protocol
    ///
    /// Connect, write `msend <sender> <body>\n`, shut down the write half,
    /// drop. Nothing is read back from the participant.
    #[derive(Debug, Clone, Default)]
    pub struct TcpDeliveryTransport {
        config: DeliveryConfig,
    }

    impl TcpDeliveryTransport {
        pub fn new(config: DeliveryConfig) -> Self {
            Self { config }
        }

        pub fn config(&self) -> DeliveryConfig {
            self.config
        }

        async fn resolve(addr: &ParticipantAddr) -> Result<SocketAddr, DeliveryError> {
            let mut candidates = lookup_host((addr.host.as_str(), addr.port))
                .await
                .map_err(|e| DeliveryError::InvalidAddress {
                    addr: addr.clone(),
                    reason: e.to_string(),
                })?;
            candidates.next().ok_or_else(|| DeliveryError::InvalidAddress {
                addr: addr.clone(),
                reason: "no addresses found".to_string(),
            })
        }

        fn map_io(addr: &ParticipantAddr, error: io::Error) -> DeliveryError {
            match error.kind() {
                io::ErrorKind::ConnectionRefused => DeliveryError::ConnectionRefused {
                    addr: addr.clone(),
                },
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                    DeliveryError::Timeout { addr: addr.clone() }
                }
                _ => DeliveryError::Io {
                    addr: addr.clone(),
                    reason: error.to_string(),
                },
            }
        }
    }

    #[async_trait]
    impl DeliveryTransport for TcpDeliveryTransport {
        async fn deliver(
            &self,
            addr: &ParticipantAddr,
            line: &DeliveryLine,
        ) -> Result<(), DeliveryError> {
            let connect = async {
                let target = Self::resolve(addr).await?;
                TcpStream::connect(target)
                    .await
                    .map_err(|e| Self::map_io(addr, e))
            };
            let mut stream = timeout(self.config.connect_timeout(), connect)
                .await
                .map_err(|_| DeliveryError::Timeout { addr: addr.clone() })??;

            let payload = format!("{line}\n");
            let write = async {
                stream.write_all(payload.as_bytes()).await?;
                stream.shutdown().await
            };
            timeout(self.config.write_timeout(), write)
                .await
                .map_err(|_| DeliveryError::Timeout { addr: addr.clone() })?
                .map_err(|e| Self::map_io(addr, e))
        }
    }
}

#[cfg(feature = "network")]
pub use tcp::TcpDeliveryTransport;
