//! # Participant Session
//!
//! Drives the local state machine. Each command is checked against
//! [`ClientState`] first; the coordinator is contacted only for allowed
//! transitions, and the new state is committed only after its ack.
//!
//! The receiver is started before `register`/`reconnect` is sent, so a
//! replay triggered by the coordinator always finds it listening.

use std::fmt;
use std::net::SocketAddr;

use shared_types::{Command, ParticipantAddr};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::{CoordinatorClient, MessageLog, ReceivedMessage, Receiver};
use crate::config::ParticipantConfig;
use crate::domain::{ClientState, ParticipantError, Transition, UserCommand};

/// What a successful command did, printed by the interactive loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Registered { addr: ParticipantAddr },
    Deregistered,
    Disconnected,
    Reconnected { addr: ParticipantAddr },
    Sent { message: String },
    Exited,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Registered { addr } => write!(f, "Registered with coordinator using {addr}"),
            Reply::Deregistered => write!(f, "Deregistered from coordinator"),
            Reply::Disconnected => write!(f, "Disconnected from coordinator"),
            Reply::Reconnected { addr } => write!(f, "Reconnected to coordinator using {addr}"),
            Reply::Sent { message } => write!(f, "Message sent: {message}"),
            Reply::Exited => write!(f, "Exiting participant program"),
        }
    }
}

/// One participant's connection to the coordinator.
pub struct ParticipantSession {
    config: ParticipantConfig,
    state: ClientState,
    client: CoordinatorClient,
    log: MessageLog,
    receiver: Option<Receiver>,
    inbox: mpsc::UnboundedSender<ReceivedMessage>,
}

impl ParticipantSession {
    /// Create a session and the channel received messages are forwarded to.
    pub fn new(config: ParticipantConfig) -> (Self, mpsc::UnboundedReceiver<ReceivedMessage>) {
        let (inbox, messages) = mpsc::unbounded_channel();
        let session = Self {
            client: CoordinatorClient::new(config.coordinator_addr(), config.ack_timeout()),
            log: MessageLog::new(config.log_file.clone()),
            config,
            state: ClientState::Unregistered,
            receiver: None,
            inbox,
        };
        (session, messages)
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn config(&self) -> &ParticipantConfig {
        &self.config
    }

    /// Address of the running receiver, if any.
    pub fn receiver_addr(&self) -> Option<SocketAddr> {
        self.receiver.as_ref().map(Receiver::local_addr)
    }

    pub async fn execute(&mut self, command: UserCommand) -> Result<Reply, ParticipantError> {
        match command {
            UserCommand::Register { port } => self.register(port).await,
            UserCommand::Deregister => self.deregister().await,
            UserCommand::Disconnect => self.disconnect().await,
            UserCommand::Reconnect { port } => self.reconnect(port).await,
            UserCommand::Msend { message } => self.msend(message).await,
            UserCommand::Exit => self.exit().await,
        }
    }

    /// Start the receiver on `port` and register its address.
    ///
    /// Port 0 binds an ephemeral port; the bound port is what gets
    /// registered.
    pub async fn register(&mut self, port: u16) -> Result<Reply, ParticipantError> {
        let next = self.state.next(Transition::Register)?;
        let addr = self.start_receiver(port).await?;
        let command = Command::Register {
            id: self.config.id.clone(),
            addr: addr.clone(),
        };
        self.send_or_stop_receiver(&command).await?;

        self.state = next;
        info!(participant = %self.config.id, %addr, "Registered");
        Ok(Reply::Registered { addr })
    }

    pub async fn deregister(&mut self) -> Result<Reply, ParticipantError> {
        let next = self.state.next(Transition::Deregister)?;
        self.client
            .send(&Command::Deregister {
                id: self.config.id.clone(),
            })
            .await?;

        self.state = next;
        self.stop_receiver().await;
        self.log.record_event("deregister", &self.config.id).await?;
        info!(participant = %self.config.id, "Deregistered");
        Ok(Reply::Deregistered)
    }

    pub async fn disconnect(&mut self) -> Result<Reply, ParticipantError> {
        let next = self.state.next(Transition::Disconnect)?;
        self.client
            .send(&Command::Disconnect {
                id: self.config.id.clone(),
            })
            .await?;

        self.state = next;
        self.stop_receiver().await;
        self.log.record_event("disconnect", &self.config.id).await?;
        info!(participant = %self.config.id, "Disconnected");
        Ok(Reply::Disconnected)
    }

    /// Start the receiver on `port` and ask the coordinator for a replay.
    pub async fn reconnect(&mut self, port: u16) -> Result<Reply, ParticipantError> {
        let next = self.state.next(Transition::Reconnect)?;
        let addr = self.start_receiver(port).await?;
        let command = Command::Reconnect {
            id: self.config.id.clone(),
            host: Some(addr.host.clone()),
            port: addr.port,
        };
        self.send_or_stop_receiver(&command).await?;

        self.state = next;
        info!(participant = %self.config.id, %addr, "Reconnected");
        Ok(Reply::Reconnected { addr })
    }

    pub async fn msend(&mut self, message: String) -> Result<Reply, ParticipantError> {
        self.state.next(Transition::Send)?;
        let command = Command::Msend {
            id: self.config.id.clone(),
            body: message.clone(),
        };
        // Render and re-parse so an empty body is caught before sending.
        Command::parse(&command.to_string())?;
        self.client.send(&command).await?;
        Ok(Reply::Sent { message })
    }

    /// Deregister if still known to the coordinator, then release the
    /// receiver.
    pub async fn exit(&mut self) -> Result<Reply, ParticipantError> {
        if self.state != ClientState::Unregistered {
            if let Err(e) = self.deregister().await {
                warn!(participant = %self.config.id, error = %e, "Deregister on exit failed");
            }
        }
        self.stop_receiver().await;
        Ok(Reply::Exited)
    }

    async fn start_receiver(&mut self, port: u16) -> Result<ParticipantAddr, ParticipantError> {
        self.stop_receiver().await;
        let receiver = Receiver::start(
            SocketAddr::new(self.config.bind_addr, port),
            self.log.clone(),
            self.inbox.clone(),
        )
        .await?;
        let addr = ParticipantAddr::new(self.config.advertise_host.clone(), receiver.port());
        self.receiver = Some(receiver);
        Ok(addr)
    }

    async fn stop_receiver(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.stop().await;
        }
    }

    async fn send_or_stop_receiver(&mut self, command: &Command) -> Result<(), ParticipantError> {
        if let Err(e) = self.client.send(command).await {
            self.stop_receiver().await;
            return Err(e);
        }
        Ok(())
    }
}
