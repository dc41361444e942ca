//! Append-only log of received messages and session events.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use shared_types::{DeliveryLine, ParticipantId};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::ParticipantError;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A delivery as seen by this participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Local receive time.
    pub received_at: DateTime<Local>,
    pub line: DeliveryLine,
}

impl ReceivedMessage {
    pub fn new(line: DeliveryLine) -> Self {
        Self {
            received_at: Local::now(),
            line,
        }
    }

    /// `[<local time>] <sender>: <body>`
    pub fn log_entry(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.received_at.format(TIME_FORMAT),
            self.line.sender,
            self.line.body
        )
    }
}

/// Message log file, opened in append mode for every write.
#[derive(Debug, Clone)]
pub struct MessageLog {
    path: PathBuf,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record_message(&self, message: &ReceivedMessage) -> Result<(), ParticipantError> {
        self.append(&message.log_entry()).await
    }

    /// `[<local time>] <verb> <id>` for disconnect and deregister.
    pub async fn record_event(
        &self,
        verb: &str,
        id: &ParticipantId,
    ) -> Result<(), ParticipantError> {
        let entry = format!("[{}] {verb} {id}", Local::now().format(TIME_FORMAT));
        self.append(&entry).await
    }

    async fn append(&self, entry: &str) -> Result<(), ParticipantError> {
        let to_error = |e: std::io::Error| ParticipantError::Log {
            path: self.path.clone(),
            reason: e.to_string(),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(to_error)?;
        file.write_all(format!("{entry}\n").as_bytes())
            .await
            .map_err(to_error)?;
        file.flush().await.map_err(to_error)
    }
}
