//! # Chat Bus
//!
//! Broadcast channel carrying chat messages from their source to every
//! subscriber. Publishing never blocks; slow subscribers lag and are told how
//! many messages they missed.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// A chat line sent by one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Uuid,
    pub message: String,
    /// Cancelled messages are delivered to subscribers but never answer an
    /// expectation.
    pub cancelled: bool,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Uuid, message: impl Into<String>) -> Self {
        Self {
            sender,
            message: message.into(),
            cancelled: false,
            sent_at: Utc::now(),
        }
    }

    pub fn cancel(mut self) -> Self {
        self.cancelled = true;
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BusError {
    #[error("Failed to send message: {message}")]
    SendFailed { message: String },
    #[error("Receiver lagged behind by {count} messages")]
    Lagged { count: u64 },
    #[error("Chat bus closed")]
    Closed,
}

pub type BusResult<T> = Result<T, BusError>;

pub struct ChatBus {
    sender: broadcast::Sender<ChatMessage>,
}

impl ChatBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> ChatReceiver {
        ChatReceiver::new(self.sender.subscribe())
    }

    /// Returns the number of subscribers that will see the message.
    pub fn publish(&self, message: ChatMessage) -> BusResult<usize> {
        trace!(sender = %message.sender, "publishing chat message");
        self.sender.send(message).map_err(|e| BusError::SendFailed {
            message: e.to_string(),
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct ChatReceiver {
    receiver: broadcast::Receiver<ChatMessage>,
}

impl ChatReceiver {
    fn new(receiver: broadcast::Receiver<ChatMessage>) -> Self {
        Self { receiver }
    }

    /// Waits for the next message.
    ///
    /// After [`BusError::Lagged`] the receiver continues with the oldest
    /// message still buffered.
    pub async fn recv(&mut self) -> BusResult<ChatMessage> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(count) => BusError::Lagged { count },
            broadcast::error::RecvError::Closed => BusError::Closed,
        })
    }
}
