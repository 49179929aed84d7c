//! # Input Listener
//!
//! Bridges the [`ChatBus`] to a [`ChatInputRegistry`]: every chat message that
//! was not cancelled is processed as input from its sender, with the message
//! itself as context.

use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use crate::{
    input::{ChatInputRegistry, Dispatch},
    InputResult,
};

use super::chat_bus::{BusError, ChatBus, ChatMessage, ChatReceiver};

pub struct InputListener {
    registry: ChatInputRegistry,
}

impl InputListener {
    pub fn new(registry: ChatInputRegistry) -> Self {
        Self { registry }
    }

    /// Processes a single message. `None` when the message was cancelled.
    pub fn on_message(&self, message: &ChatMessage) -> InputResult<Option<Dispatch>> {
        if message.cancelled {
            trace!(sender = %message.sender, "cancelled message ignored");
            return Ok(None);
        }
        self.registry
            .process(&message.sender, &message.message, Some(message))
            .map(Some)
    }

    /// Forwards messages until the bus closes.
    ///
    /// Lagging is logged and tolerated. An error from the registry stops the
    /// listener and is returned.
    #[instrument(skip_all)]
    pub async fn run(self, mut receiver: ChatReceiver) -> InputResult<()> {
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    if let Err(e) = self.on_message(&message) {
                        error!(sender = %message.sender, "input processing failed: {}", e);
                        return Err(e);
                    }
                }
                Err(BusError::Lagged { count }) => {
                    warn!(count, "input listener lagged behind the chat bus");
                }
                Err(BusError::Closed) => {
                    debug!("chat bus closed, input listener stopping");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Subscribes to `bus` and runs the listener on a tokio task.
    pub fn spawn(self, bus: &ChatBus) -> JoinHandle<InputResult<()>> {
        let receiver = bus.subscribe();
        tokio::spawn(self.run(receiver))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_on_message_processes_sender_input() {
        let registry = ChatInputRegistry::with_defaults();
        let sender = Uuid::new_v4();
        let seen = Arc::new(Mutex::new(None));

        let recorder = seen.clone();
        registry
            .expect::<i32>(sender)
            .then_with_context(move |value, message: &ChatMessage| {
                *recorder.lock().unwrap() = Some((value, message.message.clone()))
            })
            .submit()
            .unwrap();

        let listener = InputListener::new(registry);
        let outcome = listener.on_message(&ChatMessage::new(sender, "12")).unwrap();
        assert_eq!(outcome, Some(Dispatch::Success));
        assert_eq!(*seen.lock().unwrap(), Some((12, "12".to_string())));
    }

    #[test]
    fn test_cancelled_message_keeps_expectation() {
        let registry = ChatInputRegistry::with_defaults();
        let sender = Uuid::new_v4();
        registry.expect::<i32>(sender).submit().unwrap();

        let listener = InputListener::new(registry.clone());
        let outcome = listener
            .on_message(&ChatMessage::new(sender, "12").cancel())
            .unwrap();
        assert_eq!(outcome, None);
        assert_eq!(registry.pending_count(&sender), 1);
    }
}
