//! # Chat Events
//!
//! The event side of input handling: a broadcast [`ChatBus`] carrying chat
//! messages, and an [`InputListener`] feeding them into an input registry.
//!
//! ```text
//! ┌──────────┐     ┌─────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Source  │────▶│ ChatBus │────▶│InputListener│────▶│InputRegistry│
//! └──────────┘     └─────────┘     └─────────────┘     └─────────────┘
//! ```

pub mod chat_bus;
pub mod input_listener;

pub use chat_bus::{BusError, BusResult, ChatBus, ChatMessage, ChatReceiver};
pub use input_listener::InputListener;
