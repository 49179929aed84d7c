//! # Awaited Input
//!
//! Typed, one-shot answers to questions asked of a chat participant.
//!
//! ## Flow
//!
//! ```text
//! ┌───────────┐ register ┌───────────────┐  process   ┌──────────┐
//! │Expectation│─────────▶│ InputRegistry │◀───────────│ raw text │
//! └───────────┘          └───────┬───────┘            └──────────┘
//!                                │ pop oldest for id
//!                                ▼
//!                        ┌───────────────┐
//!                        │   Converter   │
//!                        └───────┬───────┘
//!                 ┌──────────────┼──────────────┐
//!                 ▼              ▼              ▼
//!             mismatch        expired        success
//! ```
//!
//! 1. An [`Expectation`] is built for an identifier and a target type
//! 2. It is registered at the tail of that identifier's queue
//! 3. The next raw event for the identifier pops the oldest expectation
//! 4. Exactly one of its mismatch, expired, or success handlers runs

pub mod expectation;
pub mod input_registry;

pub use expectation::{ContextHandler, Expectation, RawHandler, Registered, SuccessHandler};
pub use input_registry::{
    fail_on_missing_converter, skip_missing_converter, ChatInputRegistry, Dispatch,
    InputRegistry, InvalidConverterHook, RegistryKey, WeakInputRegistry,
};
