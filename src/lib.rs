//! # input-await
//!
//! Typed, awaited answers from an unordered stream of chat messages.
//!
//! A caller asks "the next message from participant X should be read as `T`"
//! by registering an [`Expectation`](input::Expectation). When a message from
//! X arrives, the oldest open expectation for X is popped, the text is
//! converted with a pluggable converter, and exactly one of its handlers runs:
//!
//! - **success** with the converted value (plus a context-aware variant)
//! - **mismatch** with the raw text, when conversion fails
//! - **expired** with the raw text, when the answer is well formed but late
//!
//! ## Modules
//!
//! - [`converter`]: type-keyed converter registry and built-in converters
//! - [`input`]: expectations and the correlating input registry
//! - [`event`]: chat bus and the listener feeding it into a registry
//! - [`config`]: JSON configuration
//!
//! ## Example
//!
//! ```rust
//! use input_await::input::{ChatInputRegistry, Dispatch};
//! use uuid::Uuid;
//!
//! let registry = ChatInputRegistry::with_defaults();
//! let player = Uuid::new_v4();
//!
//! registry
//!     .expect::<i32>(player)
//!     .then(|answer| assert_eq!(answer, 42))
//!     .submit()
//!     .unwrap();
//!
//! assert_eq!(registry.process(&player, "42", None).unwrap(), Dispatch::Success);
//! assert!(!registry.is_waiting(&player));
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod event;
pub mod input;
pub mod timestamp;

// Re-exports
pub use error::*;
pub use input::{ChatInputRegistry, Dispatch, Expectation, InputRegistry, Registered};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
