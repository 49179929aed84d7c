use thiserror::Error;

use crate::event::chat_bus::BusError;

#[derive(Error, Debug)]
pub enum InputError {
    /// An expectation was registered for a type no converter can produce.
    #[error("No converter found for input type: {type_name}")]
    MissingConverter { type_name: &'static str },
    #[error("Expectation is not bound to a live input registry")]
    RegistryUnavailable,
    #[error("Chat bus error: {0}")]
    Bus(#[from] BusError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InputResult<T> = Result<T, InputError>;

impl InputError {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        InputError::Internal(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        InputError::Config(message.into())
    }
}
