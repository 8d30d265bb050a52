use thiserror::Error;

use crate::notifier::CallbackOrigin;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Callback failed in {origin}: {message}")]
    CallbackFailure {
        origin: CallbackOrigin,
        message: String,
    },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
