use thiserror::Error;

/// Errors raised while setting up the runtime infrastructure.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value could not be applied (for example an invalid
    /// log filter directive).
    #[error("Invalid runtime configuration: {0}")]
    Config(String),

    /// The logging subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
