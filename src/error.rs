use std::fmt;

/// Errors surfaced at the boundary of the core (config loading,
/// persistence I/O, RPC transport status). The Raft state machine and
/// the MapReduce scheduler themselves never propagate errors upward —
/// their public methods return plain values, matching the Go lab APIs
/// this crate generalizes.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Something went wrong internally that should never happen.
    Internal(String),
    /// Invalid configuration.
    Config(String),
    /// A value failed to serialize or deserialize.
    Serialization(String),
    /// The RPC transport reported a failure.
    Transport(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Internal(s) => write!(f, "Internal error: {}", s),
            Error::Config(s) => write!(f, "Config error: {}", s),
            Error::Serialization(s) => write!(f, "Serialization error: {}", s),
            Error::Transport(s) => write!(f, "Transport error: {}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Error::Transport(status.message().to_string())
    }
}

impl From<tonic::transport::Error> for Error {
    fn from(err: tonic::transport::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
