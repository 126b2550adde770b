//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Crate error enumeration covering all non-domain failure modes.
///
/// Domain-level outcomes (succeeded, failed, exception) are never errors;
/// they flow as ordinary [`AgentOutput`](crate::agent::AgentOutput) values
/// so the transport layer has a uniform representation for "the agent ran
/// and produced an answer". Only faults outside the agent's domain logic
/// surface through this enum.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Wire value conversion failure.
    Codec(String),
    /// Internal fault reported by an agent task.
    Agent(String),
    /// Invocation aborted before a terminal result existed.
    Cancelled(String),
    /// Outbound stream or gRPC transport failure.
    Transport(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Whether this error represents caller-initiated cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Codec(msg) => write!(f, "codec: {msg}"),
            Self::Agent(msg) => write!(f, "agent: {msg}"),
            Self::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<tonic::transport::Error> for AppError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Cancelled(msg) => tonic::Status::cancelled(msg),
            other => tonic::Status::internal(other.to_string()),
        }
    }
}
