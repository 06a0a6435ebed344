//! Core error types for the EO client

#[derive(thiserror::Error, Debug)]
pub enum EoError {
    #[error("Value {value} does not fit in {width} encoded byte(s)")]
    EncodingOverflow { value: u64, width: usize },

    #[error("Unsupported number width: {0}")]
    InvalidWidth(usize),

    #[error("Truncated frame: needed {needed} byte(s), {available} available")]
    TruncatedFrame { needed: usize, available: usize },

    #[error("Invalid record length: expected {expected} byte(s), got {actual}")]
    InvalidRecordLength { expected: usize, actual: usize },

    #[error("Property {0} does not apply to this record type")]
    OutOfRange(String),

    #[error("Property {property} cannot be read as {requested}")]
    InvalidCast {
        property: String,
        requested: &'static str,
    },

    #[error("Sequence desync: expected {expected}, received {received}")]
    SequenceDesync { expected: u32, received: u32 },

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Connection is not initialized")]
    NotInitialized,

    #[error("Invalid connection state: {0}")]
    InvalidState(String),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl EoError {
    /// Whether this error leaves the connection unusable.
    ///
    /// Fatal conditions force the client back to `Disconnected`; everything
    /// else is local to the call that produced it.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            EoError::TruncatedFrame { .. }
                | EoError::SequenceDesync { .. }
                | EoError::ConnectionLost(_)
                | EoError::Io(_)
                | EoError::Protocol(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EoError>;
