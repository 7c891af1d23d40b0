use thiserror::Error;

/// Every failure the client layer can hand back to its caller.
///
/// `Display` renders the user-facing message and nothing else, so a caller can
/// put `err.to_string()` straight into a [`crate::response::StatusMessage`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never completed (connection refused, DNS failure, reset...).
    #[error("{message}")]
    BackendUnreachable { address: String, message: String },

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    BackendRejected { status: u16, message: String },

    /// The polled task reached the FAILED state.
    #[error("{0}")]
    TaskFailed(String),

    /// A task-status payload did not have the expected shape.
    #[error("{0}")]
    SchemaParse(String),

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    MissingInput(String),

    /// Polling was stopped through its cancellation token.
    #[error("polling cancelled for task {task_id}")]
    Cancelled { task_id: String },

    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    /// Stable name of the error kind, for logs and machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BackendUnreachable { .. } => "BackendUnreachable",
            Self::BackendRejected { .. } => "BackendRejected",
            Self::TaskFailed(_) => "TaskFailed",
            Self::SchemaParse(_) => "SchemaParse",
            Self::InvalidFormat(_) => "InvalidFormat",
            Self::MissingInput(_) => "MissingInput",
            Self::Cancelled { .. } => "Cancelled",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// HTTP status of a rejected request. None for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BackendRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend address named by a transport failure.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::BackendUnreachable { address, .. } => Some(address),
            _ => None,
        }
    }
}
