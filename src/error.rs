//! Error types for billing gateway orchestration.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for tollway operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An error surfaced by the external billing gateway.
    ///
    /// `code` and `http_status` carry the gateway's own error taxonomy when
    /// the response included one; transport-level failures leave them unset.
    #[error("Gateway error during '{operation}': {message}")]
    Gateway {
        operation: String,
        message: String,
        code: Option<String>,
        http_status: Option<u16>,
    },

    /// A gateway-reported billing interval code outside the recognized set.
    #[error("Unknown interval code: '{0}'")]
    UnknownIntervalCode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The operation is declared but intentionally not supported.
    #[error("{0} is not supported")]
    NotSupported(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build a gateway error without a structured code or status.
    pub fn gateway(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            operation: operation.into(),
            message: message.into(),
            code: None,
            http_status: None,
        }
    }

    /// Check if this is a caller error rather than a gateway/infrastructure
    /// fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::InvalidInput(_) | Self::UnknownIntervalCode(_) => true,
            Self::Gateway { http_status, .. } => {
                matches!(http_status, Some(400..=499))
            }
            _ => false,
        }
    }

    /// Check if retrying the operation could succeed.
    ///
    /// Rate limits (429) and gateway server errors (5xx) are retryable, as
    /// are transport failures with no HTTP status at all.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway { http_status, .. } => {
                matches!(http_status, Some(429) | Some(500..=599) | None)
            }
            _ => false,
        }
    }
}
