use thiserror::Error;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The call did not produce a success response. `status` is `0` when
    /// no response arrived at all (DNS, connect, timeout, abort).
    #[error("request failed (status {status}): {body}")]
    Request { status: u16, body: String },

    /// A success body did not match the expected shape.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("{operation}: not implemented")]
    Unsupported { operation: &'static str },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ApiError::Request {
            status: 0,
            body: message.into(),
        }
    }

    pub(crate) fn unsupported(operation: &'static str) -> Self {
        ApiError::Unsupported { operation }
    }

    /// HTTP status of a failed request, `Some(0)` for transport failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Request { status: 0, .. })
    }
}
