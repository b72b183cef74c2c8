use thiserror::Error;

/// Failure of a single HTTP GET issued by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request error: {0}")]
    Request(String),
}

/// Anything that prevents the primary record from being obtained or decoded.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("error retrieving movie: {0}")]
    Remote(String),

    #[error("field `{field}` has unparseable value {value:?}")]
    InvalidValue { field: String, value: String },
}

/// Error surfaced by `MovieRecord` operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("field `{field}` is not {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

impl RecordError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Lookup(_) => "lookup_error",
            Self::FieldNotFound(_) => "field_not_found",
            Self::WrongType { .. } => "wrong_type",
        }
    }

    pub fn is_field_not_found(&self) -> bool {
        matches!(self, Self::FieldNotFound(_))
    }
}

impl From<TransportError> for RecordError {
    fn from(e: TransportError) -> Self {
        Self::Lookup(LookupError::Transport(e))
    }
}
