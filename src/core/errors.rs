use thiserror::Error;

#[derive(Error, Debug)]
pub enum VimondError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Unknown error: unexpected HTTP status {status}")]
    Unknown { status: u16 },

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode failure: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to encode request body: {0}")]
    Encode(serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),
}

/// Failures below the HTTP status line: DNS, connect, TLS, cancellation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Response bodies that could not be turned into entities.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("field `{field}` is not a base-10 integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field `{field}` is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Flat classification of [`VimondError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Unknown,
    TransportFailure,
    DecodeFailure,
}

impl VimondError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidUrl(_) | Self::Encode(_) | Self::Config(_) => {
                ErrorKind::InvalidInput
            }
            Self::NotFound => ErrorKind::NotFound,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::Decode(_) => ErrorKind::DecodeFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<reqwest::Error> for VimondError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::Http(err))
    }
}

impl From<serde_json::Error> for VimondError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(DecodeError::Json(err))
    }
}

impl From<quick_xml::DeError> for VimondError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Decode(DecodeError::Xml(err))
    }
}
