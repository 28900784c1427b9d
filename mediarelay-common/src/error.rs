use serde_json::Value;

/// Everything a relay request can fail with.
///
/// Every variant is surfaced to the caller; nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("invalid configuration value for {name}: {value:?}")]
    InvalidConfiguration { name: String, value: String },

    #[error("{0}")]
    MalformedInput(String),

    #[error("unsupported media type: {mime}")]
    UnsupportedMedia { mime: String },

    #[error("file exceeds {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("could not fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("{service} request failed")]
    UpstreamFailure {
        service: String,
        status: Option<u16>,
        detail: Value,
    },

    #[error("upstream reply carried no task id")]
    MissingTaskId { body: Value },

    #[error("rehosted file at {url} is not servable: {reason}")]
    VerificationFailed { url: String, reason: String },
}

impl RelayError {
    /// Stable machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::MissingConfiguration(_) => "missing_configuration",
            RelayError::InvalidConfiguration { .. } => "invalid_configuration",
            RelayError::MalformedInput(_) => "malformed_input",
            RelayError::UnsupportedMedia { .. } => "unsupported_media",
            RelayError::PayloadTooLarge { .. } => "payload_too_large",
            RelayError::FetchFailed { .. } => "fetch_failed",
            RelayError::UpstreamFailure { .. } => "upstream_failure",
            RelayError::MissingTaskId { .. } => "missing_task_id",
            RelayError::VerificationFailed { .. } => "verification_failed",
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        RelayError::MalformedInput(msg.into())
    }

    pub fn upstream(service: impl Into<String>, status: Option<u16>, detail: Value) -> Self {
        RelayError::UpstreamFailure {
            service: service.into(),
            status,
            detail,
        }
    }
}
