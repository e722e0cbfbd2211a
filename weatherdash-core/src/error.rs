use thiserror::Error;

/// Failure of a single provider HTTP call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The service answered with a non-success status. `message` carries
    /// the response body text when there was one, else the status's
    /// canonical reason phrase.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The payload was entirely unparsable. Missing substructure inside
    /// an otherwise well-formed payload degrades in normalization and
    /// never reaches this variant.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Build the status-failure variant from a response's status code
    /// and already-read body.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            truncate_body(body)
        };
        ProviderError::Status { status: status.as_u16(), message }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

/// Geolocation failure, with the user-facing distinction between "not
/// supported", "denied/unavailable", and "timed out".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this system.")]
    Unsupported,
    #[error("Location permission denied or unavailable.")]
    Denied,
    #[error("Location permission denied or unavailable.")]
    Unavailable,
    #[error("Location request timed out.")]
    Timeout,
}

/// Everything a single dashboard operation can fail with. Converted to
/// one user-facing status message at the orchestration boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Please enter a valid city name.")]
    EmptyQuery,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Location(#[from] LocationError),
}
