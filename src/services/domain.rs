//! Errors shared by the external service clients.
//!
//! Every client maps its transport and API failures into [`ServiceError`]
//! so the generator can react to the taxonomy without knowing which
//! service produced the failure. [`ExtractedParams`] is the structured
//! object the extraction service hands back.

use serde::{Deserialize, Deserializer};

/// Errors that can occur when talking to an external service
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// Credential rejected, and the one refresh-and-retry also failed
    #[error("Access token expired or revoked")]
    AuthExpired,

    /// Network failure, rate limiting, or 5xx response
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service answered with a non-success status we don't retry
    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body didn't have the shape we expected
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The client isn't configured (missing credentials, no stored user)
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl ServiceError {
    /// Classify a reqwest transport error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        ServiceError::ServiceUnavailable(err.to_string())
    }

    /// Classify a non-success HTTP status that isn't an auth failure.
    pub fn from_status(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            ServiceError::ServiceUnavailable(format!("HTTP {}: {}", status.as_u16(), message))
        } else {
            ServiceError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Playlist parameters pulled out of a free-text request.
///
/// Every field is optional: absence means "use the default". The
/// extraction model sometimes quotes numbers, so `num_songs` accepts
/// both `15` and `"15"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractedParams {
    #[serde(deserialize_with = "lenient_count")]
    pub num_songs: Option<i64>,
    pub is_daily_drive: Option<bool>,
    pub allow_explicit: Option<bool>,
    pub ruleset_name: Option<String>,
    pub guidelines: Option<String>,
    pub music_only: Option<bool>,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
