use thiserror::Error;

/// The only way a chat exchange can fail.
///
/// Transport errors, non-success statuses and undecodable bodies all collapse
/// into this; the reason is kept for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request failed: {reason}")]
pub struct RequestFailed {
    pub reason: String,
}

impl RequestFailed {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for RequestFailed {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}
