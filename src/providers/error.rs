use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Upstream feed error: {0}")]
    Upstream(String),
    #[error("Malformed feed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Malformed feed response: {0}")]
    MalformedMessage(String),
}

impl FeedError {
    /// Parse failures are a data-quality signal rather than an outage and
    /// are logged separately.
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            FeedError::Malformed(_) | FeedError::MalformedMessage(_)
        )
    }
}
