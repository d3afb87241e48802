use thiserror::Error;

/// Errors returned by payment-provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the request (4xx with a message we can surface).
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// Transport-level failure talking to the provider.
    #[error("provider request failed: {0}")]
    Transport(String),

    /// The provider returned a response we could not interpret.
    #[error("unexpected provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}
