use thiserror::Error;

/// Failure while building an HTTP adapter
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("missing required environment variable {0}")]
    MissingCredential(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
