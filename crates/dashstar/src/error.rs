#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Request to {url} failed: HTTP {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}
