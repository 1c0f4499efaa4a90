use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// The primary provider returned no usable current price; the core refuses to run without one.
    #[error("No current price reported for {0}")]
    MissingPrice(String),

    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
