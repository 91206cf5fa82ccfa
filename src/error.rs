use thiserror::Error as ThisError;

/// Failure talking to the market-data provider.
///
/// Covers transport errors, non-success statuses, provider-reported errors and
/// responses that parse but carry nothing usable.
#[derive(ThisError, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {0}")]
    Status(u16),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No data available for {0}")]
    NoData(String),
}

/// Not enough observations to compute a delta.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("{symbol}: need 2 observations, got {observed}")]
pub struct DataGapError {
    pub symbol: String,
    pub observed: usize,
}

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
