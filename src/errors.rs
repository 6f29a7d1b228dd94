use thiserror::Error;
use std::fmt;

use crate::analysis::WINDOW_DAYS;

/// Why an analysis could not be run for a ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Fewer trading days than the analysis window
    InsufficientHistory { available: usize },
    /// Share count missing or zero
    SharesOutstandingUnknown,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::InsufficientHistory { .. } => {
                write!(f, "fewer than {} trading days", WINDOW_DAYS)
            }
            UnavailableReason::SharesOutstandingUnknown => {
                write!(f, "shares outstanding unavailable")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum DelistError {
    #[error("{ticker}: Unable to retrieve sufficient data ({reason}).")]
    DataUnavailable {
        ticker: String,
        reason: UnavailableReason,
    },

    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DelistError {
    pub fn data_unavailable(ticker: &str, reason: UnavailableReason) -> Self {
        DelistError::DataUnavailable {
            ticker: ticker.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, DelistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_unavailable_message_names_ticker_and_reason() {
        let err = DelistError::data_unavailable(
            "AMC",
            UnavailableReason::InsufficientHistory { available: 12 },
        );
        assert_eq!(
            err.to_string(),
            "AMC: Unable to retrieve sufficient data (fewer than 30 trading days)."
        );

        let err = DelistError::data_unavailable("GME", UnavailableReason::SharesOutstandingUnknown);
        assert_eq!(
            err.to_string(),
            "GME: Unable to retrieve sufficient data (shares outstanding unavailable)."
        );
    }
}
