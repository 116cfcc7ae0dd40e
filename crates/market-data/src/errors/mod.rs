//! Market data errors and their retry classification.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Failure of a quote lookup. See [`retry_class`](Self::retry_class) for
/// which ones are repeated.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but has no quotes in the requested period.
    #[error("No data for date range")]
    NoDataForRange,

    /// HTTP 429 from the provider.
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// Any other provider failure, with the provider's message.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The provider answered with a quote that cannot be used.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

impl MarketDataError {
    /// ```
    /// use ledgerfolio_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "YAHOO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,
            Self::SymbolNotFound(_)
            | Self::NoDataForRange
            | Self::ProviderError { .. }
            | Self::ValidationFailed { .. } => RetryClass::Never,
        }
    }
}
