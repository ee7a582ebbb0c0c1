//! Custom error types for ticketdesk
//!
//! User-friendly error messages for all failure scenarios.

use thiserror::Error;

/// Main error type for the ticketdesk application
#[derive(Error, Debug)]
pub enum TicketError {
    /// Transport failure or non-2xx response on list/update/stats
    #[error("Network request failed: {0}\n\n  → Check that the ticket API is reachable.\n  → Run 'td config get api-url' to see the configured endpoint.")]
    Network(String),

    /// Server rejected a ticket submission; carries the raw error payload
    #[error("{0}")]
    Validation(String),

    /// Classification endpoint failed (always suppressed in the form)
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization/deserialization error
    #[error("Configuration file is invalid: {0}")]
    Toml(String),

    /// Terminal/TUI error
    #[error("Terminal error: {0}\n\n  → Try resizing your terminal or restarting it.")]
    Terminal(String),

    /// Invalid input from user
    #[error("{0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for TicketError {
    fn from(err: reqwest::Error) -> Self {
        TicketError::Network(err.to_string())
    }
}

impl From<toml::de::Error> for TicketError {
    fn from(err: toml::de::Error) -> Self {
        TicketError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for TicketError {
    fn from(err: toml::ser::Error) -> Self {
        TicketError::Toml(err.to_string())
    }
}

/// Result type alias using TicketError
pub type Result<T> = std::result::Result<T, TicketError>;
