//! Typed error enum for the notify crate.

use thiserror::Error;

/// Errors from the mail and ticketing transports.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("cannot build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("unexpected ticket response: {0}")]
    InvalidResponse(String),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}
