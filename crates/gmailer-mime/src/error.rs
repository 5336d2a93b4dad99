//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address or display name that cannot be written into a header.
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress {
        /// The offending address as supplied.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid MIME header.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Message without a sender.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// Charset label that names no known encoding.
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    /// Body declared as UTF-8 that does not decode as UTF-8.
    #[error("Body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

impl Error {
    pub(crate) fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }
}
