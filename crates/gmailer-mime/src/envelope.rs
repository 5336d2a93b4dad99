//! Raw message envelope for HTTP mail APIs.

use crate::encoding::{decode_base64url, encode_base64url};
use crate::error::Result;
use crate::message::Message;
use std::fmt;

/// A serialised message encoded as unpadded URL-safe Base64.
///
/// This is the `raw` field expected by the Gmail `messages.send` and
/// `drafts.create` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Envelope(String);

impl Envelope {
    /// Serialises and encodes a message.
    #[must_use]
    pub fn encode(message: &Message) -> Self {
        Self::from_bytes(&message.to_bytes())
    }

    /// Encodes already serialised message bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(encode_base64url(bytes))
    }

    /// Returns the encoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the envelope, returning the encoded text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Decodes back to the serialised message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid URL-safe Base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_base64url(&self.0)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Envelope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
