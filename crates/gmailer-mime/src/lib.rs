//! # gmailer-mime
//!
//! MIME message generation for the Gmail HTTP API.
//!
//! ## Features
//!
//! - **Addresses**: validated mailboxes with display names, quoted or RFC 2047
//!   encoded as needed
//! - **Message generation**: one `multipart/mixed` container holding an HTML
//!   body and any number of attachments, with inline parts addressable by
//!   `Content-ID`
//! - **Deterministic output**: the same input always serialises to the same
//!   bytes; the boundary is derived from the content
//! - **Encoding**: Base64, Quoted-Printable, RFC 2047 headers, and the
//!   URL-safe Base64 [`Envelope`] the Gmail API expects
//!
//! ## Quick Start
//!
//! ```ignore
//! use gmailer_mime::{Address, ContentType, Disposition, Envelope, MessageBuilder, Part};
//!
//! let message = MessageBuilder::new()
//!     .from(Address::new("sender@example.com", None)?)
//!     .to([Address::new("recipient@example.com", Some("Recipient"))?])
//!     .subject("Test Message")
//!     .part(Part::html("<p>Hello, <img src=\"cid:logo.png\"></p>")?)
//!     .part(Part::attachment(
//!         "logo.png",
//!         ContentType::new("image", "png"),
//!         &png_bytes,
//!         Disposition::Inline,
//!     )?)
//!     .build()?;
//!
//! let raw = Envelope::encode(&message);
//! println!("{raw}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod content_type;
mod envelope;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Address, addresses_to_debug_string, format_address_list};
pub use content_type::ContentType;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Disposition, Message, MessageBuilder, Part, TransferEncoding};
