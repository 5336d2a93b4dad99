//! MIME message structure and serialisation.

use crate::address::{Address, format_address_list};
use crate::content_type::{ContentType, format_parameter_value};
use crate::encoding::{
    encode_base64_lines, encode_quoted_printable, encode_rfc2047, is_seven_bit, normalize_crlf,
};
use crate::error::{Error, Result};
use crate::header::Headers;
use encoding_rs::{Encoding, UTF_8};
use sha2::{Digest, Sha256};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Base64 encoding.
    Base64,
}

impl TransferEncoding {
    /// Picks the encoding for a text body.
    #[must_use]
    pub fn for_text(data: &[u8]) -> Self {
        if is_seven_bit(data) {
            Self::SevenBit
        } else {
            Self::QuotedPrintable
        }
    }

    /// Encodes `data` for transport; the result always uses CRLF line breaks.
    #[must_use]
    pub fn encode(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::SevenBit => normalize_crlf(data),
            Self::QuotedPrintable => encode_quoted_printable(data).into_bytes(),
            Self::Base64 => encode_base64_lines(data).into_bytes(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// How a mail client should present an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Offered as a separate download.
    #[default]
    Attachment,
    /// Displayed in place, referenced from the body through `cid:`.
    Inline,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attachment => write!(f, "attachment"),
            Self::Inline => write!(f, "inline"),
        }
    }
}

/// MIME message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body, already transfer-encoded.
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Creates a `text/html; charset=UTF-8` body part.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers cannot be built.
    pub fn html(html: &str) -> Result<Self> {
        let encoding = TransferEncoding::for_text(html.as_bytes());

        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::text_html().to_string())?;
        headers.add("Content-Transfer-Encoding", encoding.to_string())?;

        Ok(Self::new(headers, encoding.encode(html.as_bytes())))
    }

    /// Creates a `text/html; charset=UTF-8` body part from rendered bytes
    /// in `charset`, or in UTF-8 when no charset is declared.
    ///
    /// Bytes in a legacy charset are transcoded to UTF-8; sequences that
    /// charset cannot map become U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCharset`] if the label names no known
    /// encoding, and [`Error::InvalidUtf8`] if UTF-8 bytes do not decode.
    pub fn html_bytes(html: &[u8], charset: Option<&str>) -> Result<Self> {
        let encoding = match charset.map(str::trim).filter(|label| !label.is_empty()) {
            None => UTF_8,
            Some(label) => Encoding::for_label(label.as_bytes())
                .ok_or_else(|| Error::UnknownCharset(label.to_string()))?,
        };
        if encoding == UTF_8 {
            return Self::html(std::str::from_utf8(html)?);
        }
        let (text, _) = encoding.decode_without_bom_handling(html);
        Self::html(&text)
    }

    /// Creates an attachment part.
    ///
    /// The filename is set on both `Content-Type` (`name`) and
    /// `Content-Disposition` (`filename`). Inline parts also get
    /// `Content-ID: <name>` so the body can reference them as `cid:name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or cannot be written into a header.
    pub fn attachment(
        name: &str,
        content_type: ContentType,
        data: &[u8],
        disposition: Disposition,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidHeader("attachment name is empty".into()));
        }

        let encoding = TransferEncoding::Base64;
        let content_type = content_type.with_parameter("name", name);

        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string())?;
        headers.add("Content-Transfer-Encoding", encoding.to_string())?;
        headers.add(
            "Content-Disposition",
            format!("{disposition}; filename={}", format_parameter_value(name)),
        )?;
        if disposition == Disposition::Inline {
            headers.add("Content-ID", format!("<{name}>"))?;
        }

        Ok(Self::new(headers, encoding.encode(data)))
    }

    /// Serialises headers, blank line and body.
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

/// Multipart MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message headers, in the order they are written.
    pub headers: Headers,
    /// Message parts.
    pub parts: Vec<Part>,
    boundary: String,
}

impl Message {
    /// Returns the multipart boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Serialises the message in RFC 5322 form with CRLF line endings.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");

        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            part.write_to(&mut out);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        out
    }
}

/// Builds a [`Message`] from addresses, subject and parts.
///
/// Headers are written in a fixed order: From, To, Cc, Bcc, Reply-To,
/// Subject, then `MIME-Version` and the multipart `Content-Type`. Building is
/// deterministic: the boundary is derived from the part contents, and no
/// `Date` or `Message-ID` is generated.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Option<Address>,
    subject: Option<String>,
    parts: Vec<Part>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, address: Address) -> Self {
        self.from = Some(address);
        self
    }

    /// Adds `To` recipients.
    #[must_use]
    pub fn to(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.to.extend(addresses);
        self
    }

    /// Adds `Cc` recipients.
    #[must_use]
    pub fn cc(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.cc.extend(addresses);
        self
    }

    /// Adds `Bcc` recipients.
    #[must_use]
    pub fn bcc(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.bcc.extend(addresses);
        self
    }

    /// Sets the reply-to address.
    #[must_use]
    pub fn reply_to(mut self, address: Address) -> Self {
        self.reply_to = Some(address);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Appends a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Assembles the message.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no sender, no part, or a header value is
    /// rejected.
    pub fn build(self) -> Result<Message> {
        let from = self
            .from
            .ok_or_else(|| Error::MissingHeader("From".into()))?;
        if self.parts.is_empty() {
            return Err(Error::InvalidHeader("message has no parts".into()));
        }

        let mut headers = Headers::new();
        headers.add("From", from.to_header())?;
        for (name, list) in [("To", &self.to), ("Cc", &self.cc), ("Bcc", &self.bcc)] {
            if !list.is_empty() {
                headers.add(name, format_address_list(list))?;
            }
        }
        if let Some(reply_to) = &self.reply_to {
            headers.add("Reply-To", reply_to.to_header())?;
        }
        if let Some(subject) = &self.subject {
            headers.add("Subject", encode_rfc2047(subject, "UTF-8"))?;
        }

        let boundary = derive_boundary(&self.parts);
        headers.add("MIME-Version", "1.0")?;
        headers.add(
            "Content-Type",
            ContentType::multipart_mixed(boundary.as_str()).to_string(),
        )?;

        Ok(Message {
            headers,
            parts: self.parts,
            boundary,
        })
    }
}

/// Derives a boundary from a digest of the parts, bumping a counter until
/// it does not occur in any part.
fn derive_boundary(parts: &[Part]) -> String {
    let serialized: Vec<Vec<u8>> = parts.iter().map(Part::to_bytes).collect();

    let mut hasher = Sha256::new();
    for bytes in &serialized {
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    let digest = hasher.finalize();

    let mut counter: u32 = 0;
    loop {
        let mut round = Sha256::new();
        round.update(digest);
        round.update(counter.to_be_bytes());
        let hex: String = round
            .finalize()
            .iter()
            .take(12)
            .map(|b| format!("{b:02x}"))
            .collect();
        let boundary = format!("----=_Part_{hex}");

        let marker = format!("--{boundary}");
        if !serialized
            .iter()
            .any(|bytes| contains(bytes, marker.as_bytes()))
        {
            return boundary;
        }
        counter += 1;
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn addr(email: &str, name: Option<&str>) -> Address {
        Address::new(email, name).unwrap()
    }

    fn sample() -> MessageBuilder {
        MessageBuilder::new()
            .from(addr("sender@email.com", None))
            .to([
                addr("recipient1@email.com", Some("Recipient 1")),
                addr("recipient2@email.com", Some("Recipient 2")),
            ])
            .cc([addr("cc@email.com", None)])
            .bcc([addr("bcc@email.com", None)])
            .reply_to(addr("reply@email.com", None))
            .subject("Test subject")
            .part(Part::html("This is a test message").unwrap())
    }

    #[test]
    fn test_transfer_encoding_for_text() {
        assert_eq!(
            TransferEncoding::for_text(b"plain"),
            TransferEncoding::SevenBit
        );
        assert_eq!(
            TransferEncoding::for_text("Grüße".as_bytes()),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_header_order() {
        let message = sample().build().unwrap();
        let names: Vec<&str> = message.headers.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "From",
                "To",
                "Cc",
                "Bcc",
                "Reply-To",
                "Subject",
                "MIME-Version",
                "Content-Type"
            ]
        );
        assert_eq!(
            message.headers.get("To"),
            Some("Recipient 1 <recipient1@email.com>, Recipient 2 <recipient2@email.com>")
        );
    }

    #[test]
    fn test_serialized_layout() {
        let message = sample().build().unwrap();
        let text = String::from_utf8(message.to_bytes()).unwrap();
        let boundary = message.boundary();

        assert!(text.contains("From: sender@email.com\r\n"));
        assert!(text.contains("Subject: Test subject\r\n"));
        assert!(text.contains(&format!(
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n"
        )));
        assert!(text.contains(&format!(
            "\r\n\r\n--{boundary}\r\nContent-Type: text/html; charset=UTF-8\r\nContent-Transfer-Encoding: 7bit\r\n\r\nThis is a test message\r\n--{boundary}--\r\n"
        )));
    }

    #[test]
    fn test_omits_absent_headers() {
        let message = MessageBuilder::new()
            .from(addr("sender@email.com", None))
            .to([addr("a@x.com", None)])
            .part(Part::html("hi").unwrap())
            .build()
            .unwrap();

        assert!(message.headers.get("Cc").is_none());
        assert!(message.headers.get("Bcc").is_none());
        assert!(message.headers.get("Reply-To").is_none());
        assert!(message.headers.get("Subject").is_none());
    }

    #[test]
    fn test_missing_from() {
        let err = MessageBuilder::new()
            .part(Part::html("hi").unwrap())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingHeader(h) if h == "From"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded() {
        let message = sample().subject("Grüße").build().unwrap();
        assert_eq!(message.headers.get("Subject"), Some("=?UTF-8?B?R3LDvMOfZQ==?="));
    }

    #[test]
    fn test_subject_injection_rejected() {
        let err = sample()
            .subject("Hi\r\nBcc: someone@evil.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_inline_attachment_has_content_id() {
        let part = Part::attachment(
            "logo.png",
            ContentType::new("image", "png"),
            &[0x89, b'P', b'N', b'G'],
            Disposition::Inline,
        )
        .unwrap();

        assert_eq!(part.headers.get("Content-ID"), Some("<logo.png>"));
        assert_eq!(
            part.headers.get("Content-Disposition"),
            Some("inline; filename=logo.png")
        );
        assert_eq!(
            part.headers.get("Content-Type"),
            Some("image/png; name=logo.png")
        );
        assert_eq!(part.headers.get("Content-Transfer-Encoding"), Some("base64"));
        assert_eq!(part.body, b"iVBORw==".to_vec());
    }

    #[test]
    fn test_regular_attachment_has_no_content_id() {
        let part = Part::attachment(
            "report.csv",
            ContentType::new("text", "csv").with_parameter("charset", "UTF-8"),
            b"a,b\n1,2\n",
            Disposition::Attachment,
        )
        .unwrap();

        assert!(part.headers.get("Content-ID").is_none());
        assert_eq!(
            part.headers.get("Content-Type"),
            Some("text/csv; charset=UTF-8; name=report.csv")
        );
    }

    #[test]
    fn test_html_bytes_without_charset_must_be_utf8() {
        let part = Part::html_bytes("<p>é</p>".as_bytes(), None).unwrap();
        assert_eq!(
            part.headers.get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
        assert_eq!(part.body, b"<p>=C3=A9</p>".to_vec());

        let err = Part::html_bytes(&[0xff, 0xfe], None).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8(_)));

        let err = Part::html_bytes(&[0xff, 0xfe], Some(" utf-8 ")).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8(_)));
    }

    #[test]
    fn test_html_bytes_transcodes_declared_charset() {
        let part = Part::html_bytes(&[b'c', b'a', b'f', 0xe9], Some("ISO-8859-1")).unwrap();
        assert_eq!(
            part.headers.get("Content-Type"),
            Some("text/html; charset=UTF-8")
        );
        assert_eq!(
            part.headers.get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
        assert_eq!(part.body, b"caf=C3=A9".to_vec());

        let part = Part::html_bytes(&[0x93, b'q', 0x94], Some("windows-1252")).unwrap();
        assert_eq!(part.body, b"=E2=80=9Cq=E2=80=9D".to_vec());
    }

    #[test]
    fn test_html_bytes_unknown_charset() {
        let err = Part::html_bytes(b"hi", Some("x-klingon")).unwrap_err();
        assert!(matches!(err, Error::UnknownCharset(ref label) if label == "x-klingon"));
    }

    #[test]
    fn test_html_trailing_carriage_return_is_escaped() {
        let part = Part::html("abc\r").unwrap();
        assert_eq!(
            part.headers.get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
        assert_eq!(part.body, b"abc=0D".to_vec());
    }

    #[test]
    fn test_attachment_name_required() {
        let err = Part::attachment(
            " ",
            ContentType::new("text", "plain"),
            b"",
            Disposition::Attachment,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = sample().build().unwrap().to_bytes();
        let second = sample().build().unwrap().to_bytes();
        assert_eq!(first, second);
    }

    #[test]
    fn test_boundary_depends_on_content() {
        let a = sample().build().unwrap();
        let b = sample()
            .part(Part::html("another").unwrap())
            .build()
            .unwrap();
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn test_boundary_avoids_content() {
        let parts = vec![Part::html("x").unwrap()];
        let boundary = derive_boundary(&parts);

        // A body that happens to contain the first candidate forces a new one.
        let html = format!("see --{boundary} here");
        let parts = vec![Part::html(&html).unwrap()];
        let next = derive_boundary(&parts);
        assert!(!html.contains(&format!("--{next}")));
    }
}
