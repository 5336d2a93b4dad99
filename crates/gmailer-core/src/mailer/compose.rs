//! Turns an [`Email`] into the encoded envelope the Gmail API accepts.

use gmailer_mime::{
    Address, ContentType, Envelope, Message, MessageBuilder, Part, addresses_to_debug_string,
};
use tracing::error;

use super::email::{Attachment, Email, Mailbox, Recipients, Rendered};
use crate::error::{Error, Result};

/// Validated addresses of an email.
struct Addresses {
    from: Address,
    reply_to: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
}

impl Addresses {
    fn of(email: &Email) -> Result<Self> {
        Ok(Self {
            from: format_address(&email.from)?,
            reply_to: email.reply_to.as_ref().map(format_address).transpose()?,
            to: format_addresses(&email.to)?,
            cc: format_addresses(&email.cc)?,
            bcc: format_addresses(&email.bcc)?,
        })
    }
}

/// Validates one mailbox.
///
/// # Errors
///
/// Returns [`Error::AddressFormat`] if the address or display name cannot be
/// written into a header.
pub fn format_address(mailbox: &Mailbox) -> Result<Address> {
    Address::new(mailbox.email.as_str(), mailbox.name.as_deref()).map_err(Error::AddressFormat)
}

fn format_addresses(recipients: &Recipients) -> Result<Vec<Address>> {
    recipients.iter().map(format_address).collect()
}

/// Builds and encodes the MIME message for an email.
///
/// Composition is pure: the same email always yields the same envelope.
///
/// # Errors
///
/// Returns [`Error::AddressFormat`] for the first invalid address, or
/// [`Error::MimeConstruction`] if the body or an attachment cannot be
/// assembled. Nothing is partially built.
pub fn compose(email: &Email) -> Result<Envelope> {
    let addresses = Addresses::of(email)?;

    let message = build_message(email, &addresses).map_err(|source| {
        let summary = summarize(email, &addresses);
        error!(%summary, "failed to create email: {source}");
        Error::MimeConstruction { summary, source }
    })?;

    Ok(Envelope::encode(&message))
}

fn build_message(email: &Email, addresses: &Addresses) -> gmailer_mime::Result<Message> {
    let mut builder = MessageBuilder::new()
        .from(addresses.from.clone())
        .to(addresses.to.iter().cloned())
        .cc(addresses.cc.iter().cloned())
        .bcc(addresses.bcc.iter().cloned());
    if let Some(reply_to) = &addresses.reply_to {
        builder = builder.reply_to(reply_to.clone());
    }

    builder = builder
        .subject(email.subject.as_str())
        .part(body_part(&email.body)?);

    for attachment in &email.attachments {
        builder = builder.part(attachment_part(attachment)?);
    }

    builder.build()
}

/// Decodes the body in its declared charset. Without an explicit charset the
/// rendered content type's `charset` parameter applies, then UTF-8.
fn body_part(body: &Rendered) -> gmailer_mime::Result<Part> {
    let charset = match &body.charset {
        Some(charset) => Some(charset.clone()),
        None => ContentType::parse(&body.content_type)?
            .parameter("charset")
            .map(str::to_string),
    };
    Part::html_bytes(&body.content, charset.as_deref())
}

/// Content type is the rendered type plus its charset, if any.
fn attachment_part(attachment: &Attachment) -> gmailer_mime::Result<Part> {
    let mut content_type = ContentType::parse(&attachment.content.content_type)?;
    if let Some(charset) = &attachment.content.charset {
        content_type = content_type.with_parameter("charset", charset.as_str());
    }

    Part::attachment(
        &attachment.name,
        content_type,
        &attachment.content.content,
        attachment.disposition,
    )
}

/// One-line context for a failed composition.
fn summarize(email: &Email, addresses: &Addresses) -> String {
    let reply_to = addresses.reply_to.as_ref().map_or_else(
        || "null;null".to_string(),
        |a| format!("{};{}", a.email(), a.name().unwrap_or("null")),
    );

    format!(
        "from: {};{}, to: {}, cc: {}, bcc: {}, replyTo: {}, subject: {}, body: {} bytes, attachments: {}",
        addresses.from.email(),
        addresses.from.name().unwrap_or("null"),
        addresses_to_debug_string(&addresses.to),
        addresses_to_debug_string(&addresses.cc),
        addresses_to_debug_string(&addresses.bcc),
        reply_to,
        email.subject,
        email.body.content.len(),
        email.attachments.len(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn decoded(email: &Email) -> String {
        String::from_utf8(compose(email).unwrap().decode().unwrap()).unwrap()
    }

    fn sample() -> Email {
        Email::new(Mailbox::new("sender@email.com"))
            .to("recipient1@email.com", Some("Recipient 1"))
            .to("recipient2@email.com", Some("Recipient 2"))
            .cc("cc@email.com", None)
            .bcc("bcc@email.com", None)
            .reply_to(Mailbox::new("replyto@email.com"))
            .subject("Subject")
            .body(Rendered::html("<p>Hello</p>"))
    }

    #[test]
    fn test_headers() {
        let text = decoded(&sample());
        assert!(text.starts_with("From: sender@email.com\r\n"));
        assert!(text.contains(
            "To: Recipient 1 <recipient1@email.com>, Recipient 2 <recipient2@email.com>\r\n"
        ));
        assert!(text.contains("Cc: cc@email.com\r\n"));
        assert!(text.contains("Bcc: bcc@email.com\r\n"));
        assert!(text.contains("Reply-To: replyto@email.com\r\n"));
        assert!(text.contains("Subject: Subject\r\n"));

        let from = text.find("From:").unwrap();
        let to = text.find("To:").unwrap();
        let subject = text.find("Subject:").unwrap();
        assert!(from < to && to < subject);
    }

    #[test]
    fn test_body_part() {
        let text = decoded(&sample());
        assert!(text.contains(
            "Content-Type: text/html; charset=UTF-8\r\nContent-Transfer-Encoding: 7bit\r\n\r\n<p>Hello</p>\r\n"
        ));
    }

    #[test]
    fn test_attachment_parts() {
        let email = sample()
            .attach(Attachment::inline(
                "logo.png",
                Rendered::new(vec![0x89u8, b'P', b'N', b'G'], "image/png"),
            ))
            .attach(Attachment::new(
                "notes.txt",
                Rendered::new("hello", "text/plain").with_charset("UTF-8"),
            ));

        let text = decoded(&email);
        let boundary = text
            .split("boundary=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let delimiter = format!("--{boundary}");
        let segments: Vec<&str> = text.split(delimiter.as_str()).collect();
        assert_eq!(segments.last(), Some(&"--\r\n"));

        // Body first, then one part per attachment in order.
        let parts = &segments[1..segments.len() - 1];
        assert_eq!(parts.len(), 1 + email.attachments.len());
        assert!(parts[0].starts_with("\r\nContent-Type: text/html; charset=UTF-8\r\n"));
        assert!(!parts[0].contains("Content-Disposition:"));
        assert!(parts[1].starts_with(
            "\r\nContent-Type: image/png; name=logo.png\r\nContent-Transfer-Encoding: base64\r\nContent-Disposition: inline; filename=logo.png\r\nContent-ID: <logo.png>\r\n"
        ));
        assert!(
            parts[2].starts_with("\r\nContent-Type: text/plain; charset=UTF-8; name=notes.txt\r\n")
        );
        assert!(parts[2].contains("Content-Disposition: attachment; filename=notes.txt\r\n"));
        assert!(!parts[2].contains("Content-ID:"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let email = sample().attach(Attachment::new(
            "a.bin",
            Rendered::new(vec![0u8; 300], "application/octet-stream"),
        ));
        assert_eq!(compose(&email).unwrap(), compose(&email).unwrap());
    }

    #[test]
    fn test_invalid_address_aborts() {
        let email = sample().to("not-an-address", Some("Nobody"));
        let err = compose(&email).unwrap_err();
        assert!(matches!(err, Error::AddressFormat(_)));

        let email = sample().to("a@x.com", Some("Bad\r\nName"));
        assert!(matches!(compose(&email).unwrap_err(), Error::AddressFormat(_)));
    }

    #[test]
    fn test_invalid_attachment_type_is_mime_error() {
        let email = sample().attach(Attachment::new("x", Rendered::new(vec![1u8], "not a type")));
        let err = compose(&email).unwrap_err();
        match err {
            Error::MimeConstruction { summary, .. } => {
                assert!(summary.contains("from: sender@email.com;null"));
                assert!(summary.contains(
                    "to: recipient1@email.com,Recipient 1;recipient2@email.com,Recipient 2"
                ));
                assert!(summary.contains("attachments: 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_utf8_body_is_mime_error() {
        let email = sample().body(Rendered::new(vec![0xffu8, 0xfe], "text/html"));
        assert!(matches!(
            compose(&email).unwrap_err(),
            Error::MimeConstruction { .. }
        ));
    }

    #[test]
    fn test_body_is_decoded_in_declared_charset() {
        let latin1 = vec![b'c', b'a', b'f', 0xe9];
        let email =
            sample().body(Rendered::new(latin1.clone(), "text/html").with_charset("ISO-8859-1"));
        let text = decoded(&email);
        assert!(text.contains(
            "Content-Type: text/html; charset=UTF-8\r\nContent-Transfer-Encoding: quoted-printable\r\n\r\ncaf=C3=A9\r\n"
        ));

        let email = sample().body(Rendered::new(latin1, "text/html; charset=ISO-8859-1"));
        assert!(decoded(&email).contains("\r\n\r\ncaf=C3=A9\r\n"));
    }

    #[test]
    fn test_latin1_body_that_is_valid_utf8_is_not_relabelled() {
        let email = sample()
            .body(Rendered::new(vec![0xc3u8, 0xa9], "text/html").with_charset("ISO-8859-1"));
        assert!(decoded(&email).contains("\r\n\r\n=C3=83=C2=A9\r\n"));
    }

    #[test]
    fn test_unknown_body_charset_is_mime_error() {
        let email = sample()
            .body(Rendered::new(b"<p>Hi</p>".to_vec(), "text/html").with_charset("x-klingon"));
        match compose(&email).unwrap_err() {
            Error::MimeConstruction { source, .. } => {
                assert!(matches!(
                    source,
                    gmailer_mime::Error::UnknownCharset(ref label) if label == "x-klingon"
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
