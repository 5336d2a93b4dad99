//! MIME header handling.

use crate::error::{Error, Result};
use std::fmt;

/// Recommended maximum header line length (RFC 5322 §2.1.1).
const FOLD_AT: usize = 78;

/// Ordered collection of email headers.
///
/// Headers keep the order they were added in and the name casing they were
/// added with; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid field name or the value
    /// contains a line break or other control character.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate(&name, &value)?;
        self.headers.push((name, value));
        Ok(())
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of header fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return Err(Error::InvalidHeader(format!("invalid field name {name:?}")));
    }
    if value.chars().any(|c| c.is_control() && c != '\t') {
        return Err(Error::InvalidHeader(format!(
            "{name} contains a control character"
        )));
    }
    Ok(())
}

/// Writes `name: value`, folding at spaces so lines stay within 78
/// characters where the value allows it.
fn write_field(f: &mut fmt::Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    write!(f, "{name}:")?;
    let mut line_length = name.len() + 1;

    for (i, word) in value.split(' ').enumerate() {
        if i > 0 && line_length + 1 + word.len() > FOLD_AT {
            f.write_str("\r\n")?;
            line_length = 0;
        }
        write!(f, " {word}")?;
        line_length += 1 + word.len();
    }

    f.write_str("\r\n")
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write_field(f, name, value)?;
        }
        Ok(())
    }
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

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain").unwrap();
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_repeat_names_in_order() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com").unwrap();
        headers.add("Subject", "Hi").unwrap();
        headers.add("To", "bob@example.com").unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("to"), Some("alice@example.com"));
        let to: Vec<&str> = headers
            .iter()
            .filter(|(n, _)| *n == "To")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(to, vec!["alice@example.com", "bob@example.com"]);
    }

    #[test]
    fn test_headers_reject_injection() {
        let mut headers = Headers::new();
        assert!(headers.add("Subject", "Hi\r\nBcc: evil@example.com").is_err());
        assert!(headers.add("Bad Name", "x").is_err());
        assert!(headers.add("", "x").is_err());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_display_keeps_order() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com").unwrap();
        headers.add("To", "recipient@example.com").unwrap();
        headers.add("Subject", "Test").unwrap();

        assert_eq!(
            headers.to_string(),
            "From: sender@example.com\r\nTo: recipient@example.com\r\nSubject: Test\r\n"
        );
    }

    #[test]
    fn test_long_header_folds_at_spaces() {
        let mut headers = Headers::new();
        let value = (0..10)
            .map(|i| format!("Recipient {i} <recipient{i}@example.com>"))
            .collect::<Vec<_>>()
            .join(", ");
        headers.add("To", value.clone()).unwrap();

        let rendered = headers.to_string();
        for line in rendered.trim_end().split("\r\n") {
            assert!(line.len() <= 78, "line too long: {line}");
        }
        // Unfolding restores the original value.
        let unfolded = rendered.trim_end().replace("\r\n", "");
        assert_eq!(unfolded, format!("To: {value}"));
    }
}
