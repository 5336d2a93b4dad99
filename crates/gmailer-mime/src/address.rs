//! Email addresses for header fields.

use crate::encoding::{encode_rfc2047, needs_rfc2047};
use crate::error::{Error, Result};
use std::fmt;

/// RFC 5322 `specials`; a display name containing any of them is quoted.
const SPECIALS: &str = "()<>[]:;@\\,.\"";

/// Mailbox address: email plus optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    email: String,
    name: Option<String>,
}

impl Address {
    /// Creates an address, validating the email and display name.
    ///
    /// A blank display name is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the email is malformed or the
    /// display name cannot be written into a header.
    pub fn new(email: impl Into<String>, name: Option<&str>) -> Result<Self> {
        let email = email.into().trim().to_string();
        validate_email(&email)?;

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(name) = name
            && name.chars().any(char::is_control)
        {
            return Err(Error::invalid_address(
                &email,
                "display name contains a control character",
            ));
        }

        Ok(Self {
            email,
            name: name.map(ToString::to_string),
        })
    }

    /// Returns the email part.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Renders the address as it appears in a header field:
    /// `email`, `Name <email>`, `"Quoted, Name" <email>` or an RFC 2047
    /// encoded name for non-ASCII text.
    #[must_use]
    pub fn to_header(&self) -> String {
        match &self.name {
            None => self.email.clone(),
            Some(name) if needs_rfc2047(name) => {
                format!("{} <{}>", encode_rfc2047(name, "UTF-8"), self.email)
            }
            Some(name) if name.contains(|c: char| SPECIALS.contains(c)) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{escaped}\" <{}>", self.email)
            }
            Some(name) => format!("{name} <{}>", self.email),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header())
    }
}

/// Validates the syntax of an `addr-spec` (basic validation).
fn validate_email(addr: &str) -> Result<()> {
    if addr.is_empty() {
        return Err(Error::invalid_address(addr, "address cannot be empty"));
    }

    let Some((local, domain)) = addr.split_once('@') else {
        return Err(Error::invalid_address(addr, "address must contain @"));
    };

    if domain.contains('@') {
        return Err(Error::invalid_address(addr, "address must have exactly one @"));
    }

    if local.is_empty() || domain.is_empty() {
        return Err(Error::invalid_address(
            addr,
            "local and domain parts cannot be empty",
        ));
    }

    if addr
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || "<>(),;:\"[]\\".contains(c))
    {
        return Err(Error::invalid_address(
            addr,
            "address contains a character that is not allowed",
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(Error::invalid_address(addr, "malformed domain"));
    }

    Ok(())
}

/// Joins addresses for a header field value.
#[must_use]
pub fn format_address_list(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(Address::to_header)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line summary of addresses for logs: `email,name` pairs separated by `;`.
#[must_use]
pub fn addresses_to_debug_string(addresses: &[Address]) -> String {
    addresses
        .iter()
        .map(|a| format!("{},{}", a.email, a.name.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join(";")
}
