//! Outgoing email model.

use gmailer_mime::Disposition;

/// Email address with an optional display name, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
}

impl Mailbox {
    /// Creates a mailbox without a display name.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Recipients of one class (To, Cc or Bcc), keyed by email.
///
/// Insertion order is kept; inserting an email again replaces its display
/// name in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    mailboxes: Vec<Mailbox>,
}

impl Recipients {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipient or updates the display name of an existing one.
    pub fn insert(&mut self, email: impl Into<String>, name: Option<&str>) {
        let email = email.into();
        let name = name.map(ToString::to_string);
        match self.mailboxes.iter_mut().find(|m| m.email == email) {
            Some(existing) => existing.name = name,
            None => self.mailboxes.push(Mailbox { email, name }),
        }
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Mailbox> {
        self.mailboxes.iter()
    }

    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    /// Returns true if there are no recipients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }
}

impl<'a> IntoIterator for &'a Recipients {
    type Item = &'a Mailbox;
    type IntoIter = std::slice::Iter<'a, Mailbox>;

    fn into_iter(self) -> Self::IntoIter {
        self.mailboxes.iter()
    }
}

/// Rendered view output: bytes plus content type and charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Rendered bytes.
    pub content: Vec<u8>,
    /// MIME type, e.g. `text/html` or `application/pdf`.
    pub content_type: String,
    /// Character encoding of textual content.
    pub charset: Option<String>,
}

impl Rendered {
    /// Creates rendered content without a charset.
    #[must_use]
    pub fn new(content: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: content_type.into(),
            charset: None,
        }
    }

    /// UTF-8 HTML.
    #[must_use]
    pub fn html(html: impl Into<String>) -> Self {
        let html: String = html.into();
        Self::new(html, "text/html").with_charset("UTF-8")
    }

    /// Sets the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
}

impl Default for Rendered {
    fn default() -> Self {
        Self::html(String::new())
    }
}

/// A file attached to an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name; inline attachments are referenced as `cid:<name>`.
    pub name: String,
    /// Attachment content.
    pub content: Rendered,
    /// Whether the file is offered for download or shown in place.
    pub disposition: Disposition,
}

impl Attachment {
    /// Creates a regular attachment.
    #[must_use]
    pub fn new(name: impl Into<String>, content: Rendered) -> Self {
        Self {
            name: name.into(),
            content,
            disposition: Disposition::Attachment,
        }
    }

    /// Creates an inline attachment.
    #[must_use]
    pub fn inline(name: impl Into<String>, content: Rendered) -> Self {
        Self {
            disposition: Disposition::Inline,
            ..Self::new(name, content)
        }
    }

    /// Returns true if the attachment is shown in place.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.disposition == Disposition::Inline
    }
}

/// A message to send or save as a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Sender.
    pub from: Mailbox,
    /// Reply-to address.
    pub reply_to: Option<Mailbox>,
    /// Primary recipients.
    pub to: Recipients,
    /// Carbon copy recipients.
    pub cc: Recipients,
    /// Blind carbon copy recipients.
    pub bcc: Recipients,
    /// Subject line.
    pub subject: String,
    /// Rendered HTML body.
    pub body: Rendered,
    /// Attachments, in order.
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Creates an email with an empty subject and body.
    #[must_use]
    pub fn new(from: Mailbox) -> Self {
        Self {
            from,
            reply_to: None,
            to: Recipients::new(),
            cc: Recipients::new(),
            bcc: Recipients::new(),
            subject: String::new(),
            body: Rendered::default(),
            attachments: Vec::new(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, email: impl Into<String>, name: Option<&str>) -> Self {
        self.to.insert(email, name);
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, email: impl Into<String>, name: Option<&str>) -> Self {
        self.cc.insert(email, name);
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, email: impl Into<String>, name: Option<&str>) -> Self {
        self.bcc.insert(email, name);
        self
    }

    /// Sets the reply-to address.
    #[must_use]
    pub fn reply_to(mut self, mailbox: Mailbox) -> Self {
        self.reply_to = Some(mailbox);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: Rendered) -> Self {
        self.body = body;
        self
    }

    /// Appends an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// All recipients as `email,name` pairs separated by `;`, for logs and
    /// error context.
    #[must_use]
    pub fn recipient_summary(&self) -> String {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|m| format!("{},{}", m.email, m.name.as_deref().unwrap_or("")))
            .collect::<Vec<_>>()
            .join(";")
    }
}
