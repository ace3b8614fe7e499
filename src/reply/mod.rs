//! Application replies and their HTTP-style rendering.
//!
//! A [`Reply`] is produced by the application worker for every request it
//! consumes. [`format`] turns it into the literal HTTP/1.1 text the session
//! fragments and sends back through the router.

mod formatter;

pub use formatter::{format, format_at};

/// Status, body and optional content type produced for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    status: u16,
    body: String,
    content_type: Option<String>,
}

impl Reply {
    /// Create a reply with no content type.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    /// Create a `200` reply carrying `body` of the given content type.
    #[must_use]
    pub fn ok(body: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::new(200, body).with_content_type(content_type)
    }

    /// Create a reply whose body is replaced by the fixed text for `status`.
    #[must_use]
    pub fn status(status: u16) -> Self { Self::new(status, String::new()) }

    /// Attach a content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub const fn status_code(&self) -> u16 { self.status }

    #[must_use]
    pub fn body(&self) -> &str { &self.body }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> { self.content_type.as_deref() }
}
