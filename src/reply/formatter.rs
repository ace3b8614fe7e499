//! Rendering of [`Reply`] values as HTTP/1.1 response text.
//!
//! Only a handful of statuses are understood. `201` is reported with a
//! `200 OK` status line and every status outside the known set renders as a
//! `500` reply. All lines end in CRLF and `Content-Length` counts the bytes of
//! the final body.

use chrono::{DateTime, Utc};

use super::Reply;

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const UPDATED_BODY: &str = "File updated Successfully";
const BAD_REQUEST_BODY: &str = "Server can not understand request";
const NOT_FOUND_BODY: &str = "File not present in the current directory";
const SERVER_ERROR_BODY: &str = "Internal Server Error";

enum Rendering<'a> {
    Content { body: &'a str, content_type: Option<&'a str> },
    Fixed { status_line: &'static str, body: &'static str },
}

impl<'a> Rendering<'a> {
    fn of(reply: &'a Reply) -> Self {
        match reply.status_code() {
            200 => Self::Content {
                body: reply.body(),
                content_type: reply.content_type(),
            },
            201 => Self::Fixed {
                status_line: "200 OK",
                body: UPDATED_BODY,
            },
            400 => Self::Fixed {
                status_line: "400 Bad Request",
                body: BAD_REQUEST_BODY,
            },
            404 => Self::Fixed {
                status_line: "404 Not Found",
                body: NOT_FOUND_BODY,
            },
            _ => Self::Fixed {
                status_line: "500 Internal Server Error",
                body: SERVER_ERROR_BODY,
            },
        }
    }
}

fn disposition(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some(kind) if kind.starts_with("text/") => "inline",
        Some(_) => "attachment",
        None => "null",
    }
}

/// Render `reply` using the current UTC time for the `Date` header.
#[must_use]
pub fn format(reply: &Reply) -> String { format_at(reply, Utc::now()) }

/// Render `reply` with an explicit `Date` header value.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use relayhttp::reply::{Reply, format_at};
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
/// let text = format_at(&Reply::status(404), now);
/// assert!(text.starts_with("HTTP/1.1 404 Not Found\r\nDate: Fri, 01 Mar 2024 12:00:00 GMT\r\n"));
/// assert!(text.ends_with("\r\n\r\nFile not present in the current directory"));
/// ```
#[must_use]
pub fn format_at(reply: &Reply, now: DateTime<Utc>) -> String {
    let date = now.format(DATE_FORMAT);
    let (status_line, body, content_headers) = match Rendering::of(reply) {
        Rendering::Content { body, content_type } => (
            "200 OK",
            body,
            format!(
                "Content-Type: {}\r\nContent-Disposition: {}\r\n",
                content_type.unwrap_or("null"),
                disposition(content_type),
            ),
        ),
        Rendering::Fixed { status_line, body } => (status_line, body, String::new()),
    };

    format!(
        "HTTP/1.1 {status_line}\r\nDate: {date}\r\n{content_headers}Content-Length: {}\r\n\
         Connection: Close\r\nServer: Localhost\r\n\r\n{body}",
        body.len(),
    )
}
