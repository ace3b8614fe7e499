//! Request-line parsing and file operations behind [`FileWorker`](super::FileWorker).

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use derive_more::Display;
use log::{debug, warn};
use thiserror::Error;
use tokio::fs;

use crate::reply::Reply;

/// Methods the file worker understands.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Method {
    #[display("GET")]
    Get,
    #[display("POST")]
    Post,
}

/// Reasons a request text is answered with `400`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("empty request")]
    Empty,
    #[error("malformed request line: {0:?}")]
    MalformedLine(String),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("path leaves the served directory: {0}")]
    PathEscape(String),
}

/// The parts of a request the worker acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestLine<'a> {
    method: Method,
    path: &'a str,
    body: &'a str,
}

impl<'a> RequestLine<'a> {
    /// Parse `METHOD /path [HTTP/x.y]`, followed by optional headers and a
    /// body separated by a blank line.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] for empty texts, malformed request lines and
    /// methods other than `GET` and `POST`.
    pub fn parse(text: &'a str) -> Result<Self, RequestError> {
        let first = text.lines().next().map(str::trim).unwrap_or_default();
        if first.is_empty() {
            return Err(RequestError::Empty);
        }
        let mut parts = first.split_whitespace();
        let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
            return Err(RequestError::MalformedLine(first.to_owned()));
        };
        let version_ok = parts.next().is_none_or(|v| v.starts_with("HTTP/"));
        if !version_ok || parts.next().is_some() || !path.starts_with('/') {
            return Err(RequestError::MalformedLine(first.to_owned()));
        }
        let method = match method {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => return Err(RequestError::UnsupportedMethod(other.to_owned())),
        };
        Ok(Self {
            method,
            path,
            body: body_of(text),
        })
    }

    #[must_use]
    pub const fn method(&self) -> Method { self.method }

    #[must_use]
    pub const fn path(&self) -> &'a str { self.path }

    /// Text after the first blank line, empty if there is none.
    #[must_use]
    pub const fn body(&self) -> &'a str { self.body }
}

fn body_of(text: &str) -> &str {
    let crlf = text.find("\r\n\r\n").map(|at| at + 4);
    let lf = text.find("\n\n").map(|at| at + 2);
    let start = match (crlf, lf) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b).unwrap_or(text.len()),
    };
    &text[start..]
}

/// Map a request path onto a file below `root`.
///
/// Returns `None` for the directory itself.
fn resolve(root: &Path, path: &str) -> Result<Option<PathBuf>, RequestError> {
    let mut resolved = root.to_path_buf();
    let mut nested = false;
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(name) => {
                resolved.push(name);
                nested = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RequestError::PathEscape(path.to_owned()));
            }
        }
    }
    Ok(nested.then_some(resolved))
}

pub(super) async fn execute(root: &Path, request: &RequestLine<'_>) -> Reply {
    let target = match resolve(root, request.path()) {
        Ok(target) => target,
        Err(e) => {
            warn!("rejecting request: method={}, error={e}", request.method());
            return Reply::status(400);
        }
    };
    let result = match (request.method(), target) {
        (Method::Get, None) => list(root).await,
        (Method::Get, Some(file)) => read(&file).await,
        (Method::Post, None) => return Reply::status(400),
        (Method::Post, Some(file)) => write(&file, request.body()).await,
    };
    result.unwrap_or_else(|e| {
        if e.kind() == io::ErrorKind::NotFound && request.method() == Method::Get {
            debug!("file not found: path={}", request.path());
            Reply::status(404)
        } else {
            warn!(
                "file operation failed: method={}, path={}, error={e}",
                request.method(),
                request.path()
            );
            Reply::status(500)
        }
    })
}

async fn list(dir: &Path) -> io::Result<Reply> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();
    let mut listing = names.join("\n");
    if !listing.is_empty() {
        listing.push('\n');
    }
    Ok(Reply::ok(listing, "text/plain"))
}

async fn read(file: &Path) -> io::Result<Reply> {
    if fs::metadata(file).await?.is_dir() {
        return list(file).await;
    }
    let bytes = fs::read(file).await?;
    let body = String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    Ok(Reply::ok(body, content_type(file)))
}

async fn write(file: &Path, body: &str) -> io::Result<Reply> {
    fs::write(file, body).await?;
    debug!("file written: path={}, bytes={}", file.display(), body.len());
    Ok(Reply::status(201))
}

fn content_type(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("txt" | "log" | "md") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some(_) => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn served_dir() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("hello.txt"), "hello world").expect("write");
        std::fs::write(dir.path().join("page.html"), "<p>hi</p>").expect("write");
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");
        dir
    }

    async fn run(dir: &TempDir, text: &str) -> Reply {
        match RequestLine::parse(text) {
            Ok(request) => execute(dir.path(), &request).await,
            Err(_) => Reply::status(400),
        }
    }

    #[rstest]
    #[case("GET /a HTTP/1.1", Method::Get, "/a", "")]
    #[case("GET /a", Method::Get, "/a", "")]
    #[case("POST /a HTTP/1.0\r\nHost: x\r\n\r\nline one\r\nline two", Method::Post, "/a", "line one\r\nline two")]
    #[case("POST /a HTTP/1.1\n\nbody", Method::Post, "/a", "body")]
    fn parses_request_lines(
        #[case] text: &str,
        #[case] method: Method,
        #[case] path: &str,
        #[case] body: &str,
    ) {
        let line = RequestLine::parse(text).expect("valid request");
        assert_eq!(line.method(), method);
        assert_eq!(line.path(), path);
        assert_eq!(line.body(), body);
    }

    #[rstest]
    #[case("", RequestError::Empty)]
    #[case("GET", RequestError::MalformedLine("GET".into()))]
    #[case("GET a HTTP/1.1", RequestError::MalformedLine("GET a HTTP/1.1".into()))]
    #[case("GET /a FTP/1", RequestError::MalformedLine("GET /a FTP/1".into()))]
    #[case("DELETE /a HTTP/1.1", RequestError::UnsupportedMethod("DELETE".into()))]
    fn rejects_malformed_requests(#[case] text: &str, #[case] expected: RequestError) {
        assert_eq!(RequestLine::parse(text), Err(expected));
    }

    #[rstest]
    #[case("/", None)]
    #[case("/./", None)]
    #[case("/a.txt", Some("a.txt"))]
    #[case("/dir/a.txt", Some("dir/a.txt"))]
    fn resolves_paths_below_root(#[case] path: &str, #[case] expected: Option<&str>) {
        let root = Path::new("/srv");
        assert_eq!(
            resolve(root, path).expect("inside root"),
            expected.map(|rel| root.join(rel))
        );
    }

    #[test]
    fn rejects_parent_components() {
        assert!(matches!(
            resolve(Path::new("/srv"), "/../etc/passwd"),
            Err(RequestError::PathEscape(_))
        ));
    }

    #[tokio::test]
    async fn get_serves_file_with_content_type() {
        let dir = served_dir();
        let reply = run(&dir, "GET /hello.txt HTTP/1.1").await;
        assert_eq!(reply.status_code(), 200);
        assert_eq!(reply.body(), "hello world");
        assert_eq!(reply.content_type(), Some("text/plain"));

        let reply = run(&dir, "GET /page.html HTTP/1.1").await;
        assert_eq!(reply.content_type(), Some("text/html"));
    }

    #[tokio::test]
    async fn get_root_lists_directory() {
        let dir = served_dir();
        let reply = run(&dir, "GET / HTTP/1.1").await;
        assert_eq!(reply.status_code(), 200);
        assert_eq!(reply.body(), "hello.txt\nnested/\npage.html\n");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = served_dir();
        assert_eq!(run(&dir, "GET /nope.txt HTTP/1.1").await.status_code(), 404);
    }

    #[tokio::test]
    async fn post_writes_body() {
        let dir = served_dir();
        let reply = run(&dir, "POST /new.txt HTTP/1.1\r\nHost: x\r\n\r\nfresh").await;
        assert_eq!(reply.status_code(), 201);
        let written = std::fs::read_to_string(dir.path().join("new.txt")).expect("read");
        assert_eq!(written, "fresh");
    }

    #[rstest]
    #[case("POST / HTTP/1.1\r\n\r\nbody")]
    #[case("GET /../secret HTTP/1.1")]
    #[case("PUT /a HTTP/1.1")]
    #[tokio::test]
    async fn bad_requests_get_400(#[case] text: &str) {
        let dir = served_dir();
        assert_eq!(run(&dir, text).await.status_code(), 400);
    }

    #[tokio::test]
    async fn post_into_missing_directory_fails() {
        let dir = served_dir();
        let reply = run(&dir, "POST /absent/x.txt HTTP/1.1\r\n\r\nx").await;
        assert_eq!(reply.status_code(), 500);
    }

    #[test]
    fn unknown_extensions_are_binary() {
        assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
        assert_eq!(content_type(Path::new("README")), "text/plain");
        assert_eq!(content_type(Path::new("IMG.PNG")), "image/png");
    }
}
