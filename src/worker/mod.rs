//! Application worker answering queued requests.
//!
//! The worker drains the [`RequestReceiver`] shared by all sessions and
//! answers each request through its own reply channel. Requests are handled
//! concurrently, one task per request, so a slow disk read for one client
//! does not hold up the others.

mod file;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

pub use file::{Method, RequestError, RequestLine};
use log::{debug, info};
use tokio_util::task::TaskTracker;

use crate::{reply::Reply, request::RequestReceiver};

/// Serves files from a single directory.
#[derive(Clone, Debug)]
pub struct FileWorker {
    root: Arc<PathBuf>,
}

impl FileWorker {
    /// Create a worker serving files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// Directory the worker serves.
    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Produce the reply for one request text.
    pub async fn handle(&self, text: &str) -> Reply {
        match RequestLine::parse(text) {
            Ok(request) => file::execute(&self.root, &request).await,
            Err(e) => {
                debug!("rejecting request: error={e}");
                Reply::status(400)
            }
        }
    }

    /// Answer requests until every queue handle is dropped, then wait for
    /// the requests still being handled.
    pub async fn serve(self, mut requests: RequestReceiver) {
        let tracker = TaskTracker::new();
        info!("file worker started: root={}", self.root().display());
        while let Some(request) = requests.recv().await {
            if request.is_abandoned() {
                debug!("skipping abandoned request");
                continue;
            }
            let worker = self.clone();
            tracker.spawn(async move {
                let reply = worker.handle(request.body()).await;
                let status = reply.status_code();
                if request.respond(reply).is_err() {
                    debug!("reply discarded, session gone: status={status}");
                }
            });
        }
        tracker.close();
        tracker.wait().await;
        info!("file worker stopped: root={}", self.root().display());
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::request::{Request, request_queue};

    #[tokio::test]
    async fn serve_answers_each_request_on_its_channel() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("a.txt"), "alpha").expect("write a");
        let (queue, requests) = request_queue();
        let worker = FileWorker::new(dir.path());
        assert_eq!(worker.root(), dir.path());
        let worker = tokio::spawn(worker.serve(requests));

        let (found, found_rx) = Request::new("GET /a.txt HTTP/1.1");
        let (missing, missing_rx) = Request::new("GET /b.txt HTTP/1.1");
        queue.push(found).expect("queue open");
        queue.push(missing).expect("queue open");

        let found = found_rx.await.expect("reply");
        assert_eq!(found.status_code(), 200);
        assert_eq!(found.body(), "alpha");
        assert_eq!(missing_rx.await.expect("reply").status_code(), 404);

        drop(queue);
        worker.await.expect("worker finished");
    }

    #[tokio::test]
    async fn abandoned_requests_are_skipped() {
        let dir = TempDir::new().expect("temp dir");
        let (queue, requests) = request_queue();
        let (request, reply_rx) = Request::new("POST /x.txt HTTP/1.1\r\n\r\nbody");
        drop(reply_rx);
        queue.push(request).expect("queue open");
        drop(queue);

        FileWorker::new(dir.path()).serve(requests).await;
        assert!(!dir.path().join("x.txt").exists());
    }
}
