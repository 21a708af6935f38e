//! Replay handler
//!
//! One request in, one response out: derive the key, load the descriptor,
//! record the request, then replay the descriptor. The recording is written
//! before the response is built, and a failed recording means nothing from
//! the descriptor is sent.

use super::descriptor::{self, ReplayAction};
use super::dump;
use super::error::ReplayError;
use super::key::{self, PreviewRule};
use crate::http;
use crate::logger::{self, ReplayLogEntry};
use crate::store::{DescriptorStore, RequestRecorder};
use chrono::Local;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::USER_AGENT;
use hyper::{Method, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;

pub struct RedirectHandler<D, R> {
    descriptors: Arc<D>,
    recorder: Arc<R>,
    preview: PreviewRule,
    replay_log: bool,
}

impl<D, R> RedirectHandler<D, R>
where
    D: DescriptorStore,
    R: RequestRecorder,
{
    pub fn new(descriptors: Arc<D>, recorder: Arc<R>, preview: PreviewRule) -> Self {
        Self {
            descriptors,
            recorder,
            preview,
            replay_log: true,
        }
    }

    #[must_use]
    pub fn with_replay_log(mut self, enabled: bool) -> Self {
        self.replay_log = enabled;
        self
    }

    /// Handle one buffered request
    pub async fn handle(
        &self,
        req: &Request<Bytes>,
        remote_addr: SocketAddr,
    ) -> Response<Full<Bytes>> {
        match self.replay(req, remote_addr).await {
            Ok(resp) => resp,
            Err(err) => {
                match &err {
                    ReplayError::InvalidRequest { .. } => logger::log_warning(&err.to_string()),
                    ReplayError::UnknownCode { .. } => logger::log_error(&err.to_string()),
                    _ => logger::log_error(&format!("{} {err}", req.uri())),
                }
                let kind = err.kind();
                http::build_error_response(kind.status(), kind.client_message())
            }
        }
    }

    async fn replay(
        &self,
        req: &Request<Bytes>,
        remote_addr: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, ReplayError> {
        let key = key::derive_key(req.uri().path())?;
        let key = self.preview.apply(key, req.headers());

        let location = self.descriptors.resolve(&key);
        let content = self
            .descriptors
            .load(&location)
            .await
            .map_err(ReplayError::from_load)?;

        let stamp = dump::recording_stamp(&Local::now());
        self.recorder
            .record(&location, &stamp, &dump::dump_request(req))
            .await
            .map_err(ReplayError::Record)?;

        let action = descriptor::parse(&content)?;

        if self.replay_log {
            logger::log_replay(&replay_entry(req, remote_addr, &action));
        }

        Ok(emit(req, action))
    }
}

fn replay_entry(
    req: &Request<Bytes>,
    remote_addr: SocketAddr,
    action: &ReplayAction,
) -> ReplayLogEntry {
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    ReplayLogEntry::new(
        remote_addr.to_string(),
        action.status().as_u16(),
        req.method().to_string(),
        req.uri().to_string(),
    )
    .with_user_agent(user_agent)
}

fn emit(req: &Request<Bytes>, action: ReplayAction) -> Response<Full<Bytes>> {
    match action {
        ReplayAction::Redirect { status, location } => {
            let target = descriptor::resolve_location(req.uri().path(), &location);
            http::build_redirect_response_with_code(&target, status)
        }
        ReplayAction::Respond { status, body } if status.is_server_error() && body.is_empty() => {
            http::build_error_response(status, "Error")
        }
        ReplayAction::Respond { status, body } => {
            http::build_replay_response(status, body, req.method() == Method::GET)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FsStore, StoreError};
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_TYPE, LOCATION};
    use hyper::StatusCode;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn remote() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("host", "replay.test")
            .header("user-agent", "test-agent")
            .body(Bytes::from_static(b"request-body"))
            .unwrap()
    }

    fn fs_handler(root: &Path) -> RedirectHandler<FsStore, FsStore> {
        let store = Arc::new(FsStore::new(root));
        RedirectHandler::new(Arc::clone(&store), store, PreviewRule::default())
            .with_replay_log(false)
    }

    fn recordings(root: &Path, key: &str) -> Vec<PathBuf> {
        let prefix = format!("{key}.");
        let mut found: Vec<PathBuf> = std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n != format!("{key}.preview"))
            })
            .collect();
        found.sort();
        found
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    /// Store double that counts every access and can fail recordings
    #[derive(Default)]
    struct CountingStore {
        descriptor: Option<Vec<u8>>,
        fail_record: bool,
        loads: AtomicUsize,
        records: AtomicUsize,
    }

    impl DescriptorStore for CountingStore {
        fn resolve(&self, key: &str) -> PathBuf {
            PathBuf::from("/virtual").join(key)
        }

        async fn load(&self, location: &Path) -> Result<Vec<u8>, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.descriptor.clone().ok_or_else(|| StoreError::NotFound {
                location: location.to_path_buf(),
            })
        }
    }

    impl RequestRecorder for CountingStore {
        async fn record(
            &self,
            location: &Path,
            stamp: &str,
            _dump: &[u8],
        ) -> Result<PathBuf, StoreError> {
            self.records.fetch_add(1, Ordering::SeqCst);
            let path = PathBuf::from(format!("{}.{stamp}", location.display()));
            if self.fail_record {
                Err(StoreError::Io {
                    location: path,
                    source: std::io::Error::other("store unavailable"),
                })
            } else {
                Ok(path)
            }
        }
    }

    type CountingHandler = RedirectHandler<CountingStore, CountingStore>;

    fn counting_handler(store: CountingStore) -> (Arc<CountingStore>, CountingHandler) {
        let store = Arc::new(store);
        let handler =
            RedirectHandler::new(Arc::clone(&store), Arc::clone(&store), PreviewRule::default())
                .with_replay_log(false);
        (store, handler)
    }

    #[tokio::test]
    async fn test_traversal_is_rejected_without_io() {
        let (store, handler) = counting_handler(CountingStore {
            descriptor: Some(b"200 secret".to_vec()),
            ..CountingStore::default()
        });

        for uri in ["/..", "/a/..", "/%2e%2e", "/", "/x/..%2f"] {
            let resp = handler.handle(&request("GET", uri), remote()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body_of(resp).await, "INVALID REQUEST\n");
        }
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert_eq!(store.records.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_descriptor_is_404_without_recording() {
        let dir = tempfile::tempdir().unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/missing"), remote()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(resp).await, "Not Found\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_descriptor_is_500() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("adir")).unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/adir"), remote()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert_eq!(body, "Error\n");
        assert!(!String::from_utf8_lossy(&body).contains("adir"));
    }

    #[tokio::test]
    async fn test_redirect_for_any_method() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc"), b"301 /target\n").unwrap();
        let handler = fs_handler(dir.path());

        for method in ["GET", "POST", "HEAD", "DELETE"] {
            let resp = handler.handle(&request(method, "/go/abc"), remote()).await;
            assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY, "{method}");
            assert_eq!(resp.headers()[LOCATION], "/target");
            assert!(body_of(resp).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_relative_redirect_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc"), b"302 next").unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/go/abc"), remote()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[LOCATION], "/go/next");

        std::fs::write(dir.path().join("up"), "307 ../s\u{e9}e?x=1").unwrap();
        let resp = handler.handle(&request("GET", "/go/up"), remote()).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()[LOCATION], "/s%C3%A9e?x=1");
    }

    #[tokio::test]
    async fn test_body_only_for_get() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hi"), b"200 hello").unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/hi"), remote()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_of(resp).await, "hello");

        let resp = handler.handle(&request("POST", "/hi"), remote()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_of(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_numeric_descriptor_is_whole_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain"), b"abc").unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/plain"), remote()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, "abc");
    }

    #[tokio::test]
    async fn test_unknown_code_is_500_after_recording() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("odd"), b"199 x").unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/odd"), remote()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(resp).await, "Error\n");
        assert_eq!(recordings(dir.path(), "odd").len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_without_body_is_generic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("down"), b"503\n").unwrap();
        std::fs::write(dir.path().join("busy"), b"503 <p>busy</p>").unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/down"), remote()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_of(resp).await, "Error\n");

        let resp = handler.handle(&request("GET", "/busy"), remote()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_of(resp).await, "<p>busy</p>");
    }

    #[tokio::test]
    async fn test_each_request_is_recorded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc"), b"200 ok").unwrap();
        let handler = fs_handler(dir.path());

        let req = request("POST", "/abc?q=1");
        handler.handle(&req, remote()).await;
        let found = recordings(dir.path(), "abc");
        assert_eq!(found.len(), 1);
        assert_eq!(
            String::from_utf8(std::fs::read(&found[0]).unwrap()).unwrap(),
            "POST /abc?q=1 HTTP/1.1\r\n\
             Host: replay.test\r\n\
             User-Agent: test-agent\r\n\
             \r\n\
             request-body"
        );

        handler.handle(&request("GET", "/abc"), remote()).await;
        assert_eq!(recordings(dir.path(), "abc").len(), 2);
    }

    #[tokio::test]
    async fn test_recording_failure_suppresses_descriptor() {
        let (store, handler) = counting_handler(CountingStore {
            descriptor: Some(b"301 /target".to_vec()),
            fail_record: true,
            ..CountingStore::default()
        });

        let resp = handler.handle(&request("GET", "/abc"), remote()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(LOCATION).is_none());
        assert_eq!(body_of(resp).await, "Error\n");
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.records.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_preview_variant_uses_distinct_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc"), b"200 live").unwrap();
        std::fs::write(dir.path().join("abc.preview"), b"200 preview").unwrap();
        let handler = fs_handler(dir.path());

        let resp = handler.handle(&request("GET", "/abc"), remote()).await;
        assert_eq!(body_of(resp).await, "live");

        let mut req = request("GET", "/abc");
        req.headers_mut()
            .insert("x-purpose", hyper::header::HeaderValue::from_static("preview"));
        let resp = handler.handle(&req, remote()).await;
        assert_eq!(body_of(resp).await, "preview");

        let previews: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .filter(|n| n.starts_with("abc.preview."))
            .collect();
        assert_eq!(previews.len(), 1);
    }
}
