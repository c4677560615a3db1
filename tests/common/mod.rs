//! In-process mock of the ELT backend, shared by the integration tests.
#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use elt_console::api::ApiClient;
use elt_console::session::SessionStore;
use elt_console::storage::{MemoryStorage, Storage};
use tiny_http::{Header, Response, Server};

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

type Handler = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Serves every request through `handler` and records it.
pub struct MockBackend {
    server: Arc<Server>,
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    worker: Option<JoinHandle<()>>,
}

impl MockBackend {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("bind mock backend"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("mock backend listens on TCP");
        let base_url = format!("http://{addr}");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                while let Ok(mut request) = server.recv() {
                    let header = |name: &str| {
                        request
                            .headers()
                            .iter()
                            .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
                            .map(|h| h.value.as_str().to_string())
                    };
                    let authorization = header("Authorization");
                    let content_type = header("Content-Type");
                    let mut body = Vec::new();
                    let _ = request.as_reader().read_to_end(&mut body);

                    let recorded = RecordedRequest {
                        method: request.method().to_string(),
                        path: request.url().to_string(),
                        authorization,
                        content_type,
                        body,
                    };
                    let (status, body) = handler(&recorded);
                    requests.lock().unwrap().push(recorded);

                    let response = Response::from_string(body)
                        .with_status_code(status)
                        .with_header(
                            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                                .unwrap(),
                        );
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            server,
            base_url,
            requests,
            worker: Some(worker),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Fresh in-memory session wired to an API client for `backend`.
pub fn client_for(backend: &MockBackend) -> (ApiClient, SessionStore, Arc<dyn Storage>) {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let session = SessionStore::new(Arc::clone(&storage));
    let api = ApiClient::new(backend.base_url(), session.clone());
    (api, session, storage)
}

/// Base URL nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
