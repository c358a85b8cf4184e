use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {method} {path} returned status {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },

    #[error("HTTP {method} {path} returned an empty response")]
    NullResponse { method: &'static str, path: String },

    #[error("HTTP {method} {path} failed: {source}")]
    Request {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to construct HTTP client: {0}")]
    Build(String),
}

/// The capability the client needs from HTTP: perform a GET or POST against
/// a path relative to the base URL and hand back raw bytes. Authentication
/// is the transport's concern, attached once at construction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Vec<u8>, TransportError>;

    async fn post(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError>;
}

/// Transport backed by a shared `reqwest` connection pool. The
/// `Authorization: ApiKey <key>` header is set as a default header and never
/// mutated per call; the pool is safe for concurrent use by any number of
/// in-flight operations.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("ApiKey {api_key}"))
            .map_err(|e| TransportError::Build(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!("modelrun/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        info!("Initialized HTTP client for model service base url {base_url}");
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_body(
    method: &'static str,
    path: &str,
    response: reqwest::Response,
) -> Result<Vec<u8>, TransportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status {
            method,
            path: path.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|source| TransportError::Request {
            method,
            path: path.to_string(),
            source,
        })?;
    if body.is_empty() || body.as_ref() == &b"null"[..] {
        return Err(TransportError::NullResponse {
            method,
            path: path.to_string(),
        });
    }
    debug!("JSON response: {}", String::from_utf8_lossy(&body));
    Ok(body.to_vec())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        debug!("HTTP GET: {url}");
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|source| TransportError::Request {
                    method: "GET",
                    path: path.to_string(),
                    source,
                })?;
        read_body("GET", path, response).await
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let url = self.url(path);
        debug!("HTTP POST: {url}");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                method: "POST",
                path: path.to_string(),
                source,
            })?;
        read_body("POST", path, response).await
    }
}
