// REST transport for the otwatch backend.
//
// Pure request/response mechanics: URL construction, error-body parsing,
// and the short-timeout health probe. Offline fallback lives one layer up
// in `workflows::WorkflowService`, keeping this client testable on its own.

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Shape of backend error bodies: FastAPI uses `detail`, the workflow
/// service uses `message`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

/// Raw HTTP client for the otwatch backend.
///
/// All methods return the decoded JSON payload; non-2xx responses become
/// [`Error::Api`] carrying the server's `detail`/`message` field verbatim,
/// or a synthesized `HTTP {status}: {reason}` when the body is opaque.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    probe_http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a client from a backend base URL and transport settings.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            probe_http: transport.build_probe_client()?,
            base_url,
        })
    }

    /// Create a client with pre-built `reqwest::Client`s (used by tests to
    /// share clients or shorten timeouts).
    pub fn with_clients(http: reqwest::Client, probe_http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            probe_http,
            base_url,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    /// Probe `/health` with the short-timeout client. Any transport failure
    /// or non-2xx status counts as unavailable. Deliberately uncached: each
    /// caller pays one probe.
    pub async fn probe(&self) -> bool {
        let Ok(url) = self.url("/health") else {
            return false;
        };
        match self.probe_http.get(url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                trace!(ok, "health probe");
                ok
            }
            Err(err) => {
                debug!(%err, "health probe failed");
                false
            }
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!(%method, %url, "request");
        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            // Content-Type: application/json is only sent when there is a body.
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            let fallback = format!("HTTP {}: {reason}", status.as_u16());
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.detail.or(e.message))
                .unwrap_or(fallback);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        if resp.content_length() == Some(0) {
            return Ok(Value::Null);
        }
        let body = resp.text().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        self.send(Method::POST, path, body).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Value, Error> {
        self.send(Method::PUT, path, body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, Error> {
        self.send(Method::DELETE, path, None).await
    }

    /// GET a binary body (capture download).
    pub async fn get_bytes(&self, path: &str) -> Result<Bytes, Error> {
        let url = self.url(path)?;
        debug!(%url, "binary request");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("HTTP {}: {reason}", status.as_u16()),
            });
        }
        Ok(resp.bytes().await?)
    }

    /// POST a multipart form (capture upload).
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!(%url, "multipart request");
        let resp = self.http.post(url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            let fallback = format!("HTTP {}: {reason}", status.as_u16());
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.detail.or(e.message))
                .unwrap_or(fallback);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body = resp.text().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Decode a JSON payload into a typed value, keeping the raw body in the
/// error for debugging.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    let body = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
