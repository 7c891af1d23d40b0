use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;

use crate::dispatch::{BACKEND_PORT, BackendAddress, HostSource, StaticHost};
use crate::error::ClientError;

/// Used when a non-2xx body carries no usable `message`.
pub const UNKNOWN_BACKEND_ERROR: &str = "Unknown backend error!";

/// Placeholder expanded to the backend address inside translation templates.
const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Coarse classification of a failed request, used as the key of
/// [`ErrorTranslations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFailure {
    /// No connection could be made (refused, DNS, unreachable host).
    Connect,
    /// The configured request timeout elapsed.
    Timeout,
    /// The request failed after the connection was made.
    Request,
    /// The response body could not be read.
    Body,
    Other,
}

impl TransportFailure {
    pub fn classify(err: &reqwest::Error) -> Self {
        // A connect timeout reports both; the timeout is the useful part.
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_body() || err.is_decode() {
            Self::Body
        } else if err.is_request() {
            Self::Request
        } else {
            Self::Other
        }
    }
}

/// Maps low-level transport failures to messages a person can act on.
/// Failures without an entry keep the transport's own message.
#[derive(Debug, Clone)]
pub struct ErrorTranslations {
    entries: HashMap<TransportFailure, String>,
}

impl Default for ErrorTranslations {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert(
            TransportFailure::Connect,
            "Could not reach backend server at {address}! Did you close it? Make sure to keep it open!",
        );
        table.insert(
            TransportFailure::Timeout,
            "Backend at {address} did not respond in time!",
        );
        table
    }
}

impl ErrorTranslations {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace the template for a failure. `{address}` is substituted
    /// with the backend address at translation time.
    pub fn insert(&mut self, failure: TransportFailure, template: impl Into<String>) -> &mut Self {
        self.entries.insert(failure, template.into());
        self
    }

    pub fn translate(&self, failure: TransportFailure, address: &BackendAddress) -> Option<String> {
        self.entries
            .get(&failure)
            .map(|template| template.replace(ADDRESS_PLACEHOLDER, address.as_str()))
    }
}

/// Issues requests against the local backend. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    host: Arc<dyn HostSource>,
    port: u16,
    timeout: Option<Duration>,
    translations: Arc<ErrorTranslations>,
}

impl BackendClient {
    pub fn new(host: impl HostSource + 'static) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            host: Arc::new(host),
            port: BACKEND_PORT,
            timeout: None,
            translations: Arc::new(ErrorTranslations::default()),
        }
    }

    /// Client for a backend on this machine.
    pub fn localhost() -> Self {
        Self::new(StaticHost::new("localhost"))
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Give up on requests that take longer than `timeout`. Without this a
    /// call waits for as long as the transport does.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_translations(mut self, translations: ErrorTranslations) -> Self {
        self.translations = Arc::new(translations);
        self
    }

    /// Backend address as of now.
    pub fn address(&self) -> BackendAddress {
        BackendAddress::resolve(self.host.as_ref(), self.port)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value, ClientError> {
        self.call(endpoint, Method::GET, None).await
    }

    pub async fn post(&self, endpoint: &str, body: Option<&Value>) -> Result<Value, ClientError> {
        self.call(endpoint, Method::POST, body).await
    }

    /// Send one request to `<backend>/<endpoint>` and return the JSON body.
    ///
    /// The endpoint is not sanitized here; build it with
    /// [`crate::endpoints`] when it carries user or filesystem input.
    /// An empty or non-JSON success body yields `{}`.
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let address = self.address();
        let url = address.join(endpoint);
        tracing::debug!(method = %method, url = url, "backend call");

        let mut request = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&address, e))?;

        let status = response.status();

        if !status.is_success() {
            let bytes = response.bytes().await.unwrap_or_default();
            let message = rejection_message(&parse_json_or_empty(&bytes));
            tracing::debug!(status = status.as_u16(), reason = %message, "backend rejected call");
            return Err(ClientError::BackendRejected {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&address, e))?;

        tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "backend call finished");
        Ok(parse_json_or_empty(&bytes))
    }

    fn transport_error(&self, address: &BackendAddress, err: reqwest::Error) -> ClientError {
        // Could not even build the request (bad URL, unserializable body).
        if err.is_builder() {
            return ClientError::Unknown(format!("Unknown error occurred: {}", error_chain(&err)));
        }

        let failure = TransportFailure::classify(&err);
        tracing::warn!(address = %address, failure = ?failure, "backend call failed: {err}");

        let message = self
            .translations
            .translate(failure, address)
            .unwrap_or_else(|| error_chain(&err));

        ClientError::BackendUnreachable {
            address: address.to_string(),
            message,
        }
    }
}

/// Body as JSON, or `{}` when it is empty or malformed.
pub fn parse_json_or_empty(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// Message carried by a rejection body's `message` field.
pub fn rejection_message(body: &Value) -> String {
    match body.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) && !items.is_empty() => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Null) | None => UNKNOWN_BACKEND_ERROR.to_string(),
        Some(other) => other.to_string(),
    }
}

/// `err: cause: cause...`, skipping causes already contained in their parent.
fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
