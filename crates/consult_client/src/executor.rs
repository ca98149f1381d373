//! The request pipeline shared by every service.
//!
//! An executor owns one HTTP client for one base URL. For each call it
//! composes the headers, optionally attaches the current bearer credential,
//! sends the request, classifies the outcome and decodes success bodies into
//! the caller's type.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use consult_core::{CredentialStore, ServiceConfig};
use log::{debug, warn};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, SET_COOKIE,
};
use reqwest::{Client, Method};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cookies::SessionCookies;
use crate::error::{ApiError, Result};
use crate::observer::{RequestObserver, RequestTrace};

const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(200);
const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// One call: endpoint path, verb, optional JSON body and extra headers.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    endpoint: String,
    method: Method,
    body: Option<Vec<u8>>,
    headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    /// Serializes `body` as the JSON payload. Its shape is not checked.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body).map_err(ApiError::Encode)?);
        Ok(self)
    }

    /// Adds an extra header. Extra headers override the defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

pub struct RequestExecutor {
    client: ClientWithMiddleware,
    base_url: String,
    cookies: SessionCookies,
    credentials: Option<Arc<dyn CredentialStore>>,
    observer: Option<Arc<dyn RequestObserver>>,
}

impl RequestExecutor {
    /// Builds an executor for `config`, sharing `cookies` with any other
    /// executor built from the same jar.
    pub fn new(config: &ServiceConfig, cookies: SessionCookies) -> Result<Self> {
        let client = Self::build_http_client(config, &cookies)?;
        Ok(Self {
            client: Self::build_retry_client(client, config.retry_attempts),
            base_url: config.base_url.clone(),
            cookies,
            credentials: None,
            observer: None,
        })
    }

    /// Attach `Authorization: Bearer <credential>` whenever `store` holds one.
    pub fn with_credentials(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn build_http_client(config: &ServiceConfig, cookies: &SessionCookies) -> Result<Client> {
        Client::builder()
            .cookie_provider(cookies.provider())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))
    }

    fn build_retry_client(client: Client, retry_attempts: u32) -> ClientWithMiddleware {
        let builder = ClientBuilder::new(client);
        if retry_attempts == 0 {
            return builder.build();
        }
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(MIN_RETRY_INTERVAL, MAX_RETRY_INTERVAL)
            .build_with_max_retries(retry_attempts);
        builder
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    /// Base URL and endpoint joined verbatim.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn compose_headers(&self, extra: HeaderMap) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(extra);

        if let Some(credential) = self.credentials.as_ref().and_then(|store| store.get()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
                .map_err(|_| {
                    ApiError::InvalidHeader("credential is not a valid header value".to_string())
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    pub async fn execute<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let RequestDescriptor {
            endpoint,
            method,
            body,
            headers,
        } = request;

        let url = self.url_for(&endpoint);
        let headers = self.compose_headers(headers)?;

        if let Some(observer) = &self.observer {
            observer.on_request(&RequestTrace {
                method: &method,
                url: &url,
                header_names: headers.keys().map(HeaderName::as_str).collect(),
                has_body: body.is_some(),
            });
        }

        let mut request_builder = self.client.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }

        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} {} failed before a response arrived: {}", method, endpoint, e);
                return Err(ApiError::transport(e.to_string()));
            }
        };

        if response.headers().contains_key(SET_COOKIE) {
            self.cookies.persist();
        }

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!("{} {} failed while reading the body: {}", method, endpoint, e);
            ApiError::transport(e.to_string())
        })?;

        if !status.is_success() {
            debug!("{} {} returned {}", method, endpoint, status);
            return Err(ApiError::Request {
                status: status.as_u16(),
                body: text,
            });
        }

        decode_body(&endpoint, &text)
    }
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("attaches_credentials", &self.credentials.is_some())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

/// Decodes a success body. An empty body reads as JSON `null`, so `()` and
/// `Option<T>` targets accept `204 No Content`.
fn decode_body<T: DeserializeOwned>(endpoint: &str, text: &str) -> Result<T> {
    let payload = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(payload).map_err(|e| {
        warn!("Failed to decode response from {}: {}", endpoint, e);
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use consult_core::{Credential, MemoryCredentialStore};
    use serde::Deserialize;

    fn executor(base_url: &str) -> RequestExecutor {
        RequestExecutor::new(&ServiceConfig::new(base_url), SessionCookies::in_memory())
            .expect("executor")
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn url_is_plain_concatenation() {
        let executor = executor("http://localhost:3000/api");
        assert_eq!(
            executor.url_for("/conversations"),
            "http://localhost:3000/api/conversations"
        );
        assert_eq!(
            executor.url_for("conversations"),
            "http://localhost:3000/apiconversations"
        );
    }

    #[test]
    fn default_headers_without_credentials() {
        let headers = executor("http://localhost")
            .compose_headers(HeaderMap::new())
            .expect("headers");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn caller_headers_override_defaults() {
        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        extra.insert("x-request-id", HeaderValue::from_static("abc"));

        let headers = executor("http://localhost")
            .compose_headers(extra)
            .expect("headers");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get("x-request-id").unwrap(), "abc");
    }

    #[test]
    fn bearer_attached_only_when_present() {
        let store = Arc::new(MemoryCredentialStore::new());
        let executor = executor("http://localhost").with_credentials(store.clone());

        let headers = executor.compose_headers(HeaderMap::new()).expect("headers");
        assert!(headers.get(AUTHORIZATION).is_none());

        store.set(Credential::new("t1"));
        let headers = executor.compose_headers(HeaderMap::new()).expect("headers");
        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer t1");
        assert!(value.is_sensitive());
    }

    #[test]
    fn unencodable_credential_is_rejected() {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "bad\ntoken",
        )));
        let result = executor("http://localhost")
            .with_credentials(store)
            .compose_headers(HeaderMap::new());
        assert!(matches!(result, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn decode_typed_body() {
        let item: Item = decode_body("/items/1", r#"{"id":"1"}"#).expect("item");
        assert_eq!(item, Item { id: "1".to_string() });
    }

    #[test]
    fn empty_body_decodes_as_unit() {
        decode_body::<()>("/claim", "").expect("unit");
        let missing: Option<Item> = decode_body("/maybe", "  ").expect("option");
        assert_eq!(missing, None);
    }

    #[test]
    fn shape_mismatch_is_decode_error() {
        let err = decode_body::<Item>("/items/1", r#"{"name":"x"}"#).unwrap_err();
        match err {
            ApiError::Decode { endpoint, message } => {
                assert_eq!(endpoint, "/items/1");
                assert!(message.contains("missing field `id`"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn descriptor_builders() {
        let descriptor = RequestDescriptor::put("/expert/profile")
            .json(&serde_json::json!({ "bio": "hi" }))
            .expect("json body")
            .header(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_static("1"),
            );
        assert_eq!(descriptor.method(), &Method::PUT);
        assert_eq!(descriptor.endpoint(), "/expert/profile");
        assert_eq!(descriptor.body.as_deref(), Some(br#"{"bio":"hi"}"#.as_slice()));
        assert_eq!(descriptor.headers.get("x-trace").unwrap(), "1");
    }
}
