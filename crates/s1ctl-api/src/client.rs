// Async HTTP client for the SentinelOne management console API (v2.1).
//
// Base path: /web/api/v2.1/
// Auth: `Authorization: APIToken <token>` header
//
// Every request goes through one retry loop: HTTP failures and connection
// errors are attempted again after a fixed pause, timeouts and malformed
// bodies fail on the spot. Endpoint modules add inherent methods on top.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{RetryPolicy, TransportConfig};
use crate::types::Envelope;

/// API prefix every endpoint path is resolved against.
const API_PREFIX: &str = "/web/api/v2.1";

/// Error context used when a request does not name its own.
pub const DEFAULT_CONTEXT: &str = "API call failed.";

// ── Request ──────────────────────────────────────────────────────────

/// One logical console request: method, relative path, query, body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: Option<HeaderMap>,
    context: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: None,
            context: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. Values are URL-encoded on send.
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_owned(), value.into()));
        self
    }

    /// Attach a JSON body. Empty objects are not sent.
    pub fn body(mut self, body: Value) -> Self {
        let empty = matches!(&body, Value::Object(map) if map.is_empty()) || body.is_null();
        self.body = if empty { None } else { Some(body) };
        self
    }

    /// Replace the client's default headers (auth included) for this request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Prefix for the error message if the request ultimately fails.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn context_str(&self) -> &str {
        self.context.as_deref().unwrap_or(DEFAULT_CONTEXT)
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the SentinelOne management console.
///
/// Holds the single credential of an invocation. Construct it once and
/// pass it by reference; it carries no other mutable state.
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: Url,
    headers: HeaderMap,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ConsoleClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a console URL, API token and transport config.
    ///
    /// `console_url` is the console root (e.g. `https://usea1.sentinelone.net`);
    /// the `/web/api/v2.1/` prefix is appended unless already present.
    pub fn from_token(
        console_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(console_url)?;

        Ok(Self {
            http,
            base_url,
            headers: default_headers(token)?,
            retry: transport.retry,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(console_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            http,
            base_url: Self::normalize_base_url(console_url)?,
            headers,
            retry: RetryPolicy::default(),
            timeout: crate::transport::DEFAULT_TIMEOUT,
        })
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `https://console/...` → `https://console/.../web/api/v2.1/`
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with(API_PREFIX) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}{API_PREFIX}/"));
        }

        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"sites/42"`) onto the API base.
    /// Absolute URLs (package download links) pass through unchanged.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Run a request and decode its JSON body into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, Error> {
        let resp = self.send(request).await?;
        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(e, request.context_str()))?;

        serde_json::from_str(&body).map_err(|e| {
            let preview = body.chars().take(200).collect::<String>();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Send with the retry policy applied; returns a response with a
    /// success status.
    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let url = self.url(request.path())?;
        let attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            match self.send_once(&url, request).await {
                Ok(resp) => return Ok(resp),
                Err(err) if attempt < attempts && err.is_retryable() => {
                    warn!(
                        attempt,
                        attempts,
                        error = %err,
                        "console request failed, retrying in {:?}",
                        self.retry.pause
                    );
                    tokio::time::sleep(self.retry.pause).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, url: &Url, request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let context = request.context_str();
        if request.query.is_empty() {
            debug!("{} {url}", request.method);
        } else {
            debug!("{} {url} params={:?}", request.method, request.query);
        }

        let headers = request
            .headers
            .clone()
            .unwrap_or_else(|| self.headers.clone());
        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e, context))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api {
            context: context.to_owned(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error, context: &str) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                context: context.to_owned(),
                reason: err.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    // ── Downloads ────────────────────────────────────────────────────

    /// Stream the body of `link` into `dest`, returning the bytes written.
    ///
    /// The link is fetched with the client's retry policy. The API token is
    /// only sent when the link points at the console itself.
    pub async fn download(&self, link: &str, dest: &Path) -> Result<u64, Error> {
        let mut request = ApiRequest::get(link).context("Failed to download agent package.");
        if self.url(link)?.origin() != self.base_url.origin() {
            debug!(link, "download link is off-console, sending without token");
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
            request = request.headers(headers);
        }
        let mut resp = self.send(&request).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| self.transport_error(e, request.context_str()))?
        {
            file.write_all(&chunk).await?;
            written += u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        }
        file.flush().await?;

        debug!(bytes = written, path = %dest.display(), "download complete");
        Ok(written)
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Follow `pagination.nextCursor` until exhausted, collecting every page.
    ///
    /// A page that returns the cursor it was fetched with is an error.
    pub async fn paginate_all<T, F, Fut>(&self, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(Option<String>) -> Fut,
        Fut: Future<Output = Result<Envelope<Vec<T>>, Error>>,
    {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let sent = cursor.take();
            let page = fetch(sent.clone()).await?;
            let next = page.next_cursor().map(str::to_owned);
            all.extend(page.data);

            match next {
                Some(next) if sent.as_deref() == Some(next.as_str()) => {
                    return Err(Error::StalledCursor { cursor: next });
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(all)
    }
}

/// `Accept`, `Content-Type` and the sensitive `Authorization: APIToken` header.
fn default_headers(token: &SecretString) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("APIToken {}", token.expose_secret()))
        .map_err(|e| Error::InvalidToken {
            message: format!("invalid API token header value: {e}"),
        })?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn base_url_gets_api_prefix() {
        let url = ConsoleClient::normalize_base_url("https://console.example.net").unwrap();
        assert_eq!(url.as_str(), "https://console.example.net/web/api/v2.1/");
    }

    #[test]
    fn base_url_keeps_existing_prefix() {
        let url =
            ConsoleClient::normalize_base_url("https://console.example.net/web/api/v2.1/").unwrap();
        assert_eq!(url.as_str(), "https://console.example.net/web/api/v2.1/");
    }

    #[test]
    fn empty_body_is_dropped() {
        let req = ApiRequest::put("groups/1/revert-policy", serde_json::json!({}));
        assert!(req.body.is_none());
    }

    #[test]
    fn token_header_is_sensitive() {
        let headers = default_headers(&SecretString::from("abc".to_owned())).unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "APIToken abc");
    }

    #[test]
    fn newline_in_token_is_rejected() {
        let result = default_headers(&SecretString::from("abc\ndef".to_owned()));
        assert!(matches!(result, Err(Error::InvalidToken { .. })));
    }
}
