use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::executor::types::RunnerConfig;

#[derive(Debug, Clone)]
pub struct HttpRequestParts {
    pub method: String,
    pub url: url::Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    /// Skip certificate verification for this request.
    pub insecure_tls: bool,
}

#[derive(Debug, Clone)]
pub struct HttpResponseParts {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponseParts {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    #[error("timeout")]
    Timeout,
    #[error("connect/dns/tls error: {0}")]
    Network(String),
    #[error("response too large (>{max_bytes} bytes)")]
    ResponseTooLarge { max_bytes: usize },
    #[error("http error: {0}")]
    Other(String),
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends one request. `timeout` of `None` means no client-side limit.
    async fn send(
        &self,
        req: HttpRequestParts,
        timeout: Option<Duration>,
        max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError>;
}

/// Connection-pooled client shared by every sequence and worker.
///
/// Redirects are not followed and nothing is retried here; retries belong to
/// [`crate::retry::RetryMachine`].
pub struct ReqwestHttpClient {
    strict: reqwest::Client,
    insecure: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(config: &RunnerConfig) -> Result<Self, HttpError> {
        let builder = || {
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .pool_max_idle_per_host(config.pool_max_idle_per_host)
                .user_agent(config.user_agent.clone())
        };
        let strict = builder()
            .build()
            .map_err(|e| HttpError::Other(e.to_string()))?;
        let insecure = builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| HttpError::Other(e.to_string()))?;
        Ok(Self { strict, insecure })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        timeout: Option<Duration>,
        max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .map_err(|e| HttpError::Other(e.to_string()))?;
        let client = if req.insecure_tls {
            &self.insecure
        } else {
            &self.strict
        };
        let mut rb = client.request(method, req.url);
        if let Some(timeout) = timeout.filter(|t| !t.is_zero()) {
            rb = rb.timeout(timeout);
        }
        for (k, v) in req.headers {
            rb = rb.header(k, v);
        }
        if let Some(body) = req.body {
            rb = rb.body(body);
        }

        let mut resp = rb.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();

        let mut headers = BTreeMap::new();
        for (k, v) in resp.headers().iter() {
            if let Ok(s) = v.to_str() {
                headers.insert(k.to_string(), s.to_string());
            }
        }

        if resp
            .content_length()
            .is_some_and(|len| len > max_response_bytes as u64)
        {
            return Err(HttpError::ResponseTooLarge {
                max_bytes: max_response_bytes,
            });
        }
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(map_reqwest_error)? {
            if body.len() + chunk.len() > max_response_bytes {
                return Err(HttpError::ResponseTooLarge {
                    max_bytes: max_response_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponseParts {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        return HttpError::Timeout;
    }
    if e.is_builder() {
        return HttpError::Other(e.to_string());
    }
    if e.is_connect() || e.is_request() {
        return HttpError::Network(e.to_string());
    }
    HttpError::Other(e.to_string())
}
