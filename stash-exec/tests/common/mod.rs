#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use stash_exec::executor::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts};
use stash_exec::retry::Clock;

/// Clock whose sleeps advance time instantly and are recorded.
#[derive(Default)]
pub struct FakeClock {
    now: Mutex<Duration>,
    pub sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn advance(&self, d: Duration) {
        *self.now.lock().unwrap() += d;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

pub fn response(status: u16, content_type: &str, body: &str) -> HttpResponseParts {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), content_type.to_string());
    HttpResponseParts {
        status,
        headers,
        body: body.as_bytes().to_vec(),
    }
}

/// Replays a fixed list of outcomes, one per call; the last one repeats.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<u16, HttpError>>>,
    pub requests: Mutex<Vec<HttpRequestParts>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<u16, HttpError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        _timeout: Option<Duration>,
        _max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        self.requests.lock().unwrap().push(req);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match next.unwrap_or(Ok(200)) {
            Ok(status) => Ok(response(status, "application/json", r#"{"status":"ok"}"#)),
            Err(e) => Err(e),
        }
    }
}

/// Answers by URL path; each path may carry an artificial latency.
#[derive(Default)]
pub struct RoutedClient {
    routes: BTreeMap<String, (Duration, Result<HttpResponseParts, HttpError>)>,
    pub requests: Mutex<Vec<HttpRequestParts>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl RoutedClient {
    pub fn route(
        mut self,
        path: &str,
        latency_ms: u64,
        result: Result<HttpResponseParts, HttpError>,
    ) -> Self {
        self.routes.insert(
            path.to_string(),
            (Duration::from_millis(latency_ms), result),
        );
        self
    }

    pub fn sent_paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }
}

#[async_trait]
impl HttpClient for RoutedClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        _timeout: Option<Duration>,
        _max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let (latency, result) = self
            .routes
            .get(req.url.path())
            .cloned()
            .unwrap_or((Duration::ZERO, Ok(response(404, "text/plain", "missing"))));
        self.requests.lock().unwrap().push(req);
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
