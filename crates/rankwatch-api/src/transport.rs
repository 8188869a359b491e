//! HTTP transport seam.
//!
//! The client talks to the network through [`HttpTransport`] so retry and
//! classification logic can be driven by [`ScriptedTransport`] in tests.

use crate::error::{ApiError, ApiResult};
use parking_lot::Mutex;
pub use rankwatch_core::BoxFuture;
use std::collections::HashMap;
use std::time::Duration;

/// Outbound GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Raw response. Header names are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Transport used by the client.
///
/// A transport returns `Err` only when no HTTP response was received
/// (connection reset, timeout, ...). Every status code is a response.
pub trait HttpTransport: Send + Sync {
    fn get(&self, request: HttpRequest) -> BoxFuture<'_, ApiResult<HttpResponse>>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClient(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, request: HttpRequest) -> BoxFuture<'_, ApiResult<HttpResponse>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Transport(format!("HTTP request failed: {e}")))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Transport(format!("Failed to read body: {e}")))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Response(HttpResponse),
    /// No response received.
    Failure(String),
}

impl ScriptedReply {
    /// 200 with a JSON body.
    pub fn json(body: serde_json::Value) -> Self {
        ScriptedReply::Response(HttpResponse::new(200, body.to_string()))
    }

    /// Empty body with the given status.
    pub fn status(status: u16) -> Self {
        ScriptedReply::Response(HttpResponse::new(status, ""))
    }

    /// 429 from the upstream service itself.
    pub fn rate_limited(retry_after: Option<u64>) -> Self {
        let mut response =
            HttpResponse::new(429, "").with_header("X-Rate-Limit-Type", "application");
        if let Some(secs) = retry_after {
            response = response.with_header("Retry-After", secs.to_string());
        }
        ScriptedReply::Response(response)
    }

    /// 429 from an intermediary: no rate-limit type header.
    pub fn shard_rejection() -> Self {
        ScriptedReply::Response(HttpResponse::new(429, ""))
    }
}

struct Route {
    pattern: String,
    replies: Vec<ScriptedReply>,
    served: usize,
}

/// Scripted transport for testing.
///
/// Replies are matched by URL substring, first registered route first. Each
/// route serves its replies in order and then keeps repeating the last one.
/// Unmatched URLs receive a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register replies for URLs containing `pattern`.
    pub fn route(&self, pattern: impl Into<String>, replies: Vec<ScriptedReply>) {
        self.routes.lock().push(Route {
            pattern: pattern.into(),
            replies,
            served: 0,
        });
    }

    /// Replace the replies of an existing route, or register it.
    pub fn reroute(&self, pattern: &str, replies: Vec<ScriptedReply>) {
        let mut routes = self.routes.lock();
        match routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(route) => {
                route.replies = replies;
                route.served = 0;
            }
            None => routes.push(Route {
                pattern: pattern.to_string(),
                replies,
                served: 0,
            }),
        }
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests whose URL contains `pattern`.
    pub fn count_matching(&self, pattern: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.contains(pattern))
            .count()
    }

    fn next_reply(&self, url: &str) -> ScriptedReply {
        let mut routes = self.routes.lock();
        let Some(route) = routes
            .iter_mut()
            .find(|r| url.contains(&r.pattern) && !r.replies.is_empty())
        else {
            return ScriptedReply::status(404);
        };
        let index = route.served.min(route.replies.len() - 1);
        route.served += 1;
        route.replies[index].clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn get(&self, request: HttpRequest) -> BoxFuture<'_, ApiResult<HttpResponse>> {
        let reply = self.next_reply(&request.url);
        self.requests.lock().push(request);
        Box::pin(async move {
            match reply {
                ScriptedReply::Response(response) => Ok(response),
                ScriptedReply::Failure(message) => Err(ApiError::Transport(message)),
            }
        })
    }
}
