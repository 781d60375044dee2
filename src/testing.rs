//! In-crate test doubles for the transport and health-check seams.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use tokio::time::Instant;
use url::Url;

use crate::error::{EndpointUnhealthyError, HealthCause};
use crate::health::HealthChecker;
use crate::http::transport::{OutboundRequest, Transport, TransportError};
use crate::load_balancer::endpoint::Endpoint;

/// What a scripted upstream does on one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    Fail(&'static str),
    Hang,
}

/// A call the scripted transport received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub at: Instant,
}

/// Transport that replays scripted replies per origin. Once a script is
/// exhausted its last reply repeats; unknown origins get a network error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, (Vec<Reply>, usize)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, origin: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(origin.trim_end_matches('/').to_string(), (replies, 0));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, origin: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.url.origin().ascii_serialization() == origin)
            .collect()
    }

    fn next_reply(&self, origin: &str) -> Option<Reply> {
        let mut scripts = self.scripts.lock().unwrap();
        let (replies, cursor) = scripts.get_mut(origin)?;
        let reply = replies.get(*cursor).or_else(|| replies.last()).cloned();
        *cursor += 1;
        reply
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Response<Body>, TransportError> {
        let origin = request.url.origin().ascii_serialization();
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            at: Instant::now(),
        });

        match self.next_reply(&origin) {
            Some(Reply::Status(status, body)) => Ok(Response::builder()
                .status(status)
                .header("x-upstream", origin)
                .body(Body::from(body))
                .unwrap()),
            Some(Reply::Fail(message)) => Err(TransportError::Network(message.to_string())),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Timeout)
            }
            None => Err(TransportError::Network(format!("no route to {}", origin))),
        }
    }
}

/// Health checker with a fixed verdict and latency per origin.
/// Unlisted origins are healthy and answer immediately.
#[derive(Debug, Default)]
pub struct ScriptedHealth {
    verdicts: HashMap<String, (bool, Duration)>,
    probes: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn healthy(mut self, origin: &str, after: Duration) -> Self {
        self.verdicts.insert(origin.to_string(), (true, after));
        self
    }

    pub fn unhealthy(mut self, origin: &str, after: Duration) -> Self {
        self.verdicts.insert(origin.to_string(), (false, after));
        self
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthChecker for ScriptedHealth {
    async fn check_health(&self, endpoint: &Endpoint) -> Result<(), EndpointUnhealthyError> {
        let origin = endpoint.origin().to_string();
        self.probes.lock().unwrap().push(origin.clone());

        let (healthy, after) = self
            .verdicts
            .get(&origin)
            .copied()
            .unwrap_or((true, Duration::ZERO));
        tokio::time::sleep(after).await;
        self.completed.lock().unwrap().push(origin);

        if healthy {
            Ok(())
        } else {
            Err(EndpointUnhealthyError {
                endpoint: endpoint.url().clone(),
                cause: HealthCause::Status(StatusCode::SERVICE_UNAVAILABLE),
            })
        }
    }
}

pub fn endpoint(url: &str) -> Endpoint {
    Endpoint::new(url).unwrap().with_timeout(Duration::from_millis(500))
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
