mod attribute_expect_tests;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::errors::WebDriverError;
use crate::protocol::ELEMENT_KEY;
use crate::transport::{Method, Transport, WireResponse};
use crate::{Session, TimeoutConfig};

/// Session id used by all fixtures.
pub const SESSION_ID: &str = "13521-10219-202";

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Scripted in-process transport, the mock-server analog for these tests.
///
/// Responses are queued per (method, path); when a queue is down to its
/// last entry that entry repeats, which models an attribute staying in its
/// final state across further polls. Unstubbed routes answer with a
/// "no such element" envelope. Every call is recorded for order and count
/// assertions.
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<WireResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Make every round trip take this long, so concurrent callers can
    /// actually be observed in flight at the same time.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Highest number of round trips that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn stub(&self, method: Method, path: &str, response: WireResponse) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Stub a 200 response whose body is `{"value": value}`.
    pub fn stub_value(&self, method: Method, path: &str, value: Value) {
        self.stub(method, path, WireResponse::new(200, json!({ "value": value })));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<WireResponse, WebDriverError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut routes = self.routes.lock().unwrap();
        if let Some(queue) = routes.get_mut(&(method, path.to_string())) {
            if queue.len() > 1 {
                return Ok(queue.pop_front().unwrap());
            }
            if let Some(last) = queue.front() {
                return Ok(last.clone());
            }
        }
        Ok(error_response("no such element", "route not stubbed"))
    }
}

pub fn error_response(code: &str, message: &str) -> WireResponse {
    WireResponse::new(
        404,
        json!({ "value": { "error": code, "message": message, "stacktrace": "" } }),
    )
}

pub fn elements_value(handles: &[&str]) -> Value {
    Value::Array(
        handles
            .iter()
            .map(|h| json!({ ELEMENT_KEY: h }))
            .collect(),
    )
}

/// A session over the mock transport with a 500ms budget and 100ms polls,
/// small enough to exhaust quickly under a paused clock.
pub fn test_session(transport: Arc<MockTransport>) -> Session {
    Session::new(
        transport,
        SESSION_ID,
        TimeoutConfig::new(Duration::from_millis(500), Duration::from_millis(100)),
    )
}

pub fn path(rest: &str) -> String {
    format!("/session/{SESSION_ID}{rest}")
}
