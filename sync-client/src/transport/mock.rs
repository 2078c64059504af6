//! Mock transport for testing.
//!
//! Allows queueing responses and capturing sent requests for verification.

use super::{Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for testing.
///
/// Clones share state, so a test can keep a handle for assertions while
/// the engine owns another.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    sent_requests: Vec<TransportRequest>,
    response_queue: VecDeque<TransportResponse>,
    fail_next: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `post_json` call.
    pub fn queue_response(&self, status: u16, body: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.response_queue.push_back(TransportResponse {
            status,
            body: body.into(),
        });
    }

    /// Queue a 200 response with the given JSON body.
    pub fn queue_ok(&self, body: &serde_json::Value) {
        self.queue_response(200, body.to_string());
    }

    /// Get all requests that were sent.
    pub fn sent_requests(&self) -> Vec<TransportRequest> {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.clone()
    }

    /// Get the most recent request, if any.
    pub fn last_request(&self) -> Option<TransportRequest> {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.last().cloned()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.sent_requests.len()
    }

    /// Cause the next `post_json` to fail with the given error.
    pub fn fail_next(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error.to_string());
    }

    /// Clear all recorded requests and queued responses.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next.take() {
            return Err(TransportError::RequestFailed(error));
        }

        inner.sent_requests.push(request);
        inner
            .response_queue
            .pop_front()
            .ok_or_else(|| TransportError::RequestFailed("no queued response".into()))
    }
}
