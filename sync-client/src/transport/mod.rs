//! Transport abstraction for the sliding sync conversation.
//!
//! The engine only ever performs one kind of I/O: a POST to the sync
//! endpoint carrying query parameters, a bearer token, and a JSON body.
//! [`Transport`] captures exactly that, so the engine can run over reqwest
//! in production and over [`MockTransport`] in tests.
//!
//! A non-200 status is *not* a transport error: the engine needs the status
//! and body to recognize an expired cursor, so implementations return every
//! completed HTTP exchange as a [`TransportResponse`].

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use thiserror::Error;
use std::fmt;

/// Transport-layer errors: the request never completed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request failed after the connection was up.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The request timed out client-side.
    #[error("request timed out")]
    Timeout,
}

/// One outgoing sync request, ready for the wire.
#[derive(Clone)]
pub struct TransportRequest {
    /// Fully-formed endpoint URL.
    pub url: String,
    /// Access token for the `Authorization: Bearer` header.
    pub access_token: String,
    /// Query parameters in emission order.
    pub query: Vec<(String, String)>,
    /// JSON request body.
    pub body: serde_json::Value,
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("url", &self.url)
            .field("access_token", &"[REDACTED]")
            .field("query", &self.query)
            .field("body", &self.body)
            .finish()
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body text.
    pub body: String,
}

/// The engine's single I/O seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one sync request and return the completed exchange.
    async fn post_json(&self, request: TransportRequest)
        -> Result<TransportResponse, TransportError>;
}
