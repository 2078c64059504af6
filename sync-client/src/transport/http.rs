//! HTTP transport over reqwest.

use super::{Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;

/// Production transport: POSTs the sync request over HTTPS.
///
/// The underlying client is built without a total request timeout; the
/// sync endpoint is a long-poll and the server holds the response for up
/// to the `timeout` the engine puts on the wire. Callers wanting a
/// client-side ceiling should pass a pre-configured [`reqwest::Client`]
/// whose timeout comfortably exceeds the engine's long-poll timeout.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport over an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&request.url)
            .query(&request.query)
            .bearer_auth(&request.access_token)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else if e.is_connect() {
                    TransportError::ConnectionFailed(e.to_string())
                } else {
                    TransportError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}
