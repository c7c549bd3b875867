use super::{TransportResponse, UploadRequest, UploadTransport};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Scripted outcome of one [`MockTransport::send`] call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond { status: u16, body: String },
    NetworkError(String),
    /// Stay pending until the request is cancelled.
    Hang,
}

#[derive(Clone)]
pub struct MockTransport {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<UploadRequest>>>,
    cancellation_count: Arc<Mutex<usize>>,
    request_started: Arc<Notify>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            cancellation_count: Arc::new(Mutex::new(0)),
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn with_json_response(self, status: u16, body: serde_json::Value) -> Self {
        self.with_reply(MockReply::Respond {
            status,
            body: body.to_string(),
        })
    }

    pub fn get_request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of in-flight requests that observed a cancellation.
    pub fn get_cancellation_count(&self) -> usize {
        *self.cancellation_count.lock().unwrap()
    }

    /// Resolves once a request has reached the transport.
    pub async fn wait_for_request(&self) {
        self.request_started.notified().await;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadTransport for MockTransport {
    async fn send(
        &self,
        request: UploadRequest,
        cancel: CancellationToken,
    ) -> Result<TransportResponse> {
        let reply = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);

            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                MockReply::Respond {
                    status: 200,
                    body: r#"{"secure_url":"https://mock-cdn.example.com/upload"}"#.to_string(),
                }
            } else {
                replies[(requests.len() - 1) % replies.len()].clone()
            }
        };
        self.request_started.notify_one();

        match reply {
            MockReply::Respond { status, body } => Ok(TransportResponse::new(status, body)),
            MockReply::NetworkError(message) => Err(Error::UploadFailed(message)),
            MockReply::Hang => {
                cancel.cancelled().await;
                *self.cancellation_count.lock().unwrap() += 1;
                Err(Error::Aborted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoadedFile;
    use std::collections::BTreeMap;

    fn request() -> UploadRequest {
        UploadRequest {
            url: "https://up.example.com".to_string(),
            headers: BTreeMap::new(),
            fields: Vec::new(),
            file_field: "file".to_string(),
            file: LoadedFile::new("a.txt", "text/plain", b"a".to_vec()),
        }
    }

    #[tokio::test]
    async fn test_mock_default_reply() {
        let transport = MockTransport::new();
        let response = transport
            .send(request(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.contains("secure_url"));
        assert_eq!(transport.get_request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_replies_cycle() {
        let transport = MockTransport::new()
            .with_reply(MockReply::Respond {
                status: 500,
                body: "boom".to_string(),
            })
            .with_reply(MockReply::NetworkError("reset".to_string()));

        let first = transport
            .send(request(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(first.status, 500);

        let second = transport
            .send(request(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(second.is_upload_failed());
    }

    #[tokio::test]
    async fn test_mock_hang_counts_cancellation() {
        let transport = MockTransport::new().with_reply(MockReply::Hang);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = transport.send(request(), cancel).await.unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(transport.get_cancellation_count(), 1);
    }
}
