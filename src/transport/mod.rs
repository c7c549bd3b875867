//! HTTP transport used by the upload adapter
//!
//! The adapter never talks to the network directly: it hands a fully built
//! [`UploadRequest`] and a cancellation token to an [`UploadTransport`].

pub mod client;
pub mod mock;

pub use client::HttpTransport;
pub use mock::{MockReply, MockTransport};

use crate::models::LoadedFile;
use crate::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// One multipart POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// Text fields, sent before the file part in this order.
    pub fields: Vec<(String, String)>,
    pub file_field: String,
    pub file: LoadedFile,
}

impl UploadRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw HTTP outcome; interpretation of the body is left to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Send `request`, resolving to [`crate::Error::Aborted`] once `cancel`
    /// fires and to [`crate::Error::UploadFailed`] on network errors.
    async fn send(
        &self,
        request: UploadRequest,
        cancel: CancellationToken,
    ) -> Result<TransportResponse>;
}
