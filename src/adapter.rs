//! Upload adapter handed to the editor's file repository
//!
//! Each adapter serves a single file: one `upload()` call issues one POST,
//! and `abort()` cancels it while it is outstanding.

use crate::host::FileLoader;
use crate::models::{LoadedFile, UploadConfig, UploadResponse};
use crate::transport::{TransportResponse, UploadRequest, UploadTransport};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Contract the host expects from an upload adapter.
#[async_trait]
pub trait UploadAdapter: Send + Sync {
    async fn upload(&self) -> Result<UploadResponse>;

    /// Cancel the outstanding upload, if any. Never fails.
    fn abort(&self);

    fn state(&self) -> AdapterState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Idle,
    Uploading,
    Succeeded,
    Failed,
    Aborted,
}

impl AdapterState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AdapterState::Succeeded | AdapterState::Failed | AdapterState::Aborted
        )
    }
}

struct Inner {
    state: AdapterState,
    cancel: Option<CancellationToken>,
}

pub struct SimpleUploadAdapter {
    id: Uuid,
    loader: Arc<dyn FileLoader>,
    config: Arc<UploadConfig>,
    transport: Arc<dyn UploadTransport>,
    inner: Mutex<Inner>,
}

impl SimpleUploadAdapter {
    pub fn new(
        loader: Arc<dyn FileLoader>,
        config: Arc<UploadConfig>,
        transport: Arc<dyn UploadTransport>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loader,
            config,
            transport,
            inner: Mutex::new(Inner {
                state: AdapterState::Idle,
                cancel: None,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<CancellationToken> {
        let mut inner = self.inner();
        if inner.state.is_terminal() {
            return Err(Error::AlreadySettled);
        }
        if inner.state == AdapterState::Uploading {
            return Err(Error::UploadInProgress);
        }

        let cancel = CancellationToken::new();
        inner.state = AdapterState::Uploading;
        inner.cancel = Some(cancel.clone());
        Ok(cancel)
    }

    async fn run(&self, cancel: &CancellationToken) -> Result<UploadResponse> {
        let file = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Aborted),
            file = self.loader.file() => file.map_err(|e| {
                Error::UploadFailed(format!("Failed to read file: {}", e))
            })?,
        };

        debug!(
            adapter = %self.id,
            "Uploading {} ({} bytes) to {}",
            file.file_name,
            file.data.len(),
            self.config.upload_url
        );

        let request = self.build_request(file);
        let response = self.transport.send(request, cancel.clone()).await?;
        parse_response(&response, &self.config.url_field)
    }

    fn finish(
        &self,
        cancel: &CancellationToken,
        result: Result<UploadResponse>,
    ) -> Result<UploadResponse> {
        let mut inner = self.inner();
        inner.cancel = None;

        // An abort that raced a completed exchange still wins.
        let result = if cancel.is_cancelled() {
            Err(Error::Aborted)
        } else {
            result
        };

        inner.state = match &result {
            Ok(_) => AdapterState::Succeeded,
            Err(Error::Aborted) => AdapterState::Aborted,
            Err(_) => AdapterState::Failed,
        };

        match &result {
            Ok(response) => info!(adapter = %self.id, "Uploaded to {}", response.default_url()),
            Err(e) => debug!(adapter = %self.id, "Upload did not complete: {}", e),
        }

        result
    }

    fn build_request(&self, file: LoadedFile) -> UploadRequest {
        let mut fields = Vec::with_capacity(self.config.fields.len() + 1);
        if let Some(preset) = &self.config.upload_preset {
            fields.push((self.config.preset_field.clone(), preset.clone()));
        }
        fields.extend(
            self.config
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        UploadRequest {
            url: self.config.upload_url.clone(),
            headers: self.config.headers.clone(),
            fields,
            file_field: self.config.file_field.clone(),
            file,
        }
    }
}

#[async_trait]
impl UploadAdapter for SimpleUploadAdapter {
    async fn upload(&self) -> Result<UploadResponse> {
        let cancel = self.begin()?;
        let result = self.run(&cancel).await;
        self.finish(&cancel, result)
    }

    fn abort(&self) {
        let mut inner = self.inner();
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
            inner.state = AdapterState::Aborted;
            debug!(adapter = %self.id, "Upload aborted");
        }
    }

    fn state(&self) -> AdapterState {
        self.inner().state
    }
}

/// Interpret the server reply.
///
/// An `error.message` field fails the upload; a `urls` object is returned
/// as is (it must contain `default`); otherwise `url_field` holds the URL.
pub fn parse_response(response: &TransportResponse, url_field: &str) -> Result<UploadResponse> {
    let body: Option<Value> = serde_json::from_str(&response.body).ok();
    let error_message = body
        .as_ref()
        .and_then(|body| body.pointer("/error/message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if !response.is_success() {
        return Err(Error::UploadFailed(match error_message {
            Some(message) => format!("status {}: {}", response.status, message),
            None => format!("status {}: {}", response.status, response.body),
        }));
    }

    let body = match body {
        Some(body) => body,
        None => {
            return Err(Error::UploadFailed(format!(
                "Failed to parse upload response: {}",
                response.body
            )))
        }
    };

    if let Some(message) = error_message {
        return Err(Error::UploadFailed(message));
    }

    if let Some(urls) = body.get("urls").and_then(Value::as_object) {
        let urls: BTreeMap<String, String> = urls
            .iter()
            .filter_map(|(key, url)| url.as_str().map(|url| (key.clone(), url.to_string())))
            .collect();
        return UploadResponse::from_urls(urls).ok_or_else(|| {
            Error::UploadFailed("Upload response `urls` has no `default` entry".to_string())
        });
    }

    body.get(url_field)
        .and_then(Value::as_str)
        .map(UploadResponse::new)
        .ok_or_else(|| {
            Error::UploadFailed(format!("Upload response has no `{}` field", url_field))
        })
}
