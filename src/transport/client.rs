use super::{TransportResponse, UploadRequest, UploadTransport};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tokio_util::sync::CancellationToken;

/// [`UploadTransport`] backed by reqwest.
///
/// Cancelling drops the in-flight request future, which closes its
/// connection.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::new_with_client(Client::new())
    }

    pub fn new_with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_form(request: UploadRequest) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in request.fields {
            form = form.text(name, value);
        }

        let file = request.file;
        let part = Part::bytes(file.data)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| {
                Error::UploadFailed(format!(
                    "Invalid content type {:?}: {}",
                    file.content_type, e
                ))
            })?;

        Ok(form.part(request.file_field, part))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn send(
        &self,
        request: UploadRequest,
        cancel: CancellationToken,
    ) -> Result<TransportResponse> {
        let url = request.url.clone();
        let mut builder = self.client.post(&url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let builder = builder.multipart(Self::build_form(request)?);

        let exchange = async {
            let response = builder.send().await.map_err(|e| {
                tracing::debug!("Failed to send upload request to {}: {}", url, e);
                Error::UploadFailed(format!("Failed to send upload request: {}", e))
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                Error::UploadFailed(format!("Failed to read upload response: {}", e))
            })?;

            Ok(TransportResponse {
                status: status.as_u16(),
                body,
            })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Upload request to {} cancelled", url);
                Err(Error::Aborted)
            }
            result = exchange => result,
        }
    }
}
