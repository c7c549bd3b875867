//! Editor plugin wiring the upload adapter into the file repository

use crate::adapter::{SimpleUploadAdapter, UploadAdapter};
use crate::config::{resolve_config, ConfigResolution, CONFIG_KEY, MISSING_UPLOAD_URL_WARNING};
use crate::error::ConfigError;
use crate::host::{Editor, FileLoader};
use crate::transport::{HttpTransport, UploadTransport};
use std::sync::Arc;
use tracing::{debug, info, warn};

const INVALID_CONFIG_WARNING: &str = "simple-upload-adapter-invalid-config";

/// Outcome of [`SimpleUploadPlugin::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginStatus {
    /// No configuration block was present.
    Disabled,
    Misconfigured(ConfigError),
    Registered,
}

pub struct SimpleUploadPlugin {
    transport: Arc<dyn UploadTransport>,
}

impl SimpleUploadPlugin {
    pub const NAME: &'static str = "SimpleUploadAdapter";

    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        Self { transport }
    }

    pub fn with_http() -> Self {
        Self::new(Arc::new(HttpTransport::new()))
    }

    /// Read the `simpleUpload` block and, when it is usable, register an
    /// adapter factory with the editor's file repository.
    ///
    /// Configuration problems never fail initialization; they disable the
    /// plugin and are reported through the returned status.
    pub fn init(&self, editor: &mut Editor) -> PluginStatus {
        let config = match resolve_config(editor.config.get(CONFIG_KEY)) {
            ConfigResolution::Missing => {
                debug!("No `{}` configuration, uploads disabled", CONFIG_KEY);
                return PluginStatus::Disabled;
            }
            ConfigResolution::Invalid(reason) => {
                let code = match reason {
                    ConfigError::MissingField(_) => MISSING_UPLOAD_URL_WARNING,
                    ConfigError::Malformed(_) => INVALID_CONFIG_WARNING,
                };
                warn!(
                    code = %code,
                    "{}: `{}` configuration is unusable ({}), uploads disabled",
                    Self::NAME,
                    CONFIG_KEY,
                    reason
                );
                return PluginStatus::Misconfigured(reason);
            }
            ConfigResolution::Valid(config) => Arc::new(config),
        };

        info!("{} registered for {}", Self::NAME, config.upload_url);

        let transport = self.transport.clone();
        editor
            .file_repository
            .set_adapter_factory(move |loader: Arc<dyn FileLoader>| {
                Box::new(SimpleUploadAdapter::new(
                    loader,
                    config.clone(),
                    transport.clone(),
                )) as Box<dyn UploadAdapter>
            });

        PluginStatus::Registered
    }
}

impl Default for SimpleUploadPlugin {
    fn default() -> Self {
        Self::with_http()
    }
}
