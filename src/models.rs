//! Data models and structures
//!
//! Defines the upload configuration read from the host editor, the file
//! payload handed over by a loader and the result returned to the host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_FILE_FIELD: &str = "file";
pub const DEFAULT_PRESET_FIELD: &str = "upload_preset";
pub const DEFAULT_URL_FIELD: &str = "secure_url";

fn default_file_field() -> String {
    DEFAULT_FILE_FIELD.to_string()
}

fn default_preset_field() -> String {
    DEFAULT_PRESET_FIELD.to_string()
}

fn default_url_field() -> String {
    DEFAULT_URL_FIELD.to_string()
}

/// Settings held under the `simpleUpload` key of the editor configuration.
///
/// `upload_url` and `headers` form the generic contract. The preset and the
/// wire field names specialize it for a media provider and default to the
/// names that provider uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    #[serde(default)]
    pub upload_url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_preset: Option<String>,
    /// Extra text fields sent along with the file.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default = "default_file_field")]
    pub file_field: String,
    #[serde(default = "default_preset_field")]
    pub preset_field: String,
    /// JSON field of the response holding the uploaded resource URL.
    #[serde(default = "default_url_field")]
    pub url_field: String,
}

impl UploadConfig {
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            headers: BTreeMap::new(),
            upload_preset: None,
            fields: BTreeMap::new(),
            file_field: default_file_field(),
            preset_field: default_preset_field(),
            url_field: default_url_field(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_upload_preset(mut self, preset: impl Into<String>) -> Self {
        self.upload_preset = Some(preset.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_url_field(mut self, url_field: impl Into<String>) -> Self {
        self.url_field = url_field.into();
        self
    }

    /// Build a configuration from `SIMPLE_UPLOAD_*` environment variables.
    ///
    /// A missing `SIMPLE_UPLOAD_URL` yields an empty endpoint, which
    /// [`crate::config::resolve_config`] then reports as invalid.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(std::env::var("SIMPLE_UPLOAD_URL").unwrap_or_default());
        config.upload_preset = std::env::var("SIMPLE_UPLOAD_PRESET").ok();

        if let Ok(headers) = std::env::var("SIMPLE_UPLOAD_HEADERS") {
            config.headers = serde_json::from_str(&headers)?;
        }
        if let Ok(field) = std::env::var("SIMPLE_UPLOAD_FILE_FIELD") {
            config.file_field = field;
        }
        if let Ok(field) = std::env::var("SIMPLE_UPLOAD_PRESET_FIELD") {
            config.preset_field = field;
        }
        if let Ok(field) = std::env::var("SIMPLE_UPLOAD_URL_FIELD") {
            config.url_field = field;
        }

        Ok(config)
    }
}

/// File payload resolved by a [`crate::host::FileLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl LoadedFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Result handed back to the host: always carries a `default` URL, plus any
/// additional sizes the server reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    default: String,
    #[serde(flatten)]
    others: BTreeMap<String, String>,
}

impl UploadResponse {
    pub fn new(default_url: impl Into<String>) -> Self {
        Self {
            default: default_url.into(),
            others: BTreeMap::new(),
        }
    }

    /// Build from a `urls` mapping; `None` unless it contains `default`.
    pub fn from_urls(mut urls: BTreeMap<String, String>) -> Option<Self> {
        let default = urls.remove("default")?;
        Some(Self {
            default,
            others: urls,
        })
    }

    pub fn default_url(&self) -> &str {
        &self.default
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == "default" {
            Some(&self.default)
        } else {
            self.others.get(key).map(String::as_str)
        }
    }

    pub fn len(&self) -> usize {
        self.others.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
