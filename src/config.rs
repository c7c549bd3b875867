//! Resolution of the `simpleUpload` configuration block
//!
//! Validation is pure: it reports what it found and leaves logging or
//! registration to the caller.

use crate::error::ConfigError;
use crate::models::UploadConfig;
use serde_json::Value;

/// Key under which the editor configuration stores upload settings.
pub const CONFIG_KEY: &str = "simpleUpload";

/// Warning code logged when the endpoint is missing.
pub const MISSING_UPLOAD_URL_WARNING: &str = "simple-upload-adapter-missing-uploadUrl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigResolution {
    /// No configuration block; the feature is silently off.
    Missing,
    /// A block is present but unusable.
    Invalid(ConfigError),
    Valid(UploadConfig),
}

pub fn resolve_config(value: Option<&Value>) -> ConfigResolution {
    let value = match value {
        None | Some(Value::Null) => return ConfigResolution::Missing,
        Some(value) => value,
    };

    if let Value::Object(map) = value {
        if map.get("uploadUrl").map_or(true, Value::is_null) {
            return ConfigResolution::Invalid(ConfigError::MissingField("uploadUrl"));
        }
    }

    let config: UploadConfig = match serde_json::from_value(value.clone()) {
        Ok(config) => config,
        Err(e) => return ConfigResolution::Invalid(ConfigError::Malformed(e.to_string())),
    };

    if config.upload_url.trim().is_empty() {
        return ConfigResolution::Invalid(ConfigError::MissingField("uploadUrl"));
    }

    ConfigResolution::Valid(config)
}
