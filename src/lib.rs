//! Upload adapter plugin for a rich-text editor
//!
//! Uploads files selected in the editor to a media service with a single
//! multipart POST and hands the resulting URL back to the editor's file
//! repository.

pub mod adapter;
pub mod config;
pub mod error;
pub mod host;
pub mod mime;
pub mod models;
pub mod plugin;
pub mod transport;

pub use adapter::{AdapterState, SimpleUploadAdapter, UploadAdapter};
pub use config::{resolve_config, ConfigResolution, CONFIG_KEY};
pub use error::{ConfigError, Error, Result};
pub use host::{Editor, EditorConfig, FileLoader, FileRepository};
pub use models::{LoadedFile, UploadConfig, UploadResponse};
pub use plugin::{PluginStatus, SimpleUploadPlugin};
