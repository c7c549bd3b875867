//! Host editor collaborators
//!
//! The editor owns the configuration store and the file repository; the
//! upload plugin only reads the former and registers with the latter.

use crate::adapter::UploadAdapter;
use crate::mime::detect_mime;
use crate::models::LoadedFile;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Handle to a file the user selected; the payload may resolve lazily.
#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn file(&self) -> Result<LoadedFile>;
}

/// Loader over an already available payload.
#[derive(Debug, Clone)]
pub struct MemoryFileLoader {
    file: LoadedFile,
}

impl MemoryFileLoader {
    pub fn new(file: LoadedFile) -> Self {
        Self { file }
    }
}

#[async_trait]
impl FileLoader for MemoryFileLoader {
    async fn file(&self) -> Result<LoadedFile> {
        Ok(self.file.clone())
    }
}

/// Loader reading a file from disk when the upload starts.
#[derive(Debug, Clone)]
pub struct PathFileLoader {
    path: PathBuf,
}

impl PathFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FileLoader for PathFileLoader {
    async fn file(&self) -> Result<LoadedFile> {
        let data = tokio::fs::read(&self.path).await?;
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = detect_mime(&data, &file_name);

        Ok(LoadedFile::new(file_name, content_type, data))
    }
}

pub type AdapterFactory =
    Arc<dyn Fn(Arc<dyn FileLoader>) -> Box<dyn UploadAdapter> + Send + Sync>;

/// Registry through which the editor obtains an upload adapter per file.
#[derive(Default)]
pub struct FileRepository {
    factory: Option<AdapterFactory>,
}

impl FileRepository {
    pub fn set_adapter_factory<F>(&mut self, factory: F)
    where
        F: Fn(Arc<dyn FileLoader>) -> Box<dyn UploadAdapter> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
    }

    pub fn has_adapter_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Create an adapter bound to `loader`, or `None` when uploads are not
    /// configured.
    pub fn create_upload_adapter(
        &self,
        loader: Arc<dyn FileLoader>,
    ) -> Option<Box<dyn UploadAdapter>> {
        self.factory.as_ref().map(|factory| factory(loader))
    }
}

impl fmt::Debug for FileRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRepository")
            .field("has_adapter_factory", &self.has_adapter_factory())
            .finish()
    }
}

/// String-keyed configuration store of the editor.
#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    values: HashMap<String, Value>,
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; other JSON values give an empty store.
    pub fn from_json(value: Value) -> Self {
        let values = match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }
}

#[derive(Debug, Default)]
pub struct Editor {
    pub config: EditorConfig,
    pub file_repository: FileRepository,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            file_repository: FileRepository::default(),
        }
    }
}
