use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::Value;
use simple_upload_adapter::host::PathFileLoader;
use simple_upload_adapter::{
    ConfigError, Editor, EditorConfig, Error, FileLoader, PluginStatus, SimpleUploadPlugin,
    UploadAdapter, UploadConfig, CONFIG_KEY,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "simple-upload-adapter")]
#[command(about = "Upload a file through the editor upload adapter")]
struct CliArgs {
    /// File to upload.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON file with the upload settings. Either the `simpleUpload` block
    /// itself or an editor configuration containing it. Falls back to
    /// `SIMPLE_UPLOAD_*` environment variables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Accept either a whole editor configuration or the bare upload block.
fn upload_block(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(CONFIG_KEY) => {
            map.remove(CONFIG_KEY).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn load_config_value(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: Value = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?;
            Ok(upload_block(value))
        }
        None => Ok(serde_json::to_value(UploadConfig::from_env()?)?),
    }
}

/// The CLI has nothing to do without a registered adapter.
fn ensure_registered(status: PluginStatus) -> simple_upload_adapter::Result<()> {
    match status {
        PluginStatus::Registered => Ok(()),
        PluginStatus::Misconfigured(reason) => Err(Error::Config(reason)),
        PluginStatus::Disabled => Err(Error::Config(ConfigError::MissingField("uploadUrl"))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_upload_adapter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = EditorConfig::new();
    config.set(CONFIG_KEY, load_config_value(args.config.as_deref())?);
    let mut editor = Editor::new(config);

    let plugin = SimpleUploadPlugin::with_http();
    ensure_registered(plugin.init(&mut editor))?;

    let loader: Arc<dyn FileLoader> = Arc::new(PathFileLoader::new(&args.file));
    let adapter: Arc<dyn UploadAdapter> = editor
        .file_repository
        .create_upload_adapter(loader)
        .ok_or_else(|| anyhow!("No upload adapter registered"))?
        .into();

    info!("Uploading {}", args.file.display());

    let mut upload = {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.upload().await })
    };

    let result = tokio::select! {
        result = &mut upload => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, aborting upload");
            adapter.abort();
            upload.await?
        }
    };

    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            error!("Upload failed: {}", e);
            std::process::exit(if e.is_aborted() { 130 } else { 1 });
        }
    }
}
