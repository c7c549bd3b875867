use pretty_assertions::assert_eq;
use serde_json::json;
use simple_upload_adapter::{
    host::{MemoryFileLoader, PathFileLoader},
    transport::{HttpTransport, MockReply, MockTransport},
    AdapterState, Editor, EditorConfig, FileLoader, LoadedFile, PluginStatus,
    SimpleUploadPlugin, UploadAdapter, UploadResponse, CONFIG_KEY,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn editor_for(upload_url: String) -> Editor {
    Editor::new(EditorConfig::from_json(json!({
        CONFIG_KEY: {
            "uploadUrl": upload_url,
            "uploadPreset": "unsigned",
            "headers": { "X-Requested-With": "editor" }
        }
    })))
}

fn png_loader() -> Arc<dyn FileLoader> {
    Arc::new(MemoryFileLoader::new(LoadedFile::new(
        "x.png",
        "image/png",
        b"fake png bytes".to_vec(),
    )))
}

#[tokio::test]
async fn test_full_upload_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .and(header("x-requested-with", "editor"))
        .and(body_string_contains("name=\"upload_preset\""))
        .and(body_string_contains("unsigned"))
        .and(body_string_contains("filename=\"x.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "x",
            "secure_url": "https://cdn.example.com/x.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut editor = editor_for(format!("{}/v1_1/demo/image/upload", server.uri()));
    let plugin = SimpleUploadPlugin::with_http();
    assert_eq!(plugin.init(&mut editor), PluginStatus::Registered);

    let adapter = editor
        .file_repository
        .create_upload_adapter(png_loader())
        .unwrap();
    let response = adapter.upload().await.unwrap();

    assert_eq!(response, UploadResponse::new("https://cdn.example.com/x.png"));
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "default": "https://cdn.example.com/x.png" })
    );
    assert_eq!(adapter.state(), AdapterState::Succeeded);
}

#[tokio::test]
async fn test_upload_from_disk_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("filename=\"diagram.gif\""))
        .and(body_string_contains("Content-Type: image/gif"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secure_url": "https://cdn.example.com/diagram.gif"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("diagram.gif");
    std::fs::write(&file_path, b"GIF89a\x01\x00\x01\x00").unwrap();

    let mut editor = editor_for(format!("{}/upload", server.uri()));
    SimpleUploadPlugin::with_http().init(&mut editor);

    let adapter = editor
        .file_repository
        .create_upload_adapter(Arc::new(PathFileLoader::new(file_path)))
        .unwrap();

    let response = adapter.upload().await.unwrap();
    assert_eq!(response.default_url(), "https://cdn.example.com/diagram.gif");
}

#[tokio::test]
async fn test_http_server_error_fails_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .expect(1)
        .mount(&server)
        .await;

    let mut editor = editor_for(format!("{}/upload", server.uri()));
    SimpleUploadPlugin::with_http().init(&mut editor);
    let adapter = editor
        .file_repository
        .create_upload_adapter(png_loader())
        .unwrap();

    let err = adapter.upload().await.unwrap_err();
    assert!(err.is_upload_failed());
    assert_eq!(adapter.state(), AdapterState::Failed);
}

#[tokio::test]
async fn test_http_malformed_body_fails_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let mut editor = editor_for(format!("{}/upload", server.uri()));
    SimpleUploadPlugin::with_http().init(&mut editor);
    let adapter = editor
        .file_repository
        .create_upload_adapter(png_loader())
        .unwrap();

    assert!(adapter.upload().await.unwrap_err().is_upload_failed());
}

#[tokio::test]
async fn test_abort_pending_http_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "secure_url": "https://cdn.example.com/late.png" }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut editor = editor_for(format!("{}/upload", server.uri()));
    SimpleUploadPlugin::new(Arc::new(HttpTransport::new())).init(&mut editor);
    let adapter: Arc<dyn UploadAdapter> = editor
        .file_repository
        .create_upload_adapter(png_loader())
        .unwrap()
        .into();

    let pending = {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.upload().await })
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        while server
            .received_requests()
            .await
            .map_or(true, |requests| requests.is_empty())
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("upload request should reach the server");
    assert_eq!(adapter.state(), AdapterState::Uploading);
    adapter.abort();

    let err = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("aborted upload should settle promptly")
        .unwrap()
        .unwrap_err();
    assert!(err.is_aborted());
    assert_eq!(adapter.state(), AdapterState::Aborted);
}

#[tokio::test]
async fn test_each_file_gets_its_own_adapter() {
    let transport = MockTransport::new()
        .with_json_response(200, json!({ "secure_url": "https://cdn.example.com/1.png" }))
        .with_reply(MockReply::Respond {
            status: 500,
            body: "busy".to_string(),
        });

    let mut editor = editor_for("https://api.example.com/upload".to_string());
    SimpleUploadPlugin::new(Arc::new(transport.clone())).init(&mut editor);

    let first = editor
        .file_repository
        .create_upload_adapter(png_loader())
        .unwrap();
    let second = editor
        .file_repository
        .create_upload_adapter(png_loader())
        .unwrap();

    assert!(first.upload().await.is_ok());
    assert!(second.upload().await.unwrap_err().is_upload_failed());

    assert_eq!(first.state(), AdapterState::Succeeded);
    assert_eq!(second.state(), AdapterState::Failed);
    assert_eq!(transport.get_request_count(), 2);
}

#[tokio::test]
async fn test_unconfigured_editor_has_no_adapter() {
    let mut editor = Editor::default();
    let status = SimpleUploadPlugin::new(Arc::new(MockTransport::new())).init(&mut editor);

    assert_eq!(status, PluginStatus::Disabled);
    assert!(editor
        .file_repository
        .create_upload_adapter(png_loader())
        .is_none());
}
