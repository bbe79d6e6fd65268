use movement_analyzer::{AcceptFilter, AnalysisClient, ConfigBuilder, DashboardError, SelectedFile};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn sample_video(dir: &TempDir) -> SelectedFile {
    let path = dir.path().join("squat.mp4");
    tokio::fs::write(&path, b"fake mp4 payload").await.unwrap();
    SelectedFile::open(&path, &AcceptFilter::default(), 0).await.unwrap()
}

#[tokio::test]
async fn test_submit_posts_multipart_and_resolves_download_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"squat.mp4\""))
        .and(body_string_contains("fake mp4 payload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": {"red": 10},
            "download_url": "/out/1.mp4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = sample_video(&dir).await;
    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url(server.uri()).build()).unwrap();

    let result = client.submit(&file).await.unwrap();
    assert_eq!(result.processed_video, format!("{}/out/1.mp4", server.uri()));
    assert_eq!(result.summary, json!({"red": 10}));
}

#[tokio::test]
async fn test_server_error_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "cannot open video"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = sample_video(&dir).await;
    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url(server.uri()).build()).unwrap();

    let err = client.submit(&file).await.unwrap_err();
    match err {
        DashboardError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "cannot open video");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = sample_video(&dir).await;
    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url(server.uri()).build()).unwrap();

    let err = client.submit(&file).await.unwrap_err();
    assert!(err.is_request_failure());
}

#[tokio::test]
async fn test_unreachable_server() {
    let dir = TempDir::new().unwrap();
    let file = sample_video(&dir).await;
    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url("http://127.0.0.1:1").build()).unwrap();

    let err = client.submit(&file).await.unwrap_err();
    assert!(matches!(err, DashboardError::Http(_)));
    assert!(err.is_request_failure());
}

#[tokio::test]
async fn test_health_reads_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Video analysis backend running. Go to /docs to test."
        })))
        .mount(&server)
        .await;

    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url(server.uri()).build()).unwrap();
    let status = client.health().await.unwrap();

    assert!(status.healthy);
    assert_eq!(status.status, 200);
    assert!(status.message.unwrap().starts_with("Video analysis backend running"));
}

#[tokio::test]
async fn test_download_processed_video() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/processed/abc.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"processed frames".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url(server.uri()).build()).unwrap();

    let reference = format!("{}/processed/abc.mp4", server.uri());
    let saved = client.download(&reference, &dir.path().join("out")).await.unwrap();

    assert_eq!(saved, dir.path().join("out/abc.mp4"));
    assert_eq!(tokio::fs::read(&saved).await.unwrap(), b"processed frames");
}

#[tokio::test]
async fn test_download_missing_video() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/processed/gone.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = AnalysisClient::new(ConfigBuilder::new().with_server_url(server.uri()).build()).unwrap();

    let reference = format!("{}/processed/gone.mp4", server.uri());
    let err = client.download(&reference, dir.path()).await.unwrap_err();
    assert!(matches!(err, DashboardError::Server { status: 404, .. }));
    assert!(!dir.path().join("gone.mp4").exists());
}
