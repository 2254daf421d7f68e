//! Functional tests for the HTTP surface

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use gen_fault_gateway::{
    api::create_router,
    config::{RunMode, Settings},
    lifecycle::{
        FaultEventKind, FaultReport, GuardianConfig, GuardianState, ProcessFaultEvent,
        ProcessGuardian, Terminator,
    },
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoExit;

impl Terminator for NoExit {
    fn terminate(&self, _code: i32) {}
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.polling.interval_ms = 10;
    settings.polling.max_attempts = Some(20);
    settings
}

fn create_test_app(settings: Settings) -> (Router, Arc<ProcessGuardian>) {
    let guardian = ProcessGuardian::new(GuardianConfig::default(), Arc::new(NoExit));
    let state = Arc::new(AppState::new(settings, guardian.clone()));
    (create_router(state), guardian)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_is_active() {
    let (app, _) = create_test_app(test_settings());

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-time"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "success", "message": "Server is active!!"}));
}

#[tokio::test]
async fn test_health_reports_guardian_state() {
    let (app, _) = create_test_app(test_settings());

    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], json!("Running"));
}

#[tokio::test]
async fn test_unknown_route_is_operational_404() {
    let (app, _) = create_test_app(test_settings());

    let (status, body) = send(app, get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "status": "Failure",
            "message": "Unable to find /api/v1/nope on this server!!"
        })
    );
}

#[tokio::test]
async fn test_wrong_method_is_operational_405() {
    let (app, _) = create_test_app(test_settings());

    let response = app.oneshot(get("/api/v1/lumaai/image")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().contains_key("x-request-time"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "status": "Failure",
            "message": "GET is not supported on /api/v1/lumaai/image!!"
        })
    );
}

#[tokio::test]
async fn test_error_keeps_request_time_header() {
    let (app, _) = create_test_app(test_settings());

    let response = app.oneshot(get("/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-time"));
}

#[tokio::test]
async fn test_missing_prompt_is_rejected() {
    let (app, _) = create_test_app(test_settings());

    let (status, body) = send(
        app,
        post_json("/api/v1/lumaai/image", json!({"prompt": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": "Failure", "message": "Prompt is required"})
    );
}

#[tokio::test]
async fn test_malformed_json_is_a_client_failure() {
    let (app, _) = create_test_app(test_settings());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/lumaai/image")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"prompt\": "))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!("Failure"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let (app, _) = create_test_app(test_settings());

    let prompt = "x".repeat(20 * 1024);
    let (status, body) = send(
        app,
        post_json("/api/v1/lumaai/image", json!({"prompt": prompt})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], json!("Failure"));
}

#[tokio::test]
async fn test_luma_without_key_reports_init_error() {
    let (app, _) = create_test_app(test_settings());

    let (status, body) = send(
        app,
        post_json("/api/v1/lumaai/image", json!({"prompt": "a cat"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "status": "Error",
            "message": "Luma AI initialization error: LUMAAI_API_KEY is not configured"
        })
    );
}

async fn luma_settings(server: &MockServer) -> Settings {
    let mut settings = test_settings();
    settings.providers.luma.api_key = Some("luma-test-key".to_string());
    settings.providers.luma.base_url = server.uri();
    settings
}

#[tokio::test]
async fn test_luma_image_is_polled_to_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generations/image"))
        .and(header("authorization", "Bearer luma-test-key"))
        .and(body_partial_json(json!({
            "prompt": "a cat",
            "model": "photon-flash-1",
            "aspect_ratio": "16:9"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "gen-1",
            "state": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "state": "dreaming"
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/generations/gen-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "state": "completed",
            "assets": {"image": "https://cdn.example/gen-1.png"}
        })))
        .mount(&server)
        .await;

    let (app, _) = create_test_app(luma_settings(&server).await);
    let (status, body) = send(
        app,
        post_json("/api/v1/lumaai/image", json!({"prompt": "a cat"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "message": "Image generated successfully",
            "data": "https://cdn.example/gen-1.png"
        })
    );
}

#[tokio::test]
async fn test_luma_failed_generation_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "gen-2",
            "state": "queued"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/generations/gen-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-2",
            "state": "failed",
            "failure_reason": "bad prompt"
        })))
        .mount(&server)
        .await;

    let (app, _) = create_test_app(luma_settings(&server).await);
    let (status, body) = send(
        app,
        post_json("/api/v1/lumaai/video", json!({"prompt": "waves"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({"status": "Error", "message": "Generation failed: bad prompt"})
    );
}

#[tokio::test]
async fn test_luma_submit_failure_is_a_connect_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generations/image"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid aspect ratio"})),
        )
        .mount(&server)
        .await;

    let (app, _) = create_test_app(luma_settings(&server).await);
    let (status, body) = send(
        app,
        post_json(
            "/api/v1/lumaai/image",
            json!({"prompt": "a cat", "aspect_ratio": "1:99"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Failed to connect to Luma AI: "));
    assert!(message.contains("Invalid aspect ratio"));
}

#[tokio::test]
async fn test_runware_validation_runs_before_connecting() {
    let (app, _) = create_test_app(test_settings());

    let (status, body) = send(
        app,
        post_json(
            "/api/v1/runware/image",
            json!({"positivePrompt": "a cat", "width": 512}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": "Failure", "message": "Height is required"}));
}

async fn runware_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "Bearer rw-test-key"))
        .and(body_partial_json(json!([{"taskType": "ping"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"taskType": "ping", "pong": true}]
        })))
        .mount(&server)
        .await;

    server
}

fn runware_settings(server: &MockServer) -> Settings {
    let mut settings = test_settings();
    settings.providers.runware.api_key = Some("rw-test-key".to_string());
    settings.providers.runware.base_url = server.uri();
    settings
}

#[tokio::test]
async fn test_runware_text_to_image() {
    let server = runware_server().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!([{
            "taskType": "imageInference",
            "positivePrompt": "a cat",
            "numberResults": 1,
            "outputType": "URL",
            "outputFormat": "PNG",
            "includeCost": true
        }])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"taskType": "imageInference", "imageURL": "https://im.runware.ai/1.png"},
                {"taskType": "imageInference", "imageURL": "https://im.runware.ai/2.png"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = create_test_app(runware_settings(&server));
    let (status, body) = send(
        app,
        post_json(
            "/api/v1/runware/image",
            json!({
                "positivePrompt": "a cat",
                "width": 512,
                "height": 512,
                "model": "runware:100@1"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Images generated successfully"));
    assert_eq!(body["results"], json!(2));
    assert_eq!(body["data"][1]["imageURL"], json!("https://im.runware.ai/2.png"));
}

#[tokio::test]
async fn test_runware_task_error_is_reported() {
    let server = runware_server().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!([{"taskType": "imageUpscale"}])))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{"code": "invalidUpscaleFactor", "message": "Invalid upscale factor"}]
        })))
        .mount(&server)
        .await;

    let (app, _) = create_test_app(runware_settings(&server));
    let (status, body) = send(
        app,
        post_json(
            "/api/v1/runware/upscale",
            json!({"inputImage": "https://example.com/in.png", "upscaleFactor": 9}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Failed to upscale image: Invalid upscale factor"));
}

#[tokio::test]
async fn test_runware_disconnect() {
    let server = runware_server().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!([{"taskType": "promptEnhance"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"taskType": "promptEnhance", "text": "a fluffy cat"}]
        })))
        .mount(&server)
        .await;

    let (app, _) = create_test_app(runware_settings(&server));

    let (status, body) = send(app.clone(), post_json("/api/v1/runware/disconnect", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("No Runware client was connected"));

    let (status, body) = send(
        app.clone(),
        post_json("/api/v1/runware/enhancePrompt", json!({"prompt": "cat"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["text"], json!("a fluffy cat"));

    let (_, body) = send(app, post_json("/api/v1/runware/disconnect", json!({}))).await;
    assert_eq!(body["message"], json!("Runware client disconnected successfully"));
}

#[tokio::test]
async fn test_requests_are_refused_while_draining() {
    let (app, guardian) = create_test_app(test_settings());

    guardian
        .handle(ProcessFaultEvent::new(
            FaultEventKind::UncaughtException,
            FaultReport::new("Error", "boom"),
        ))
        .await;
    assert_eq!(guardian.state(), GuardianState::Terminated);

    let (status, body) = send(app, get("/")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({"status": "Error", "message": "Server is shutting down"})
    );
}

#[tokio::test]
async fn test_development_mode_includes_details() {
    let mut settings = test_settings();
    settings.mode = RunMode::Development;
    let (app, _) = create_test_app(settings);

    let (status, body) = send(
        app,
        post_json("/api/v1/runware/searchModels", json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!("Failure"));
    assert_eq!(body["message"], json!("Search query is required"));
    assert_eq!(body["error"]["statusCode"], json!(400));
    assert!(body.get("stack").is_some());
}

#[tokio::test]
async fn test_fault_triggers_are_off_by_default() {
    let (app, _) = create_test_app(test_settings());

    let (status, _) = send(app, get("/test/trigger-unhandled")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unhandled_trigger_reaches_guardian() {
    let mut settings = test_settings();
    settings.server.enable_fault_triggers = true;
    let (app, guardian) = create_test_app(settings);
    guardian.start();

    let (status, _) = send(app, get("/test/trigger-unhandled")).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::timeout(Duration::from_secs(1), guardian.terminated())
        .await
        .unwrap();
    assert!(!guardian.is_running());
}
