use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use petawall::analysis::{AnalysisError, Analyzer, AnalyzerRegistry};
use petawall::domain::scan::{NetworkInput, ScanRequest, ToolInput};
use petawall::domain::tool::Tool;
use petawall::services::bot_detection::BotDetector;

mod common;

/// Echoes what it was asked to analyze.
struct EchoAnalyzer;

#[async_trait]
impl Analyzer for EchoAnalyzer {
    async fn analyze(&self, request: &ScanRequest) -> Result<Value, AnalysisError> {
        let detail = match &request.input {
            ToolInput::Network(NetworkInput::Capture(file)) => json!({
                "file_name": file.file_name,
                "size": file.size,
            }),
            other => json!({ "subject": other.subject() }),
        };
        Ok(json!({ "tool": request.tool().as_str(), "detail": detail }))
    }
}

struct FailingAnalyzer;

#[async_trait]
impl Analyzer for FailingAnalyzer {
    async fn analyze(&self, _request: &ScanRequest) -> Result<Value, AnalysisError> {
        Err(AnalysisError::EmptyResponse)
    }
}

macro_rules! api_app {
    ($repo:expr) => {
        api_app!(
            $repo,
            AnalyzerRegistry::new()
                .with_default(Arc::new(EchoAnalyzer))
                .register(Tool::Waf, Arc::new(FailingAnalyzer))
        )
    };
    ($repo:expr, $registry:expr) => {{
        let config = common::server_config();
        let (json_config, query_config) = petawall::json_error_config();
        test::init_service(
            App::new()
                .configure(petawall::configure)
                .app_data(json_config)
                .app_data(query_config)
                .app_data(web::Data::new($registry))
                .app_data(web::Data::new(BotDetector::from_config(&config)))
                .app_data(web::Data::new($repo.clone()))
                .app_data(web::Data::new(config)),
        )
        .await
    }};
}

#[actix_web::test]
async fn json_request_runs_the_tool_and_records_the_scan() {
    let test_db = common::TestDb::new("json_request_runs_the_tool_and_records_the_scan.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let req = test::TestRequest::post()
        .uri("/api")
        .set_json(json!({"tool": "password", "password": "hunter2"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["tool"], "password");
    assert_eq!(body["analysis_type"], "strength");
    assert_eq!(body["data"]["detail"]["subject"], "[redacted]");
    assert!(body["timestamp"].is_string());

    let req = test::TestRequest::get()
        .uri("/api/v1/scans?tool=password")
        .to_request();
    let scans: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(scans["total"], 1);
    assert_eq!(scans["items"][0]["success"], true);
    assert_eq!(scans["items"][0]["subject"], "[redacted]");
    assert!(!scans.to_string().contains("hunter2"));
}

#[actix_web::test]
async fn form_request_is_accepted() {
    let test_db = common::TestDb::new("form_request_is_accepted.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let req = test::TestRequest::post()
        .uri("/api")
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload("tool=vulnerability&url=https%3A%2F%2Fexample.com&scan_type=full")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["tool"], "vulnerability");
    assert_eq!(body["analysis_type"], "full");
}

#[actix_web::test]
async fn missing_tool_is_a_bad_request() {
    let test_db = common::TestDb::new("missing_tool_is_a_bad_request.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let req = test::TestRequest::post().uri("/api").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"success": false, "error": "No tool specified"}));

    let req = test::TestRequest::post()
        .uri("/api")
        .set_json(json!({"tool": "nmap"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid tool: nmap");

    let req = test::TestRequest::post()
        .uri("/api")
        .set_json(json!({"tool": "phishing"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing required field: url or email_content");
}

#[actix_web::test]
async fn analyzer_failure_is_reported_and_recorded() {
    let test_db = common::TestDb::new("analyzer_failure_is_reported_and_recorded.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let req = test::TestRequest::post()
        .uri("/api")
        .set_json(json!({"tool": "waf", "url": "https://example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(!body["error"].as_str().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/api/v1/scans").to_request();
    let scans: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(scans["total"], 1);
    assert_eq!(scans["items"][0]["tool"], "waf");
    assert_eq!(scans["items"][0]["success"], false);
}

#[actix_web::test]
async fn multipart_capture_upload_reaches_the_analyzer() {
    let test_db = common::TestDb::new("multipart_capture_upload_reaches_the_analyzer.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let body = concat!(
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"tool\"\r\n\r\n",
        "network\r\n",
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"pcap_file\"; filename=\"capture.pcap\"\r\n",
        "Content-Type: application/vnd.tcpdump.pcap\r\n\r\n",
        "0123456789\r\n",
        "--XBOUNDARY--\r\n",
    );
    let req = test::TestRequest::post()
        .uri("/api")
        .insert_header((
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=XBOUNDARY",
        ))
        .set_payload(body)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["tool"], "network");
    assert_eq!(body["data"]["detail"]["file_name"], "capture.pcap");
    assert_eq!(body["data"]["detail"]["size"], 10);
}

#[actix_web::test]
async fn multipart_rejects_wrong_extension() {
    let test_db = common::TestDb::new("multipart_rejects_wrong_extension.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let body = concat!(
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"tool\"\r\n\r\n",
        "mobile\r\n",
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"app_file\"; filename=\"app.exe\"\r\n",
        "Content-Type: application/octet-stream\r\n\r\n",
        "MZ\r\n",
        "--XBOUNDARY--\r\n",
    );
    let req = test::TestRequest::post()
        .uri("/api")
        .insert_header((
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=XBOUNDARY",
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn invalid_scan_filter_is_rejected() {
    let test_db = common::TestDb::new("invalid_scan_filter_is_rejected.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let req = test::TestRequest::get()
        .uri("/api/v1/scans?tool=nmap")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn huge_page_number_returns_an_empty_page() {
    let test_db = common::TestDb::new("huge_page_number_returns_an_empty_page.db");
    let repo = test_db.repo();
    let app = api_app!(repo);

    let req = test::TestRequest::post()
        .uri("/api")
        .set_json(json!({"tool": "iot", "target": "camera.local"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = u64::MAX / 2;
    for uri in [
        format!("/api/v1/scans?page={page}"),
        format!("/api/v1/campaigns?page={page}"),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["items"].as_array().unwrap().is_empty(), "{uri}");
    }
}
