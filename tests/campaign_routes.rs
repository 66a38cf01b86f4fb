use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};

use petawall::services::bot_detection::BotDetector;

mod common;

macro_rules! campaign_app {
    ($repo:expr) => {{
        let config = common::server_config();
        let (json_config, query_config) = petawall::json_error_config();
        test::init_service(
            App::new()
                .configure(petawall::configure)
                .app_data(json_config)
                .app_data(query_config)
                .app_data(web::Data::new(BotDetector::from_config(&config)))
                .app_data(web::Data::new($repo.clone()))
                .app_data(web::Data::new(config)),
        )
        .await
    }};
}

#[actix_web::test]
async fn campaign_lifecycle_over_http() {
    let test_db = common::TestDb::new("campaign_lifecycle_over_http.db");
    let repo = test_db.repo();
    let app = campaign_app!(repo);

    let req = test::TestRequest::post()
        .uri("/api/v1/campaigns")
        .set_json(json!({
            "name": "Payroll update",
            "subject": "Action required: confirm your bank details",
            "landing_url": "https://intranet.example.com/training",
            "owner_email": "Owner@Example.com"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let campaign: Value = test::read_body_json(resp).await;
    assert_eq!(campaign["status"], "draft");
    assert_eq!(campaign["owner_email"], "owner@example.com");
    let id = campaign["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{id}/launch"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT, "no recipients yet");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{id}/recipients"))
        .set_json(json!({
            "recipients": [
                {"email": "a@example.com", "name": "Alice"},
                {"email": "b@example.com"},
                {"email": "A@example.com"}
            ]
        }))
        .to_request();
    let added: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(added, json!({"added": 2, "skipped": 1}));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{id}/launch"))
        .to_request();
    let launched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(launched["sent"], 2);
    assert_eq!(launched["campaign"]["status"], "active");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{id}/recipients"))
        .set_json(json!({"recipients": [{"email": "late@example.com"}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/campaigns/{id}"))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["stats"]["recipients"], 2);
    assert_eq!(detail["stats"]["sent"], 2);
    let click = detail["recipients"][0]["links"]["click"].as_str().unwrap();
    assert!(click.starts_with("https://track.example.com/t/c/"));
    assert!(detail["recipients"][0].get("token").is_none());

    let req = test::TestRequest::get()
        .uri("/api/v1/campaigns?owner=owner@example.com&status=active")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["items"][0]["name"], "Payroll update");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{id}/complete"))
        .to_request();
    let completed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(completed["status"], "completed");

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications?email=owner@example.com")
        .to_request();
    let notifications: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(notifications[0]["title"], "Campaign launched");
}

#[actix_web::test]
async fn invalid_campaign_payloads_are_rejected() {
    let test_db = common::TestDb::new("invalid_campaign_payloads_are_rejected.db");
    let repo = test_db.repo();
    let app = campaign_app!(repo);

    let req = test::TestRequest::post()
        .uri("/api/v1/campaigns")
        .set_json(json!({"name": "", "subject": "Hi", "owner_email": "owner@example.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/campaigns")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/campaigns/42")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/campaigns?status=archived")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn recipients_csv_upload() {
    let test_db = common::TestDb::new("recipients_csv_upload.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(&repo, None, &["a@example.com"]);
    let app = campaign_app!(repo);

    let body = concat!(
        "--XBOUNDARY\r\n",
        "Content-Disposition: form-data; name=\"csv\"; filename=\"team.csv\"\r\n",
        "Content-Type: text/csv\r\n\r\n",
        "Email,Name\n",
        "a@example.com,Alice\n",
        "\n",
        "c@example.com,Carol\n",
        "\r\n",
        "--XBOUNDARY--\r\n",
    );
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{}/recipients/upload", campaign.id))
        .insert_header((
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=XBOUNDARY",
        ))
        .set_payload(body)
        .to_request();
    let added: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(added, json!({"added": 1, "skipped": 1}));
}

#[actix_web::test]
async fn recount_endpoint_reports_summary() {
    let test_db = common::TestDb::new("recount_endpoint_reports_summary.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(&repo, None, &["a@example.com", "b@example.com"]);
    let app = campaign_app!(repo);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/campaigns/{}/recount", campaign.id))
        .to_request();
    let summary: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(summary, json!({"recipients": 2, "events": 0, "reclassified": 0}));
}

#[actix_web::test]
async fn notifications_are_read_by_their_owner_only() {
    let test_db = common::TestDb::new("notifications_are_read_by_their_owner_only.db");
    let repo = test_db.repo();
    let app = campaign_app!(repo);

    let owner = petawall::domain::types::EmailAddress::new("owner@example.com").unwrap();
    for title in ["First", "Second"] {
        petawall::services::notifications::notify(&repo, &owner, title, "Body", None).unwrap();
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications?email=owner@example.com&unread=true")
        .to_request();
    let unread: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unread.as_array().unwrap().len(), 2);
    let id = unread[0]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/notifications/{id}/read?email=intruder@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/notifications/{id}/read?email=owner@example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications/read-all?email=owner@example.com")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"success": true, "updated": 1}));

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "email is required");
}
