use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::Duration;
use tera::Tera;

use petawall::domain::types::EmailAddress;
use petawall::repository::{CampaignWriter, NotificationReader, RecipientReader};
use petawall::routes::tracking::TRACKING_PIXEL;
use petawall::services::bot_detection::BotDetector;

mod common;

const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0";

macro_rules! tracking_app {
    ($repo:expr) => {
        tracking_app!($repo, common::server_config())
    };
    ($repo:expr, $config:expr) => {{
        let config = $config;
        test::init_service(
            App::new()
                .configure(petawall::configure)
                .app_data(web::Data::new(Tera::new(&config.templates_dir).unwrap()))
                .app_data(web::Data::new(BotDetector::from_config(&config)))
                .app_data(web::Data::new($repo.clone()))
                .app_data(web::Data::new(config)),
        )
        .await
    }};
}

#[actix_web::test]
async fn open_pixel_is_served_for_unknown_tokens() {
    let test_db = common::TestDb::new("open_pixel_is_served_for_unknown_tokens.db");
    let repo = test_db.repo();
    let app = tracking_app!(repo);

    let req = test::TestRequest::get().uri("/t/o/not-a-token").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/gif");
    let cache_control = resp
        .headers()
        .get(header::CACHE_CONTROL)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cache_control.contains("no-store"));
    assert!(cache_control.contains("no-cache"));

    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), TRACKING_PIXEL.as_slice());
}

#[actix_web::test]
async fn human_open_counts_once_per_request() {
    let test_db = common::TestDb::new("human_open_counts_once_per_request.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(&repo, None, &["a@example.com"]);
    repo.launch_campaign(campaign.id, common::now() - Duration::hours(1))
        .unwrap();
    let recipient = repo.list_recipients(campaign.id).unwrap().remove(0);
    let app = tracking_app!(repo);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri(&format!("/t/o/{}", recipient.token))
            .insert_header((header::USER_AGENT, BROWSER_UA))
            .peer_addr("198.51.100.20:40000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let recipient = repo.get_recipient_by_token(recipient.token).unwrap().unwrap();
    assert_eq!(recipient.open_count, 2);
    assert!(recipient.opened_at.is_some());
    assert!(recipient.clicked_at.is_none());
}

#[actix_web::test]
async fn click_with_unknown_token_is_not_found() {
    let test_db = common::TestDb::new("click_with_unknown_token_is_not_found.db");
    let repo = test_db.repo();
    let app = tracking_app!(repo);

    let req = test::TestRequest::get()
        .uri("/t/c/1b4e28ba-2fa1-11d2-883f-0016d3cca427")
        .insert_header((header::USER_AGENT, BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn human_click_redirects_and_notifies_owner() {
    let test_db = common::TestDb::new("human_click_redirects_and_notifies_owner.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(
        &repo,
        Some("https://intranet.example.com/training"),
        &["a@example.com"],
    );
    repo.launch_campaign(campaign.id, common::now() - Duration::hours(1))
        .unwrap();
    let recipient = repo.list_recipients(campaign.id).unwrap().remove(0);
    let app = tracking_app!(repo);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri(&format!("/t/c/{}", recipient.token))
            .insert_header((header::USER_AGENT, BROWSER_UA))
            .peer_addr("198.51.100.20:40000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "https://intranet.example.com/training"
        );
    }

    let recipient = repo.get_recipient_by_token(recipient.token).unwrap().unwrap();
    assert_eq!(recipient.click_count, 2);
    assert_eq!(recipient.bot_click_count, 0);
    assert!(recipient.clicked_at.is_some());
    assert_eq!(recipient.opened_at, recipient.clicked_at);

    let owner = EmailAddress::new("owner@example.com").unwrap();
    let notifications = repo.list_notifications(&owner, false).unwrap();
    assert_eq!(notifications.len(), 1, "only the first click notifies");
    assert_eq!(notifications[0].title.as_str(), "Phishing link clicked");
}

#[actix_web::test]
async fn scanner_click_is_counted_as_bot() {
    let test_db = common::TestDb::new("scanner_click_is_counted_as_bot.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(
        &repo,
        Some("https://intranet.example.com/training"),
        &["a@example.com"],
    );
    repo.launch_campaign(campaign.id, common::now() - Duration::hours(1))
        .unwrap();
    let recipient = repo.list_recipients(campaign.id).unwrap().remove(0);
    let app = tracking_app!(repo);

    let scanners = [
        ("python-requests/2.31.0", "198.51.100.20:40000"),
        (BROWSER_UA, "40.107.22.10:443"),
        (BROWSER_UA, "203.0.113.9:1234"),
    ];
    for (user_agent, peer) in scanners {
        let req = test::TestRequest::get()
            .uri(&format!("/t/c/{}", recipient.token))
            .insert_header((header::USER_AGENT, user_agent))
            .peer_addr(peer.parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    let recipient = repo.get_recipient_by_token(recipient.token).unwrap().unwrap();
    assert_eq!(recipient.click_count, 0);
    assert_eq!(recipient.bot_click_count, 3);
    assert!(recipient.clicked_at.is_none());

    let owner = EmailAddress::new("owner@example.com").unwrap();
    assert!(repo.list_notifications(&owner, false).unwrap().is_empty());
}

#[actix_web::test]
async fn click_without_landing_url_renders_awareness_page() {
    let test_db = common::TestDb::new("click_without_landing_url_renders_awareness_page.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(&repo, None, &["a@example.com"]);
    repo.launch_campaign(campaign.id, common::now() - Duration::hours(1))
        .unwrap();
    let recipient = repo.list_recipients(campaign.id).unwrap().remove(0);
    let app = tracking_app!(repo);

    let req = test::TestRequest::get()
        .uri(&format!("/t/c/{}", recipient.token))
        .insert_header((header::USER_AGENT, BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("phishing simulation"));
    assert!(body.contains("Quarterly drill"));
}

#[actix_web::test]
async fn events_before_launch_are_ignored() {
    let test_db = common::TestDb::new("events_before_launch_are_ignored.db");
    let repo = test_db.repo();
    let (campaign, recipients) = common::seed_campaign(
        &repo,
        Some("https://intranet.example.com/training"),
        &["a@example.com"],
    );
    let app = tracking_app!(repo);

    let req = test::TestRequest::get()
        .uri(&format!("/t/c/{}", recipients[0].token))
        .insert_header((header::USER_AGENT, BROWSER_UA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let recipient = repo.list_recipients(campaign.id).unwrap().remove(0);
    assert_eq!(recipient.click_count, 0);
    assert_eq!(recipient.bot_click_count, 0);
}

#[actix_web::test]
async fn forwarded_for_is_ignored_unless_proxy_is_trusted() {
    let test_db = common::TestDb::new("forwarded_for_is_ignored_unless_proxy_is_trusted.db");
    let repo = test_db.repo();
    let (campaign, _) = common::seed_campaign(
        &repo,
        Some("https://intranet.example.com/training"),
        &["a@example.com"],
    );
    repo.launch_campaign(campaign.id, common::now() - Duration::hours(1))
        .unwrap();
    let recipient = repo.list_recipients(campaign.id).unwrap().remove(0);

    let token = recipient.token;
    let click = || {
        test::TestRequest::get()
            .uri(&format!("/t/c/{token}"))
            .insert_header((header::USER_AGENT, BROWSER_UA))
            .insert_header(("X-Forwarded-For", "40.107.22.10"))
            .peer_addr("198.51.100.20:40000".parse().unwrap())
            .to_request()
    };

    let app = tracking_app!(repo);
    let resp = test::call_service(&app, click()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let stored = repo.get_recipient_by_token(recipient.token).unwrap().unwrap();
    assert_eq!(stored.click_count, 1, "spoofed header must not hide a human click");
    assert_eq!(stored.bot_click_count, 0);

    let mut config = common::server_config();
    config.trust_forwarded_for = true;
    let app = tracking_app!(repo, config);
    let resp = test::call_service(&app, click()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let stored = repo.get_recipient_by_token(recipient.token).unwrap().unwrap();
    assert_eq!(stored.click_count, 1);
    assert_eq!(stored.bot_click_count, 1, "trusted proxy header names the vendor");
}
