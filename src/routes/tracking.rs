//! Public endpoints embedded in campaign emails.

use actix_web::http::header::{self, CacheControl, CacheDirective};
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use chrono::Utc;
use tera::{Context, Tera};

use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::render_template;
use crate::services::ServiceError;
use crate::services::bot_detection::BotDetector;
use crate::services::tracking::{self as tracking_service, Visitor};

/// 1x1 transparent GIF.
pub const TRACKING_PIXEL: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

fn user_agent(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
}

/// Socket peer address, or the forwarded client address when running behind a trusted proxy.
fn client_ip(req: &HttpRequest, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for {
        req.connection_info()
            .realip_remote_addr()
            .map(str::to_string)
    } else {
        req.peer_addr().map(|addr| addr.ip().to_string())
    }
}

fn pixel_response() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("image/gif")
        .insert_header(CacheControl(vec![
            CacheDirective::NoCache,
            CacheDirective::NoStore,
            CacheDirective::MustRevalidate,
        ]))
        .insert_header((header::PRAGMA, "no-cache"))
        .insert_header((header::EXPIRES, "0"))
        .body(TRACKING_PIXEL.to_vec())
}

#[get("/t/o/{token}")]
pub async fn track_open(
    req: HttpRequest,
    token: web::Path<String>,
    repo: web::Data<DieselRepository>,
    detector: web::Data<BotDetector>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let ip = client_ip(&req, server_config.trust_forwarded_for);
    let visitor = Visitor {
        user_agent: user_agent(&req),
        ip: ip.as_deref(),
    };

    match tracking_service::record_open(
        repo.get_ref(),
        detector.get_ref(),
        &token,
        visitor,
        Utc::now().naive_utc(),
    ) {
        Ok(_) => {}
        Err(ServiceError::NotFound) => log::debug!("Open pixel requested for unknown token"),
        Err(err) => log::error!("Failed to record open: {err}"),
    }

    pixel_response()
}

#[get("/t/c/{token}")]
pub async fn track_click(
    req: HttpRequest,
    token: web::Path<String>,
    repo: web::Data<DieselRepository>,
    detector: web::Data<BotDetector>,
    server_config: web::Data<ServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let ip = client_ip(&req, server_config.trust_forwarded_for);
    let visitor = Visitor {
        user_agent: user_agent(&req),
        ip: ip.as_deref(),
    };

    let outcome = match tracking_service::record_click(
        repo.get_ref(),
        detector.get_ref(),
        &token,
        visitor,
        Utc::now().naive_utc(),
    ) {
        Ok(outcome) => outcome,
        Err(ServiceError::NotFound) => return HttpResponse::NotFound().body("Not found"),
        Err(err) => {
            log::error!("Failed to record click: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match &outcome.campaign.landing_url {
        Some(url) => HttpResponse::SeeOther()
            .insert_header((header::LOCATION, url.as_str()))
            .finish(),
        None => {
            let mut context = Context::new();
            context.insert("campaign", &outcome.campaign.name);
            context.insert(
                "recipient",
                &outcome
                    .recipient
                    .name
                    .as_ref()
                    .map(|name| name.as_str())
                    .unwrap_or(outcome.recipient.email.as_str()),
            );
            render_template(&tera, "tracking/awareness.html", &context)
        }
    }
}
