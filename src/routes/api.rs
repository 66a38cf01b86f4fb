use actix_multipart::form::MultipartForm;
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{FromRequest, HttpRequest, HttpResponse, Responder, get, post, web};
use serde::Deserialize;

use crate::analysis::AnalyzerRegistry;
use crate::dto::api::ScansQuery;
use crate::forms::api::{ToolUploadForm, fields_from_form, fields_from_json};
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, service_error_response};
use crate::services::tools::{self as tools_service, RawToolRequest};
use crate::services::uploads::UploadLimits;

fn content_type(req: &HttpRequest) -> String {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

async fn run(
    repo: &DieselRepository,
    registry: &AnalyzerRegistry,
    limits: &UploadLimits,
    raw: RawToolRequest,
) -> HttpResponse {
    match tools_service::handle_request(repo, registry, limits, raw).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => service_error_response(err, "run tool"),
    }
}

/// Tool router accepting JSON, url-encoded and multipart bodies.
#[post("/api")]
pub async fn tool_router(
    req: HttpRequest,
    payload: web::Payload,
    repo: web::Data<DieselRepository>,
    registry: web::Data<AnalyzerRegistry>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    let limits = UploadLimits::from(server_config.get_ref());
    let content_type = content_type(&req);

    if content_type.starts_with("multipart/form-data") {
        let mut payload = payload.into_inner();
        let form = match MultipartForm::<ToolUploadForm>::from_request(&req, &mut payload).await {
            Ok(form) => form,
            Err(err) => {
                log::warn!("Failed to read multipart tool request: {err}");
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {err}"));
            }
        };

        // The temp files are removed when `form` drops, after the analyzer ran.
        return run(&repo, &registry, &limits, form.to_raw()).await;
    }

    let body = match payload
        .to_bytes_limited(server_config.max_source_file_size)
        .await
    {
        Ok(Ok(body)) => body,
        Ok(Err(err)) => {
            log::warn!("Failed to read tool request body: {err}");
            return error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
        Err(_) => return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"),
    };

    let fields = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(Default::default())
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        fields_from_form(&body)
    } else if content_type.starts_with("application/json") {
        fields_from_json(&body)
    } else {
        fields_from_json(&body).or_else(|_| fields_from_form(&body))
    };

    match fields {
        Ok(fields) => run(&repo, &registry, &limits, RawToolRequest::new(fields)).await,
        Err(err) => error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {err}")),
    }
}

#[derive(Deserialize)]
struct ScansQueryParams {
    tool: Option<String>,
    page: Option<usize>,
}

#[get("/v1/scans")]
pub async fn list_scans(
    params: web::Query<ScansQueryParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let params = params.into_inner();
    let query = ScansQuery {
        tool: params.tool,
        page: params.page,
    };

    match tools_service::list_scans(repo.get_ref(), query) {
        Ok(scans) => HttpResponse::Ok().json(scans),
        Err(err) => service_error_response(err, "list scans"),
    }
}
