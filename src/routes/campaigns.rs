use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;

use crate::dto::campaigns::CampaignsQuery;
use crate::forms::campaigns::{AddRecipientsForm, CreateCampaignForm, UploadRecipientsForm};
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::service_error_response;
use crate::services::bot_detection::BotDetector;
use crate::services::campaigns as campaigns_service;
use crate::services::tracking as tracking_service;

#[derive(Deserialize)]
struct CampaignsQueryParams {
    owner: Option<String>,
    status: Option<String>,
    page: Option<usize>,
}

#[post("/v1/campaigns")]
pub async fn create_campaign(
    repo: web::Data<DieselRepository>,
    form: web::Json<CreateCampaignForm>,
) -> impl Responder {
    match campaigns_service::create_campaign(repo.get_ref(), form.into_inner()) {
        Ok(campaign) => HttpResponse::Created().json(campaign),
        Err(err) => service_error_response(err, "create campaign"),
    }
}

#[get("/v1/campaigns")]
pub async fn list_campaigns(
    params: web::Query<CampaignsQueryParams>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let params = params.into_inner();
    let query = CampaignsQuery {
        owner: params.owner,
        status: params.status,
        page: params.page,
    };

    match campaigns_service::list_campaigns(repo.get_ref(), query) {
        Ok(campaigns) => HttpResponse::Ok().json(campaigns),
        Err(err) => service_error_response(err, "list campaigns"),
    }
}

#[get("/v1/campaigns/{campaign_id}")]
pub async fn show_campaign(
    campaign_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    match campaigns_service::campaign_detail(
        repo.get_ref(),
        &server_config.public_url,
        campaign_id.into_inner(),
    ) {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => service_error_response(err, "load campaign"),
    }
}

#[post("/v1/campaigns/{campaign_id}/recipients")]
pub async fn add_recipients(
    campaign_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    form: web::Json<AddRecipientsForm>,
) -> impl Responder {
    let form = form.into_inner();
    match campaigns_service::add_recipients(
        repo.get_ref(),
        campaign_id.into_inner(),
        form.recipients,
    ) {
        Ok(added) => HttpResponse::Ok().json(added),
        Err(err) => service_error_response(err, "add recipients"),
    }
}

#[post("/v1/campaigns/{campaign_id}/recipients/upload")]
pub async fn upload_recipients(
    campaign_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    MultipartForm(form): MultipartForm<UploadRecipientsForm>,
) -> impl Responder {
    match campaigns_service::upload_recipients(repo.get_ref(), campaign_id.into_inner(), &form) {
        Ok(added) => HttpResponse::Ok().json(added),
        Err(err) => service_error_response(err, "upload recipients"),
    }
}

#[post("/v1/campaigns/{campaign_id}/launch")]
pub async fn launch_campaign(
    campaign_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match campaigns_service::launch_campaign(repo.get_ref(), campaign_id.into_inner()) {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => service_error_response(err, "launch campaign"),
    }
}

#[post("/v1/campaigns/{campaign_id}/complete")]
pub async fn complete_campaign(
    campaign_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match campaigns_service::complete_campaign(repo.get_ref(), campaign_id.into_inner()) {
        Ok(campaign) => HttpResponse::Ok().json(campaign),
        Err(err) => service_error_response(err, "complete campaign"),
    }
}

/// Re-runs the automated-scan heuristic over the stored events of a campaign.
#[post("/v1/campaigns/{campaign_id}/recount")]
pub async fn recount_campaign(
    campaign_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    detector: web::Data<BotDetector>,
) -> impl Responder {
    match tracking_service::recount_clicks(
        repo.get_ref(),
        detector.get_ref(),
        campaign_id.into_inner(),
    ) {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => service_error_response(err, "recount campaign"),
    }
}
