use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use serde_json::json;

use crate::repository::DieselRepository;
use crate::routes::service_error_response;
use crate::services::notifications as notifications_service;

#[derive(Deserialize)]
struct NotificationsQuery {
    email: String,
    #[serde(default)]
    unread: bool,
}

#[derive(Deserialize)]
struct OwnerQuery {
    email: String,
}

#[get("/v1/notifications")]
pub async fn list_notifications(
    params: web::Query<NotificationsQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match notifications_service::list_notifications(repo.get_ref(), &params.email, params.unread)
    {
        Ok(notifications) => HttpResponse::Ok().json(notifications),
        Err(err) => service_error_response(err, "list notifications"),
    }
}

#[post("/v1/notifications/read-all")]
pub async fn mark_all_read(
    params: web::Query<OwnerQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match notifications_service::mark_all_read(repo.get_ref(), &params.email) {
        Ok(updated) => HttpResponse::Ok().json(json!({ "success": true, "updated": updated })),
        Err(err) => service_error_response(err, "mark notifications read"),
    }
}

#[post("/v1/notifications/{notification_id}/read")]
pub async fn mark_read(
    notification_id: web::Path<i32>,
    params: web::Query<OwnerQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match notifications_service::mark_read(
        repo.get_ref(),
        notification_id.into_inner(),
        &params.email,
    ) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(err) => service_error_response(err, "mark notification read"),
    }
}
