// src/api/handlers/tools.rs
use actix_web::{web, HttpResponse, Responder};
use crate::tools::{breach, favicon, geo};
use crate::api::types::{
    BreachCheckRequest, BreachCheckResponse, GeoResponse,
    FaviconQuery, FaviconResponse,
};
use log::warn;

/// Check a secret against the breach corpus
///
/// Performs a k-anonymity range lookup; only a hash prefix leaves the
/// server. An unreachable corpus yields a null verdict, not an error.
#[utoipa::path(
    post,
    path = "/tools/breach",
    tag = "Tools",
    security(
        ("bearer_auth" = [])
    ),
    request_body = BreachCheckRequest,
    responses(
        (status = 200, description = "Breach check result", body = BreachCheckResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn breach_check(
    req: web::Json<BreachCheckRequest>,
) -> impl Responder {
    match breach::check_secret(&req.secret).await {
        Ok(report) => {
            HttpResponse::Ok().json(BreachCheckResponse {
                success: true,
                breached: Some(report.breached),
                times_seen: Some(report.times_seen),
            })
        },
        Err(e) => {
            warn!("⚠️ Breach lookup unavailable: {}", e);
            HttpResponse::Ok().json(BreachCheckResponse {
                success: true,
                breached: None,
                times_seen: None,
            })
        }
    }
}

/// Look up the server's public location
///
/// Best-effort IP geolocation; an unreachable provider yields a null
/// location, not an error.
#[utoipa::path(
    get,
    path = "/tools/geolocation",
    tag = "Tools",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Geolocation result", body = GeoResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn geolocation() -> impl Responder {
    match geo::lookup().await {
        Ok(location) => {
            HttpResponse::Ok().json(GeoResponse {
                success: true,
                location: Some(location),
            })
        },
        Err(e) => {
            warn!("⚠️ Geolocation lookup unavailable: {}", e);
            HttpResponse::Ok().json(GeoResponse {
                success: true,
                location: None,
            })
        }
    }
}

/// Derive a favicon URL for a site name
#[utoipa::path(
    get,
    path = "/tools/favicon",
    tag = "Tools",
    security(
        ("bearer_auth" = [])
    ),
    params(FaviconQuery),
    responses(
        (status = 200, description = "Favicon URL", body = FaviconResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn favicon(
    query: web::Query<FaviconQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(FaviconResponse {
        success: true,
        url: favicon::favicon_url(&query.name),
    })
}
