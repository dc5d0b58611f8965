//! HTTP handler functions for the civic map API.

use actix_web::{HttpRequest, HttpResponse, web};
use civic_map_server_models::{ApiError, ApiHealth, ViewportQueryParams};
use civic_map_viewport::ViewportError;
use civic_map_viewport_models::ViewportRequest;

use crate::AppState;
use crate::caller::caller_from_request;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/gis/map-items`
///
/// Markers when zoomed in, clusters when zoomed out.
pub async fn map_items(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ViewportQueryParams>,
) -> HttpResponse {
    let caller = caller_from_request(&req);
    let request = ViewportRequest::from(params.into_inner());

    match state.engine.map_items(&caller, &request).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => error_response("map items", &e),
    }
}

/// `GET /api/gis/hotspots`
pub async fn hotspots(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ViewportQueryParams>,
) -> HttpResponse {
    let caller = caller_from_request(&req);
    let request = ViewportRequest::from(params.into_inner());

    match state.engine.hotspots(&caller, &request).await {
        Ok(bins) => HttpResponse::Ok().json(bins),
        Err(e) => error_response("hotspots", &e),
    }
}

/// `GET /api/gis/districts`
pub async fn districts(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ViewportQueryParams>,
) -> HttpResponse {
    let caller = caller_from_request(&req);
    let request = ViewportRequest::from(params.into_inner());

    match state.engine.districts(&caller, &request).await {
        Ok(districts) => HttpResponse::Ok().json(districts),
        Err(e) => error_response("districts", &e),
    }
}

/// `GET /api/gis/complaints`
///
/// Paginated detail list for the viewport.
pub async fn complaints(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ViewportQueryParams>,
) -> HttpResponse {
    let caller = caller_from_request(&req);
    let params = params.into_inner();
    let (page, size) = (params.page, params.size);
    let request = ViewportRequest::from(params);

    match state.engine.list(&caller, &request, page, size).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => error_response("complaints", &e),
    }
}

/// Maps an engine error onto a status code and body. Store failures are
/// already logged by the engine and are reported without detail.
fn error_response(what: &str, error: &ViewportError) -> HttpResponse {
    match error {
        ViewportError::InvalidBounds { .. } | ViewportError::InvalidRange { .. } => {
            HttpResponse::BadRequest().json(ApiError {
                error: error.to_string(),
            })
        }
        ViewportError::QueryTimeout { .. } => HttpResponse::ServiceUnavailable().json(ApiError {
            error: format!("Timed out querying {what}"),
        }),
        ViewportError::QueryFailed { .. } => HttpResponse::InternalServerError().json(ApiError {
            error: format!("Failed to query {what}"),
        }),
    }
}
