use actix_web::{HttpResponse, Responder, web};

use crate::api::metrics::DateQuery;
use crate::engine::MetricsEngine;
use crate::error::ApiError;
use crate::model::roster::{EarlyDepartureRoster, LateRoster, PresentRoster};

/// Employees present on the date, observed punches and non-bio listed apart
#[utoipa::path(
    get,
    path = "/api/attendance/present",
    params(DateQuery),
    responses(
        (status = 200, description = "Present roster", body = PresentRoster),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn present(
    engine: web::Data<MetricsEngine>,
    query: web::Query<DateQuery>,
) -> Result<impl Responder, ApiError> {
    let roster = engine.present_roster(query.date).await?;
    Ok(HttpResponse::Ok().json(roster))
}

#[utoipa::path(
    get,
    path = "/api/attendance/late",
    params(DateQuery),
    responses(
        (status = 200, description = "Late and grace arrivals", body = LateRoster),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn late(
    engine: web::Data<MetricsEngine>,
    query: web::Query<DateQuery>,
) -> Result<impl Responder, ApiError> {
    let roster = engine.late_roster(query.date).await?;
    Ok(HttpResponse::Ok().json(roster))
}

#[utoipa::path(
    get,
    path = "/api/attendance/early-departures",
    params(DateQuery),
    responses(
        (status = 200, description = "Departures before the shift end", body = EarlyDepartureRoster),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn early_departures(
    engine: web::Data<MetricsEngine>,
    query: web::Query<DateQuery>,
) -> Result<impl Responder, ApiError> {
    let roster = engine.early_departure_roster(query.date).await?;
    Ok(HttpResponse::Ok().json(roster))
}
