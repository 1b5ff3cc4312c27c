use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::engine::MetricsEngine;
use crate::error::ApiError;
use crate::model::metrics::{AttendanceMetrics, TeeEstimate};
use crate::utils::metrics_cache::MetricsCache;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Target date (YYYY-MM-DD); today when omitted.
    #[param(value_type = Option<String>, example = "2025-03-10")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// Number of days ending today; clamped to the configured maximum.
    #[param(example = 7)]
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeeQuery {
    #[param(value_type = Option<String>, example = "2025-03-10")]
    pub date: Option<NaiveDate>,
    /// Punch-in count to compare against; the stored count when omitted.
    pub actual: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/metrics",
    params(DateQuery),
    responses(
        (status = 200, description = "Reconciled snapshot", body = AttendanceMetrics),
        (status = 500, description = "Internal server error")
    ),
    tag = "Metrics"
)]
pub async fn get_metrics(
    engine: web::Data<MetricsEngine>,
    cache: web::Data<MetricsCache>,
    query: web::Query<DateQuery>,
) -> Result<impl Responder, ApiError> {
    let date = engine.resolve_date(query.date);
    let metrics = cache
        .get_or_compute(date, engine.now(), || engine.compute_metrics(Some(date)))
        .await?;

    Ok(HttpResponse::Ok().json(metrics))
}

#[utoipa::path(
    get,
    path = "/api/metrics/range",
    params(RangeQuery),
    responses(
        (status = 200, description = "One snapshot per day, oldest first", body = [AttendanceMetrics]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Metrics"
)]
pub async fn range_metrics(
    engine: web::Data<MetricsEngine>,
    query: web::Query<RangeQuery>,
) -> Result<impl Responder, ApiError> {
    let series = engine.range_metrics(query.days.unwrap_or(7)).await?;
    Ok(HttpResponse::Ok().json(series))
}

#[utoipa::path(
    get,
    path = "/api/metrics/tee",
    params(TeeQuery),
    responses(
        (status = 200, description = "Expected headcount for the weekday", body = TeeEstimate),
        (status = 500, description = "History lookup failed")
    ),
    tag = "Metrics"
)]
pub async fn tee_estimate(
    engine: web::Data<MetricsEngine>,
    query: web::Query<TeeQuery>,
) -> Result<impl Responder, ApiError> {
    if query.actual.is_some_and(|actual| actual < 0) {
        return Err(ApiError::BadRequest("actual must not be negative".into()));
    }

    let date = engine.resolve_date(query.date);
    let estimate = engine.tee_estimate(date, query.actual).await?;
    Ok(HttpResponse::Ok().json(estimate))
}
