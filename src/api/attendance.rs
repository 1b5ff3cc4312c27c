use actix_web::{HttpResponse, Responder, web};

use crate::engine::MetricsEngine;
use crate::error::ApiError;
use crate::model::attendance::AttendanceRecord;
use crate::model::punch::MobilePunch;
use crate::utils::metrics_cache::MetricsCache;

/// Mobile check-in / check-out
#[utoipa::path(
    post,
    path = "/api/attendance/mobile-punch",
    request_body = MobilePunch,
    responses(
        (status = 200, description = "Punch recorded", body = AttendanceRecord),
        (status = 400, description = "Missing employee code, bad coordinates, or a check-out with no check-in", body = Object, example = json!({
            "message": "No active check-in found for EMP-001 on 2025-03-10"
        })),
        (status = 404, description = "Unknown employee code", body = Object, example = json!({
            "message": "Unknown employee code EMP-999"
        })),
        (status = 409, description = "Punch-out precedes the punch-in", body = Object, example = json!({
            "message": "Punch-out at 2025-03-10 08:00:00 precedes punch-in at 2025-03-10 09:00:00"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mobile_punch(
    engine: web::Data<MetricsEngine>,
    cache: web::Data<MetricsCache>,
    payload: web::Json<MobilePunch>,
) -> Result<impl Responder, ApiError> {
    let record = engine.record_punch(payload.into_inner()).await?;
    cache.invalidate_all();

    Ok(HttpResponse::Ok().json(record))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::api::testing::app_data;
    use crate::engine::testing::{at, day};
    use crate::model::employee::employee;
    use crate::routes;
    use crate::store::memory::MemoryStore;

    #[actix_web::test]
    async fn punch_round_trip_updates_metrics() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(10, 0).with_employees(vec![employee("MP-1", "Asad", "Finance")]);
        let (engine, cache) = app_data(store, at(d, 9, 5));
        let app = test::init_service(
            App::new()
                .app_data(engine)
                .app_data(cache)
                .configure(routes::configure_api),
        )
        .await;

        // primes the cache with an empty day
        let req = test::TestRequest::get().uri("/metrics?date=2025-03-10").to_request();
        let before: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(before["totalPunchIn"], 0);

        let req = test::TestRequest::post()
            .uri("/attendance/mobile-punch")
            .set_json(json!({
                "employeeCode": "MP-1",
                "punchType": "checkin",
                "latitude": 24.86,
                "longitude": 67.0
            }))
            .to_request();
        let record: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(record["punchSource"], "mobile");
        assert_eq!(record["checkIn"], "2025-03-10T09:05:00");

        let req = test::TestRequest::get().uri("/metrics?date=2025-03-10").to_request();
        let after: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(after["totalPunchIn"], 1);
        assert_eq!(after["totalMobilePunchIn"], 1);
    }

    #[actix_web::test]
    async fn error_statuses() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(10, 0).with_employees(vec![employee("MP-2", "Bilal", "Support")]);
        let (engine, cache) = app_data(store, at(d, 9, 5));
        let app = test::init_service(
            App::new()
                .app_data(engine)
                .app_data(cache)
                .configure(routes::configure_api),
        )
        .await;

        let cases = [
            (json!({"employeeCode": "", "punchType": "checkin", "latitude": 0.0, "longitude": 0.0}), StatusCode::BAD_REQUEST),
            (json!({"employeeCode": "MP-2", "punchType": "checkin", "latitude": 95.0, "longitude": 0.0}), StatusCode::BAD_REQUEST),
            (json!({"employeeCode": "GHOST-77", "punchType": "checkin", "latitude": 0.0, "longitude": 0.0}), StatusCode::NOT_FOUND),
        ];
        for (body, status) in cases {
            let req = test::TestRequest::post()
                .uri("/attendance/mobile-punch")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), status);
        }

        let punch = |punch_type: &str, ts: &str| {
            test::TestRequest::post()
                .uri("/attendance/mobile-punch")
                .set_json(json!({
                    "employeeCode": "MP-2",
                    "punchType": punch_type,
                    "latitude": 0.0,
                    "longitude": 0.0,
                    "timestamp": ts
                }))
                .to_request()
        };
        let resp = test::call_service(&app, punch("checkin", "2025-03-10T09:00:00")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = test::call_service(&app, punch("checkout", "2025-03-10T08:00:00")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn check_out_without_check_in_is_a_bad_request() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(10, 0).with_employees(vec![employee("MP-3", "Kamran", "Ops")]);
        let (engine, cache) = app_data(store, at(d, 17, 0));
        let app = test::init_service(
            App::new()
                .app_data(engine)
                .app_data(cache)
                .configure(routes::configure_api),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/attendance/mobile-punch")
            .set_json(json!({
                "employeeCode": "MP-3",
                "punchType": "checkout",
                "latitude": 24.86,
                "longitude": 67.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "No active check-in found for MP-3 on 2025-03-10");

        let req = test::TestRequest::get().uri("/metrics?date=2025-03-10").to_request();
        let metrics: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(metrics["totalPunchOut"], 0);
        assert_eq!(metrics["totalMobilePunchOut"], 0);
    }
}
