use crate::model::attendance::{AttendanceRecord, PunchSource, RecordStatus, TimingStatus};
use crate::model::metrics::{AttendanceMetrics, TeeEstimate};
use crate::model::punch::{MobilePunch, PunchType};
use crate::model::roster::{
    EarlyDeparture, EarlyDepartureRoster, LateArrival, LateRoster, PresenceKind, PresentEmployee,
    PresentRoster,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Metrics API",
        version = "1.0.0",
        description = r#"
## Attendance Metrics Reconciliation

Turns raw punch records (biometric terminals and the mobile app) and the
employee registry into one consistent daily attendance snapshot.

### 🔹 Key Features
- **Daily metrics**
  - Punch-in / punch-out totals by source, presence, absence and attendance rate
  - Non-bio imputation, overtime and average hours
  - Expected attendance (TEE) from the same weekday's history
- **Rosters**
  - Present, late and early-departure drill-downs
- **Mobile punches**
  - Check-in / check-out with location

### 📦 Response Format
- JSON, camelCase fields
- Errors as `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::metrics::get_metrics,
        crate::api::metrics::range_metrics,
        crate::api::metrics::tee_estimate,

        crate::api::roster::present,
        crate::api::roster::late,
        crate::api::roster::early_departures,

        crate::api::attendance::mobile_punch
    ),
    components(
        schemas(
            AttendanceMetrics,
            TeeEstimate,
            AttendanceRecord,
            PunchSource,
            RecordStatus,
            TimingStatus,
            MobilePunch,
            PunchType,
            PresenceKind,
            PresentEmployee,
            PresentRoster,
            LateArrival,
            LateRoster,
            EarlyDeparture,
            EarlyDepartureRoster
        )
    ),
    tags(
        (name = "Metrics", description = "Daily attendance metrics"),
        (name = "Attendance", description = "Rosters and mobile punches"),
    )
)]
pub struct ApiDoc;
