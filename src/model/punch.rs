use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PunchType {
    Checkin,
    Checkout,
}

/// Punch submitted by the mobile app.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[schema(example = json!({
    "employeeCode": "EMP-001",
    "punchType": "checkin",
    "latitude": 24.8607,
    "longitude": 67.0011,
    "accuracy": 12.5,
    "timestamp": "2025-03-10T09:02:11"
}))]
#[serde(rename_all = "camelCase")]
pub struct MobilePunch {
    pub employee_code: String,
    pub punch_type: PunchType,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    /// Local wall time of the punch; the server clock when omitted.
    pub timestamp: Option<NaiveDateTime>,
}

impl MobilePunch {
    pub fn has_valid_location(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.accuracy.is_none_or(|a| a.is_finite() && a >= 0.0)
    }
}

/// A validated punch resolved to the attendance day it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PunchWrite {
    pub employee_code: String,
    pub day: NaiveDate,
    pub at: NaiveDateTime,
    pub punch_type: PunchType,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn punch(latitude: f64, longitude: f64, accuracy: Option<f64>) -> MobilePunch {
        MobilePunch {
            employee_code: "E1".into(),
            punch_type: PunchType::Checkin,
            latitude,
            longitude,
            accuracy,
            timestamp: None,
        }
    }

    #[test]
    fn location_bounds() {
        assert!(punch(24.86, 67.0, Some(10.0)).has_valid_location());
        assert!(punch(-90.0, 180.0, None).has_valid_location());
        assert!(!punch(91.0, 0.0, None).has_valid_location());
        assert!(!punch(0.0, -181.0, None).has_valid_location());
        assert!(!punch(0.0, 0.0, Some(-1.0)).has_valid_location());
        assert!(!punch(f64::NAN, 0.0, None).has_valid_location());
    }

    #[test]
    fn punch_type_wire_names() {
        let p: MobilePunch = serde_json::from_value(serde_json::json!({
            "employeeCode": "E1",
            "punchType": "checkout",
            "latitude": 1.0,
            "longitude": 2.0
        }))
        .unwrap();
        assert_eq!(p.punch_type, PunchType::Checkout);
        assert_eq!(p.accuracy, None);
        assert_eq!(PunchType::Checkin.as_ref(), "checkin");
    }
}
