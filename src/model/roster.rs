use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::TimingStatus;

/// Observed presence vs. imputed presence of a biometric-exempt employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PresenceKind {
    Present,
    NonBio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentEmployee {
    pub employee_code: String,
    pub name: String,
    pub department: String,
    pub designation: String,
    /// Always `None` for non-bio rows.
    pub check_in: Option<NaiveDateTime>,
    /// Hours on the clock so far, or the imputed figure for non-bio rows.
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub hours: Decimal,
    pub status: PresenceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresentRoster {
    pub target_date: NaiveDate,
    pub observed: Vec<PresentEmployee>,
    pub non_bio: Vec<PresentEmployee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LateArrival {
    pub employee_code: String,
    pub name: String,
    pub department: String,
    pub shift_name: Option<String>,
    #[schema(value_type = String, example = "09:00:00")]
    pub expected_arrival: NaiveTime,
    pub check_in: Option<NaiveDateTime>,
    pub arrival_status: TimingStatus,
    pub minutes_late: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LateRoster {
    pub target_date: NaiveDate,
    pub entries: Vec<LateArrival>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarlyDeparture {
    pub employee_code: String,
    pub name: String,
    pub department: String,
    pub shift_name: Option<String>,
    #[schema(value_type = String, example = "17:00:00")]
    pub expected_departure: NaiveTime,
    pub check_out: Option<NaiveDateTime>,
    pub minutes_early: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EarlyDepartureRoster {
    pub target_date: NaiveDate,
    pub entries: Vec<EarlyDeparture>,
}
