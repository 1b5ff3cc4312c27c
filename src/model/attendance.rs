use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Channel a punch arrived through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
    AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PunchSource {
    #[default]
    Terminal,
    Mobile,
}

impl PunchSource {
    /// A missing or unrecognised tag is a terminal punch.
    pub fn from_column(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RecordStatus {
    Active,
    AutoPunchout,
    AdminTerminated,
}

impl RecordStatus {
    /// Closed by the system or an administrator rather than by the employee.
    pub fn is_forced(self) -> bool {
        matches!(self, RecordStatus::AutoPunchout | RecordStatus::AdminTerminated)
    }
}

/// Arrival/departure classification written by the timing classifier job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TimingStatus {
    Early,
    OnTime,
    Grace,
    Late,
}

/// Presence state of a record, derived at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    /// No check-in on the record.
    NoPunch,
    /// Checked in, no check-out, still inside the auto punch-out window.
    OpenActive,
    /// Checked in, no check-out, window elapsed: pending auto closure.
    OpenStale,
    Closed,
}

impl PunchState {
    pub fn derive(
        check_in: Option<NaiveDateTime>,
        check_out: Option<NaiveDateTime>,
        now: NaiveDateTime,
        window: Duration,
    ) -> Self {
        match (check_in, check_out) {
            (None, _) => PunchState::NoPunch,
            (Some(_), Some(_)) => PunchState::Closed,
            (Some(check_in), None) if check_in + window > now => PunchState::OpenActive,
            (Some(_), None) => PunchState::OpenStale,
        }
    }
}

/// One employee's attendance row for a punch-in day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub employee_code: String,
    /// The punch-in day; a punch-out after midnight still belongs here.
    pub date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub punch_source: PunchSource,
    pub status: Option<RecordStatus>,
    pub arrival_status: Option<TimingStatus>,
    pub departure_status: Option<TimingStatus>,
    pub late_minutes: Option<i32>,
    pub grace_minutes: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub total_hours: Option<Decimal>,
}

impl AttendanceRecord {
    pub fn new(employee_code: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            employee_code: employee_code.into(),
            date,
            check_in: None,
            check_out: None,
            punch_source: PunchSource::Terminal,
            status: None,
            arrival_status: None,
            departure_status: None,
            late_minutes: None,
            grace_minutes: None,
            total_hours: None,
        }
    }

    pub fn punch_state(&self, now: NaiveDateTime, window: Duration) -> PunchState {
        PunchState::derive(self.check_in, self.check_out, now, window)
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in.is_some()
    }

    pub fn is_checked_out(&self) -> bool {
        self.check_out.is_some()
    }

    /// Both punches present and correctly ordered.
    pub fn is_completed(&self) -> bool {
        matches!((self.check_in, self.check_out), (Some(i), Some(o)) if o > i)
    }

    pub fn is_missing_punch_out(&self) -> bool {
        self.check_in.is_some() && self.check_out.is_none()
    }

    pub fn is_forced_punch_out(&self) -> bool {
        self.check_out.is_some() && self.status.is_some_and(RecordStatus::is_forced)
    }

    /// Worked hours, a missing figure counts as zero.
    pub fn hours(&self) -> Decimal {
        self.total_hours.unwrap_or(Decimal::ZERO)
    }

    /// Minutes since midnight of the check-in wall time.
    pub fn check_in_minute_of_day(&self) -> Option<u32> {
        self.check_in.map(|t| t.hour() * 60 + t.minute())
    }
}
