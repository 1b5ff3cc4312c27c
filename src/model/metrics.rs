use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Attendance snapshot for one target date. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMetrics {
    pub total_employees: i64,
    pub total_punch_in: i64,
    pub total_punch_out: i64,
    pub total_forced_punch_out: i64,
    pub total_biometric_punch_in: i64,
    pub total_biometric_punch_out: i64,
    pub total_mobile_punch_in: i64,
    pub total_mobile_punch_out: i64,
    pub employees_needing_auto_punch_out: i64,
    pub total_attendance: i64,
    pub completed_today: i64,
    pub present_today: i64,
    pub absent_today: i64,
    pub non_bio_employees: i64,
    /// Threshold-based count.
    pub late_arrivals: i64,
    /// Classifier-based count, zero while the classifier has not run.
    pub authoritative_late_arrivals: i64,
    pub late_discrepancy: i64,
    pub missed_punchouts: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub overtime_hours: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub actual_hours_worked: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_hours_worked: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub average_working_hours: Decimal,
    pub attendance_rate: f64,
    pub tee_value: i64,
    pub tee_absentees: i64,
    pub tee_below_norm: bool,
    pub target_date: NaiveDate,
    pub calculated_at: NaiveDateTime,
}

impl AttendanceMetrics {
    /// Snapshot for a history with no attendance rows at all.
    pub fn headcount_only(
        total_employees: i64,
        target_date: NaiveDate,
        calculated_at: NaiveDateTime,
    ) -> Self {
        Self {
            total_employees,
            total_punch_in: 0,
            total_punch_out: 0,
            total_forced_punch_out: 0,
            total_biometric_punch_in: 0,
            total_biometric_punch_out: 0,
            total_mobile_punch_in: 0,
            total_mobile_punch_out: 0,
            employees_needing_auto_punch_out: 0,
            total_attendance: 0,
            completed_today: 0,
            present_today: 0,
            absent_today: total_employees,
            non_bio_employees: 0,
            late_arrivals: 0,
            authoritative_late_arrivals: 0,
            late_discrepancy: 0,
            missed_punchouts: 0,
            overtime_hours: Decimal::ZERO,
            actual_hours_worked: Decimal::ZERO,
            total_hours_worked: Decimal::ZERO,
            average_working_hours: Decimal::ZERO,
            attendance_rate: 0.0,
            tee_value: 0,
            tee_absentees: 0,
            tee_below_norm: false,
            target_date,
            calculated_at,
        }
    }
}

/// Expected headcount for a weekday from its trailing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeeEstimate {
    pub date: NaiveDate,
    #[schema(example = "Monday")]
    pub day_of_week: String,
    pub expected: i64,
    pub actual: i64,
    pub absentees: i64,
    /// Historical days the average was taken over.
    pub samples: usize,
}

/// Punch-in total of one day, input to the expected-attendance model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPunchIns {
    pub date: NaiveDate,
    pub punch_ins: i64,
}
