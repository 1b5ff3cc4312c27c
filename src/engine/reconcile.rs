//! Pure formulas turning one day of records plus headcounts into metrics.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::engine::EngineSettings;
use crate::engine::lateness::{LatenessSignals, is_late_by_classifier, is_late_by_threshold};
use crate::model::attendance::{AttendanceRecord, PunchSource, PunchState};
use crate::model::metrics::{AttendanceMetrics, TeeEstimate};

/// Distinct-employee counts and hour sums for one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayTally {
    pub biometric_punch_in: i64,
    pub mobile_punch_in: i64,
    pub biometric_punch_out: i64,
    pub mobile_punch_out: i64,
    pub forced_punch_out: i64,
    pub still_present: i64,
    pub needing_auto_punch_out: i64,
    pub completed: i64,
    pub missed_punchouts: i64,
    pub lateness: LatenessSignals,
    pub actual_hours: Decimal,
    pub overtime_hours: Decimal,
}

impl DayTally {
    /// Terminal and mobile filters are disjoint, one record carries one tag.
    pub fn total_punch_in(&self) -> i64 {
        self.biometric_punch_in + self.mobile_punch_in
    }

    /// Observed punch-outs plus the ones the auto punch-out window implies.
    pub fn total_punch_out(&self) -> i64 {
        self.biometric_punch_out + self.mobile_punch_out + self.needing_auto_punch_out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Headcount {
    pub active_accounts: i64,
    pub system_accounts: i64,
    pub non_bio: i64,
}

impl Headcount {
    pub fn total_employees(&self) -> i64 {
        (self.active_accounts - self.system_accounts).max(0)
    }

    pub fn non_bio(&self) -> i64 {
        self.non_bio.max(0)
    }
}

fn distinct_employees(records: &[AttendanceRecord], pred: impl Fn(&AttendanceRecord) -> bool) -> i64 {
    records
        .iter()
        .filter(|r| pred(*r))
        .map(|r| r.employee_code.as_str())
        .collect::<HashSet<_>>()
        .len() as i64
}

pub fn tally(records: &[AttendanceRecord], now: NaiveDateTime, settings: &EngineSettings) -> DayTally {
    let window = settings.auto_punchout_window;
    let state = |r: &AttendanceRecord| r.punch_state(now, window);

    let checked_in = records.iter().filter(|r| r.is_checked_in());
    let actual_hours: Decimal = checked_in.clone().map(AttendanceRecord::hours).sum();
    let overtime_hours: Decimal = checked_in
        .map(|r| (r.hours() - settings.standard_shift_hours).max(Decimal::ZERO))
        .sum();

    DayTally {
        biometric_punch_in: distinct_employees(records, |r| {
            r.is_checked_in() && r.punch_source == PunchSource::Terminal
        }),
        mobile_punch_in: distinct_employees(records, |r| {
            r.is_checked_in() && r.punch_source == PunchSource::Mobile
        }),
        biometric_punch_out: distinct_employees(records, |r| {
            r.is_checked_out() && r.punch_source == PunchSource::Terminal
        }),
        mobile_punch_out: distinct_employees(records, |r| {
            r.is_checked_out() && r.punch_source == PunchSource::Mobile
        }),
        forced_punch_out: distinct_employees(records, AttendanceRecord::is_forced_punch_out),
        still_present: distinct_employees(records, |r| state(r) == PunchState::OpenActive),
        needing_auto_punch_out: distinct_employees(records, |r| state(r) == PunchState::OpenStale),
        completed: distinct_employees(records, AttendanceRecord::is_completed),
        missed_punchouts: distinct_employees(records, AttendanceRecord::is_missing_punch_out),
        lateness: LatenessSignals {
            threshold: distinct_employees(records, |r| {
                is_late_by_threshold(r, settings.late_threshold_minutes)
            }),
            classifier: distinct_employees(records, is_late_by_classifier),
        },
        actual_hours,
        overtime_hours,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn assemble(
    tally: &DayTally,
    headcount: Headcount,
    tee: Option<&TeeEstimate>,
    target_date: NaiveDate,
    calculated_at: NaiveDateTime,
    settings: &EngineSettings,
) -> AttendanceMetrics {
    let total_employees = headcount.total_employees();
    let non_bio = headcount.non_bio();
    let total_punch_in = tally.total_punch_in();
    let total_attendance = total_punch_in + non_bio;

    let total_hours_worked = tally.actual_hours + Decimal::from(non_bio) * settings.non_bio_hours;
    let average_working_hours = if total_attendance == 0 {
        Decimal::ZERO
    } else {
        (total_hours_worked / Decimal::from(total_attendance)).round_dp(2)
    };
    let attendance_rate = if total_employees == 0 {
        0.0
    } else {
        round2(total_attendance as f64 * 100.0 / total_employees as f64)
    };

    let tee_value = tee.map_or(0, |t| t.expected);

    AttendanceMetrics {
        total_employees,
        total_punch_in,
        total_punch_out: tally.total_punch_out(),
        total_forced_punch_out: tally.forced_punch_out,
        total_biometric_punch_in: tally.biometric_punch_in,
        total_biometric_punch_out: tally.biometric_punch_out,
        total_mobile_punch_in: tally.mobile_punch_in,
        total_mobile_punch_out: tally.mobile_punch_out,
        employees_needing_auto_punch_out: tally.needing_auto_punch_out,
        total_attendance,
        completed_today: tally.completed,
        present_today: tally.still_present,
        absent_today: (total_employees - total_attendance).max(0),
        non_bio_employees: non_bio,
        late_arrivals: tally.lateness.reported(),
        authoritative_late_arrivals: tally.lateness.classifier,
        late_discrepancy: tally.lateness.discrepancy(),
        missed_punchouts: tally.missed_punchouts,
        overtime_hours: tally.overtime_hours,
        actual_hours_worked: tally.actual_hours,
        total_hours_worked,
        average_working_hours,
        attendance_rate,
        tee_value,
        tee_absentees: tee.map_or(0, |t| t.absentees),
        tee_below_norm: tee.is_some_and(|t| total_punch_in < t.expected),
        target_date,
        calculated_at,
    }
}
