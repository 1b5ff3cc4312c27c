//! Two independent lateness signals over the same record.
//!
//! The threshold rule always works; the classifier rule depends on an
//! upstream job having written `arrival_status` and may be blank for days.

use crate::model::attendance::{AttendanceRecord, TimingStatus};

/// Check-in strictly after `threshold_minutes` past midnight.
pub fn is_late_by_threshold(record: &AttendanceRecord, threshold_minutes: u32) -> bool {
    record
        .check_in_minute_of_day()
        .is_some_and(|minute| minute > threshold_minutes)
}

pub fn is_late_by_classifier(record: &AttendanceRecord) -> bool {
    record.arrival_status == Some(TimingStatus::Late)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatenessSignals {
    pub threshold: i64,
    pub classifier: i64,
}

impl LatenessSignals {
    /// The figure reported as `lateArrivals`.
    pub fn reported(&self) -> i64 {
        self.threshold
    }

    pub fn discrepancy(&self) -> i64 {
        self.threshold - self.classifier
    }
}
