//! Total Expected Employees: a per-weekday moving average of punch-ins.
//!
//! Mondays are compared with past Mondays, Saturdays with past Saturdays.
//! Days without any check-ins (holidays, ingestion gaps) are not samples.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::model::metrics::{DailyPunchIns, TeeEstimate};
use crate::store::PunchStore;

#[derive(Debug, Clone)]
pub struct TeeSettings {
    /// Trailing weeks the average is taken over.
    pub window_weeks: u32,
    /// Fewer samples than this and the estimate falls back to the actual count.
    pub min_samples: usize,
}

impl Default for TeeSettings {
    fn default() -> Self {
        Self {
            window_weeks: 8,
            min_samples: 2,
        }
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// First day of the trailing window for `date`.
pub fn window_start(date: NaiveDate, settings: &TeeSettings) -> NaiveDate {
    date - Duration::weeks(i64::from(settings.window_weeks))
}

pub fn estimate_from_history(
    date: NaiveDate,
    actual_punch_ins: i64,
    history: &[DailyPunchIns],
    settings: &TeeSettings,
) -> TeeEstimate {
    let start = window_start(date, settings);
    let samples: Vec<i64> = history
        .iter()
        .filter(|h| h.date >= start && h.date < date)
        .filter(|h| h.date.weekday() == date.weekday() && h.punch_ins > 0)
        .map(|h| h.punch_ins)
        .collect();

    let expected = if samples.is_empty() || samples.len() < settings.min_samples {
        debug!(%date, samples = samples.len(), "Insufficient weekday history, expecting actual");
        actual_punch_ins
    } else {
        let sum: i64 = samples.iter().sum();
        (sum as f64 / samples.len() as f64).round() as i64
    };

    TeeEstimate {
        date,
        day_of_week: weekday_name(date.weekday()).to_string(),
        expected,
        actual: actual_punch_ins,
        absentees: (expected - actual_punch_ins).max(0),
        samples: samples.len(),
    }
}

#[derive(Clone)]
pub struct TeeModel {
    punches: Arc<dyn PunchStore>,
    settings: TeeSettings,
}

impl TeeModel {
    pub fn new(punches: Arc<dyn PunchStore>, settings: TeeSettings) -> Self {
        Self { punches, settings }
    }

    pub async fn estimate(&self, date: NaiveDate, actual_punch_ins: i64) -> Result<TeeEstimate> {
        let from = window_start(date, &self.settings);
        let to = date - Duration::days(1);
        let history = self.punches.daily_punch_in_counts(from, to).await?;
        Ok(estimate_from_history(date, actual_punch_ins, &history, &self.settings))
    }
}
