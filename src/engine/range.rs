use anyhow::Result;
use chrono::{Duration, NaiveDate};
use futures::{StreamExt, TryStreamExt, stream};

use crate::engine::MetricsEngine;
use crate::model::metrics::AttendanceMetrics;

/// Days computed at once; each one is a handful of indexed reads.
const RANGE_CONCURRENCY: usize = 4;

impl MetricsEngine {
    /// One snapshot per day for the last `days_back` days ending today,
    /// oldest first. Every day goes through [`MetricsEngine::compute_metrics`]
    /// on its own, date fallback included.
    pub async fn range_metrics(&self, days_back: u32) -> Result<Vec<AttendanceMetrics>> {
        let days = days_back.clamp(1, self.settings.max_range_days.max(1));
        let today = self.clock.today();

        let dates: Vec<NaiveDate> = (0..days)
            .rev()
            .map(|offset| today - Duration::days(i64::from(offset)))
            .collect();

        stream::iter(dates)
            .map(|date| self.compute_metrics(Some(date)))
            .buffered(RANGE_CONCURRENCY)
            .try_collect()
            .await
    }
}
