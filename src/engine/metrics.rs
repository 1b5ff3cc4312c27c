use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::engine::MetricsEngine;
use crate::engine::reconcile::{Headcount, assemble, tally};
use crate::model::metrics::{AttendanceMetrics, TeeEstimate};

impl MetricsEngine {
    /// Metrics for `target` (today when omitted).
    ///
    /// A day without any rows is reported as the most recent earlier day that
    /// has rows, so an ingestion gap never reads as zero attendance.
    pub async fn compute_metrics(&self, target: Option<NaiveDate>) -> Result<AttendanceMetrics> {
        let now = self.clock.now();
        let requested = target.unwrap_or(now.date());

        if self.punches.count_records(requested).await? > 0 {
            return self.metrics_for_date(requested, now).await;
        }

        match self.punches.latest_date_with_data(requested).await? {
            Some(fallback) => {
                info!(
                    target_date = %requested,
                    fallback_date = %fallback,
                    "No attendance rows for target date, using most recent day with data"
                );
                self.metrics_for_date(fallback, now).await
            }
            None => {
                warn!(target_date = %requested, "No attendance rows in history, reporting headcount only");
                let headcount = self.headcount().await?;
                Ok(AttendanceMetrics::headcount_only(
                    headcount.total_employees(),
                    requested,
                    now,
                ))
            }
        }
    }

    /// Expected attendance for a day; `actual` defaults to that day's punch-ins.
    pub async fn tee_estimate(&self, date: NaiveDate, actual: Option<i64>) -> Result<TeeEstimate> {
        let actual = match actual {
            Some(actual) => actual,
            None => {
                let records = self.punches.records_for_date(date).await?;
                tally(&records, self.clock.now(), &self.settings).total_punch_in()
            }
        };
        self.tee.estimate(date, actual.max(0)).await
    }

    async fn headcount(&self) -> Result<Headcount> {
        let (active_accounts, system_accounts, non_bio) = futures::try_join!(
            self.registry.active_account_count(),
            self.registry.active_system_account_count(),
            self.registry.non_bio_count(),
        )?;

        Ok(Headcount {
            active_accounts,
            system_accounts,
            non_bio,
        })
    }

    async fn metrics_for_date(&self, date: NaiveDate, now: NaiveDateTime) -> Result<AttendanceMetrics> {
        let (records, headcount) =
            futures::try_join!(self.punches.records_for_date(date), self.headcount())?;

        let tally = tally(&records, now, &self.settings);

        let tee = match self.tee.estimate(date, tally.total_punch_in()).await {
            Ok(estimate) => Some(estimate),
            Err(e) => {
                warn!(error = %e, target_date = %date, "Expected attendance unavailable, teeValue degraded to 0");
                None
            }
        };

        if tally.lateness.discrepancy() != 0 {
            info!(
                target_date = %date,
                threshold_late = tally.lateness.threshold,
                classifier_late = tally.lateness.classifier,
                "Late arrival signals disagree"
            );
        }

        let metrics = assemble(&tally, headcount, tee.as_ref(), date, now, &self.settings);
        info!(
            target_date = %date,
            total_employees = metrics.total_employees,
            total_attendance = metrics.total_attendance,
            absent = metrics.absent_today,
            threshold_late = tally.lateness.threshold,
            classifier_late = tally.lateness.classifier,
            "Attendance metrics computed"
        );
        Ok(metrics)
    }
}
