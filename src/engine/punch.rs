//! Mobile punch write path: the only place the engine touches a row.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use derive_more::Display;
use tracing::info;

use crate::engine::MetricsEngine;
use crate::model::attendance::AttendanceRecord;
use crate::model::punch::{MobilePunch, PunchType, PunchWrite};

#[derive(Debug, Display)]
pub enum PunchError {
    #[display(fmt = "Employee code is required")]
    MissingEmployeeCode,
    #[display(fmt = "Location is out of range")]
    InvalidLocation,
    #[display(fmt = "Unknown employee code {}", _0)]
    UnknownEmployee(String),
    #[display(fmt = "No active check-in found for {} on {}", employee_code, day)]
    NoOpenCheckIn {
        employee_code: String,
        day: NaiveDate,
    },
    #[display(fmt = "Punch-out at {} precedes punch-in at {}", at, check_in)]
    CheckOutBeforeCheckIn {
        at: NaiveDateTime,
        check_in: NaiveDateTime,
    },
    #[display(fmt = "{}", _0)]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for PunchError {
    fn from(e: anyhow::Error) -> Self {
        PunchError::Store(e)
    }
}

impl MetricsEngine {
    /// Records a mobile check-in or check-out and returns the stored row.
    pub async fn record_punch(&self, punch: MobilePunch) -> Result<AttendanceRecord, PunchError> {
        let employee_code = punch.employee_code.trim();
        if employee_code.is_empty() {
            return Err(PunchError::MissingEmployeeCode);
        }
        if !punch.has_valid_location() {
            return Err(PunchError::InvalidLocation);
        }
        if !self.is_known_employee(employee_code).await? {
            return Err(PunchError::UnknownEmployee(employee_code.to_string()));
        }

        let at = punch.timestamp.unwrap_or_else(|| self.clock.now());
        let day = self.punch_day(employee_code, punch.punch_type, at).await?;

        let write = PunchWrite {
            employee_code: employee_code.to_string(),
            day,
            at,
            punch_type: punch.punch_type,
            latitude: punch.latitude,
            longitude: punch.longitude,
            accuracy: punch.accuracy,
        };
        let Some(record) = self.punches.upsert_mobile_punch(&write).await? else {
            return Err(PunchError::NoOpenCheckIn {
                employee_code: employee_code.to_string(),
                day,
            });
        };

        if punch.punch_type == PunchType::Checkout {
            if let Some(check_in) = record.check_in.filter(|check_in| at < *check_in) {
                return Err(PunchError::CheckOutBeforeCheckIn { at, check_in });
            }
        }

        info!(
            employee_code,
            punch_type = %punch.punch_type,
            %day,
            %at,
            "Mobile punch recorded"
        );
        Ok(record)
    }

    /// Day a punch belongs to. A check-out closes the latest open record from
    /// the punch date or the day before, so a shift crossing midnight stays
    /// on its punch-in day.
    pub async fn punch_day(
        &self,
        employee_code: &str,
        punch_type: PunchType,
        at: NaiveDateTime,
    ) -> anyhow::Result<NaiveDate> {
        let date = at.date();
        match punch_type {
            PunchType::Checkin => Ok(date),
            PunchType::Checkout => Ok(self
                .punches
                .open_punch_day(employee_code, date - Duration::days(1), date)
                .await?
                .unwrap_or(date)),
        }
    }

    /// A warm filter miss rejects outright; anything else is settled by the
    /// registry, so a stale filter entry never admits an inactive code.
    async fn is_known_employee(&self, employee_code: &str) -> anyhow::Result<bool> {
        if self.employees.definitely_absent(employee_code) {
            return Ok(false);
        }
        self.registry.employee_exists(employee_code).await
    }
}
