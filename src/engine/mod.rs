//! Attendance reconciliation engine.
//!
//! Reads the punch store and the registry for one target date and turns them
//! into an [`AttendanceMetrics`](crate::model::metrics::AttendanceMetrics)
//! snapshot. Roster views, the multi-day series and the mobile punch write
//! path share the same rules and live beside it.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::employee::RosterFilter;
use crate::store::{EmployeeRegistry, PunchStore};
use crate::utils::employee_filter::EmployeeFilter;

pub mod clock;
pub mod drilldown;
pub mod lateness;
pub mod metrics;
pub mod punch;
pub mod range;
pub mod reconcile;
pub mod tee;

use clock::Clock;
use tee::{TeeModel, TeeSettings};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Open punches older than this are pending auto punch-out.
    pub auto_punchout_window: Duration,
    /// Hours credited to each biometric-exempt employee.
    pub non_bio_hours: Decimal,
    /// Hours beyond this count as overtime.
    pub standard_shift_hours: Decimal,
    /// Minutes after midnight; a later check-in is late (570 = 09:30).
    pub late_threshold_minutes: u32,
    pub tee: TeeSettings,
    pub max_range_days: u32,
    pub roster_filter: RosterFilter,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            auto_punchout_window: Duration::hours(9),
            non_bio_hours: dec!(8),
            standard_shift_hours: dec!(8),
            late_threshold_minutes: 570,
            tee: TeeSettings::default(),
            max_range_days: 90,
            roster_filter: RosterFilter {
                excluded_departments: Vec::new(),
                placeholder_names: vec!["NOC".to_string()],
            },
        }
    }
}

/// Cheap to clone into every worker; clones share the employee filter.
#[derive(Clone)]
pub struct MetricsEngine {
    punches: Arc<dyn PunchStore>,
    registry: Arc<dyn EmployeeRegistry>,
    clock: Arc<dyn Clock>,
    tee: TeeModel,
    employees: EmployeeFilter,
    settings: Arc<EngineSettings>,
}

impl MetricsEngine {
    pub fn new(
        punches: Arc<dyn PunchStore>,
        registry: Arc<dyn EmployeeRegistry>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        let tee = TeeModel::new(punches.clone(), settings.tee.clone());
        Self {
            punches,
            registry,
            clock,
            tee,
            employees: EmployeeFilter::new(),
            settings: Arc::new(settings),
        }
    }

    /// Shared with the background refresh task.
    pub fn employee_filter(&self) -> &EmployeeFilter {
        &self.employees
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn resolve_date(&self, date: Option<NaiveDate>) -> NaiveDate {
        date.unwrap_or_else(|| self.clock.today())
    }
}
