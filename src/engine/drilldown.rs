//! Roster views built on the same rules as the aggregate metrics.
//!
//! Shift times here only give the rows display context; whether someone was
//! late or left early was decided upstream by the timing classifier.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::engine::MetricsEngine;
use crate::model::attendance::{AttendanceRecord, PunchState, TimingStatus};
use crate::model::employee::Employee;
use crate::model::roster::{
    EarlyDeparture, EarlyDepartureRoster, LateArrival, LateRoster, PresenceKind, PresentEmployee,
    PresentRoster,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftTimes {
    pub arrival: NaiveTime,
    pub departure: NaiveTime,
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

/// Expected arrival and departure for a shift name, 09:00-17:00 when unknown.
pub fn shift_times(shift_name: Option<&str>) -> ShiftTimes {
    let name = shift_name.map(|s| s.trim().to_ascii_lowercase());
    let (arrival, departure) = match name.as_deref() {
        Some("evening") => (hm(14, 0), hm(22, 0)),
        Some("night") => (hm(22, 0), hm(6, 0)),
        _ => (hm(9, 0), hm(17, 0)),
    };
    ShiftTimes { arrival, departure }
}

impl ShiftTimes {
    /// Expected departure on the wall clock; overnight shifts end the next day.
    pub fn departure_on(&self, day: NaiveDate) -> NaiveDateTime {
        let end = day.and_time(self.departure);
        if self.departure <= self.arrival {
            end + Duration::days(1)
        } else {
            end
        }
    }
}

fn minutes_between(earlier: NaiveDateTime, later: NaiveDateTime) -> i64 {
    (later - earlier).num_minutes().max(0)
}

/// Minutes past the expected arrival, preferring the classifier's figure.
fn minutes_late(record: &AttendanceRecord, status: TimingStatus, shift: ShiftTimes) -> i64 {
    let recorded = match status {
        TimingStatus::Late => record.late_minutes,
        TimingStatus::Grace => record.grace_minutes,
        _ => None,
    };
    recorded.map(i64::from).unwrap_or_else(|| {
        record
            .check_in
            .map_or(0, |check_in| minutes_between(record.date.and_time(shift.arrival), check_in))
    })
}

impl MetricsEngine {
    async fn admitted_employees(&self, records: &[&AttendanceRecord]) -> Result<HashMap<String, Employee>> {
        let mut codes: Vec<String> = records.iter().map(|r| r.employee_code.clone()).collect();
        codes.sort();
        codes.dedup();

        let filter = &self.settings.roster_filter;
        let employees: HashMap<String, Employee> = self
            .registry
            .employees_by_codes(&codes)
            .await?
            .into_iter()
            .filter(|e| filter.admits(e))
            .map(|e| (e.employee_code.clone(), e))
            .collect();

        let skipped = codes.len() - codes.iter().filter(|c| employees.contains_key(*c)).count();
        if skipped > 0 {
            debug!(skipped, "Roster rows without an eligible registry entry were left out");
        }
        Ok(employees)
    }

    /// Employees still on the clock, with biometric-exempt staff listed apart.
    pub async fn present_roster(&self, date: Option<NaiveDate>) -> Result<PresentRoster> {
        let date = self.resolve_date(date);
        let now = self.clock.now();
        let window = self.settings.auto_punchout_window;

        let (records, non_bio) = futures::try_join!(
            self.punches.records_for_date(date),
            self.registry.non_bio_roster(),
        )?;

        let open: Vec<&AttendanceRecord> = records
            .iter()
            .filter(|r| r.punch_state(now, window) == PunchState::OpenActive)
            .collect();
        let employees = self.admitted_employees(&open).await?;

        let mut observed: Vec<PresentEmployee> = open
            .iter()
            .filter_map(|r| {
                let employee = employees.get(&r.employee_code)?;
                let hours = r.check_in.map_or(Decimal::ZERO, |check_in| {
                    (Decimal::from(minutes_between(check_in, now)) / Decimal::from(60)).round_dp(2)
                });
                Some(PresentEmployee {
                    employee_code: r.employee_code.clone(),
                    name: employee.display_name(),
                    department: employee.department_or_unknown(),
                    designation: employee.designation_or_unknown(),
                    check_in: r.check_in,
                    hours,
                    status: PresenceKind::Present,
                })
            })
            .collect();
        observed.sort_by(|a, b| a.check_in.cmp(&b.check_in));

        let filter = &self.settings.roster_filter;
        let non_bio = non_bio
            .iter()
            .filter(|e| filter.admits(e))
            .map(|e| PresentEmployee {
                employee_code: e.employee_code.clone(),
                name: e.display_name(),
                department: e.department_or_unknown(),
                designation: e.designation_or_unknown(),
                check_in: None,
                hours: self.settings.non_bio_hours,
                status: PresenceKind::NonBio,
            })
            .collect();

        Ok(PresentRoster {
            target_date: date,
            observed,
            non_bio,
        })
    }

    /// Rows the classifier marked late or within grace.
    pub async fn late_roster(&self, date: Option<NaiveDate>) -> Result<LateRoster> {
        let date = self.resolve_date(date);
        let records = self.punches.records_for_date(date).await?;

        let flagged: Vec<&AttendanceRecord> = records
            .iter()
            .filter(|r| matches!(r.arrival_status, Some(TimingStatus::Late | TimingStatus::Grace)))
            .collect();
        let employees = self.admitted_employees(&flagged).await?;

        let mut entries: Vec<LateArrival> = flagged
            .iter()
            .filter_map(|r| {
                let employee = employees.get(&r.employee_code)?;
                let status = r.arrival_status?;
                let shift = shift_times(employee.shift_name.as_deref());
                Some(LateArrival {
                    employee_code: r.employee_code.clone(),
                    name: employee.display_name(),
                    department: employee.department_or_unknown(),
                    shift_name: employee.shift_name.clone(),
                    expected_arrival: shift.arrival,
                    check_in: r.check_in,
                    arrival_status: status,
                    minutes_late: minutes_late(r, status, shift),
                })
            })
            .collect();
        entries.sort_by(|a, b| b.minutes_late.cmp(&a.minutes_late));

        Ok(LateRoster {
            target_date: date,
            entries,
        })
    }

    /// Rows the classifier marked as leaving early.
    pub async fn early_departure_roster(&self, date: Option<NaiveDate>) -> Result<EarlyDepartureRoster> {
        let date = self.resolve_date(date);
        let records = self.punches.records_for_date(date).await?;

        let flagged: Vec<&AttendanceRecord> = records
            .iter()
            .filter(|r| r.departure_status == Some(TimingStatus::Early))
            .collect();
        let employees = self.admitted_employees(&flagged).await?;

        let mut entries: Vec<EarlyDeparture> = flagged
            .iter()
            .filter_map(|r| {
                let employee = employees.get(&r.employee_code)?;
                let shift = shift_times(employee.shift_name.as_deref());
                let minutes_early = r.check_out.map_or(0, |check_out| {
                    minutes_between(check_out, shift.departure_on(r.date))
                });
                Some(EarlyDeparture {
                    employee_code: r.employee_code.clone(),
                    name: employee.display_name(),
                    department: employee.department_or_unknown(),
                    shift_name: employee.shift_name.clone(),
                    expected_departure: shift.departure,
                    check_out: r.check_out,
                    minutes_early,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.minutes_early.cmp(&a.minutes_early));

        Ok(EarlyDepartureRoster {
            target_date: date,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, day, engine, punched};
    use crate::model::attendance::PunchSource;
    use crate::model::employee::employee;
    use crate::store::memory::MemoryStore;
    use rust_decimal_macros::dec;

    #[test]
    fn shift_lookup_defaults() {
        assert_eq!(shift_times(None).arrival, hm(9, 0));
        assert_eq!(shift_times(Some("unheard")).departure, hm(17, 0));
        assert_eq!(shift_times(Some(" Evening ")).arrival, hm(14, 0));

        let night = shift_times(Some("night"));
        let d = day(2025, 3, 10);
        assert_eq!(night.departure_on(d), at(day(2025, 3, 11), 6, 0));
        assert_eq!(shift_times(None).departure_on(d), at(d, 17, 0));
    }

    #[actix_web::test]
    async fn present_roster_separates_imputed_presence() {
        let d = day(2025, 3, 10);
        let mut exempt = employee("NB1", "Nadia", "Admin");
        exempt.non_bio = true;
        let mut noc = employee("NB2", "NOC", "Ops");
        noc.non_bio = true;

        let store = MemoryStore::new(10, 0)
            .with_employees(vec![
                employee("A", "Asad", "Finance"),
                employee("B", "Bilal", "Finance"),
                employee("C", "Cyra", "HR"),
                exempt,
                noc,
            ])
            .with_records(vec![
                punched("A", d, Some(at(d, 9, 0)), None, PunchSource::Terminal),
                punched("B", d, Some(at(d, 1, 0)), None, PunchSource::Terminal),
                punched("C", d, Some(at(d, 8, 0)), Some(at(d, 11, 0)), PunchSource::Mobile),
                punched("GHOST", d, Some(at(d, 9, 30)), None, PunchSource::Mobile),
            ]);
        let (engine, _) = engine(store, at(d, 12, 0));

        let roster = engine.present_roster(Some(d)).await.unwrap();
        assert_eq!(roster.observed.len(), 1);
        assert_eq!(roster.observed[0].employee_code, "A");
        assert_eq!(roster.observed[0].hours, dec!(3));
        assert_eq!(roster.observed[0].status, PresenceKind::Present);

        assert_eq!(roster.non_bio.len(), 1);
        assert_eq!(roster.non_bio[0].employee_code, "NB1");
        assert_eq!(roster.non_bio[0].status, PresenceKind::NonBio);
        assert_eq!(roster.non_bio[0].check_in, None);
        assert_eq!(roster.non_bio[0].hours, dec!(8));
    }

    #[actix_web::test]
    async fn late_roster_uses_classifier_rows() {
        let d = day(2025, 3, 10);
        let mut evening = employee("B", "Bilal", "Support");
        evening.shift_name = Some("evening".into());

        let mut late = punched("A", d, Some(at(d, 9, 45)), None, PunchSource::Terminal);
        late.arrival_status = Some(TimingStatus::Late);
        let mut grace = punched("B", d, Some(at(d, 14, 5)), None, PunchSource::Terminal);
        grace.arrival_status = Some(TimingStatus::Grace);
        grace.grace_minutes = Some(5);
        // threshold-late but never classified: not a roster row
        let unclassified = punched("C", d, Some(at(d, 10, 0)), None, PunchSource::Terminal);

        let store = MemoryStore::new(10, 0)
            .with_employees(vec![employee("A", "Asad", "Finance"), evening, employee("C", "Cyra", "HR")])
            .with_records(vec![late, grace, unclassified]);
        let (engine, _) = engine(store, at(d, 15, 0));

        let roster = engine.late_roster(Some(d)).await.unwrap();
        assert_eq!(roster.entries.len(), 2);
        assert_eq!(roster.entries[0].employee_code, "A");
        assert_eq!(roster.entries[0].minutes_late, 45);
        assert_eq!(roster.entries[0].expected_arrival, hm(9, 0));
        assert_eq!(roster.entries[1].employee_code, "B");
        assert_eq!(roster.entries[1].arrival_status, TimingStatus::Grace);
        assert_eq!(roster.entries[1].minutes_late, 5);
        assert_eq!(roster.entries[1].expected_arrival, hm(14, 0));
    }

    #[actix_web::test]
    async fn early_departure_roster_measures_against_shift_end() {
        let d = day(2025, 3, 10);
        let mut left = punched("A", d, Some(at(d, 9, 0)), Some(at(d, 15, 30)), PunchSource::Mobile);
        left.departure_status = Some(TimingStatus::Early);
        let mut on_time = punched("B", d, Some(at(d, 9, 0)), Some(at(d, 17, 5)), PunchSource::Terminal);
        on_time.departure_status = Some(TimingStatus::OnTime);

        let store = MemoryStore::new(10, 0)
            .with_employees(vec![employee("A", "Asad", "Finance"), employee("B", "Bilal", "HR")])
            .with_records(vec![left, on_time]);
        let (engine, _) = engine(store, at(d, 18, 0));

        let roster = engine.early_departure_roster(Some(d)).await.unwrap();
        assert_eq!(roster.entries.len(), 1);
        assert_eq!(roster.entries[0].employee_code, "A");
        assert_eq!(roster.entries[0].minutes_early, 90);
        assert_eq!(roster.entries[0].expected_departure, hm(17, 0));
    }
}
