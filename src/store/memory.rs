use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream, StreamExt};
use rust_decimal::Decimal;

use crate::model::{
    attendance::{AttendanceRecord, PunchSource, RecordStatus},
    employee::Employee,
    metrics::DailyPunchIns,
    punch::{PunchType, PunchWrite},
};
use crate::store::{EmployeeRegistry, PunchStore};

/// In-memory punch store and registry mirroring the MySQL semantics.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AttendanceRecord>>,
    employees: Vec<Employee>,
    active_accounts: i64,
    system_accounts: i64,
    fail_history: bool,
}

impl MemoryStore {
    pub fn new(active_accounts: i64, system_accounts: i64) -> Self {
        Self {
            active_accounts,
            system_accounts,
            ..Self::default()
        }
    }

    pub fn with_employees(mut self, employees: Vec<Employee>) -> Self {
        self.employees = employees;
        self
    }

    pub fn with_records(self, records: Vec<AttendanceRecord>) -> Self {
        self.records.lock().unwrap().extend(records);
        self
    }

    /// Makes the history query used by the expected-attendance model fail.
    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl PunchStore for MemoryStore {
    async fn count_records(&self, date: NaiveDate) -> Result<i64> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.date == date).count() as i64)
    }

    async fn latest_date_with_data(&self, before: NaiveDate) -> Result<Option<NaiveDate>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().map(|r| r.date).filter(|d| *d < before).max())
    }

    async fn records_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.date == date).cloned().collect())
    }

    async fn daily_punch_in_counts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPunchIns>> {
        if self.fail_history {
            bail!("history unavailable");
        }

        let records = self.records.lock().unwrap();
        let mut by_day: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
        for r in records
            .iter()
            .filter(|r| r.date >= from && r.date <= to && r.check_in.is_some())
        {
            by_day.entry(r.date).or_default().insert(&r.employee_code);
        }

        Ok(by_day
            .into_iter()
            .map(|(date, codes)| DailyPunchIns {
                date,
                punch_ins: codes.len() as i64,
            })
            .collect())
    }

    async fn open_punch_day(
        &self,
        employee_code: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Option<NaiveDate>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| {
                r.employee_code == employee_code
                    && r.date >= since
                    && r.date <= until
                    && r.is_missing_punch_out()
            })
            .map(|r| r.date)
            .max())
    }

    async fn upsert_mobile_punch(&self, punch: &PunchWrite) -> Result<Option<AttendanceRecord>> {
        let mut records = self.records.lock().unwrap();
        let existing = records
            .iter()
            .position(|r| r.employee_code == punch.employee_code && r.date == punch.day);

        let index = match (punch.punch_type, existing) {
            (_, Some(i)) => i,
            (PunchType::Checkin, None) => {
                let mut record = AttendanceRecord::new(&punch.employee_code, punch.day);
                record.punch_source = PunchSource::Mobile;
                record.status = Some(RecordStatus::Active);
                records.push(record);
                records.len() - 1
            }
            (PunchType::Checkout, None) => return Ok(None),
        };

        let record = &mut records[index];
        match punch.punch_type {
            PunchType::Checkin => {
                if record.check_in.is_none() && record.check_out.is_none_or(|o| o >= punch.at) {
                    record.check_in = Some(punch.at);
                    record.punch_source = PunchSource::Mobile;
                }
            }
            PunchType::Checkout => {
                let Some(check_in) = record.check_in else {
                    return Ok(None);
                };
                if punch.at >= check_in && record.check_out.is_none_or(|o| o < punch.at) {
                    record.check_out = Some(punch.at);
                    let seconds = Decimal::from((punch.at - check_in).num_seconds());
                    record.total_hours = Some((seconds / Decimal::from(3600)).round_dp(2));
                }
            }
        }

        Ok(Some(record.clone()))
    }
}

#[async_trait]
impl EmployeeRegistry for MemoryStore {
    async fn active_account_count(&self) -> Result<i64> {
        Ok(self.active_accounts)
    }

    async fn active_system_account_count(&self) -> Result<i64> {
        Ok(self.system_accounts)
    }

    async fn non_bio_count(&self) -> Result<i64> {
        Ok(self.employees.iter().filter(|e| e.non_bio).count() as i64)
    }

    async fn non_bio_roster(&self) -> Result<Vec<Employee>> {
        Ok(self.employees.iter().filter(|e| e.non_bio).cloned().collect())
    }

    async fn employees_by_codes(&self, codes: &[String]) -> Result<Vec<Employee>> {
        Ok(self
            .employees
            .iter()
            .filter(|e| codes.contains(&e.employee_code))
            .cloned()
            .collect())
    }

    async fn employee_exists(&self, employee_code: &str) -> Result<bool> {
        Ok(self
            .employees
            .iter()
            .any(|e| e.is_active && e.employee_code == employee_code))
    }

    fn active_employee_codes(&self) -> BoxStream<'_, Result<String>> {
        let codes: Vec<String> = self
            .employees
            .iter()
            .filter(|e| e.is_active)
            .map(|e| e.employee_code.clone())
            .collect();
        stream::iter(codes.into_iter().map(Ok)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, day, punched};
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn write(punch_type: PunchType, when: NaiveDateTime) -> PunchWrite {
        PunchWrite {
            employee_code: "MEM-A".to_string(),
            day: when.date(),
            at: when,
            punch_type,
            latitude: 24.86,
            longitude: 67.0,
            accuracy: None,
        }
    }

    #[actix_web::test]
    async fn first_check_in_and_latest_check_out_win() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(1, 0);

        store.upsert_mobile_punch(&write(PunchType::Checkin, at(d, 9, 0))).await.unwrap();
        store.upsert_mobile_punch(&write(PunchType::Checkin, at(d, 9, 45))).await.unwrap();
        store.upsert_mobile_punch(&write(PunchType::Checkout, at(d, 18, 0))).await.unwrap();
        let record = store
            .upsert_mobile_punch(&write(PunchType::Checkout, at(d, 17, 0)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.check_in, Some(at(d, 9, 0)));
        assert_eq!(record.check_out, Some(at(d, 18, 0)));
        assert_eq!(record.total_hours, Some(dec!(9)));
    }

    #[actix_web::test]
    async fn check_out_earlier_than_check_in_is_ignored() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(1, 0);

        store.upsert_mobile_punch(&write(PunchType::Checkin, at(d, 11, 0))).await.unwrap();
        let record = store
            .upsert_mobile_punch(&write(PunchType::Checkout, at(d, 10, 0)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.check_out, None);
        assert_eq!(record.total_hours, None);
    }

    #[actix_web::test]
    async fn check_out_without_check_in_writes_nothing() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(1, 0);

        let record = store
            .upsert_mobile_punch(&write(PunchType::Checkout, at(d, 17, 0)))
            .await
            .unwrap();

        assert!(record.is_none());
        assert!(store.records().is_empty());
    }

    #[actix_web::test]
    async fn mobile_check_out_keeps_terminal_source() {
        let d = day(2025, 3, 10);
        let store = MemoryStore::new(1, 0).with_records(vec![punched(
            "MEM-A",
            d,
            Some(at(d, 9, 0)),
            None,
            PunchSource::Terminal,
        )]);

        let record = store
            .upsert_mobile_punch(&write(PunchType::Checkout, at(d, 17, 30)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.punch_source, PunchSource::Terminal);
        assert_eq!(record.check_out, Some(at(d, 17, 30)));
    }
}
