//! Narrow query surface over the punch store and the employee registry.
//!
//! The engine only talks to these traits; `MySqlStore` backs them in
//! production and `MemoryStore` backs the tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;

use crate::model::{
    attendance::AttendanceRecord, employee::Employee, metrics::DailyPunchIns, punch::PunchWrite,
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[async_trait]
pub trait PunchStore: Send + Sync {
    /// Number of attendance rows for a day.
    async fn count_records(&self, date: NaiveDate) -> Result<i64>;

    /// Most recent day strictly before `date` that has at least one row.
    async fn latest_date_with_data(&self, before: NaiveDate) -> Result<Option<NaiveDate>>;

    async fn records_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    /// Distinct checked-in employees per day over `from..=to`.
    /// Days without check-ins are omitted.
    async fn daily_punch_in_counts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPunchIns>>;

    /// Latest day in `since..=until` on which the employee has a check-in
    /// but no check-out.
    async fn open_punch_day(
        &self,
        employee_code: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Option<NaiveDate>>;

    /// Writes a mobile punch keyed on (employee code, day) and returns the row
    /// as stored afterwards.
    ///
    /// A check-in inserts the day's row or fills an empty check-in. A check-out
    /// only updates a row that already has a check-in and never creates one;
    /// `None` means there was no such row.
    async fn upsert_mobile_punch(&self, punch: &PunchWrite) -> Result<Option<AttendanceRecord>>;
}

#[async_trait]
pub trait EmployeeRegistry: Send + Sync {
    async fn active_account_count(&self) -> Result<i64>;

    async fn active_system_account_count(&self) -> Result<i64>;

    /// Active biometric exemptions.
    async fn non_bio_count(&self) -> Result<i64>;

    /// Registry rows of employees holding an active biometric exemption.
    async fn non_bio_roster(&self) -> Result<Vec<Employee>>;

    async fn employees_by_codes(&self, codes: &[String]) -> Result<Vec<Employee>>;

    async fn employee_exists(&self, employee_code: &str) -> Result<bool>;

    /// Codes of every active employee, streamed row by row.
    fn active_employee_codes(&self) -> BoxStream<'_, Result<String>>;
}
