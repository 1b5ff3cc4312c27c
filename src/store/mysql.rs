use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::{BoxStream, StreamExt};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::model::{
    attendance::{AttendanceRecord, PunchSource},
    employee::Employee,
    metrics::DailyPunchIns,
    punch::{PunchType, PunchWrite},
};
use crate::store::{EmployeeRegistry, PunchStore};

const RECORD_COLUMNS: &str = r#"
    employee_code, date, check_in, check_out, punch_source, status,
    arrival_status, departure_status, late_minutes, grace_minutes, total_hours
"#;

const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.employee_code,
        e.first_name,
        e.last_name,
        e.department,
        e.designation,
        e.shift_name,
        e.is_active,
        e.system_account,
        CAST(EXISTS(
            SELECT 1 FROM biometric_exemptions b
            WHERE b.employee_code = e.employee_code AND b.is_active = 1
        ) AS SIGNED) AS non_bio,
        u.is_active AS account_active,
        u.account_type
    FROM employees e
    LEFT JOIN users u ON u.id = e.user_id
"#;

/// Keeps the first check-in of the day. Source and location follow the
/// check-in only when this punch is the one that supplies it.
/// MySQL applies the assignments left to right, so `check_in` goes last and
/// every condition above it still sees the stored value.
/// The same rules are pinned against `MemoryStore` in `store::memory::tests`.
const UPSERT_CHECK_IN: &str = r#"
    INSERT INTO attendance_records
        (employee_code, date, check_in, punch_source, status,
         check_in_latitude, check_in_longitude, check_in_accuracy)
    VALUES (?, ?, ?, 'mobile', 'active', ?, ?, ?)
    ON DUPLICATE KEY UPDATE
        punch_source = IF(check_in IS NULL AND (check_out IS NULL OR check_out >= VALUES(check_in)),
                          'mobile', punch_source),
        check_in_latitude = IF(check_in IS NULL AND (check_out IS NULL OR check_out >= VALUES(check_in)),
                               VALUES(check_in_latitude), check_in_latitude),
        check_in_longitude = IF(check_in IS NULL AND (check_out IS NULL OR check_out >= VALUES(check_in)),
                                VALUES(check_in_longitude), check_in_longitude),
        check_in_accuracy = IF(check_in IS NULL AND (check_out IS NULL OR check_out >= VALUES(check_in)),
                               VALUES(check_in_accuracy), check_in_accuracy),
        check_in = IF(check_in IS NULL AND (check_out IS NULL OR check_out >= VALUES(check_in)),
                      VALUES(check_in), check_in)
"#;

/// Closes a row that already has a check-in; never inserts. Only a later
/// check-out replaces the stored one, and one earlier than the check-in
/// matches nothing. `total_hours` is computed from the bound timestamp, so
/// the statement does not depend on assignment order.
///
/// `punch_source` is left alone: it tags the channel of the check-in, so a
/// mobile check-out on a terminal row still counts as a biometric punch-out.
///
/// The same rules are pinned against `MemoryStore` in `store::memory::tests`.
const CLOSE_WITH_CHECK_OUT: &str = r#"
    UPDATE attendance_records
    SET check_out = ?,
        total_hours = ROUND(TIMESTAMPDIFF(SECOND, check_in, ?) / 3600, 2),
        check_out_latitude = ?,
        check_out_longitude = ?,
        check_out_accuracy = ?
    WHERE employee_code = ?
    AND date = ?
    AND check_in IS NOT NULL
    AND check_in <= ?
    AND (check_out IS NULL OR check_out < ?)
"#;

#[derive(FromRow)]
struct RecordRow {
    employee_code: String,
    date: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    punch_source: Option<String>,
    status: Option<String>,
    arrival_status: Option<String>,
    departure_status: Option<String>,
    late_minutes: Option<i32>,
    grace_minutes: Option<i32>,
    total_hours: Option<Decimal>,
}

impl From<RecordRow> for AttendanceRecord {
    fn from(row: RecordRow) -> Self {
        // unknown enum text is treated like a missing value
        Self {
            employee_code: row.employee_code,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            punch_source: PunchSource::from_column(row.punch_source.as_deref()),
            status: row.status.and_then(|s| s.parse().ok()),
            arrival_status: row.arrival_status.and_then(|s| s.parse().ok()),
            departure_status: row.departure_status.and_then(|s| s.parse().ok()),
            late_minutes: row.late_minutes,
            grace_minutes: row.grace_minutes,
            total_hours: row.total_hours,
        }
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    employee_code: String,
    first_name: Option<String>,
    last_name: Option<String>,
    department: Option<String>,
    designation: Option<String>,
    shift_name: Option<String>,
    is_active: bool,
    system_account: bool,
    non_bio: i64,
    account_active: Option<bool>,
    account_type: Option<String>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Self {
            employee_code: row.employee_code,
            first_name: row.first_name,
            last_name: row.last_name,
            department: row.department,
            designation: row.designation,
            shift_name: row.shift_name,
            is_active: row.is_active,
            system_account: row.system_account,
            non_bio: row.non_bio != 0,
            account_active: row.account_active,
            account_type: row.account_type.and_then(|s| s.parse().ok()),
        }
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn record(&self, employee_code: &str, date: NaiveDate) -> Result<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE employee_code = ? AND date = ?"
        );
        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(employee_code)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AttendanceRecord::from))
    }
}

#[async_trait]
impl PunchStore for MySqlStore {
    async fn count_records(&self, date: NaiveDate) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance_records WHERE date = ?",
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .context("count attendance records")?;
        Ok(count)
    }

    async fn latest_date_with_data(&self, before: NaiveDate) -> Result<Option<NaiveDate>> {
        let date = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(date) FROM attendance_records WHERE date < ?",
        )
        .bind(before)
        .fetch_one(&self.pool)
        .await
        .context("find latest date with attendance")?;
        Ok(date)
    }

    async fn records_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records WHERE date = ?");
        debug!(sql = %sql, %date, "Fetching attendance records");

        let rows = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .context("fetch attendance records")?;
        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn daily_punch_in_counts(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyPunchIns>> {
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT date, COUNT(DISTINCT employee_code)
            FROM attendance_records
            WHERE date BETWEEN ? AND ?
            AND check_in IS NOT NULL
            GROUP BY date
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .context("fetch daily punch-in history")?;

        Ok(rows
            .into_iter()
            .map(|(date, punch_ins)| DailyPunchIns { date, punch_ins })
            .collect())
    }

    async fn open_punch_day(
        &self,
        employee_code: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Option<NaiveDate>> {
        let date = sqlx::query_scalar::<_, Option<NaiveDate>>(
            r#"
            SELECT MAX(date)
            FROM attendance_records
            WHERE employee_code = ?
            AND date BETWEEN ? AND ?
            AND check_in IS NOT NULL
            AND check_out IS NULL
            "#,
        )
        .bind(employee_code)
        .bind(since)
        .bind(until)
        .fetch_one(&self.pool)
        .await
        .context("find open punch day")?;
        Ok(date)
    }

    async fn upsert_mobile_punch(&self, punch: &PunchWrite) -> Result<Option<AttendanceRecord>> {
        match punch.punch_type {
            PunchType::Checkin => {
                sqlx::query(UPSERT_CHECK_IN)
                    .bind(&punch.employee_code)
                    .bind(punch.day)
                    .bind(punch.at)
                    .bind(punch.latitude)
                    .bind(punch.longitude)
                    .bind(punch.accuracy)
                    .execute(&self.pool)
                    .await
                    .context("upsert mobile check-in")?;
            }
            PunchType::Checkout => {
                let result = sqlx::query(CLOSE_WITH_CHECK_OUT)
                    .bind(punch.at)
                    .bind(punch.at)
                    .bind(punch.latitude)
                    .bind(punch.longitude)
                    .bind(punch.accuracy)
                    .bind(&punch.employee_code)
                    .bind(punch.day)
                    .bind(punch.at)
                    .bind(punch.at)
                    .execute(&self.pool)
                    .await
                    .context("record mobile check-out")?;
                debug!(rows = result.rows_affected(), "Mobile check-out applied");
            }
        }

        let record = self.record(&punch.employee_code, punch.day).await?;
        Ok(record.filter(|r| r.check_in.is_some()))
    }
}

#[async_trait]
impl EmployeeRegistry for MySqlStore {
    async fn active_account_count(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await
                .context("count active accounts")?;
        Ok(count)
    }

    async fn active_system_account_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE is_active = 1 AND account_type = 'system'",
        )
        .fetch_one(&self.pool)
        .await
        .context("count active system accounts")?;
        Ok(count)
    }

    async fn non_bio_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM biometric_exemptions WHERE is_active = 1",
        )
        .fetch_one(&self.pool)
        .await
        .context("count biometric exemptions")?;
        Ok(count)
    }

    async fn non_bio_roster(&self) -> Result<Vec<Employee>> {
        let sql = format!(
            r#"{EMPLOYEE_SELECT}
            WHERE EXISTS(
                SELECT 1 FROM biometric_exemptions b
                WHERE b.employee_code = e.employee_code AND b.is_active = 1
            )
            ORDER BY e.first_name, e.last_name"#
        );

        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("fetch non-bio roster")?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn employees_by_codes(&self, codes: &[String]) -> Result<Vec<Employee>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; codes.len()].join(", ");
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.employee_code IN ({placeholders})");
        debug!(count = codes.len(), "Fetching employees by code");

        let mut query = sqlx::query_as::<_, EmployeeRow>(&sql);
        for code in codes {
            query = query.bind(code);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("fetch employees by code")?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn employee_exists(&self, employee_code: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT CAST(EXISTS(SELECT 1 FROM employees WHERE employee_code = ? AND is_active = 1 LIMIT 1) AS SIGNED)",
        )
        .bind(employee_code)
        .fetch_one(&self.pool)
        .await
        .context("check employee code")?;
        Ok(exists != 0)
    }

    fn active_employee_codes(&self) -> BoxStream<'_, Result<String>> {
        sqlx::query_scalar::<_, String>("SELECT employee_code FROM employees WHERE is_active = 1")
            .fetch(&self.pool)
            .map(|row| row.context("fetch active employee code"))
            .boxed()
    }
}
