//! Attendance model and related types.
//!
//! Attendance records are captured by the (external) check-in/check-out
//! component. The engine only reads them, but the hours computation lives
//! here so capture and aggregation agree on what an hour is.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// One employee's attendance on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The calendar date of the entry.
    pub date: NaiveDate,
    /// Time of check-in.
    pub entry_time: NaiveTime,
    /// Time of check-out; `None` while the employee is still checked in.
    #[serde(default)]
    pub exit_time: Option<NaiveTime>,
    /// Hours worked on this date, computed at check-out.
    pub hours_worked: Decimal,
}

impl AttendanceRecord {
    /// Creates an open record at check-in. It contributes no hours until check-out.
    pub fn check_in(employee_id: impl Into<String>, date: NaiveDate, entry_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            date,
            entry_time,
            exit_time: None,
            hours_worked: Decimal::ZERO,
        }
    }

    /// Creates a closed record with hours computed from entry and exit.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::AttendanceRecord;
    /// use chrono::{NaiveDate, NaiveTime};
    /// use rust_decimal::Decimal;
    ///
    /// let record = AttendanceRecord::closed(
    ///     "emp_001",
    ///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
    ///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
    /// );
    /// assert_eq!(record.hours_worked, Decimal::new(85, 1)); // 8.5 hours
    /// ```
    pub fn closed(
        employee_id: impl Into<String>,
        date: NaiveDate,
        entry_time: NaiveTime,
        exit_time: NaiveTime,
    ) -> Self {
        let mut record = Self::check_in(employee_id, date, entry_time);
        record.check_out(exit_time);
        record
    }

    /// Records the check-out time and recomputes hours worked.
    pub fn check_out(&mut self, exit_time: NaiveTime) {
        self.exit_time = Some(exit_time);
        self.hours_worked = hours_between(self.entry_time, exit_time);
    }

    /// Returns true while the employee has not checked out.
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// Computes the hours between entry and exit.
///
/// An exit earlier than the entry is treated as crossing midnight.
pub fn hours_between(entry: NaiveTime, exit: NaiveTime) -> Decimal {
    let mut minutes = (exit - entry).num_minutes();
    if minutes < 0 {
        minutes += MINUTES_PER_DAY;
    }
    Decimal::new(minutes, 0) / Decimal::new(60, 0)
}

/// Worked-time totals for one employee over one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Number of distinct dates with hours worked.
    pub days_worked: u32,
    /// Hours at or below the standard shift length, summed over the period.
    pub regular_hours: Decimal,
    /// Hours beyond the standard shift length, summed over the period.
    pub overtime_hours: Decimal,
}

impl AttendanceSummary {
    /// Total hours worked (regular + overtime).
    pub fn total_hours(&self) -> Decimal {
        self.regular_hours + self.overtime_hours
    }
}
