//! Attendance aggregation.
//!
//! Turns an employee's daily attendance records for a period into worked
//! days, regular hours and overtime hours.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{AttendanceRecord, AttendanceSummary, PayrollPeriod};

use super::daily_overtime::split_daily_hours;

/// Aggregates attendance records into period totals.
///
/// Records outside `period` are ignored. Records sharing a date are summed
/// before the daily split, so a duplicated check-in never counts a day
/// twice or hides overtime. A date counts as worked only when its hours are
/// positive, which leaves open (not yet checked-out) records out.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::aggregate_attendance;
/// use payroll_engine::models::{AttendanceRecord, PayrollPeriod};
/// use chrono::{NaiveDate, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let period = PayrollPeriod::new(2026, 1).unwrap();
/// let records = vec![AttendanceRecord::closed(
///     "emp_001",
///     NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
///     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
/// )];
///
/// let summary = aggregate_attendance(&records, &period, Decimal::new(8, 0));
/// assert_eq!(summary.days_worked, 1);
/// assert_eq!(summary.regular_hours, Decimal::new(8, 0));
/// assert_eq!(summary.overtime_hours, Decimal::new(2, 0));
/// ```
pub fn aggregate_attendance(
    records: &[AttendanceRecord],
    period: &PayrollPeriod,
    shift_hours: Decimal,
) -> AttendanceSummary {
    let mut hours_by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for record in records.iter().filter(|r| period.contains_date(r.date)) {
        *hours_by_date.entry(record.date).or_default() += record.hours_worked;
    }

    hours_by_date
        .values()
        .filter(|hours| **hours > Decimal::ZERO)
        .fold(AttendanceSummary::default(), |mut summary, hours| {
            let split = split_daily_hours(*hours, shift_hours);
            summary.days_worked += 1;
            summary.regular_hours += split.regular_hours;
            summary.overtime_hours += split.overtime_hours;
            summary
        })
}
