//! Payroll period model.
//!
//! This module contains the [`PayrollPeriod`] type: one calendar month,
//! anchored to its first day, which is how liquidations are keyed.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A calendar-month payroll period.
///
/// The period is stored as its first and last day so both are always valid
/// dates. It serializes as its label (`"YYYY-MM"`).
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayrollPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayrollPeriod::new(2026, 2).unwrap();
///
/// assert_eq!(period.label(), "2026-02");
/// assert_eq!(period.start_date(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
/// assert_eq!(period.end_date(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PayrollPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl PayrollPeriod {
    /// Creates the period for the given year and month (1-12).
    ///
    /// Returns a validation error when the month is out of range or the
    /// year cannot be represented.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        let invalid = || EngineError::validation("period", format!("{year}-{month:02} is not a valid month"));

        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next_start = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        let end = next_start.pred_opt().ok_or_else(invalid)?;

        Ok(Self { start, end })
    }

    /// Returns the period containing the given date.
    pub fn containing(date: NaiveDate) -> EngineResult<Self> {
        Self::new(date.year(), date.month())
    }

    /// Returns the calendar year.
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Returns the calendar month (1-12).
    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// The first day of the period (inclusive). Liquidations are anchored here.
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// The last day of the period (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.end
    }

    /// Checks if a given date falls within this period (inclusive on both ends).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns the `YYYY-MM` label of the period.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }
}

impl fmt::Display for PayrollPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for PayrollPeriod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::validation("period", format!("'{s}' is not a YYYY-MM period"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for PayrollPeriod {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PayrollPeriod> for String {
    fn from(period: PayrollPeriod) -> Self {
        period.label()
    }
}
