//! Daily overtime split.
//!
//! Splits one day's worked hours into regular hours (up to the standard
//! shift length) and overtime hours (anything beyond it).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Regular/overtime split of a single day's hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHoursSplit {
    /// Hours up to the threshold.
    pub regular_hours: Decimal,
    /// Hours exceeding the threshold (can be zero).
    pub overtime_hours: Decimal,
}

/// Splits worked hours at the daily threshold.
///
/// Hours at or below `threshold` are regular; hours above it are overtime.
/// Negative input is treated as zero.
///
/// # Examples
///
/// ## Day at threshold (no overtime)
///
/// ```
/// use payroll_engine::calculation::split_daily_hours;
/// use payroll_engine::config::DEFAULT_STANDARD_SHIFT_HOURS;
/// use rust_decimal::Decimal;
///
/// let split = split_daily_hours(Decimal::new(8, 0), DEFAULT_STANDARD_SHIFT_HOURS);
/// assert_eq!(split.regular_hours, Decimal::new(8, 0));
/// assert_eq!(split.overtime_hours, Decimal::ZERO);
/// ```
///
/// ## Day exceeding threshold
///
/// ```
/// use payroll_engine::calculation::split_daily_hours;
/// use payroll_engine::config::DEFAULT_STANDARD_SHIFT_HOURS;
/// use rust_decimal::Decimal;
///
/// let split = split_daily_hours(Decimal::new(105, 1), DEFAULT_STANDARD_SHIFT_HOURS);
/// assert_eq!(split.regular_hours, Decimal::new(8, 0));
/// assert_eq!(split.overtime_hours, Decimal::new(25, 1));
/// ```
pub fn split_daily_hours(worked_hours: Decimal, threshold: Decimal) -> DailyHoursSplit {
    let worked_hours = worked_hours.max(Decimal::ZERO);

    if worked_hours > threshold {
        DailyHoursSplit {
            regular_hours: threshold,
            overtime_hours: worked_hours - threshold,
        }
    } else {
        DailyHoursSplit {
            regular_hours: worked_hours,
            overtime_hours: Decimal::ZERO,
        }
    }
}
