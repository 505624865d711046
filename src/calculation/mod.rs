//! Calculation logic for the Payroll Liquidation Engine.
//!
//! This module contains the pure calculations behind a liquidation: the
//! per-day regular/overtime split, attendance aggregation over a period,
//! gross salary from base salary and attendance, and statutory deductions.

mod attendance;
mod daily_overtime;
mod deductions;
mod gross_salary;

pub use attendance::aggregate_attendance;
pub use daily_overtime::{DailyHoursSplit, split_daily_hours};
pub use deductions::{DeductionCalculator, round_currency};
pub use gross_salary::{GrossSalaryResult, calculate_gross_salary};
