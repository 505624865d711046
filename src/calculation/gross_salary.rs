//! Gross salary calculation.
//!
//! The base monthly salary pays for the standard number of working days.
//! Each worked day earns a daily rate, and each overtime hour earns the
//! hourly rate times the overtime multiplier:
//!
//! ```text
//! daily_rate    = base_salary / standard_working_days
//! hourly_rate   = base_salary / (standard_working_days * standard_shift_hours)
//! regular_pay   = daily_rate * days_worked
//! overtime_pay  = hourly_rate * overtime_hours * overtime_multiplier
//! gross_salary  = regular_pay + overtime_pay
//! ```
//!
//! Both pay components are rounded to the currency scale before summing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::AttendanceSummary;

use super::deductions::round_currency;

/// Breakdown of a gross salary computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossSalaryResult {
    /// Base salary per standard working day (unrounded).
    pub daily_rate: Decimal,
    /// Base salary per standard hour (unrounded).
    pub hourly_rate: Decimal,
    /// Pay for the days worked.
    pub regular_pay: Decimal,
    /// Overtime premium.
    pub overtime_pay: Decimal,
    /// `regular_pay + overtime_pay`.
    pub gross_salary: Decimal,
}

/// Computes the gross salary for one period.
///
/// # Errors
///
/// Returns `Validation` if `base_salary` is negative, or so large that the
/// pay for the attendance cannot be represented.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_gross_salary;
/// use payroll_engine::config::PayrollConfig;
/// use payroll_engine::models::AttendanceSummary;
/// use rust_decimal::Decimal;
///
/// let summary = AttendanceSummary {
///     days_worked: 20,
///     regular_hours: Decimal::new(160, 0),
///     overtime_hours: Decimal::ZERO,
/// };
/// let result =
///     calculate_gross_salary(Decimal::new(1_000_000, 0), &summary, &PayrollConfig::default())
///         .unwrap();
/// assert_eq!(result.gross_salary, Decimal::new(1_000_000, 0));
/// ```
pub fn calculate_gross_salary(
    base_salary: Decimal,
    summary: &AttendanceSummary,
    config: &PayrollConfig,
) -> EngineResult<GrossSalaryResult> {
    if base_salary < Decimal::ZERO {
        return Err(EngineError::validation(
            "base_salary",
            format!("must not be negative, got {}", base_salary),
        ));
    }

    let working_days = Decimal::from(config.standard_working_days);
    let daily_rate = base_salary / working_days;
    let hourly_rate = base_salary / (working_days * config.standard_shift_hours);

    // multiply before dividing so whole-month attendance pays exactly the base
    let regular_pay = base_salary
        .checked_mul(Decimal::from(summary.days_worked))
        .map(|amount| round_currency(amount / working_days, config.currency_scale))
        .ok_or_else(|| out_of_range(base_salary))?;
    let overtime_pay = base_salary
        .checked_mul(summary.overtime_hours)
        .and_then(|amount| amount.checked_mul(config.overtime_multiplier))
        .map(|amount| {
            round_currency(
                amount / (working_days * config.standard_shift_hours),
                config.currency_scale,
            )
        })
        .ok_or_else(|| out_of_range(base_salary))?;
    let gross_salary = regular_pay
        .checked_add(overtime_pay)
        .ok_or_else(|| out_of_range(base_salary))?;

    Ok(GrossSalaryResult {
        daily_rate,
        hourly_rate,
        regular_pay,
        overtime_pay,
        gross_salary,
    })
}

fn out_of_range(base_salary: Decimal) -> EngineError {
    EngineError::validation(
        "base_salary",
        format!("{} is too large to compute a salary for", base_salary),
    )
}
