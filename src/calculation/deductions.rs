//! Statutory deduction calculation.
//!
//! Applies the configured deduction rules (pension and health at minimum) to
//! a gross salary and returns a per-concept breakdown.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::{DeductionRule, PayrollConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{DeductionBreakdown, DeductionLine};

/// Rounds a monetary amount to `scale` decimal places, halves away from zero.
pub fn round_currency(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a fixed set of deduction rules to gross salaries.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::DeductionCalculator;
/// use payroll_engine::config::PayrollConfig;
/// use rust_decimal::Decimal;
///
/// let calculator = DeductionCalculator::from_config(&PayrollConfig::default());
/// let breakdown = calculator.calculate(Decimal::new(1_000_000, 0)).unwrap();
///
/// assert_eq!(breakdown.amount_for("pension"), Decimal::new(100_000, 0));
/// assert_eq!(breakdown.amount_for("health"), Decimal::new(70_000, 0));
/// assert_eq!(breakdown.total_deductions, Decimal::new(170_000, 0));
/// ```
#[derive(Debug, Clone)]
pub struct DeductionCalculator {
    rules: Vec<DeductionRule>,
    scale: u32,
}

impl DeductionCalculator {
    /// Creates a calculator from explicit rules.
    pub fn new(rules: Vec<DeductionRule>, scale: u32) -> Self {
        Self { rules, scale }
    }

    /// Creates a calculator from the configured rules and currency scale.
    pub fn from_config(config: &PayrollConfig) -> Self {
        Self::new(config.deductions.clone(), config.currency_scale)
    }

    /// The rules applied, in line order.
    pub fn rules(&self) -> &[DeductionRule] {
        &self.rules
    }

    /// Computes the deduction breakdown for `gross_salary`.
    ///
    /// Each line is rounded on its own; the total is the sum of the rounded
    /// lines, so it always matches the persisted deduction records.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `gross_salary` is negative, or so large that
    /// the deductions overflow.
    pub fn calculate(&self, gross_salary: Decimal) -> EngineResult<DeductionBreakdown> {
        if gross_salary < Decimal::ZERO {
            return Err(EngineError::validation(
                "gross_salary",
                format!("must not be negative, got {}", gross_salary),
            ));
        }

        let out_of_range = || {
            EngineError::validation(
                "gross_salary",
                format!("{} is too large to compute deductions for", gross_salary),
            )
        };

        let details = self
            .rules
            .iter()
            .map(|rule| {
                let amount = gross_salary.checked_mul(rule.rate).ok_or_else(out_of_range)?;
                Ok(DeductionLine {
                    concept: rule.concept.clone(),
                    rate: rule.rate,
                    amount: round_currency(amount, self.scale),
                })
            })
            .collect::<EngineResult<Vec<DeductionLine>>>()?;
        let total_deductions = details
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.amount))
            .ok_or_else(out_of_range)?;

        Ok(DeductionBreakdown {
            total_deductions,
            details,
        })
    }
}
