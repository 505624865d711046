//! Configuration types for payroll liquidation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{HEALTH_CONCEPT, PENSION_CONCEPT};

/// Default standard shift length in hours. Hours beyond it in one day are overtime.
pub const DEFAULT_STANDARD_SHIFT_HOURS: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Default number of working days a base monthly salary pays for.
pub const DEFAULT_STANDARD_WORKING_DAYS: u32 = 20;

/// Default overtime multiplier applied to the hourly rate (150%).
pub const DEFAULT_OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Default number of decimal places monetary amounts are rounded to.
pub const DEFAULT_CURRENCY_SCALE: u32 = 2;

/// Default pension-fund deduction rate (10%).
pub const DEFAULT_PENSION_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Default health deduction rate (7%).
pub const DEFAULT_HEALTH_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// A statutory deduction applied as a rate of gross salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRule {
    /// Concept label (e.g. "pension", "health").
    pub concept: String,
    /// Rate of gross salary, between 0 and 1.
    pub rate: Decimal,
}

impl DeductionRule {
    /// Creates a rule.
    pub fn new(concept: impl Into<String>, rate: Decimal) -> Self {
        Self {
            concept: concept.into(),
            rate,
        }
    }
}

/// The complete payroll configuration.
///
/// Every field has a default, so a configuration file only needs to list
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    /// Hours per day counted as regular; anything above is overtime.
    pub standard_shift_hours: Decimal,
    /// Working days the base monthly salary pays for.
    pub standard_working_days: u32,
    /// Multiplier applied to the hourly rate for overtime hours.
    pub overtime_multiplier: Decimal,
    /// Decimal places monetary amounts are rounded to.
    pub currency_scale: u32,
    /// Deduction rules, in the order their lines appear.
    pub deductions: Vec<DeductionRule>,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            standard_shift_hours: DEFAULT_STANDARD_SHIFT_HOURS,
            standard_working_days: DEFAULT_STANDARD_WORKING_DAYS,
            overtime_multiplier: DEFAULT_OVERTIME_MULTIPLIER,
            currency_scale: DEFAULT_CURRENCY_SCALE,
            deductions: vec![
                DeductionRule::new(PENSION_CONCEPT, DEFAULT_PENSION_RATE),
                DeductionRule::new(HEALTH_CONCEPT, DEFAULT_HEALTH_RATE),
            ],
        }
    }
}

impl PayrollConfig {
    /// Returns the rule for a concept, if configured.
    pub fn rule(&self, concept: &str) -> Option<&DeductionRule> {
        self.deductions.iter().find(|rule| rule.concept == concept)
    }

    /// Sum of all deduction rates.
    pub fn total_deduction_rate(&self) -> Decimal {
        self.deductions.iter().map(|rule| rule.rate).sum()
    }
}
