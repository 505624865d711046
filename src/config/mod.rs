//! Configuration loading and management for the Payroll Liquidation Engine.
//!
//! This module loads the payroll configuration from a YAML file: the
//! standard shift length, working days per month, overtime multiplier,
//! currency rounding, and the statutory deduction rules.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/payroll.yaml").unwrap();
//! println!("Deduction rules: {}", config.config().deductions.len());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    DEFAULT_CURRENCY_SCALE, DEFAULT_HEALTH_RATE, DEFAULT_OVERTIME_MULTIPLIER, DEFAULT_PENSION_RATE,
    DEFAULT_STANDARD_SHIFT_HOURS, DEFAULT_STANDARD_WORKING_DAYS, DeductionRule, PayrollConfig,
};
