//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the payroll
//! configuration from a YAML file and checking it before use.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{HEALTH_CONCEPT, PENSION_CONCEPT};

use super::types::PayrollConfig;

const MAX_CURRENCY_SCALE: u32 = 8;

/// Loads and provides access to the payroll configuration.
///
/// # File Format
///
/// ```text
/// standard_shift_hours: 8
/// standard_working_days: 20
/// overtime_multiplier: 1.5
/// currency_scale: 2
/// deductions:
///   - concept: pension
///     rate: 0.10
///   - concept: health
///     rate: 0.07
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/payroll.yaml").unwrap();
/// println!("Shift length: {}h", loader.config().standard_shift_hours);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config: PayrollConfig::default(),
        }
    }
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file contains invalid YAML (`ConfigParseError`)
    /// - The values are inconsistent (`InvalidConfig`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::from_yaml_str(&content, &path_str)
    }

    /// Parses configuration from YAML text. `origin` names the source in errors.
    pub fn from_yaml_str(content: &str, origin: &str) -> EngineResult<Self> {
        let config: PayrollConfig =
            serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        Self::from_config(config)
    }

    /// Wraps an already-built configuration after validating it.
    pub fn from_config(config: PayrollConfig) -> EngineResult<Self> {
        validate(&config)?;
        Ok(Self { config })
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> PayrollConfig {
        self.config
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig {
        message: message.into(),
    }
}

fn validate(config: &PayrollConfig) -> EngineResult<()> {
    if config.standard_shift_hours <= Decimal::ZERO {
        return Err(invalid("standard_shift_hours must be positive"));
    }
    if config.standard_working_days == 0 {
        return Err(invalid("standard_working_days must be positive"));
    }
    if config.overtime_multiplier < Decimal::ONE {
        return Err(invalid("overtime_multiplier must be at least 1"));
    }
    if config.currency_scale > MAX_CURRENCY_SCALE {
        return Err(invalid(format!(
            "currency_scale must be at most {}",
            MAX_CURRENCY_SCALE
        )));
    }

    let mut seen = HashSet::new();
    for rule in &config.deductions {
        if rule.concept.trim().is_empty() {
            return Err(invalid("deduction concept must not be blank"));
        }
        if !seen.insert(rule.concept.as_str()) {
            return Err(invalid(format!("duplicate deduction concept '{}'", rule.concept)));
        }
        if rule.rate < Decimal::ZERO || rule.rate > Decimal::ONE {
            return Err(invalid(format!(
                "deduction rate for '{}' must be between 0 and 1, got {}",
                rule.concept, rule.rate
            )));
        }
    }

    for required in [PENSION_CONCEPT, HEALTH_CONCEPT] {
        if config.rule(required).is_none() {
            return Err(invalid(format!("missing '{}' deduction rule", required)));
        }
    }

    if config.total_deduction_rate() > Decimal::ONE {
        return Err(invalid("deduction rates add up to more than 100%"));
    }

    Ok(())
}
