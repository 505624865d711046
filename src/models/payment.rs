//! Payment models: salary payments, provisional (pension/health) payments and
//! the details a caller supplies to pay.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::Liquidation;

/// How a salary is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paper check.
    Check,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Lowercase name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Check => "check",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "check" => Ok(PaymentMethod::Check),
            "transfer" => Ok(PaymentMethod::Transfer),
            "" => Err(EngineError::validation("method", "a payment method is required")),
            other => Err(EngineError::validation(
                "method",
                format!("unknown payment method '{}', expected check or transfer", other),
            )),
        }
    }
}

/// Caller-supplied details for paying one or many liquidations.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PaymentDetails, PaymentMethod};
///
/// let details = PaymentDetails::parse("transfer", "Banco Estado", None).unwrap();
/// assert_eq!(details.method, PaymentMethod::Transfer);
///
/// assert!(PaymentDetails::parse("cash", "Banco Estado", None).is_err());
/// assert!(PaymentDetails::parse("check", "  ", None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Payment method.
    pub method: PaymentMethod,
    /// Paying bank.
    pub bank: String,
    /// Payment date; today (UTC) when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl PaymentDetails {
    /// Creates details for an undated payment.
    pub fn new(method: PaymentMethod, bank: impl Into<String>) -> Self {
        Self {
            method,
            bank: bank.into(),
            date: None,
        }
    }

    /// Sets the payment date.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Parses raw method/bank input and validates it.
    pub fn parse(method: &str, bank: &str, date: Option<NaiveDate>) -> EngineResult<Self> {
        let details = Self {
            method: method.parse()?,
            bank: bank.trim().to_string(),
            date,
        };
        details.validate()?;
        Ok(details)
    }

    /// Checks that a bank is present.
    pub fn validate(&self) -> EngineResult<()> {
        if self.bank.trim().is_empty() {
            return Err(EngineError::validation("bank", "a bank is required"));
        }
        Ok(())
    }
}

/// The salary paid for one liquidation. Its existence witnesses that the
/// liquidation is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryPayment {
    /// Unique identifier for the payment.
    pub id: Uuid,
    /// The liquidation being paid.
    pub liquidation_id: Uuid,
    /// Paying bank.
    pub bank: String,
    /// Payment method.
    pub method: PaymentMethod,
    /// Amount paid; always the liquidation's net salary.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
}

impl SalaryPayment {
    /// Creates the payment of `liquidation`'s net salary.
    pub fn for_liquidation(liquidation: &Liquidation, details: &PaymentDetails, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            liquidation_id: liquidation.id(),
            bank: details.bank.trim().to_string(),
            method: details.method,
            amount: liquidation.net_salary(),
            date,
        }
    }
}

/// Remittance of the pension and health amounts withheld from a liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalPayment {
    /// Unique identifier for the payment.
    pub id: Uuid,
    /// The liquidation the amounts were withheld from.
    pub liquidation_id: Uuid,
    /// `YYYY-MM` label of the period the remittance belongs to.
    pub period_label: String,
    /// Pension-fund amount.
    pub pension_amount: Decimal,
    /// Health amount.
    pub health_amount: Decimal,
    /// `pension_amount + health_amount`.
    pub total: Decimal,
    /// Payment date.
    pub payment_date: NaiveDate,
}

/// Everything created by paying one liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// The liquidation, now `paid`.
    pub liquidation: Liquidation,
    /// The salary payment.
    pub salary_payment: SalaryPayment,
    /// The provisional payment.
    pub provisional_payment: ProvisionalPayment,
}
