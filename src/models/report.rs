//! Result models for bulk operations and periodic reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, ErrorKind};

use super::{Liquidation, PayrollPeriod};

/// One liquidation paid by a batch payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSuccess {
    /// The liquidation paid.
    pub liquidation_id: Uuid,
    /// The salary payment created.
    pub salary_payment_id: Uuid,
    /// The provisional payment created.
    pub provisional_payment_id: Uuid,
    /// Net salary paid.
    pub amount: Decimal,
}

/// One liquidation a batch payment could not pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// The liquidation that failed.
    pub liquidation_id: Uuid,
    /// Stable error kind.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub reason: String,
}

impl BatchFailure {
    /// Records `error` as the failure of `liquidation_id`.
    pub fn from_error(liquidation_id: Uuid, error: &EngineError) -> Self {
        Self {
            liquidation_id,
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// Outcome of a batch payment that committed at least one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPaymentReport {
    /// Items paid, in request order.
    pub succeeded: Vec<BatchSuccess>,
    /// Items not paid, in request order.
    pub failed: Vec<BatchFailure>,
    /// Sum of the net salaries paid.
    pub total_amount: Decimal,
}

impl BatchPaymentReport {
    /// Number of items processed.
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Ids of the liquidations paid.
    pub fn succeeded_ids(&self) -> Vec<Uuid> {
        self.succeeded.iter().map(|s| s.liquidation_id).collect()
    }

    /// Ids of the liquidations not paid.
    pub fn failed_ids(&self) -> Vec<Uuid> {
        self.failed.iter().map(|f| f.liquidation_id).collect()
    }
}

/// One employee for whom bulk generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    /// The employee.
    pub employee_id: String,
    /// Stable error kind.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub reason: String,
}

/// Outcome of generating liquidations for every employee of a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Liquidations created.
    pub succeeded: Vec<Liquidation>,
    /// Employees skipped, with the reason.
    pub failed: Vec<GenerationFailure>,
}

impl GenerationReport {
    /// Number of employees processed.
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Provisional payment totals for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalReport {
    /// The period reported on.
    pub period: PayrollPeriod,
    /// Company scope, if the report was filtered.
    pub company_id: Option<String>,
    /// Sum of pension amounts.
    pub pension_total: Decimal,
    /// Sum of health amounts.
    pub health_total: Decimal,
    /// `pension_total + health_total`.
    pub total: Decimal,
    /// Number of provisional payments aggregated.
    pub payment_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_failure_from_error() {
        let id = Uuid::new_v4();
        let error = EngineError::validation("bank", "a bank is required");
        let failure = BatchFailure::from_error(id, &error);

        assert_eq!(failure.liquidation_id, id);
        assert_eq!(failure.kind, ErrorKind::Validation);
        assert_eq!(failure.reason, "Invalid field 'bank': a bank is required");
    }

    #[test]
    fn test_batch_report_counts() {
        let paid = Uuid::new_v4();
        let unpaid = Uuid::new_v4();
        let report = BatchPaymentReport {
            succeeded: vec![BatchSuccess {
                liquidation_id: paid,
                salary_payment_id: Uuid::new_v4(),
                provisional_payment_id: Uuid::new_v4(),
                amount: Decimal::new(830_000, 0),
            }],
            failed: vec![BatchFailure {
                liquidation_id: unpaid,
                kind: ErrorKind::InvalidState,
                reason: "not approved".to_string(),
            }],
            total_amount: Decimal::new(830_000, 0),
        };

        assert_eq!(report.processed(), 2);
        assert_eq!(report.succeeded_ids(), vec![paid]);
        assert_eq!(report.failed_ids(), vec![unpaid]);
    }

    #[test]
    fn test_batch_failure_serialization() {
        let failure = BatchFailure {
            liquidation_id: Uuid::nil(),
            kind: ErrorKind::InvalidState,
            reason: "not approved".to_string(),
        };
        let json = serde_json::to_string(&failure).unwrap();
        assert!(json.contains("\"kind\":\"INVALID_STATE\""));
    }
}
