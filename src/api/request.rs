//! Request types for the Payroll Liquidation Engine API.
//!
//! This module defines the JSON bodies and query strings accepted by the
//! endpoints, and their conversions into engine inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PaymentDetails, PayrollPeriod};

/// Request body for `POST /liquidations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLiquidationRequest {
    /// The employee to liquidate.
    pub employee_id: String,
    /// The period, as `YYYY-MM`.
    pub period: PayrollPeriod,
}

/// Request body for `POST /companies/:company_id/liquidations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyGenerationRequest {
    /// The period, as `YYYY-MM`.
    pub period: PayrollPeriod,
}

/// Request body for `POST /liquidations/:id/approve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// Who approves the liquidation.
    pub approver_id: String,
}

/// Request body for `POST /liquidations/:id/reject`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    /// Why the liquidation is rejected. Blank reasons are refused by the engine.
    #[serde(default)]
    pub reason: String,
}

/// Request body for `POST /liquidations/:id/pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// `check` or `transfer`.
    pub method: String,
    /// Paying bank.
    pub bank: String,
    /// Payment date; today (UTC) when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Request body for `POST /payments/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPaymentRequest {
    /// Liquidations to pay, in order.
    pub liquidation_ids: Vec<Uuid>,
    /// Payment details shared by every item.
    #[serde(flatten)]
    pub payment: PaymentRequest,
}

/// Request body for `POST /liquidations/:id/provisional-payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionalPaymentRequest {
    /// Payment date of the remittance.
    pub date: NaiveDate,
}

/// Query string for `GET /reports/provisional`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionalReportQuery {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Restrict to one company.
    #[serde(default)]
    pub company_id: Option<String>,
}

impl ProvisionalReportQuery {
    /// The requested period.
    pub fn period(&self) -> EngineResult<PayrollPeriod> {
        PayrollPeriod::new(self.year, self.month)
    }
}

impl TryFrom<PaymentRequest> for PaymentDetails {
    type Error = EngineError;

    fn try_from(req: PaymentRequest) -> Result<Self, Self::Error> {
        PaymentDetails::parse(&req.method, &req.bank, req.date)
    }
}
