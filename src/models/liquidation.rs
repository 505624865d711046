//! Liquidation model: the payroll statement for one employee and one period.
//!
//! A [`Liquidation`] is the aggregate root for its [`Deduction`]s and its
//! payment records. Its fields are private: figures are fixed at creation
//! (or by an explicit recompute while pending) and the status only moves
//! through the transition methods, each of which returns a new value and
//! leaves the original untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{AttendanceSummary, PayrollPeriod, ProvisionalPayment, SalaryPayment};

/// Concept label of the pension-fund deduction.
pub const PENSION_CONCEPT: &str = "pension";

/// Concept label of the health deduction.
pub const HEALTH_CONCEPT: &str = "health";

/// Lifecycle state of a liquidation.
///
/// `pending` → `approved` | `rejected`; `approved` → `paid`.
/// `rejected` and `paid` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidationStatus {
    /// Created, awaiting approval.
    Pending,
    /// Approved, awaiting payment.
    Approved,
    /// Rejected; voids the liquidation.
    Rejected,
    /// Paid; a salary payment exists.
    Paid,
}

impl LiquidationStatus {
    /// Lowercase name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidationStatus::Pending => "pending",
            LiquidationStatus::Approved => "approved",
            LiquidationStatus::Rejected => "rejected",
            LiquidationStatus::Paid => "paid",
        }
    }

    /// Returns true if no transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LiquidationStatus::Rejected | LiquidationStatus::Paid)
    }

    /// Returns true if a liquidation in this state no longer occupies its period.
    pub fn is_voided(&self) -> bool {
        matches!(self, LiquidationStatus::Rejected)
    }
}

impl fmt::Display for LiquidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation that changes a liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// `pending` → `approved`.
    Approve,
    /// `pending` → `rejected`.
    Reject,
    /// `approved` → `paid`.
    Pay,
    /// Replace figures and deductions while `pending`.
    Recompute,
    /// Administrative removal; refused once paid.
    Remove,
}

impl Transition {
    /// Lowercase verb for the transition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Pay => "pay",
            Transition::Recompute => "recompute",
            Transition::Remove => "remove",
        }
    }

    /// Returns true if the transition may start from `current`.
    pub fn permits(&self, current: LiquidationStatus) -> bool {
        match self {
            Transition::Approve | Transition::Reject | Transition::Recompute => {
                current == LiquidationStatus::Pending
            }
            Transition::Pay => current == LiquidationStatus::Approved,
            Transition::Remove => current != LiquidationStatus::Paid,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a computed deduction breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    /// Concept label (e.g. "pension", "health").
    pub concept: String,
    /// Rate applied to the gross salary.
    pub rate: Decimal,
    /// Rounded amount withheld.
    pub amount: Decimal,
}

/// The result of applying deduction rules to a gross salary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    /// Sum of every line amount.
    pub total_deductions: Decimal,
    /// Individual deduction lines, in rule order.
    pub details: Vec<DeductionLine>,
}

impl DeductionBreakdown {
    /// Sum of the amounts of lines with the given concept label.
    pub fn amount_for(&self, concept: &str) -> Decimal {
        self.details
            .iter()
            .filter(|line| line.concept == concept)
            .map(|line| line.amount)
            .sum()
    }
}

/// A persisted deduction line owned by a liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// Unique identifier for the deduction.
    pub id: Uuid,
    /// The owning liquidation.
    pub liquidation_id: Uuid,
    /// Concept label (e.g. "pension").
    pub concept: String,
    /// Rate that produced the amount.
    pub rate: Decimal,
    /// Amount withheld.
    pub amount: Decimal,
}

/// Sum of a set of persisted deductions for one concept.
pub fn concept_total(deductions: &[Deduction], concept: &str) -> Decimal {
    deductions
        .iter()
        .filter(|d| d.concept == concept)
        .map(|d| d.amount)
        .sum()
}

/// A payroll statement for one employee covering one period.
///
/// Deserialization goes through the same checks as construction: figures
/// must be non-negative, `net_salary` must equal `gross_salary -
/// total_deductions`, and the audit fields must match the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LiquidationRecord")]
pub struct Liquidation {
    id: Uuid,
    employee_id: String,
    period: PayrollPeriod,
    status: LiquidationStatus,
    days_worked: u32,
    regular_hours: Decimal,
    overtime_hours: Decimal,
    gross_salary: Decimal,
    total_deductions: Decimal,
    net_salary: Decimal,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    rejected_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

/// Unchecked wire form of a [`Liquidation`].
#[derive(Deserialize)]
struct LiquidationRecord {
    id: Uuid,
    employee_id: String,
    period: PayrollPeriod,
    status: LiquidationStatus,
    days_worked: u32,
    regular_hours: Decimal,
    overtime_hours: Decimal,
    gross_salary: Decimal,
    total_deductions: Decimal,
    net_salary: Decimal,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    rejected_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LiquidationRecord> for Liquidation {
    type Error = EngineError;

    fn try_from(record: LiquidationRecord) -> Result<Self, Self::Error> {
        for (field, value) in [
            ("regular_hours", record.regular_hours),
            ("overtime_hours", record.overtime_hours),
            ("gross_salary", record.gross_salary),
            ("total_deductions", record.total_deductions),
        ] {
            if value < Decimal::ZERO {
                return Err(EngineError::validation(
                    field,
                    format!("must not be negative, got {}", value),
                ));
            }
        }
        if record.gross_salary.checked_sub(record.total_deductions) != Some(record.net_salary) {
            return Err(EngineError::validation(
                "net_salary",
                format!(
                    "{} is not gross {} minus deductions {}",
                    record.net_salary, record.gross_salary, record.total_deductions
                ),
            ));
        }

        let approved = record.approved_by.is_some() && record.approved_at.is_some();
        let rejected = record.rejection_reason.is_some() && record.rejected_at.is_some();
        let paid = record.paid_at.is_some();
        let consistent = match record.status {
            LiquidationStatus::Pending => {
                record.approved_at.is_none() && record.rejected_at.is_none() && !paid
            }
            LiquidationStatus::Approved => approved && record.rejected_at.is_none() && !paid,
            LiquidationStatus::Rejected => rejected && record.approved_at.is_none() && !paid,
            LiquidationStatus::Paid => approved && record.rejected_at.is_none() && paid,
        };
        if !consistent {
            return Err(EngineError::validation(
                "status",
                format!("audit fields do not match status {}", record.status),
            ));
        }

        Ok(Self {
            id: record.id,
            employee_id: record.employee_id,
            period: record.period,
            status: record.status,
            days_worked: record.days_worked,
            regular_hours: record.regular_hours,
            overtime_hours: record.overtime_hours,
            gross_salary: record.gross_salary,
            total_deductions: record.total_deductions,
            net_salary: record.net_salary,
            approved_by: record.approved_by,
            approved_at: record.approved_at,
            rejection_reason: record.rejection_reason,
            rejected_at: record.rejected_at,
            paid_at: record.paid_at,
            created_at: record.created_at,
        })
    }
}

impl Liquidation {
    /// Creates a pending liquidation together with its deduction records.
    ///
    /// `net_salary` is derived as `gross_salary - breakdown.total_deductions`.
    pub fn pending(
        employee_id: impl Into<String>,
        period: PayrollPeriod,
        summary: &AttendanceSummary,
        gross_salary: Decimal,
        breakdown: &DeductionBreakdown,
        now: DateTime<Utc>,
    ) -> (Self, Vec<Deduction>) {
        let liquidation = Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            period,
            status: LiquidationStatus::Pending,
            days_worked: summary.days_worked,
            regular_hours: summary.regular_hours,
            overtime_hours: summary.overtime_hours,
            gross_salary,
            total_deductions: breakdown.total_deductions,
            net_salary: gross_salary - breakdown.total_deductions,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            rejected_at: None,
            paid_at: None,
            created_at: now,
        };
        let deductions = liquidation.deduction_records(breakdown);
        (liquidation, deductions)
    }

    fn deduction_records(&self, breakdown: &DeductionBreakdown) -> Vec<Deduction> {
        breakdown
            .details
            .iter()
            .map(|line| Deduction {
                id: Uuid::new_v4(),
                liquidation_id: self.id,
                concept: line.concept.clone(),
                rate: line.rate,
                amount: line.amount,
            })
            .collect()
    }

    /// Unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The employee this liquidation pays.
    pub fn employee_id(&self) -> &str {
        &self.employee_id
    }

    /// The period covered.
    pub fn period(&self) -> PayrollPeriod {
        self.period
    }

    /// Current lifecycle state.
    pub fn status(&self) -> LiquidationStatus {
        self.status
    }

    /// Distinct dates worked in the period.
    pub fn days_worked(&self) -> u32 {
        self.days_worked
    }

    /// Regular hours worked in the period.
    pub fn regular_hours(&self) -> Decimal {
        self.regular_hours
    }

    /// Overtime hours worked in the period.
    pub fn overtime_hours(&self) -> Decimal {
        self.overtime_hours
    }

    /// Gross salary.
    pub fn gross_salary(&self) -> Decimal {
        self.gross_salary
    }

    /// Sum of all deductions.
    pub fn total_deductions(&self) -> Decimal {
        self.total_deductions
    }

    /// Net salary (gross minus deductions).
    pub fn net_salary(&self) -> Decimal {
        self.net_salary
    }

    /// Who approved the liquidation, if approved.
    pub fn approved_by(&self) -> Option<&str> {
        self.approved_by.as_deref()
    }

    /// When the liquidation was approved.
    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    /// Why the liquidation was rejected, if rejected.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// When the liquidation was rejected.
    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    /// When the liquidation was paid.
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// When the liquidation was generated.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Fails with `InvalidState` unless `transition` may start from the current state.
    pub fn ensure_can(&self, transition: Transition) -> EngineResult<()> {
        if transition.permits(self.status) {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                liquidation_id: self.id,
                current: self.status,
                attempted: transition,
            })
        }
    }

    /// Returns true if the stored deductions agree with the liquidation totals.
    pub fn is_consistent_with(&self, deductions: &[Deduction]) -> bool {
        let sum: Decimal = deductions.iter().map(|d| d.amount).sum();
        sum == self.total_deductions
            && self.net_salary == self.gross_salary - self.total_deductions
            && deductions.iter().all(|d| d.liquidation_id == self.id)
    }

    /// Approves a pending liquidation.
    pub fn approve(&self, approver_id: &str, at: DateTime<Utc>) -> EngineResult<Self> {
        let approver_id = approver_id.trim();
        if approver_id.is_empty() {
            return Err(EngineError::validation("approver_id", "an approver is required"));
        }
        self.ensure_can(Transition::Approve)?;

        let mut next = self.clone();
        next.status = LiquidationStatus::Approved;
        next.approved_by = Some(approver_id.to_string());
        next.approved_at = Some(at);
        Ok(next)
    }

    /// Rejects a pending liquidation. The reason is mandatory.
    pub fn reject(&self, reason: &str, at: DateTime<Utc>) -> EngineResult<Self> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EngineError::validation("reason", "a rejection reason is required"));
        }
        self.ensure_can(Transition::Reject)?;

        let mut next = self.clone();
        next.status = LiquidationStatus::Rejected;
        next.rejection_reason = Some(reason.to_string());
        next.rejected_at = Some(at);
        Ok(next)
    }

    /// Marks an approved liquidation as paid.
    pub fn mark_paid(&self, at: DateTime<Utc>) -> EngineResult<Self> {
        self.ensure_can(Transition::Pay)?;

        let mut next = self.clone();
        next.status = LiquidationStatus::Paid;
        next.paid_at = Some(at);
        Ok(next)
    }

    /// Replaces the figures of a pending liquidation, returning fresh deduction records.
    pub fn recompute(
        &self,
        summary: &AttendanceSummary,
        gross_salary: Decimal,
        breakdown: &DeductionBreakdown,
    ) -> EngineResult<(Self, Vec<Deduction>)> {
        self.ensure_can(Transition::Recompute)?;

        let mut next = self.clone();
        next.days_worked = summary.days_worked;
        next.regular_hours = summary.regular_hours;
        next.overtime_hours = summary.overtime_hours;
        next.gross_salary = gross_salary;
        next.total_deductions = breakdown.total_deductions;
        next.net_salary = gross_salary - breakdown.total_deductions;
        let deductions = next.deduction_records(breakdown);
        Ok((next, deductions))
    }
}

/// A liquidation with everything it owns, as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationDetail {
    /// The liquidation itself.
    pub liquidation: Liquidation,
    /// Its deduction lines.
    pub deductions: Vec<Deduction>,
    /// The salary payment, once paid.
    pub salary_payment: Option<SalaryPayment>,
    /// The provisional (pension/health) payment, once paid.
    pub provisional_payment: Option<ProvisionalPayment>,
}
