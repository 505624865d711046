//! Provisional (pension/health) payments.
//!
//! When a liquidation is paid, the pension and health amounts withheld from
//! it are remitted to the funds as one provisional payment. This module
//! derives those records and aggregates them into periodic reports.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Deduction, HEALTH_CONCEPT, Liquidation, LiquidationStatus, PENSION_CONCEPT, PayrollPeriod,
    ProvisionalPayment, ProvisionalReport, concept_total,
};
use crate::store::{EmployeeDirectory, LiquidationStore, UnitOfWork};

/// Derives, persists and reports provisional payments.
#[derive(Clone)]
pub struct ProvisionalPaymentGenerator {
    liquidations: Arc<dyn LiquidationStore>,
    employees: Arc<dyn EmployeeDirectory>,
}

impl ProvisionalPaymentGenerator {
    /// Creates a generator reading from `liquidations` and joining through `employees`.
    pub fn new(
        liquidations: Arc<dyn LiquidationStore>,
        employees: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        Self {
            liquidations,
            employees,
        }
    }

    /// Builds the provisional payment for a liquidation from its deductions.
    ///
    /// The period label is the `YYYY-MM` of `payment_date`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the pension and health amounts sum to zero or less.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::engine::ProvisionalPaymentGenerator;
    /// use payroll_engine::models::{
    ///     AttendanceSummary, DeductionBreakdown, DeductionLine, Liquidation, PayrollPeriod,
    /// };
    /// use chrono::{NaiveDate, Utc};
    /// use rust_decimal::Decimal;
    ///
    /// let breakdown = DeductionBreakdown {
    ///     total_deductions: Decimal::new(170, 0),
    ///     details: vec![
    ///         DeductionLine { concept: "pension".into(), rate: Decimal::new(10, 2), amount: Decimal::new(100, 0) },
    ///         DeductionLine { concept: "health".into(), rate: Decimal::new(7, 2), amount: Decimal::new(70, 0) },
    ///     ],
    /// };
    /// let (liquidation, deductions) = Liquidation::pending(
    ///     "emp_001",
    ///     PayrollPeriod::new(2026, 1).unwrap(),
    ///     &AttendanceSummary::default(),
    ///     Decimal::new(1000, 0),
    ///     &breakdown,
    ///     Utc::now(),
    /// );
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
    /// let payment = ProvisionalPaymentGenerator::derive(&liquidation, &deductions, date).unwrap();
    /// assert_eq!(payment.period_label, "2026-02");
    /// assert_eq!(payment.total, Decimal::new(170, 0));
    /// ```
    pub fn derive(
        liquidation: &Liquidation,
        deductions: &[Deduction],
        payment_date: NaiveDate,
    ) -> EngineResult<ProvisionalPayment> {
        let pension_amount = concept_total(deductions, PENSION_CONCEPT);
        let health_amount = concept_total(deductions, HEALTH_CONCEPT);
        let total = pension_amount + health_amount;

        if total <= Decimal::ZERO {
            return Err(EngineError::validation(
                "deductions",
                format!(
                    "liquidation {} has no pension or health amount to remit",
                    liquidation.id()
                ),
            ));
        }

        Ok(ProvisionalPayment {
            id: Uuid::new_v4(),
            liquidation_id: liquidation.id(),
            period_label: payment_date.format("%Y-%m").to_string(),
            pension_amount,
            health_amount,
            total,
            payment_date,
        })
    }

    /// Persists the provisional payment of a paid liquidation that has none yet.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the liquidation does not exist
    /// - `Validation` if it is not paid, already has a provisional payment,
    ///   or has nothing to remit
    pub fn generate(
        &self,
        liquidation_id: Uuid,
        payment_date: NaiveDate,
    ) -> EngineResult<ProvisionalPayment> {
        let liquidation = self
            .liquidations
            .find_by_id(liquidation_id)?
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))?;

        if liquidation.status() != LiquidationStatus::Paid {
            return Err(EngineError::validation(
                "status",
                format!(
                    "provisional payments are generated for paid liquidations, {} is {}",
                    liquidation_id,
                    liquidation.status()
                ),
            ));
        }
        if self
            .liquidations
            .provisional_payment_for(liquidation_id)?
            .is_some()
        {
            return Err(EngineError::validation(
                "liquidation_id",
                format!("liquidation {} already has a provisional payment", liquidation_id),
            ));
        }

        let deductions = self.liquidations.deductions_for(liquidation_id)?;
        let payment = Self::derive(&liquidation, &deductions, payment_date)?;

        let mut unit = UnitOfWork::new();
        unit.insert_provisional_payment(payment.clone());
        self.liquidations.commit(unit)?;

        info!(
            liquidation_id = %liquidation_id,
            provisional_payment_id = %payment.id,
            total = %payment.total,
            "Provisional payment generated"
        );
        Ok(payment)
    }

    /// Totals the provisional payments dated in `period`.
    ///
    /// With `company_id`, only payments whose liquidation belongs to an
    /// employee of that company are counted.
    pub fn report_for_period(
        &self,
        period: PayrollPeriod,
        company_id: Option<&str>,
    ) -> EngineResult<ProvisionalReport> {
        let payments = self
            .liquidations
            .provisional_payments_between(period.start_date(), period.end_date())?;

        let payments = match company_id {
            Some(company_id) => self.filter_by_company(payments, company_id)?,
            None => payments,
        };

        let pension_total: Decimal = payments.iter().map(|p| p.pension_amount).sum();
        let health_total: Decimal = payments.iter().map(|p| p.health_amount).sum();
        let report = ProvisionalReport {
            period,
            company_id: company_id.map(str::to_string),
            pension_total,
            health_total,
            total: pension_total + health_total,
            payment_count: payments.len(),
        };

        info!(
            period = %period,
            company_id = company_id.unwrap_or("*"),
            payment_count = report.payment_count,
            total = %report.total,
            "Provisional report built"
        );
        Ok(report)
    }

    fn filter_by_company(
        &self,
        payments: Vec<ProvisionalPayment>,
        company_id: &str,
    ) -> EngineResult<Vec<ProvisionalPayment>> {
        // employee id -> belongs to the company
        let mut membership: HashMap<String, bool> = HashMap::new();
        let mut kept = Vec::with_capacity(payments.len());

        for payment in payments {
            let Some(liquidation) = self.liquidations.find_by_id(payment.liquidation_id)? else {
                warn!(
                    provisional_payment_id = %payment.id,
                    liquidation_id = %payment.liquidation_id,
                    "Provisional payment without liquidation"
                );
                continue;
            };

            let employee_id = liquidation.employee_id();
            let belongs = match membership.get(employee_id) {
                Some(belongs) => *belongs,
                None => {
                    let belongs = self
                        .employees
                        .find_by_id(employee_id)?
                        .is_some_and(|employee| employee.company_id == company_id);
                    membership.insert(employee_id.to_string(), belongs);
                    belongs
                }
            };

            if belongs {
                kept.push(payment);
            }
        }

        debug!(
            company_id = %company_id,
            employees = membership.len(),
            kept = kept.len(),
            "Filtered provisional payments by company"
        );
        Ok(kept)
    }
}
