//! Liquidation generation.
//!
//! Creates pending liquidations from attendance, either for one employee or
//! for every employee of a company, and recomputes pending ones.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{DeductionCalculator, calculate_gross_salary};
use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceSummary, DeductionBreakdown, Employee, EmployeeFilter, GenerationFailure,
    GenerationReport, Liquidation, LiquidationStatus, PayrollPeriod, Transition,
};
use crate::store::{AttendanceStore, EmployeeDirectory, LiquidationStore, UnitOfWork};

use super::aggregator::AttendanceAggregator;

struct Figures {
    summary: AttendanceSummary,
    gross_salary: Decimal,
    breakdown: DeductionBreakdown,
}

/// Builds liquidations from employee data and attendance.
#[derive(Clone)]
pub struct LiquidationGenerator {
    employees: Arc<dyn EmployeeDirectory>,
    liquidations: Arc<dyn LiquidationStore>,
    aggregator: AttendanceAggregator,
    deductions: DeductionCalculator,
    config: Arc<PayrollConfig>,
}

impl LiquidationGenerator {
    /// Creates a generator. `config` is expected to be validated.
    pub fn new(
        config: Arc<PayrollConfig>,
        employees: Arc<dyn EmployeeDirectory>,
        attendance: Arc<dyn AttendanceStore>,
        liquidations: Arc<dyn LiquidationStore>,
    ) -> Self {
        Self {
            employees,
            liquidations,
            aggregator: AttendanceAggregator::new(attendance, config.standard_shift_hours),
            deductions: DeductionCalculator::from_config(&config),
            config,
        }
    }

    /// The attendance aggregator used for generation.
    pub fn aggregator(&self) -> &AttendanceAggregator {
        &self.aggregator
    }

    /// Generates the pending liquidation of one employee for one period.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the employee does not exist
    /// - `DuplicatePeriod` if a non-voided liquidation already covers the period,
    ///   including one committed concurrently
    /// - `Storage` on collaborator failure; nothing is persisted
    pub fn generate(&self, employee_id: &str, period: PayrollPeriod) -> EngineResult<Liquidation> {
        let employee = self.employee(employee_id)?;

        if let Some(existing) = self.liquidations.find_active(&employee.id, period)? {
            warn!(
                employee_id = %employee.id,
                period = %period,
                existing_id = %existing.id(),
                "Liquidation already exists for period"
            );
            return Err(EngineError::DuplicatePeriod {
                employee_id: employee.id,
                period: period.label(),
            });
        }

        let figures = self.compute(&employee, period)?;
        let (liquidation, deductions) = Liquidation::pending(
            employee.id.as_str(),
            period,
            &figures.summary,
            figures.gross_salary,
            &figures.breakdown,
            Utc::now(),
        );

        let mut unit = UnitOfWork::new();
        unit.insert_liquidation(liquidation.clone(), deductions);
        self.liquidations.commit(unit)?;

        info!(
            liquidation_id = %liquidation.id(),
            employee_id = %employee.id,
            period = %period,
            days_worked = liquidation.days_worked(),
            gross_salary = %liquidation.gross_salary(),
            net_salary = %liquidation.net_salary(),
            "Liquidation generated"
        );
        Ok(liquidation)
    }

    /// Generates liquidations for every employee of a company.
    ///
    /// Employees are processed independently; a failure for one is recorded
    /// in the report and does not affect the others.
    pub fn generate_for_company(
        &self,
        company_id: &str,
        period: PayrollPeriod,
    ) -> EngineResult<GenerationReport> {
        let employees = self.employees.find(&EmployeeFilter::company(company_id))?;
        let mut report = GenerationReport::default();

        for employee in employees {
            match self.generate(&employee.id, period) {
                Ok(liquidation) => report.succeeded.push(liquidation),
                Err(err) => {
                    warn!(
                        employee_id = %employee.id,
                        period = %period,
                        error = %err,
                        "Skipping employee in company generation"
                    );
                    report.failed.push(GenerationFailure {
                        employee_id: employee.id,
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            company_id = %company_id,
            period = %period,
            processed = report.processed(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Company generation completed"
        );
        Ok(report)
    }

    /// Recomputes a pending liquidation from current attendance and base salary.
    ///
    /// Figures and deduction lines are replaced in one commit, conditional on
    /// the liquidation still being pending.
    pub fn recompute(&self, liquidation_id: Uuid) -> EngineResult<Liquidation> {
        let current = self
            .liquidations
            .find_by_id(liquidation_id)?
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))?;
        current.ensure_can(Transition::Recompute)?;

        let employee = self.employee(current.employee_id())?;
        let figures = self.compute(&employee, current.period())?;
        let (updated, deductions) =
            current.recompute(&figures.summary, figures.gross_salary, &figures.breakdown)?;

        let mut unit = UnitOfWork::new();
        unit.update_liquidation(
            updated.clone(),
            LiquidationStatus::Pending,
            Transition::Recompute,
        );
        unit.replace_deductions(liquidation_id, deductions);
        self.liquidations.commit(unit)?;

        info!(
            liquidation_id = %liquidation_id,
            previous_net = %current.net_salary(),
            net_salary = %updated.net_salary(),
            "Liquidation recomputed"
        );
        Ok(updated)
    }

    fn employee(&self, employee_id: &str) -> EngineResult<Employee> {
        self.employees
            .find_by_id(employee_id)?
            .ok_or_else(|| EngineError::not_found("employee", employee_id))
    }

    fn compute(&self, employee: &Employee, period: PayrollPeriod) -> EngineResult<Figures> {
        let summary = self.aggregator.aggregate(&employee.id, period)?;
        let gross = calculate_gross_salary(employee.base_salary, &summary, &self.config)?;
        let breakdown = self.deductions.calculate(gross.gross_salary)?;

        Ok(Figures {
            summary,
            gross_salary: gross.gross_salary,
            breakdown,
        })
    }
}
