//! The Payroll Liquidation Engine.
//!
//! [`PayrollEngine`] is the entry point for outer layers. It wires the
//! components together from one validated [`PayrollConfig`] and the
//! injected [`Collaborators`]:
//!
//! - [`AttendanceAggregator`]: attendance into worked days and hours
//! - [`LiquidationGenerator`]: pending liquidations from attendance
//! - [`LiquidationStateMachine`]: approval and rejection
//! - [`PaymentProcessor`]: single and batch payment
//! - [`ProvisionalPaymentGenerator`]: pension/health remittances and reports
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use payroll_engine::config::PayrollConfig;
//! use payroll_engine::engine::{Collaborators, PayrollEngine};
//! use payroll_engine::models::{Employee, PayrollPeriod};
//! use payroll_engine::notify::LogNotifier;
//! use payroll_engine::store::{
//!     InMemoryAttendanceStore, InMemoryEmployeeDirectory, InMemoryLiquidationStore,
//! };
//! use rust_decimal::Decimal;
//!
//! let employees = InMemoryEmployeeDirectory::with_employees(vec![Employee {
//!     id: "emp_001".to_string(),
//!     company_id: "acme".to_string(),
//!     name: "Ana".to_string(),
//!     base_salary: Decimal::new(1_000_000, 0),
//! }]);
//! let engine = PayrollEngine::new(
//!     PayrollConfig::default(),
//!     Collaborators {
//!         employees: Arc::new(employees),
//!         attendance: Arc::new(InMemoryAttendanceStore::new()),
//!         liquidations: Arc::new(InMemoryLiquidationStore::new()),
//!         notifier: Arc::new(LogNotifier),
//!     },
//! )
//! .unwrap();
//!
//! let period = PayrollPeriod::new(2026, 1).unwrap();
//! let liquidation = engine.generate_liquidation("emp_001", period).unwrap();
//! let approved = engine.approve(liquidation.id(), "hr_001").unwrap();
//! assert_eq!(approved.status().as_str(), "approved");
//! ```

mod aggregator;
mod generator;
mod payment;
mod provisional;
mod state_machine;

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ConfigLoader, PayrollConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    BatchPaymentReport, GenerationReport, Liquidation, LiquidationDetail, PaymentDetails,
    PaymentReceipt, PayrollPeriod, ProvisionalPayment, ProvisionalReport, Transition,
};
use crate::notify::Notifier;
use crate::store::{AttendanceStore, EmployeeDirectory, LiquidationStore, UnitOfWork};

pub use aggregator::AttendanceAggregator;
pub use generator::LiquidationGenerator;
pub use payment::PaymentProcessor;
pub use provisional::ProvisionalPaymentGenerator;
pub use state_machine::LiquidationStateMachine;

/// External collaborators the engine depends on.
#[derive(Clone)]
pub struct Collaborators {
    /// Employee directory.
    pub employees: Arc<dyn EmployeeDirectory>,
    /// Attendance records.
    pub attendance: Arc<dyn AttendanceStore>,
    /// Liquidations, deductions and payments.
    pub liquidations: Arc<dyn LiquidationStore>,
    /// Employee notification sink.
    pub notifier: Arc<dyn Notifier>,
}

/// Facade over every payroll operation.
#[derive(Clone)]
pub struct PayrollEngine {
    config: Arc<PayrollConfig>,
    liquidations: Arc<dyn LiquidationStore>,
    generator: LiquidationGenerator,
    state_machine: LiquidationStateMachine,
    payments: PaymentProcessor,
    provisional: ProvisionalPaymentGenerator,
}

impl PayrollEngine {
    /// Builds an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is inconsistent.
    pub fn new(config: PayrollConfig, collaborators: Collaborators) -> EngineResult<Self> {
        let config = Arc::new(ConfigLoader::from_config(config)?.into_config());
        let Collaborators {
            employees,
            attendance,
            liquidations,
            notifier,
        } = collaborators;

        Ok(Self {
            generator: LiquidationGenerator::new(
                config.clone(),
                employees.clone(),
                attendance,
                liquidations.clone(),
            ),
            state_machine: LiquidationStateMachine::new(liquidations.clone(), notifier.clone()),
            payments: PaymentProcessor::new(liquidations.clone(), notifier),
            provisional: ProvisionalPaymentGenerator::new(liquidations.clone(), employees),
            liquidations,
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// The attendance aggregator.
    pub fn aggregator(&self) -> &AttendanceAggregator {
        self.generator.aggregator()
    }

    /// Generates the pending liquidation of an employee for a period.
    pub fn generate_liquidation(
        &self,
        employee_id: &str,
        period: PayrollPeriod,
    ) -> EngineResult<Liquidation> {
        self.generator.generate(employee_id, period)
    }

    /// Generates liquidations for every employee of a company.
    pub fn generate_liquidations_for_company(
        &self,
        company_id: &str,
        period: PayrollPeriod,
    ) -> EngineResult<GenerationReport> {
        self.generator.generate_for_company(company_id, period)
    }

    /// Recomputes a pending liquidation.
    pub fn recompute(&self, liquidation_id: Uuid) -> EngineResult<Liquidation> {
        self.generator.recompute(liquidation_id)
    }

    /// Approves a pending liquidation.
    pub fn approve(&self, liquidation_id: Uuid, approver_id: &str) -> EngineResult<Liquidation> {
        self.state_machine.approve(liquidation_id, approver_id)
    }

    /// Rejects a pending liquidation.
    pub fn reject(&self, liquidation_id: Uuid, reason: &str) -> EngineResult<Liquidation> {
        self.state_machine.reject(liquidation_id, reason)
    }

    /// Pays an approved liquidation.
    pub fn pay(&self, liquidation_id: Uuid, details: &PaymentDetails) -> EngineResult<PaymentReceipt> {
        self.payments.pay(liquidation_id, details)
    }

    /// Pays several approved liquidations as one payroll run.
    pub fn pay_batch(
        &self,
        liquidation_ids: &[Uuid],
        details: &PaymentDetails,
    ) -> EngineResult<BatchPaymentReport> {
        self.payments.pay_batch(liquidation_ids, details)
    }

    /// Persists the provisional payment of a paid liquidation that lacks one.
    pub fn generate_provisional_payment(
        &self,
        liquidation_id: Uuid,
        payment_date: NaiveDate,
    ) -> EngineResult<ProvisionalPayment> {
        self.provisional.generate(liquidation_id, payment_date)
    }

    /// Provisional payment totals for a period, optionally for one company.
    pub fn provisional_report(
        &self,
        period: PayrollPeriod,
        company_id: Option<&str>,
    ) -> EngineResult<ProvisionalReport> {
        self.provisional.report_for_period(period, company_id)
    }

    /// A liquidation with its deductions and payments, as stored.
    pub fn liquidation(&self, liquidation_id: Uuid) -> EngineResult<LiquidationDetail> {
        let liquidation = self.load(liquidation_id)?;
        let deductions = self.liquidations.deductions_for(liquidation_id)?;

        if !liquidation.is_consistent_with(&deductions) {
            warn!(
                liquidation_id = %liquidation_id,
                total_deductions = %liquidation.total_deductions(),
                lines = deductions.len(),
                "Stored deductions disagree with liquidation totals"
            );
        }

        Ok(LiquidationDetail {
            salary_payment: self.liquidations.salary_payment_for(liquidation_id)?,
            provisional_payment: self.liquidations.provisional_payment_for(liquidation_id)?,
            liquidation,
            deductions,
        })
    }

    /// Removes a liquidation and everything it owns.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the liquidation does not exist
    /// - `InvalidState` if it is paid
    pub fn remove_liquidation(&self, liquidation_id: Uuid) -> EngineResult<()> {
        let liquidation = self.load(liquidation_id)?;
        liquidation.ensure_can(Transition::Remove)?;

        let mut unit = UnitOfWork::new();
        unit.remove_liquidation(liquidation_id, liquidation.status());
        self.liquidations.commit(unit)?;

        info!(
            liquidation_id = %liquidation_id,
            employee_id = %liquidation.employee_id(),
            status = %liquidation.status(),
            "Liquidation removed"
        );
        Ok(())
    }

    fn load(&self, liquidation_id: Uuid) -> EngineResult<Liquidation> {
        self.liquidations
            .find_by_id(liquidation_id)?
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))
    }
}
