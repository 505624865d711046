//! Storage collaborators for the Payroll Liquidation Engine.
//!
//! The engine never talks to a database directly. It reads through three
//! object-safe traits and writes through [`LiquidationStore::commit`], which
//! takes a whole [`UnitOfWork`] at once. In-memory implementations back the
//! tests, benchmarks and the HTTP adapter.

mod memory;
mod unit_of_work;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AttendanceRecord, Deduction, Employee, EmployeeFilter, Liquidation, PayrollPeriod,
    ProvisionalPayment, SalaryPayment,
};

pub use memory::{InMemoryAttendanceStore, InMemoryEmployeeDirectory, InMemoryLiquidationStore};
pub use unit_of_work::{UnitOfWork, Write};

/// Read access to employees.
pub trait EmployeeDirectory: Send + Sync {
    /// Looks up one employee.
    fn find_by_id(&self, employee_id: &str) -> EngineResult<Option<Employee>>;

    /// Lists employees matching `filter`, ordered by id.
    fn find(&self, filter: &EmployeeFilter) -> EngineResult<Vec<Employee>>;
}

/// Read access to attendance records.
pub trait AttendanceStore: Send + Sync {
    /// Records of one employee whose date falls in `from..=to`, ordered by date.
    fn find_by_employee_and_date_range(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>>;
}

/// Liquidations, their deductions and payments.
pub trait LiquidationStore: Send + Sync {
    /// Looks up one liquidation.
    fn find_by_id(&self, liquidation_id: Uuid) -> EngineResult<Option<Liquidation>>;

    /// The non-voided liquidation of an employee for a period, if any.
    fn find_active(
        &self,
        employee_id: &str,
        period: PayrollPeriod,
    ) -> EngineResult<Option<Liquidation>>;

    /// Deduction lines of a liquidation.
    fn deductions_for(&self, liquidation_id: Uuid) -> EngineResult<Vec<Deduction>>;

    /// Salary payment of a liquidation, once paid.
    fn salary_payment_for(&self, liquidation_id: Uuid) -> EngineResult<Option<SalaryPayment>>;

    /// Provisional payment of a liquidation, once paid.
    fn provisional_payment_for(
        &self,
        liquidation_id: Uuid,
    ) -> EngineResult<Option<ProvisionalPayment>>;

    /// Provisional payments dated in `from..=to`.
    fn provisional_payments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ProvisionalPayment>>;

    /// Applies every write of `unit`, or none of them.
    ///
    /// Conditional writes are re-checked against the stored state:
    /// a status mismatch fails with `InvalidState`, and a second non-voided
    /// liquidation for one employee and period fails with `DuplicatePeriod`.
    fn commit(&self, unit: UnitOfWork) -> EngineResult<()>;
}
