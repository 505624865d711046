//! In-memory storage.
//!
//! Intended for tests, benchmarks and the demo HTTP adapter. Each store
//! guards its data with one `RwLock`; a poisoned lock surfaces as a
//! `Storage` error rather than a panic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, Deduction, Employee, EmployeeFilter, EmployeePatch, Liquidation,
    PayrollPeriod, ProvisionalPayment, SalaryPayment, Transition,
};

use super::unit_of_work::{UnitOfWork, Write};
use super::{AttendanceStore, EmployeeDirectory, LiquidationStore};

fn read<T>(lock: &RwLock<T>) -> EngineResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| EngineError::storage("lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> EngineResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| EngineError::storage("lock poisoned"))
}

// ============================================================================
// Employees
// ============================================================================

/// In-memory employee directory, ordered by employee id.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: RwLock<BTreeMap<String, Employee>>,
}

impl InMemoryEmployeeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory holding `employees`.
    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let employees = employees
            .into_iter()
            .map(|employee| (employee.id.clone(), employee))
            .collect();
        Self {
            employees: RwLock::new(employees),
        }
    }

    /// Adds an employee. Fails with `Validation` if the id is taken.
    pub fn insert(&self, employee: Employee) -> EngineResult<()> {
        if employee.base_salary.is_sign_negative() {
            return Err(EngineError::validation(
                "base_salary",
                format!("must not be negative, got {}", employee.base_salary),
            ));
        }

        let mut employees = write(&self.employees)?;
        if employees.contains_key(&employee.id) {
            return Err(EngineError::validation(
                "id",
                format!("employee '{}' already exists", employee.id),
            ));
        }
        employees.insert(employee.id.clone(), employee);
        Ok(())
    }

    /// Applies `patch` to an employee atomically and returns the updated record.
    pub fn update(&self, employee_id: &str, patch: &EmployeePatch) -> EngineResult<Employee> {
        let mut employees = write(&self.employees)?;
        let current = employees
            .get(employee_id)
            .ok_or_else(|| EngineError::not_found("employee", employee_id))?;

        let updated = patch.apply(current)?;
        employees.insert(employee_id.to_string(), updated.clone());
        Ok(updated)
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn find_by_id(&self, employee_id: &str) -> EngineResult<Option<Employee>> {
        Ok(read(&self.employees)?.get(employee_id).cloned())
    }

    fn find(&self, filter: &EmployeeFilter) -> EngineResult<Vec<Employee>> {
        Ok(read(&self.employees)?
            .values()
            .filter(|employee| filter.matches(employee))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Attendance
// ============================================================================

/// In-memory attendance store holding at most one record per employee and date.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    records: RwLock<BTreeMap<(String, NaiveDate), AttendanceRecord>>,
}

impl InMemoryAttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record. Fails with `Validation` if the employee already has one that date.
    pub fn insert(&self, record: AttendanceRecord) -> EngineResult<()> {
        let mut records = write(&self.records)?;
        let key = (record.employee_id.clone(), record.date);
        if records.contains_key(&key) {
            return Err(EngineError::validation(
                "date",
                format!(
                    "attendance already recorded for employee '{}' on {}",
                    record.employee_id, record.date
                ),
            ));
        }
        records.insert(key, record);
        Ok(())
    }

    /// Adds several records, stopping at the first rejected one.
    pub fn insert_all(&self, records: impl IntoIterator<Item = AttendanceRecord>) -> EngineResult<()> {
        records.into_iter().try_for_each(|record| self.insert(record))
    }
}

impl AttendanceStore for InMemoryAttendanceStore {
    fn find_by_employee_and_date_range(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        if from > to {
            return Ok(Vec::new());
        }
        let lower = (employee_id.to_string(), from);
        let upper = (employee_id.to_string(), to);
        Ok(read(&self.records)?
            .range(lower..=upper)
            .map(|(_, record)| record.clone())
            .collect())
    }
}

// ============================================================================
// Liquidations
// ============================================================================

#[derive(Debug, Default)]
struct LiquidationState {
    liquidations: HashMap<Uuid, Liquidation>,
    deductions: HashMap<Uuid, Vec<Deduction>>,
    salary_payments: HashMap<Uuid, SalaryPayment>,
    provisional_payments: HashMap<Uuid, ProvisionalPayment>,
}

impl LiquidationState {
    fn active_for(&self, employee_id: &str, period: PayrollPeriod) -> Option<&Liquidation> {
        self.liquidations.values().find(|liquidation| {
            liquidation.employee_id() == employee_id
                && liquidation.period() == period
                && !liquidation.status().is_voided()
        })
    }

    /// Everything held for one liquidation, for undoing a failed commit.
    fn snapshot(&self, liquidation_id: Uuid) -> Snapshot {
        Snapshot {
            liquidation_id,
            liquidation: self.liquidations.get(&liquidation_id).cloned(),
            deductions: self.deductions.get(&liquidation_id).cloned(),
            salary_payment: self.salary_payments.get(&liquidation_id).cloned(),
            provisional_payment: self.provisional_payments.get(&liquidation_id).cloned(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let id = snapshot.liquidation_id;
        put(&mut self.liquidations, id, snapshot.liquidation);
        put(&mut self.deductions, id, snapshot.deductions);
        put(&mut self.salary_payments, id, snapshot.salary_payment);
        put(&mut self.provisional_payments, id, snapshot.provisional_payment);
    }

    fn stored(&self, liquidation_id: Uuid) -> EngineResult<&Liquidation> {
        self.liquidations
            .get(&liquidation_id)
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))
    }

    fn apply(&mut self, write: Write) -> EngineResult<()> {
        match write {
            Write::InsertLiquidation {
                liquidation,
                deductions,
            } => {
                if self.liquidations.contains_key(&liquidation.id()) {
                    return Err(EngineError::storage(format!(
                        "liquidation {} already exists",
                        liquidation.id()
                    )));
                }
                if self
                    .active_for(liquidation.employee_id(), liquidation.period())
                    .is_some()
                {
                    return Err(EngineError::DuplicatePeriod {
                        employee_id: liquidation.employee_id().to_string(),
                        period: liquidation.period().label(),
                    });
                }
                self.deductions.insert(liquidation.id(), deductions);
                self.liquidations.insert(liquidation.id(), liquidation);
            }
            Write::UpdateLiquidation {
                liquidation,
                expected,
                transition,
            } => {
                let current = self.stored(liquidation.id())?.status();
                if current != expected {
                    return Err(EngineError::InvalidState {
                        liquidation_id: liquidation.id(),
                        current,
                        attempted: transition,
                    });
                }
                self.liquidations.insert(liquidation.id(), liquidation);
            }
            Write::ReplaceDeductions {
                liquidation_id,
                deductions,
            } => {
                self.stored(liquidation_id)?;
                self.deductions.insert(liquidation_id, deductions);
            }
            Write::InsertSalaryPayment(payment) => {
                self.stored(payment.liquidation_id)?;
                if self.salary_payments.contains_key(&payment.liquidation_id) {
                    return Err(EngineError::storage(format!(
                        "liquidation {} already has a salary payment",
                        payment.liquidation_id
                    )));
                }
                self.salary_payments.insert(payment.liquidation_id, payment);
            }
            Write::InsertProvisionalPayment(payment) => {
                self.stored(payment.liquidation_id)?;
                if self.provisional_payments.contains_key(&payment.liquidation_id) {
                    return Err(EngineError::storage(format!(
                        "liquidation {} already has a provisional payment",
                        payment.liquidation_id
                    )));
                }
                self.provisional_payments
                    .insert(payment.liquidation_id, payment);
            }
            Write::RemoveLiquidation {
                liquidation_id,
                expected,
            } => {
                let current = self.stored(liquidation_id)?.status();
                if current != expected {
                    return Err(EngineError::InvalidState {
                        liquidation_id,
                        current,
                        attempted: Transition::Remove,
                    });
                }
                self.liquidations.remove(&liquidation_id);
                self.deductions.remove(&liquidation_id);
                self.salary_payments.remove(&liquidation_id);
                self.provisional_payments.remove(&liquidation_id);
            }
        }
        Ok(())
    }
}

/// Prior entries of one liquidation id.
struct Snapshot {
    liquidation_id: Uuid,
    liquidation: Option<Liquidation>,
    deductions: Option<Vec<Deduction>>,
    salary_payment: Option<SalaryPayment>,
    provisional_payment: Option<ProvisionalPayment>,
}

fn put<V>(map: &mut HashMap<Uuid, V>, key: Uuid, value: Option<V>) {
    match value {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

/// In-memory liquidation store with all-or-nothing commits.
///
/// A commit snapshots the entries of each liquidation before its first write
/// and restores them in reverse order if any write fails. The write lock is
/// held for the whole commit, so conditional checks and the rollback are
/// atomic.
#[derive(Debug, Default)]
pub struct InMemoryLiquidationStore {
    state: RwLock<LiquidationState>,
}

impl InMemoryLiquidationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored liquidation, oldest first.
    pub fn liquidations(&self) -> EngineResult<Vec<Liquidation>> {
        let state = read(&self.state)?;
        let mut liquidations: Vec<Liquidation> = state.liquidations.values().cloned().collect();
        liquidations.sort_by_key(|l| (l.created_at(), l.id()));
        Ok(liquidations)
    }

    /// Number of stored salary payments.
    pub fn salary_payment_count(&self) -> EngineResult<usize> {
        Ok(read(&self.state)?.salary_payments.len())
    }

    /// Number of stored provisional payments.
    pub fn provisional_payment_count(&self) -> EngineResult<usize> {
        Ok(read(&self.state)?.provisional_payments.len())
    }
}

impl LiquidationStore for InMemoryLiquidationStore {
    fn find_by_id(&self, liquidation_id: Uuid) -> EngineResult<Option<Liquidation>> {
        Ok(read(&self.state)?.liquidations.get(&liquidation_id).cloned())
    }

    fn find_active(
        &self,
        employee_id: &str,
        period: PayrollPeriod,
    ) -> EngineResult<Option<Liquidation>> {
        Ok(read(&self.state)?.active_for(employee_id, period).cloned())
    }

    fn deductions_for(&self, liquidation_id: Uuid) -> EngineResult<Vec<Deduction>> {
        Ok(read(&self.state)?
            .deductions
            .get(&liquidation_id)
            .cloned()
            .unwrap_or_default())
    }

    fn salary_payment_for(&self, liquidation_id: Uuid) -> EngineResult<Option<SalaryPayment>> {
        Ok(read(&self.state)?
            .salary_payments
            .get(&liquidation_id)
            .cloned())
    }

    fn provisional_payment_for(
        &self,
        liquidation_id: Uuid,
    ) -> EngineResult<Option<ProvisionalPayment>> {
        Ok(read(&self.state)?
            .provisional_payments
            .get(&liquidation_id)
            .cloned())
    }

    fn provisional_payments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ProvisionalPayment>> {
        let state = read(&self.state)?;
        let mut payments: Vec<ProvisionalPayment> = state
            .provisional_payments
            .values()
            .filter(|payment| payment.payment_date >= from && payment.payment_date <= to)
            .cloned()
            .collect();
        payments.sort_by_key(|payment| (payment.payment_date, payment.id));
        Ok(payments)
    }

    fn commit(&self, unit: UnitOfWork) -> EngineResult<()> {
        if unit.is_empty() {
            return Ok(());
        }

        let mut state = write(&self.state)?;
        let mut undo: Vec<Snapshot> = Vec::new();
        for staged in unit.into_writes() {
            let liquidation_id = staged.liquidation_id();
            if !undo.iter().any(|snapshot| snapshot.liquidation_id == liquidation_id) {
                undo.push(state.snapshot(liquidation_id));
            }
            if let Err(err) = state.apply(staged) {
                for snapshot in undo.into_iter().rev() {
                    state.restore(snapshot);
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
