//! Staged write sets.
//!
//! Every mutating engine operation collects its writes in a [`UnitOfWork`]
//! and hands it to [`LiquidationStore::commit`](super::LiquidationStore::commit)
//! in one call. The store applies all writes or none.

use uuid::Uuid;

use crate::models::{
    Deduction, Liquidation, LiquidationStatus, ProvisionalPayment, SalaryPayment, Transition,
};

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Insert a new liquidation with its deduction lines.
    ///
    /// The store rejects the insert if a non-voided liquidation already
    /// exists for the same employee and period.
    InsertLiquidation {
        /// The liquidation to insert.
        liquidation: Liquidation,
        /// Its deduction lines.
        deductions: Vec<Deduction>,
    },
    /// Replace a liquidation, conditional on its stored status.
    UpdateLiquidation {
        /// The new state of the liquidation.
        liquidation: Liquidation,
        /// The status the stored liquidation must still have.
        expected: LiquidationStatus,
        /// The transition being applied, reported on conflict.
        transition: Transition,
    },
    /// Replace every deduction line of a liquidation.
    ReplaceDeductions {
        /// The owning liquidation.
        liquidation_id: Uuid,
        /// The new lines.
        deductions: Vec<Deduction>,
    },
    /// Insert the salary payment of a liquidation.
    InsertSalaryPayment(SalaryPayment),
    /// Insert the provisional payment of a liquidation.
    InsertProvisionalPayment(ProvisionalPayment),
    /// Remove a liquidation and everything it owns, conditional on its stored status.
    RemoveLiquidation {
        /// The liquidation to remove.
        liquidation_id: Uuid,
        /// The status the stored liquidation must still have.
        expected: LiquidationStatus,
    },
}

impl Write {
    /// The liquidation this write touches.
    pub fn liquidation_id(&self) -> Uuid {
        match self {
            Write::InsertLiquidation { liquidation, .. } => liquidation.id(),
            Write::UpdateLiquidation { liquidation, .. } => liquidation.id(),
            Write::ReplaceDeductions { liquidation_id, .. } => *liquidation_id,
            Write::InsertSalaryPayment(payment) => payment.liquidation_id,
            Write::InsertProvisionalPayment(payment) => payment.liquidation_id,
            Write::RemoveLiquidation { liquidation_id, .. } => *liquidation_id,
        }
    }
}

/// An ordered set of writes committed atomically.
///
/// # Example
///
/// ```
/// use payroll_engine::store::UnitOfWork;
///
/// let mut unit = UnitOfWork::new();
/// assert!(unit.is_empty());
/// unit.absorb(UnitOfWork::new());
/// assert_eq!(unit.len(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a new liquidation and its deductions.
    pub fn insert_liquidation(&mut self, liquidation: Liquidation, deductions: Vec<Deduction>) {
        self.writes.push(Write::InsertLiquidation {
            liquidation,
            deductions,
        });
    }

    /// Stages a conditional liquidation update.
    pub fn update_liquidation(
        &mut self,
        liquidation: Liquidation,
        expected: LiquidationStatus,
        transition: Transition,
    ) {
        self.writes.push(Write::UpdateLiquidation {
            liquidation,
            expected,
            transition,
        });
    }

    /// Stages a wholesale replacement of a liquidation's deductions.
    pub fn replace_deductions(&mut self, liquidation_id: Uuid, deductions: Vec<Deduction>) {
        self.writes.push(Write::ReplaceDeductions {
            liquidation_id,
            deductions,
        });
    }

    /// Stages a salary payment.
    pub fn insert_salary_payment(&mut self, payment: SalaryPayment) {
        self.writes.push(Write::InsertSalaryPayment(payment));
    }

    /// Stages a provisional payment.
    pub fn insert_provisional_payment(&mut self, payment: ProvisionalPayment) {
        self.writes.push(Write::InsertProvisionalPayment(payment));
    }

    /// Stages a cascading removal.
    pub fn remove_liquidation(&mut self, liquidation_id: Uuid, expected: LiquidationStatus) {
        self.writes.push(Write::RemoveLiquidation {
            liquidation_id,
            expected,
        });
    }

    /// Appends every write of `other`, preserving order.
    pub fn absorb(&mut self, other: UnitOfWork) {
        self.writes.extend(other.writes);
    }

    /// The latest staged state of a liquidation, if this unit inserts or updates it.
    ///
    /// Lets a caller building a large unit see its own pending writes, so
    /// the same liquidation is never transitioned twice in one commit.
    pub fn staged_liquidation(&self, id: Uuid) -> Option<&Liquidation> {
        self.writes.iter().rev().find_map(|write| match write {
            Write::InsertLiquidation { liquidation, .. }
            | Write::UpdateLiquidation { liquidation, .. }
                if liquidation.id() == id =>
            {
                Some(liquidation)
            }
            _ => None,
        })
    }

    /// Returns true if any write touches `liquidation_id`.
    pub fn touches(&self, liquidation_id: Uuid) -> bool {
        self.writes
            .iter()
            .any(|write| write.liquidation_id() == liquidation_id)
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// The staged writes, in order.
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Consumes the unit, returning its writes.
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}
