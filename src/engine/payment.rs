//! Salary payment, single and batch.
//!
//! Paying a liquidation writes three things in one unit of work: the salary
//! payment, the provisional payment derived from its deductions, and the
//! `approved -> paid` transition. A batch stages one such unit per item and
//! commits every successful item together.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BatchFailure, BatchPaymentReport, BatchSuccess, Liquidation, LiquidationStatus,
    PaymentDetails, PaymentReceipt, SalaryPayment, Transition,
};
use crate::notify::{NotificationEvent, Notifier, dispatch};
use crate::store::{LiquidationStore, UnitOfWork};

use super::provisional::ProvisionalPaymentGenerator;

/// One batch item staged for commit.
struct StagedItem {
    index: usize,
    unit: UnitOfWork,
    receipt: PaymentReceipt,
}

/// Pays approved liquidations.
#[derive(Clone)]
pub struct PaymentProcessor {
    liquidations: Arc<dyn LiquidationStore>,
    notifier: Arc<dyn Notifier>,
}

impl PaymentProcessor {
    /// Creates a processor over `liquidations`, notifying through `notifier`.
    pub fn new(liquidations: Arc<dyn LiquidationStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            liquidations,
            notifier,
        }
    }

    /// Pays one approved liquidation.
    ///
    /// The payment date defaults to today (UTC).
    ///
    /// # Errors
    ///
    /// - `NotFound` if the liquidation does not exist
    /// - `InvalidState` unless it is approved (also when another caller paid it first)
    /// - `Validation` for a blank bank or nothing to remit
    pub fn pay(&self, liquidation_id: Uuid, details: &PaymentDetails) -> EngineResult<PaymentReceipt> {
        let date = payment_date(details);
        let liquidation = self.load(liquidation_id)?;
        let (unit, receipt) = self
            .stage(&liquidation, details, date, Utc::now())
            .inspect_err(|err| log_item_failure(liquidation_id, err))?;

        self.liquidations
            .commit(unit)
            .inspect_err(|err| log_item_failure(liquidation_id, err))?;

        info!(
            liquidation_id = %liquidation_id,
            salary_payment_id = %receipt.salary_payment.id,
            provisional_payment_id = %receipt.provisional_payment.id,
            amount = %receipt.salary_payment.amount,
            method = %receipt.salary_payment.method,
            "Liquidation paid"
        );
        self.notify_paid(&receipt);
        Ok(receipt)
    }

    /// Pays several liquidations as one payroll run.
    ///
    /// Each item is validated and staged on its own; an item is never
    /// partially staged. Items that fail are reported with their error kind.
    /// If no item succeeds nothing is committed and the call fails with
    /// `BatchFailed`. If the commit finds an item already moved by another
    /// caller, that item joins the failures and the rest are committed.
    ///
    /// # Errors
    ///
    /// - `Validation` if `liquidation_ids` is empty
    /// - `BatchFailed` if no item could be paid
    /// - `Storage` on a commit failure not attributable to one item
    pub fn pay_batch(
        &self,
        liquidation_ids: &[Uuid],
        details: &PaymentDetails,
    ) -> EngineResult<BatchPaymentReport> {
        if liquidation_ids.is_empty() {
            return Err(EngineError::validation(
                "liquidation_ids",
                "at least one liquidation is required",
            ));
        }

        let date = payment_date(details);
        let now = Utc::now();
        let mut staged: Vec<StagedItem> = Vec::new();
        let mut failures: Vec<(usize, BatchFailure)> = Vec::new();
        let mut batch = UnitOfWork::new();

        for (index, id) in liquidation_ids.iter().copied().enumerate() {
            match self.stage_batch_item(id, &batch, details, date, now) {
                Ok((unit, receipt)) => {
                    batch.absorb(unit.clone());
                    staged.push(StagedItem {
                        index,
                        unit,
                        receipt,
                    });
                }
                Err(err) => {
                    log_item_failure(id, &err);
                    failures.push((index, BatchFailure::from_error(id, &err)));
                }
            }
        }

        self.commit_batch(&mut staged, &mut failures)?;

        failures.sort_by_key(|(index, _)| *index);
        let report = BatchPaymentReport {
            total_amount: staged
                .iter()
                .map(|item| item.receipt.salary_payment.amount)
                .sum::<Decimal>(),
            succeeded: staged
                .iter()
                .map(|item| BatchSuccess {
                    liquidation_id: item.receipt.liquidation.id(),
                    salary_payment_id: item.receipt.salary_payment.id,
                    provisional_payment_id: item.receipt.provisional_payment.id,
                    amount: item.receipt.salary_payment.amount,
                })
                .collect(),
            failed: failures.into_iter().map(|(_, failure)| failure).collect(),
        };

        info!(
            processed = report.processed(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            total_amount = %report.total_amount,
            "Batch payment completed"
        );
        for item in &staged {
            self.notify_paid(&item.receipt);
        }
        Ok(report)
    }

    /// Commits the staged items, moving items that lost a race to `failures`.
    fn commit_batch(
        &self,
        staged: &mut Vec<StagedItem>,
        failures: &mut Vec<(usize, BatchFailure)>,
    ) -> EngineResult<()> {
        loop {
            if staged.is_empty() {
                failures.sort_by_key(|(index, _)| *index);
                let failures: Vec<BatchFailure> =
                    failures.drain(..).map(|(_, failure)| failure).collect();
                warn!(failed = failures.len(), "Batch payment failed for every item");
                return Err(EngineError::BatchFailed { failures });
            }

            let mut unit = UnitOfWork::new();
            for item in staged.iter() {
                unit.absorb(item.unit.clone());
            }

            let err = match self.liquidations.commit(unit) {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            let conflicting = conflicting_liquidation(&err).and_then(|liquidation_id| {
                staged
                    .iter()
                    .position(|item| item.receipt.liquidation.id() == liquidation_id)
            });
            let Some(position) = conflicting else {
                return Err(err);
            };

            let item = staged.remove(position);
            let id = item.receipt.liquidation.id();
            warn!(
                liquidation_id = %id,
                error = %err,
                "Batch item changed concurrently; retrying without it"
            );
            failures.push((item.index, BatchFailure::from_error(id, &err)));
        }
    }

    fn stage_batch_item(
        &self,
        liquidation_id: Uuid,
        batch: &UnitOfWork,
        details: &PaymentDetails,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<(UnitOfWork, PaymentReceipt)> {
        // a liquidation already staged by this batch is seen as paid
        let liquidation = match batch.staged_liquidation(liquidation_id) {
            Some(staged) => staged.clone(),
            None => self.load(liquidation_id)?,
        };
        self.stage(&liquidation, details, date, now)
    }

    fn stage(
        &self,
        liquidation: &Liquidation,
        details: &PaymentDetails,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<(UnitOfWork, PaymentReceipt)> {
        liquidation.ensure_can(Transition::Pay)?;
        details.validate()?;

        let deductions = self.liquidations.deductions_for(liquidation.id())?;
        let provisional_payment = ProvisionalPaymentGenerator::derive(liquidation, &deductions, date)?;
        let paid = liquidation.mark_paid(now)?;
        let salary_payment = SalaryPayment::for_liquidation(&paid, details, date);

        let mut unit = UnitOfWork::new();
        unit.update_liquidation(paid.clone(), LiquidationStatus::Approved, Transition::Pay);
        unit.insert_salary_payment(salary_payment.clone());
        unit.insert_provisional_payment(provisional_payment.clone());

        Ok((
            unit,
            PaymentReceipt {
                liquidation: paid,
                salary_payment,
                provisional_payment,
            },
        ))
    }

    fn load(&self, liquidation_id: Uuid) -> EngineResult<Liquidation> {
        self.liquidations
            .find_by_id(liquidation_id)?
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))
    }

    fn notify_paid(&self, receipt: &PaymentReceipt) {
        dispatch(
            self.notifier.as_ref(),
            receipt.liquidation.employee_id(),
            NotificationEvent::LiquidationPaid,
            json!({
                "liquidation_id": receipt.liquidation.id(),
                "period": receipt.liquidation.period(),
                "amount": receipt.salary_payment.amount,
                "method": receipt.salary_payment.method,
                "date": receipt.salary_payment.date,
            }),
        );
    }
}

/// The liquidation a failed commit names, if the failure belongs to one item.
fn conflicting_liquidation(err: &EngineError) -> Option<Uuid> {
    match err {
        EngineError::InvalidState { liquidation_id, .. } => Some(*liquidation_id),
        EngineError::NotFound { entity, id } if *entity == "liquidation" => {
            Uuid::parse_str(id).ok()
        }
        _ => None,
    }
}

fn payment_date(details: &PaymentDetails) -> NaiveDate {
    details.date.unwrap_or_else(|| Utc::now().date_naive())
}

fn log_item_failure(liquidation_id: Uuid, err: &EngineError) {
    warn!(
        liquidation_id = %liquidation_id,
        kind = %err.kind(),
        error = %err,
        "Payment refused"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{
        AttendanceSummary, DeductionBreakdown, DeductionLine, HEALTH_CONCEPT, PENSION_CONCEPT,
        PaymentMethod, PayrollPeriod,
    };
    use crate::notify::LogNotifier;
    use crate::store::InMemoryLiquidationStore;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn details() -> PaymentDetails {
        PaymentDetails::new(PaymentMethod::Transfer, "Banco Estado")
            .on(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap())
    }

    fn breakdown(gross: &str) -> DeductionBreakdown {
        let gross = dec(gross);
        let pension = gross * dec("0.10");
        let health = gross * dec("0.07");
        DeductionBreakdown {
            total_deductions: pension + health,
            details: vec![
                DeductionLine {
                    concept: PENSION_CONCEPT.to_string(),
                    rate: dec("0.10"),
                    amount: pension,
                },
                DeductionLine {
                    concept: HEALTH_CONCEPT.to_string(),
                    rate: dec("0.07"),
                    amount: health,
                },
            ],
        }
    }

    /// Seeds a liquidation for `employee_id`, approved when `approve` is set.
    fn seed(
        store: &InMemoryLiquidationStore,
        employee_id: &str,
        gross: &str,
        approve: bool,
    ) -> Liquidation {
        let (liquidation, deductions) = Liquidation::pending(
            employee_id,
            PayrollPeriod::new(2026, 1).unwrap(),
            &AttendanceSummary::default(),
            dec(gross),
            &breakdown(gross),
            Utc::now(),
        );
        let mut unit = UnitOfWork::new();
        unit.insert_liquidation(liquidation.clone(), deductions);
        if approve {
            unit.update_liquidation(
                liquidation.approve("hr_001", Utc::now()).unwrap(),
                LiquidationStatus::Pending,
                Transition::Approve,
            );
        }
        store.commit(unit).unwrap();
        store.find_by_id(liquidation.id()).unwrap().unwrap()
    }

    fn processor(store: &Arc<InMemoryLiquidationStore>) -> PaymentProcessor {
        PaymentProcessor::new(store.clone(), Arc::new(LogNotifier))
    }

    #[test]
    fn test_pay_creates_salary_and_provisional_payments() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let liquidation = seed(&store, "emp_001", "1000000", true);

        let receipt = processor(&store).pay(liquidation.id(), &details()).unwrap();

        assert_eq!(receipt.liquidation.status(), LiquidationStatus::Paid);
        assert!(receipt.liquidation.paid_at().is_some());
        assert_eq!(receipt.salary_payment.amount, dec("830000"));
        assert_eq!(receipt.salary_payment.bank, "Banco Estado");
        assert_eq!(receipt.provisional_payment.pension_amount, dec("100000"));
        assert_eq!(receipt.provisional_payment.health_amount, dec("70000"));
        assert_eq!(receipt.provisional_payment.total, dec("170000"));
        assert_eq!(receipt.provisional_payment.period_label, "2026-01");

        assert_eq!(store.salary_payment_count().unwrap(), 1);
        assert_eq!(store.provisional_payment_count().unwrap(), 1);
    }

    #[test]
    fn test_pay_pending_is_invalid_state_and_writes_nothing() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let liquidation = seed(&store, "emp_001", "1000000", false);

        match processor(&store).pay(liquidation.id(), &details()) {
            Err(EngineError::InvalidState {
                current, attempted, ..
            }) => {
                assert_eq!(current, LiquidationStatus::Pending);
                assert_eq!(attempted, Transition::Pay);
            }
            other => panic!("Expected InvalidState error, got {:?}", other),
        }
        assert_eq!(store.salary_payment_count().unwrap(), 0);
        assert_eq!(store.provisional_payment_count().unwrap(), 0);
    }

    #[test]
    fn test_pay_blank_bank_is_validation_error() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let liquidation = seed(&store, "emp_001", "1000000", true);
        let details = PaymentDetails::new(PaymentMethod::Check, " ");

        match processor(&store).pay(liquidation.id(), &details) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "bank"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_pay_zero_deductions_is_validation_error() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let liquidation = seed(&store, "emp_001", "0", true);

        match processor(&store).pay(liquidation.id(), &details()) {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "deductions"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
        assert_eq!(
            store.find_by_id(liquidation.id()).unwrap().unwrap().status(),
            LiquidationStatus::Approved
        );
    }

    #[test]
    fn test_pay_defaults_date_to_today() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let liquidation = seed(&store, "emp_001", "1000000", true);

        let receipt = processor(&store)
            .pay(liquidation.id(), &PaymentDetails::new(PaymentMethod::Check, "Bank"))
            .unwrap();

        let today = Utc::now().date_naive();
        // tolerate a run across midnight
        assert!(receipt.salary_payment.date == today || receipt.salary_payment.date.succ_opt() == Some(today));
    }

    #[test]
    fn test_batch_partial_failure() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let l1 = seed(&store, "emp_001", "1000000", true);
        let l2 = seed(&store, "emp_002", "1000000", false);
        let l3 = seed(&store, "emp_003", "2000000", true);

        let report = processor(&store)
            .pay_batch(&[l1.id(), l2.id(), l3.id()], &details())
            .unwrap();

        assert_eq!(report.succeeded_ids(), vec![l1.id(), l3.id()]);
        assert_eq!(report.failed_ids(), vec![l2.id()]);
        assert_eq!(report.failed[0].kind, ErrorKind::InvalidState);
        assert_eq!(report.total_amount, dec("2490000"));
        assert_eq!(report.processed(), 3);

        assert_eq!(
            store.find_by_id(l2.id()).unwrap().unwrap().status(),
            LiquidationStatus::Pending
        );
        assert_eq!(store.salary_payment_count().unwrap(), 2);
    }

    #[test]
    fn test_batch_all_failed_commits_nothing() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let l4 = seed(&store, "emp_004", "1000000", true);
        let blank_bank = PaymentDetails::new(PaymentMethod::Transfer, "");

        match processor(&store).pay_batch(&[l4.id()], &blank_bank) {
            Err(EngineError::BatchFailed { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].liquidation_id, l4.id());
                assert_eq!(failures[0].kind, ErrorKind::Validation);
            }
            other => panic!("Expected BatchFailed error, got {:?}", other),
        }
        assert_eq!(store.salary_payment_count().unwrap(), 0);
        assert_eq!(
            store.find_by_id(l4.id()).unwrap().unwrap().status(),
            LiquidationStatus::Approved
        );
    }

    #[test]
    fn test_batch_duplicate_id_fails_second_occurrence() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let l1 = seed(&store, "emp_001", "1000000", true);

        let report = processor(&store)
            .pay_batch(&[l1.id(), l1.id()], &details())
            .unwrap();

        assert_eq!(report.succeeded_ids(), vec![l1.id()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kind, ErrorKind::InvalidState);
        assert_eq!(store.salary_payment_count().unwrap(), 1);
    }

    #[test]
    fn test_batch_unknown_id_is_reported() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        let l1 = seed(&store, "emp_001", "1000000", true);
        let ghost = Uuid::new_v4();

        let report = processor(&store)
            .pay_batch(&[ghost, l1.id()], &details())
            .unwrap();

        assert_eq!(report.failed_ids(), vec![ghost]);
        assert_eq!(report.failed[0].kind, ErrorKind::NotFound);
        assert_eq!(report.succeeded_ids(), vec![l1.id()]);
    }

    #[test]
    fn test_empty_batch_is_validation_error() {
        let store = Arc::new(InMemoryLiquidationStore::new());
        assert!(matches!(
            processor(&store).pay_batch(&[], &details()),
            Err(EngineError::Validation { .. })
        ));
    }

    type Race = fn(&Arc<InMemoryLiquidationStore>, Uuid) -> EngineResult<()>;

    /// Store that lets another caller touch one liquidation right before the batch commits.
    struct RacingStore {
        inner: Arc<InMemoryLiquidationStore>,
        victim: Uuid,
        race: Race,
        raced: AtomicBool,
    }

    fn pay_first(store: &Arc<InMemoryLiquidationStore>, id: Uuid) -> EngineResult<()> {
        PaymentProcessor::new(store.clone(), Arc::new(LogNotifier))
            .pay(id, &details())
            .map(|_| ())
    }

    fn remove_first(store: &Arc<InMemoryLiquidationStore>, id: Uuid) -> EngineResult<()> {
        let mut unit = UnitOfWork::new();
        unit.remove_liquidation(id, LiquidationStatus::Approved);
        store.commit(unit)
    }

    impl LiquidationStore for RacingStore {
        fn find_by_id(&self, id: Uuid) -> EngineResult<Option<Liquidation>> {
            self.inner.find_by_id(id)
        }
        fn find_active(
            &self,
            employee_id: &str,
            period: PayrollPeriod,
        ) -> EngineResult<Option<Liquidation>> {
            self.inner.find_active(employee_id, period)
        }
        fn deductions_for(&self, id: Uuid) -> EngineResult<Vec<crate::models::Deduction>> {
            self.inner.deductions_for(id)
        }
        fn salary_payment_for(&self, id: Uuid) -> EngineResult<Option<SalaryPayment>> {
            self.inner.salary_payment_for(id)
        }
        fn provisional_payment_for(
            &self,
            id: Uuid,
        ) -> EngineResult<Option<crate::models::ProvisionalPayment>> {
            self.inner.provisional_payment_for(id)
        }
        fn provisional_payments_between(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> EngineResult<Vec<crate::models::ProvisionalPayment>> {
            self.inner.provisional_payments_between(from, to)
        }
        fn commit(&self, unit: UnitOfWork) -> EngineResult<()> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                (self.race)(&self.inner, self.victim)?;
            }
            self.inner.commit(unit)
        }
    }

    #[test]
    fn test_batch_drops_item_paid_concurrently() {
        let inner = Arc::new(InMemoryLiquidationStore::new());
        let l1 = seed(&inner, "emp_001", "1000000", true);
        let l2 = seed(&inner, "emp_002", "1000000", true);
        let racing = Arc::new(RacingStore {
            inner: inner.clone(),
            victim: l2.id(),
            race: pay_first,
            raced: AtomicBool::new(false),
        });

        let report = PaymentProcessor::new(racing, Arc::new(LogNotifier))
            .pay_batch(&[l1.id(), l2.id()], &details())
            .unwrap();

        assert_eq!(report.succeeded_ids(), vec![l1.id()]);
        assert_eq!(report.failed_ids(), vec![l2.id()]);
        assert_eq!(report.failed[0].kind, ErrorKind::InvalidState);
        // one payment from the racer, one from the batch
        assert_eq!(inner.salary_payment_count().unwrap(), 2);
    }

    #[test]
    fn test_batch_drops_item_removed_concurrently() {
        let inner = Arc::new(InMemoryLiquidationStore::new());
        let l1 = seed(&inner, "emp_001", "1000000", true);
        let l2 = seed(&inner, "emp_002", "1000000", true);
        let racing = Arc::new(RacingStore {
            inner: inner.clone(),
            victim: l2.id(),
            race: remove_first,
            raced: AtomicBool::new(false),
        });

        let report = PaymentProcessor::new(racing, Arc::new(LogNotifier))
            .pay_batch(&[l1.id(), l2.id()], &details())
            .unwrap();

        assert_eq!(report.succeeded_ids(), vec![l1.id()]);
        assert_eq!(report.failed_ids(), vec![l2.id()]);
        assert_eq!(report.failed[0].kind, ErrorKind::NotFound);
        assert_eq!(
            inner.find_by_id(l1.id()).unwrap().map(|l| l.status()),
            Some(LiquidationStatus::Paid)
        );
        assert!(inner.find_by_id(l2.id()).unwrap().is_none());
        assert_eq!(inner.salary_payment_count().unwrap(), 1);
    }
}
