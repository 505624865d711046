//! Approval and rejection of liquidations.
//!
//! ```text
//! pending ──approve──▶ approved ──pay──▶ paid
//!    │
//!    └────reject────▶ rejected
//! ```
//!
//! Every transition is committed as a conditional update on the source
//! state, so of two concurrent callers at most one succeeds.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Liquidation, Transition};
use crate::notify::{NotificationEvent, Notifier, dispatch};
use crate::store::{LiquidationStore, UnitOfWork};

/// Drives approval and rejection.
#[derive(Clone)]
pub struct LiquidationStateMachine {
    liquidations: Arc<dyn LiquidationStore>,
    notifier: Arc<dyn Notifier>,
}

impl LiquidationStateMachine {
    /// Creates a state machine over `liquidations`, notifying through `notifier`.
    pub fn new(liquidations: Arc<dyn LiquidationStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            liquidations,
            notifier,
        }
    }

    /// Approves a pending liquidation and notifies the employee.
    ///
    /// # Errors
    ///
    /// - `Validation` if `approver_id` is blank
    /// - `NotFound` if the liquidation does not exist
    /// - `InvalidState` unless the liquidation is pending
    pub fn approve(&self, liquidation_id: Uuid, approver_id: &str) -> EngineResult<Liquidation> {
        let current = self.load(liquidation_id)?;
        let approved = current
            .approve(approver_id, Utc::now())
            .inspect_err(|err| log_refused(liquidation_id, Transition::Approve, err))?;

        self.transition(&current, approved.clone(), Transition::Approve)?;

        info!(
            liquidation_id = %liquidation_id,
            employee_id = %approved.employee_id(),
            approved_by = approved.approved_by().unwrap_or_default(),
            "Liquidation approved"
        );
        dispatch(
            self.notifier.as_ref(),
            approved.employee_id(),
            NotificationEvent::LiquidationApproved,
            json!({
                "liquidation_id": liquidation_id,
                "period": approved.period(),
                "net_salary": approved.net_salary(),
                "approved_by": approved.approved_by(),
            }),
        );
        Ok(approved)
    }

    /// Rejects a pending liquidation with a mandatory reason and notifies the employee.
    ///
    /// # Errors
    ///
    /// - `Validation` if `reason` is blank
    /// - `NotFound` if the liquidation does not exist
    /// - `InvalidState` unless the liquidation is pending
    pub fn reject(&self, liquidation_id: Uuid, reason: &str) -> EngineResult<Liquidation> {
        let current = self.load(liquidation_id)?;
        let rejected = current
            .reject(reason, Utc::now())
            .inspect_err(|err| log_refused(liquidation_id, Transition::Reject, err))?;

        self.transition(&current, rejected.clone(), Transition::Reject)?;

        info!(
            liquidation_id = %liquidation_id,
            employee_id = %rejected.employee_id(),
            reason = rejected.rejection_reason().unwrap_or_default(),
            "Liquidation rejected"
        );
        dispatch(
            self.notifier.as_ref(),
            rejected.employee_id(),
            NotificationEvent::LiquidationRejected,
            json!({
                "liquidation_id": liquidation_id,
                "period": rejected.period(),
                "reason": rejected.rejection_reason(),
            }),
        );
        Ok(rejected)
    }

    fn load(&self, liquidation_id: Uuid) -> EngineResult<Liquidation> {
        self.liquidations
            .find_by_id(liquidation_id)?
            .ok_or_else(|| EngineError::not_found("liquidation", liquidation_id))
    }

    fn transition(
        &self,
        current: &Liquidation,
        next: Liquidation,
        transition: Transition,
    ) -> EngineResult<()> {
        let mut unit = UnitOfWork::new();
        unit.update_liquidation(next, current.status(), transition);
        self.liquidations
            .commit(unit)
            .inspect_err(|err| log_refused(current.id(), transition, err))
    }
}

fn log_refused(liquidation_id: Uuid, transition: Transition, err: &EngineError) {
    warn!(
        liquidation_id = %liquidation_id,
        transition = %transition,
        error = %err,
        "Transition refused"
    );
}
