//! Attendance aggregation against the attendance store.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculation::aggregate_attendance;
use crate::error::EngineResult;
use crate::models::{AttendanceSummary, PayrollPeriod};
use crate::store::AttendanceStore;

/// Loads an employee's attendance for a period and totals it.
#[derive(Clone)]
pub struct AttendanceAggregator {
    store: Arc<dyn AttendanceStore>,
    shift_hours: Decimal,
}

impl AttendanceAggregator {
    /// Creates an aggregator splitting days at `shift_hours`.
    pub fn new(store: Arc<dyn AttendanceStore>, shift_hours: Decimal) -> Self {
        Self { store, shift_hours }
    }

    /// Worked days, regular hours and overtime hours of `employee_id` in `period`.
    ///
    /// An employee without records yields zeros; only storage errors fail.
    pub fn aggregate(
        &self,
        employee_id: &str,
        period: PayrollPeriod,
    ) -> EngineResult<AttendanceSummary> {
        let records = self.store.find_by_employee_and_date_range(
            employee_id,
            period.start_date(),
            period.end_date(),
        )?;
        let summary = aggregate_attendance(&records, &period, self.shift_hours);

        debug!(
            employee_id = %employee_id,
            period = %period,
            records = records.len(),
            days_worked = summary.days_worked,
            regular_hours = %summary.regular_hours,
            overtime_hours = %summary.overtime_hours,
            "Aggregated attendance"
        );
        Ok(summary)
    }
}
