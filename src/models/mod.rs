//! Core data models for the Payroll Liquidation Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod employee;
mod liquidation;
mod payment;
mod period;
mod report;

pub use attendance::{AttendanceRecord, AttendanceSummary, hours_between};
pub use employee::{Employee, EmployeeFilter, EmployeePatch};
pub use liquidation::{
    Deduction, DeductionBreakdown, DeductionLine, HEALTH_CONCEPT, Liquidation, LiquidationDetail,
    LiquidationStatus, PENSION_CONCEPT, Transition, concept_total,
};
pub use payment::{PaymentDetails, PaymentMethod, PaymentReceipt, ProvisionalPayment, SalaryPayment};
pub use period::PayrollPeriod;
pub use report::{
    BatchFailure, BatchPaymentReport, BatchSuccess, GenerationFailure, GenerationReport,
    ProvisionalReport,
};
