//! HTTP API module for the Payroll Liquidation Engine.
//!
//! A thin adapter exposing [`PayrollEngine`](crate::engine::PayrollEngine)
//! operations over JSON. Errors are returned as `{code, message, details?}`
//! with the status derived from the error kind.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    ApproveRequest, BatchPaymentRequest, CompanyGenerationRequest, GenerateLiquidationRequest,
    PaymentRequest, ProvisionalPaymentRequest, ProvisionalReportQuery, RejectRequest,
};
pub use response::{ApiError, ApiErrorResponse, status_for};
pub use state::AppState;
