//! HTTP request handlers for the Payroll Liquidation Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::PaymentDetails;

use super::request::{
    ApproveRequest, BatchPaymentRequest, CompanyGenerationRequest, GenerateLiquidationRequest,
    PaymentRequest, ProvisionalPaymentRequest, ProvisionalReportQuery, RejectRequest,
};
use super::response::ApiErrorResponse;
use super::state::AppState;

type HandlerResult = Result<axum::response::Response, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/liquidations", post(generate_liquidation))
        .route(
            "/liquidations/:id",
            get(get_liquidation).delete(remove_liquidation),
        )
        .route("/liquidations/:id/recompute", post(recompute_liquidation))
        .route("/liquidations/:id/approve", post(approve_liquidation))
        .route("/liquidations/:id/reject", post(reject_liquidation))
        .route("/liquidations/:id/pay", post(pay_liquidation))
        .route(
            "/liquidations/:id/provisional-payment",
            post(generate_provisional_payment),
        )
        .route(
            "/companies/:company_id/liquidations",
            post(generate_company_liquidations),
        )
        .route("/payments/batch", post(pay_batch))
        .route("/reports/provisional", get(provisional_report))
        .with_state(state)
}

/// Unwraps an extractor result, logging the rejection.
fn extract<T, R>(correlation_id: Uuid, extracted: Result<T, R>) -> Result<T, ApiErrorResponse>
where
    R: Into<ApiErrorResponse>,
{
    extracted.map_err(|rejection| {
        let response: ApiErrorResponse = rejection.into();
        warn!(
            correlation_id = %correlation_id,
            error = %response.error.message,
            "Request rejected"
        );
        response
    })
}

/// Turns an engine result into a JSON response with `status`.
fn respond<T: serde::Serialize>(
    correlation_id: Uuid,
    operation: &'static str,
    started: Instant,
    status: StatusCode,
    result: EngineResult<T>,
) -> HandlerResult {
    match result {
        Ok(body) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = started.elapsed().as_micros(),
                "Request completed"
            );
            Ok((status, Json(body)).into_response())
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                kind = %err.kind(),
                error = %err,
                "Request failed"
            );
            Err(err.into())
        }
    }
}

/// Handler for `POST /liquidations`.
async fn generate_liquidation(
    State(state): State<AppState>,
    payload: Result<Json<GenerateLiquidationRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Json(request) = extract(correlation_id, payload)?;
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee_id,
        period = %request.period,
        "Generating liquidation"
    );

    let result = state
        .engine()
        .generate_liquidation(&request.employee_id, request.period);
    respond(correlation_id, "generate", started, StatusCode::CREATED, result)
}

/// Handler for `POST /companies/:company_id/liquidations`.
async fn generate_company_liquidations(
    State(state): State<AppState>,
    company_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<CompanyGenerationRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(company_id) = extract(correlation_id, company_id)?;
    let Json(request) = extract(correlation_id, payload)?;

    let result = state
        .engine()
        .generate_liquidations_for_company(&company_id, request.period);
    respond(correlation_id, "generate_company", started, StatusCode::OK, result)
}

/// Handler for `GET /liquidations/:id`.
async fn get_liquidation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;

    let result = state.engine().liquidation(id);
    respond(correlation_id, "get", started, StatusCode::OK, result)
}

/// Handler for `DELETE /liquidations/:id`.
async fn remove_liquidation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;

    match state.engine().remove_liquidation(id) {
        Ok(()) => {
            info!(
                correlation_id = %correlation_id,
                operation = "remove",
                duration_us = started.elapsed().as_micros(),
                "Request completed"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(err) => respond::<()>(correlation_id, "remove", started, StatusCode::OK, Err(err)),
    }
}

/// Handler for `POST /liquidations/:id/recompute`.
async fn recompute_liquidation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;

    let result = state.engine().recompute(id);
    respond(correlation_id, "recompute", started, StatusCode::OK, result)
}

/// Handler for `POST /liquidations/:id/approve`.
async fn approve_liquidation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ApproveRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;
    let Json(request) = extract(correlation_id, payload)?;

    let result = state.engine().approve(id, &request.approver_id);
    respond(correlation_id, "approve", started, StatusCode::OK, result)
}

/// Handler for `POST /liquidations/:id/reject`.
async fn reject_liquidation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RejectRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;
    let Json(request) = extract(correlation_id, payload)?;

    let result = state.engine().reject(id, &request.reason);
    respond(correlation_id, "reject", started, StatusCode::OK, result)
}

/// Handler for `POST /liquidations/:id/pay`.
async fn pay_liquidation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;
    let Json(request) = extract(correlation_id, payload)?;

    let result = PaymentDetails::try_from(request)
        .and_then(|details| state.engine().pay(id, &details));
    respond(correlation_id, "pay", started, StatusCode::OK, result)
}

/// Handler for `POST /liquidations/:id/provisional-payment`.
async fn generate_provisional_payment(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProvisionalPaymentRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Path(id) = extract(correlation_id, id)?;
    let Json(request) = extract(correlation_id, payload)?;

    let result = state.engine().generate_provisional_payment(id, request.date);
    respond(correlation_id, "provisional_payment", started, StatusCode::CREATED, result)
}

/// Handler for `POST /payments/batch`.
async fn pay_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchPaymentRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Json(request) = extract(correlation_id, payload)?;
    info!(
        correlation_id = %correlation_id,
        items = request.liquidation_ids.len(),
        "Processing batch payment"
    );

    let ids = request.liquidation_ids;
    let result = PaymentDetails::try_from(request.payment)
        .and_then(|details| state.engine().pay_batch(&ids, &details));
    respond(correlation_id, "pay_batch", started, StatusCode::OK, result)
}

/// Handler for `GET /reports/provisional`.
async fn provisional_report(
    State(state): State<AppState>,
    query: Result<Query<ProvisionalReportQuery>, QueryRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let started = Instant::now();
    let Query(query) = extract(correlation_id, query)?;

    let result = query.period().and_then(|period| {
        state
            .engine()
            .provisional_report(period, query.company_id.as_deref())
    });
    respond(correlation_id, "provisional_report", started, StatusCode::OK, result)
}
