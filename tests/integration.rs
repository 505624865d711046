//! Integration tests for the Payroll Liquidation Engine.
//!
//! This test suite covers the liquidation lifecycle end to end:
//! - Generation from attendance (single employee and whole company)
//! - Approval and rejection
//! - Single and batch payment
//! - Provisional payments and the monthly report
//! - Notification failures
//! - The HTTP adapter

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::{ConfigLoader, PayrollConfig};
use payroll_engine::engine::{Collaborators, PayrollEngine};
use payroll_engine::error::{EngineError, EngineResult, ErrorKind};
use payroll_engine::models::{
    AttendanceRecord, Employee, LiquidationStatus, PaymentDetails, PaymentMethod, PayrollPeriod,
};
use payroll_engine::notify::{LogNotifier, NotificationEvent, Notifier};
use payroll_engine::store::{
    InMemoryAttendanceStore, InMemoryEmployeeDirectory, InMemoryLiquidationStore,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn january() -> PayrollPeriod {
    PayrollPeriod::new(2026, 1).unwrap()
}

fn pay_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
}

fn transfer() -> PaymentDetails {
    PaymentDetails::new(PaymentMethod::Transfer, "Banco Estado").on(pay_date())
}

fn employee(id: &str, company: &str, base_salary: &str) -> Employee {
    Employee {
        id: id.to_string(),
        company_id: company.to_string(),
        name: format!("Employee {}", id),
        base_salary: dec(base_salary),
    }
}

/// Twenty 8-hour days in January 2026 for each employee.
fn full_month(attendance: &InMemoryAttendanceStore, employee_id: &str) {
    for day in 1..=20 {
        attendance
            .insert(AttendanceRecord::closed(
                employee_id,
                NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            ))
            .unwrap();
    }
}

/// Counts notifications and fails every one of them.
#[derive(Default)]
struct FailingNotifier {
    attempts: AtomicUsize,
}

impl Notifier for FailingNotifier {
    fn notify(&self, _employee_id: &str, _event: NotificationEvent, _payload: &Value) -> EngineResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EngineError::storage("mail relay unavailable"))
    }
}

struct Fixture {
    engine: PayrollEngine,
    liquidations: Arc<InMemoryLiquidationStore>,
}

fn fixture_with_notifier(employees: Vec<Employee>, notifier: Arc<dyn Notifier>) -> Fixture {
    let attendance = InMemoryAttendanceStore::new();
    for employee in &employees {
        full_month(&attendance, &employee.id);
    }
    let liquidations = Arc::new(InMemoryLiquidationStore::new());
    let engine = PayrollEngine::new(
        PayrollConfig::default(),
        Collaborators {
            employees: Arc::new(InMemoryEmployeeDirectory::with_employees(employees)),
            attendance: Arc::new(attendance),
            liquidations: liquidations.clone(),
            notifier,
        },
    )
    .expect("Failed to build engine");

    Fixture {
        engine,
        liquidations,
    }
}

fn fixture(employees: Vec<Employee>) -> Fixture {
    fixture_with_notifier(employees, Arc::new(LogNotifier))
}

fn single_employee() -> Fixture {
    fixture(vec![employee("emp_001", "acme", "1000000")])
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_full_month_without_overtime() {
    let f = single_employee();

    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();

    assert_eq!(liquidation.status(), LiquidationStatus::Pending);
    assert_eq!(liquidation.days_worked(), 20);
    assert_eq!(liquidation.regular_hours(), dec("160"));
    assert_eq!(liquidation.overtime_hours(), Decimal::ZERO);
    assert_eq!(liquidation.gross_salary(), dec("1000000"));
    assert_eq!(liquidation.total_deductions(), dec("170000"));
    assert_eq!(liquidation.net_salary(), dec("830000"));

    let detail = f.engine.liquidation(liquidation.id()).unwrap();
    let pension = detail.deductions.iter().find(|d| d.concept == "pension").unwrap();
    let health = detail.deductions.iter().find(|d| d.concept == "health").unwrap();
    assert_eq!(pension.amount, dec("100000"));
    assert_eq!(health.amount, dec("70000"));
}

#[test]
fn test_net_equals_gross_minus_deductions() {
    let f = fixture(vec![employee("emp_002", "acme", "987654")]);

    let liquidation = f.engine.generate_liquidation("emp_002", january()).unwrap();
    let detail = f.engine.liquidation(liquidation.id()).unwrap();

    let sum: Decimal = detail.deductions.iter().map(|d| d.amount).sum();
    assert_eq!(liquidation.total_deductions(), sum);
    assert_eq!(
        liquidation.net_salary(),
        liquidation.gross_salary() - liquidation.total_deductions()
    );
}

#[test]
fn test_duplicate_generation_fails() {
    let f = single_employee();
    f.engine.generate_liquidation("emp_001", january()).unwrap();

    match f.engine.generate_liquidation("emp_001", january()) {
        Err(EngineError::DuplicatePeriod {
            employee_id,
            period,
        }) => {
            assert_eq!(employee_id, "emp_001");
            assert_eq!(period, "2026-01");
        }
        other => panic!("Expected DuplicatePeriod error, got {:?}", other),
    }
    assert_eq!(f.liquidations.liquidations().unwrap().len(), 1);
}

#[test]
fn test_unknown_employee_is_not_found() {
    let f = single_employee();

    let err = f.engine.generate_liquidation("emp_999", january()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(f.liquidations.liquidations().unwrap().is_empty());
}

#[test]
fn test_rejected_liquidation_does_not_block_regeneration() {
    let f = single_employee();
    let first = f.engine.generate_liquidation("emp_001", january()).unwrap();
    f.engine.reject(first.id(), "hours under review").unwrap();

    let second = f.engine.generate_liquidation("emp_001", january()).unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(
        f.engine.liquidation(first.id()).unwrap().liquidation.status(),
        LiquidationStatus::Rejected
    );
}

#[test]
fn test_company_generation_collects_failures() {
    let f = fixture(vec![
        employee("emp_001", "acme", "1000000"),
        employee("emp_002", "acme", "800000"),
        employee("emp_003", "globex", "900000"),
    ]);
    f.engine.generate_liquidation("emp_001", january()).unwrap();

    let report = f
        .engine
        .generate_liquidations_for_company("acme", january())
        .unwrap();

    assert_eq!(report.processed(), 2);
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].employee_id(), "emp_002");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].employee_id, "emp_001");
    assert_eq!(report.failed[0].kind, ErrorKind::DuplicatePeriod);
}

// =============================================================================
// Approval and rejection
// =============================================================================

#[test]
fn test_approve_twice_keeps_first_approval() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();
    let approved = f.engine.approve(liquidation.id(), "hr_001").unwrap();

    match f.engine.approve(liquidation.id(), "hr_002") {
        Err(EngineError::InvalidState {
            current, attempted, ..
        }) => {
            assert_eq!(current, LiquidationStatus::Approved);
            assert_eq!(attempted.as_str(), "approve");
        }
        other => panic!("Expected InvalidState error, got {:?}", other),
    }

    let stored = f.engine.liquidation(liquidation.id()).unwrap().liquidation;
    assert_eq!(stored.approved_by(), Some("hr_001"));
    assert_eq!(stored.approved_at(), approved.approved_at());
}

#[test]
fn test_reject_without_reason_keeps_pending() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();

    match f.engine.reject(liquidation.id(), "   ") {
        Err(EngineError::Validation { field, .. }) => assert_eq!(field, "reason"),
        other => panic!("Expected Validation error, got {:?}", other),
    }

    let stored = f.engine.liquidation(liquidation.id()).unwrap().liquidation;
    assert_eq!(stored.status(), LiquidationStatus::Pending);
    assert!(stored.rejection_reason().is_none());
}

#[test]
fn test_notification_failure_never_rolls_back() {
    let notifier = Arc::new(FailingNotifier::default());
    let f = fixture_with_notifier(
        vec![employee("emp_001", "acme", "1000000")],
        notifier.clone(),
    );
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();

    let approved = f.engine.approve(liquidation.id(), "hr_001").unwrap();
    assert_eq!(approved.status(), LiquidationStatus::Approved);

    let receipt = f.engine.pay(liquidation.id(), &transfer()).unwrap();
    assert_eq!(receipt.liquidation.status(), LiquidationStatus::Paid);

    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(
        f.engine.liquidation(liquidation.id()).unwrap().liquidation.status(),
        LiquidationStatus::Paid
    );
}

// =============================================================================
// Payment
// =============================================================================

#[test]
fn test_pay_pending_creates_no_records() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();

    match f.engine.pay(liquidation.id(), &transfer()) {
        Err(EngineError::InvalidState { current, .. }) => {
            assert_eq!(current, LiquidationStatus::Pending)
        }
        other => panic!("Expected InvalidState error, got {:?}", other),
    }
    assert_eq!(f.liquidations.salary_payment_count().unwrap(), 0);
    assert_eq!(f.liquidations.provisional_payment_count().unwrap(), 0);
}

#[test]
fn test_pay_creates_salary_and_provisional_payment() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();
    f.engine.approve(liquidation.id(), "hr_001").unwrap();

    let receipt = f.engine.pay(liquidation.id(), &transfer()).unwrap();

    assert_eq!(receipt.liquidation.status(), LiquidationStatus::Paid);
    assert!(receipt.liquidation.paid_at().is_some());
    assert_eq!(receipt.salary_payment.amount, dec("830000"));
    assert_eq!(receipt.salary_payment.method, PaymentMethod::Transfer);
    assert_eq!(receipt.salary_payment.date, pay_date());

    let provisional = &receipt.provisional_payment;
    assert_eq!(provisional.pension_amount, dec("100000"));
    assert_eq!(provisional.health_amount, dec("70000"));
    assert_eq!(
        provisional.total,
        provisional.pension_amount + provisional.health_amount
    );
    assert_eq!(provisional.period_label, "2026-01");

    assert_eq!(f.liquidations.salary_payment_count().unwrap(), 1);
    assert_eq!(f.liquidations.provisional_payment_count().unwrap(), 1);
}

#[test]
fn test_paid_liquidation_rereads_identically() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();
    f.engine.approve(liquidation.id(), "hr_001").unwrap();
    f.engine.pay(liquidation.id(), &transfer()).unwrap();

    let first = f.engine.liquidation(liquidation.id()).unwrap();
    let second = f.engine.liquidation(liquidation.id()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.liquidation.gross_salary(), dec("1000000"));
    assert_eq!(first.liquidation.net_salary(), dec("830000"));
}

#[test]
fn test_batch_partial_failure() {
    let f = fixture(vec![
        employee("emp_001", "acme", "1000000"),
        employee("emp_002", "acme", "1000000"),
        employee("emp_003", "acme", "1000000"),
    ]);
    let l1 = f.engine.generate_liquidation("emp_001", january()).unwrap();
    let l2 = f.engine.generate_liquidation("emp_002", january()).unwrap();
    let l3 = f.engine.generate_liquidation("emp_003", january()).unwrap();
    f.engine.approve(l1.id(), "hr_001").unwrap();
    f.engine.approve(l3.id(), "hr_001").unwrap();

    let report = f
        .engine
        .pay_batch(&[l1.id(), l2.id(), l3.id()], &transfer())
        .unwrap();

    assert_eq!(report.succeeded_ids(), vec![l1.id(), l3.id()]);
    assert_eq!(report.failed_ids(), vec![l2.id()]);
    assert_eq!(report.failed[0].kind, ErrorKind::InvalidState);
    assert_eq!(report.processed(), 3);
    assert_eq!(report.total_amount, dec("1660000"));

    assert_eq!(
        f.engine.liquidation(l2.id()).unwrap().liquidation.status(),
        LiquidationStatus::Pending
    );
    assert_eq!(f.liquidations.salary_payment_count().unwrap(), 2);
    assert_eq!(f.liquidations.provisional_payment_count().unwrap(), 2);
}

#[test]
fn test_batch_with_no_success_commits_nothing() {
    // a zero salary leaves nothing to remit
    let f = fixture(vec![employee("emp_004", "acme", "0")]);
    let l4 = f.engine.generate_liquidation("emp_004", january()).unwrap();
    f.engine.approve(l4.id(), "hr_001").unwrap();

    match f.engine.pay_batch(&[l4.id()], &transfer()) {
        Err(EngineError::BatchFailed { failures }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].liquidation_id, l4.id());
            assert_eq!(failures[0].kind, ErrorKind::Validation);
        }
        other => panic!("Expected BatchFailed error, got {:?}", other),
    }

    assert_eq!(
        f.engine.liquidation(l4.id()).unwrap().liquidation.status(),
        LiquidationStatus::Approved
    );
    assert_eq!(f.liquidations.salary_payment_count().unwrap(), 0);
    assert_eq!(f.liquidations.provisional_payment_count().unwrap(), 0);
}

// =============================================================================
// Provisional payments
// =============================================================================

#[test]
fn test_provisional_report_filters_by_company() {
    let f = fixture(vec![
        employee("emp_001", "acme", "1000000"),
        employee("emp_002", "globex", "2000000"),
    ]);
    let ids: Vec<Uuid> = ["emp_001", "emp_002"]
        .iter()
        .map(|id| {
            let liquidation = f.engine.generate_liquidation(id, january()).unwrap();
            f.engine.approve(liquidation.id(), "hr_001").unwrap();
            liquidation.id()
        })
        .collect();
    f.engine.pay_batch(&ids, &transfer()).unwrap();

    let all = f.engine.provisional_report(january(), None).unwrap();
    assert_eq!(all.payment_count, 2);
    assert_eq!(all.pension_total, dec("300000"));
    assert_eq!(all.health_total, dec("210000"));
    assert_eq!(all.total, dec("510000"));

    let acme = f.engine.provisional_report(january(), Some("acme")).unwrap();
    assert_eq!(acme.payment_count, 1);
    assert_eq!(acme.company_id.as_deref(), Some("acme"));
    assert_eq!(acme.total, dec("170000"));

    let february = PayrollPeriod::new(2026, 2).unwrap();
    let empty = f.engine.provisional_report(february, None).unwrap();
    assert_eq!(empty.payment_count, 0);
    assert_eq!(empty.total, Decimal::ZERO);
}

#[test]
fn test_provisional_payment_not_generated_twice() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();
    f.engine.approve(liquidation.id(), "hr_001").unwrap();
    f.engine.pay(liquidation.id(), &transfer()).unwrap();

    let err = f
        .engine
        .generate_provisional_payment(liquidation.id(), pay_date())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(f.liquidations.provisional_payment_count().unwrap(), 1);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_shipped_config_matches_defaults() {
    let loader = ConfigLoader::load("./config/payroll.yaml").expect("Failed to load config");
    assert_eq!(loader.config(), &PayrollConfig::default());
}

// =============================================================================
// HTTP API
// =============================================================================

fn router_for(f: &Fixture) -> Router {
    create_router(AppState::new(f.engine.clone()))
}

async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Reads a decimal serialized either as a string or a number.
fn decimal_field(value: &Value) -> Decimal {
    match value {
        Value::String(s) => dec(s),
        other => dec(&other.to_string()),
    }
}

#[tokio::test]
async fn test_http_liquidation_lifecycle() {
    let f = single_employee();
    let router = router_for(&f);

    let (status, created) = send(
        router.clone(),
        "POST",
        "/liquidations",
        Some(json!({"employee_id": "emp_001", "period": "2026-01"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(decimal_field(&created["net_salary"]), dec("830000"));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, approved) = send(
        router.clone(),
        "POST",
        &format!("/liquidations/{}/approve", id),
        Some(json!({"approver_id": "hr_001"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, receipt) = send(
        router.clone(),
        "POST",
        &format!("/liquidations/{}/pay", id),
        Some(json!({"method": "transfer", "bank": "Banco Estado", "date": "2026-01-31"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["liquidation"]["status"], "paid");
    assert_eq!(
        decimal_field(&receipt["salary_payment"]["amount"]),
        dec("830000")
    );

    let (status, detail) = send(router.clone(), "GET", &format!("/liquidations/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["deductions"].as_array().unwrap().len(), 2);

    let (status, report) = send(
        router,
        "GET",
        "/reports/provisional?year=2026&month=1&company_id=acme",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["payment_count"], 1);
    assert_eq!(decimal_field(&report["total"]), dec("170000"));
}

#[tokio::test]
async fn test_http_duplicate_generation_is_conflict() {
    let f = single_employee();
    f.engine.generate_liquidation("emp_001", january()).unwrap();

    let (status, body) = send(
        router_for(&f),
        "POST",
        "/liquidations",
        Some(json!({"employee_id": "emp_001", "period": "2026-01"})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_PERIOD");
    assert_eq!(body["details"]["employee_id"], "emp_001");
}

#[tokio::test]
async fn test_http_unknown_liquidation_is_not_found() {
    let f = single_employee();

    let (status, body) = send(
        router_for(&f),
        "GET",
        &format!("/liquidations/{}", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_http_malformed_json() {
    let f = single_employee();
    let request = Request::builder()
        .method("POST")
        .uri("/liquidations")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = router_for(&f).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "MALFORMED_JSON");
}

#[tokio::test]
async fn test_http_batch_all_failed_is_unprocessable() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();

    let (status, body) = send(
        router_for(&f),
        "POST",
        "/payments/batch",
        Some(json!({
            "liquidation_ids": [liquidation.id()],
            "method": "check",
            "bank": "Banco Estado",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BATCH_FAILED");
    assert_eq!(body["details"]["failures"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_remove_pending_liquidation() {
    let f = single_employee();
    let liquidation = f.engine.generate_liquidation("emp_001", january()).unwrap();
    let router = router_for(&f);

    let (status, _) = send(
        router.clone(),
        "DELETE",
        &format!("/liquidations/{}", liquidation.id()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        router,
        "GET",
        &format!("/liquidations/{}", liquidation.id()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_http_invalid_report_month() {
    let f = single_employee();

    let (status, body) = send(
        router_for(&f),
        "GET",
        "/reports/provisional?year=2026&month=13",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
