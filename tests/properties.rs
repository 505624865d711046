//! Property tests for the payroll calculations.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use payroll_engine::calculation::{
    DeductionCalculator, calculate_gross_salary, round_currency, split_daily_hours,
};
use payroll_engine::config::{DeductionRule, PayrollConfig};
use payroll_engine::models::{AttendanceSummary, Liquidation, PayrollPeriod};

/// A non-negative amount with cents.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates between 0 and 1 with four decimal places.
fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|bp| Decimal::new(bp, 4))
}

fn summary() -> impl Strategy<Value = AttendanceSummary> {
    (0u32..=31, 0i64..=2_480, 0i64..=1_000).prop_map(|(days, regular, overtime)| AttendanceSummary {
        days_worked: days,
        regular_hours: Decimal::new(regular, 1),
        overtime_hours: Decimal::new(overtime, 1),
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// The total withheld is exactly the sum of the rounded lines.
    #[test]
    fn deduction_total_is_sum_of_lines(
        gross in amount(),
        pension in rate(),
        health in rate(),
    ) {
        let calculator = DeductionCalculator::new(
            vec![
                DeductionRule::new("pension", pension),
                DeductionRule::new("health", health),
            ],
            2,
        );

        let breakdown = calculator.calculate(gross).unwrap();

        let sum: Decimal = breakdown.details.iter().map(|line| line.amount).sum();
        prop_assert_eq!(breakdown.total_deductions, sum);
        for line in &breakdown.details {
            prop_assert!(line.amount >= Decimal::ZERO);
            prop_assert!(line.amount <= gross);
            prop_assert_eq!(line.amount, round_currency(line.amount, 2));
        }
    }

    /// A generated liquidation always nets gross minus deductions.
    #[test]
    fn net_is_gross_minus_deductions(base in amount(), summary in summary()) {
        let config = PayrollConfig::default();
        let gross = calculate_gross_salary(base, &summary, &config).unwrap();
        let breakdown = DeductionCalculator::from_config(&config)
            .calculate(gross.gross_salary)
            .unwrap();

        let period = PayrollPeriod::new(2026, 1).unwrap();
        let (liquidation, deductions) = Liquidation::pending(
            "emp_001",
            period,
            &summary,
            gross.gross_salary,
            &breakdown,
            Utc::now(),
        );

        prop_assert_eq!(
            liquidation.net_salary(),
            liquidation.gross_salary() - liquidation.total_deductions()
        );
        let persisted: Decimal = deductions.iter().map(|d| d.amount).sum();
        prop_assert_eq!(liquidation.total_deductions(), persisted);
        prop_assert!(liquidation.is_consistent_with(&deductions));
    }

    /// Gross pay is never negative and is the sum of its parts.
    #[test]
    fn gross_is_non_negative(base in amount(), summary in summary()) {
        let result = calculate_gross_salary(base, &summary, &PayrollConfig::default()).unwrap();

        prop_assert!(result.regular_pay >= Decimal::ZERO);
        prop_assert!(result.overtime_pay >= Decimal::ZERO);
        prop_assert_eq!(result.gross_salary, result.regular_pay + result.overtime_pay);
    }

    /// Splitting a day never loses or invents hours.
    #[test]
    fn daily_split_preserves_hours(
        worked in 0i64..=2_400i64,
        threshold in 1i64..=240i64,
    ) {
        let worked = Decimal::new(worked, 2);
        let threshold = Decimal::new(threshold, 1);

        let split = split_daily_hours(worked, threshold);

        prop_assert_eq!(split.regular_hours + split.overtime_hours, worked);
        prop_assert!(split.regular_hours <= threshold);
        prop_assert!(split.overtime_hours >= Decimal::ZERO);
    }
}
