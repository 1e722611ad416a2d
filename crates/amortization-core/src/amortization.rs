//! Month-by-month amortization of a fixed-rate installment loan with
//! optional extra principal payments.
//!
//! Every monetary quantity is rounded to 2 dp as it is produced, so total
//! interest is the sum of already-rounded monthly interest. The loop stops
//! in the first month the balance reaches zero, which is how extra payments
//! shorten the schedule.

use log::{debug, trace};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanError;
use crate::extra_payments::ExtraPaymentPlan;
use crate::installment::{compute_installment, monthly_interest, LoanTerms};
use crate::rounding::round_money;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Loan terms plus the extra payments to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(flatten)]
    pub terms: LoanTerms,
    #[serde(default)]
    pub extra_payments: ExtraPaymentPlan,
}

impl ScheduleInput {
    /// Decode a schedule request from a JSON document (file or stdin body).
    pub fn from_json(value: serde_json::Value) -> LoanResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// One simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month number.
    pub period: u32,
    pub interest: Money,
    /// Scheduled principal portion of the installment.
    pub principal: Money,
    pub extra_payment: Money,
    /// Interest + scheduled principal + extra payment.
    pub total_payment: Money,
    /// Balance after this month's payments, never below zero.
    pub remaining_balance: Money,
}

/// Complete schedule of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub installment: Money,
    /// `tenure_years * 12`; the loop never runs past it.
    pub nominal_periods: u32,
    pub rows: Vec<AmortizationRow>,
    /// Sum of the per-row interest.
    pub total_interest: Money,
    /// Sum of the scheduled principal portions.
    pub total_principal: Money,
    pub total_extra_payments: Money,
    /// Number of rows produced.
    pub periods_used: u32,
}

impl AmortizationResult {
    pub fn last_row(&self) -> Option<&AmortizationRow> {
        self.rows.last()
    }

    /// True when the balance was retired before the nominal term.
    pub fn paid_off_early(&self) -> bool {
        self.periods_used < self.nominal_periods
    }

    /// Principal plus interest actually paid.
    pub fn total_amount_paid(&self) -> LoanResult<Money> {
        let repaid = checked_add(
            self.total_principal,
            self.total_extra_payments,
            "total repayment",
        )?;
        checked_add(repaid, self.total_interest, "total amount paid")
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the loan month by month.
///
/// The installment comes from [`compute_installment`]. Each month accrues
/// interest on the opening balance, applies the scheduled principal and any
/// extra payment from `extra_payments`, and records the row. The last
/// nominal month retires whatever residual the installment rounding left.
///
/// # Errors
///
/// Propagates `InvalidInput` and `FinancialImpossibility` from the
/// installment calculation. Plan validation has already happened when the
/// [`ExtraPaymentPlan`] was built.
pub fn simulate_amortization(
    principal: Money,
    annual_rate_percent: Decimal,
    tenure_years: u32,
    extra_payments: &ExtraPaymentPlan,
) -> LoanResult<AmortizationResult> {
    let info = compute_installment(principal, annual_rate_percent, tenure_years)?;
    let installment = info.installment;
    let nominal_periods = info.total_periods;

    let mut balance = round_money(principal);
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut total_extra = Decimal::ZERO;
    let mut rows = Vec::with_capacity(nominal_periods as usize);

    for period in 1..=nominal_periods {
        let interest = monthly_interest(balance, annual_rate_percent)?;
        let extra = round_money(extra_payments.get(period));

        let mut scheduled = round_money(installment - interest);
        if period == nominal_periods {
            scheduled = round_money((balance - extra).max(Decimal::ZERO));
        } else if scheduled > balance {
            scheduled = balance;
        }

        balance -= round_money(checked_add(scheduled, extra, "principal payment")?);
        total_interest = checked_add(total_interest, interest, "total interest")?;
        total_principal = checked_add(total_principal, scheduled, "total principal")?;
        total_extra = checked_add(total_extra, extra, "total extra payments")?;

        trace!(
            "period {period}: interest {interest}, principal {scheduled}, extra {extra}, balance {balance}"
        );

        rows.push(AmortizationRow {
            period,
            interest,
            principal: scheduled,
            extra_payment: extra,
            total_payment: checked_add(
                checked_add(interest, scheduled, "payment")?,
                extra,
                "payment",
            )?,
            remaining_balance: round_money(balance.max(Decimal::ZERO)),
        });

        if balance <= Decimal::ZERO {
            if period < nominal_periods {
                debug!("loan retired early in period {period} of {nominal_periods}");
            }
            break;
        }
    }

    // Bounds every partial sum of repayments, e.g. per-year buckets.
    let repaid = checked_add(total_principal, total_extra, "total repayment")?;
    let periods_used = rows.len() as u32;
    debug!(
        "simulated {periods_used} periods, installment {installment}, total interest {total_interest}, repaid {repaid}"
    );

    Ok(AmortizationResult {
        installment,
        nominal_periods,
        rows,
        total_interest: round_money(total_interest),
        total_principal,
        total_extra_payments: total_extra,
        periods_used,
    })
}

/// Simulate the schedule described by `input` and wrap it in the standard
/// computation envelope.
pub fn build_schedule(input: &ScheduleInput) -> LoanResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let terms = &input.terms;

    let result = simulate_amortization(
        terms.principal,
        terms.annual_rate,
        terms.tenure_years,
        &input.extra_payments,
    )?;

    let mut warnings = Vec::new();
    let inert = input.extra_payments.periods_after(result.periods_used);
    if !inert.is_empty() {
        warnings.push(format!(
            "Extra payments for periods {} fall after the loan is retired in period {} and were not applied",
            join_periods(&inert),
            result.periods_used
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-installment amortization with extra principal payments",
        input,
        warnings,
        elapsed,
        result,
    ))
}

/// Addition that reports leaving the decimal range instead of panicking.
pub(crate) fn checked_add(a: Money, b: Money, what: &str) -> LoanResult<Money> {
    a.checked_add(b).ok_or_else(|| {
        LoanError::FinancialImpossibility(format!("{what} overflows the decimal range"))
    })
}

pub(crate) fn join_periods(periods: &[u32]) -> String {
    periods
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use test_log::test;

    fn no_extra() -> ExtraPaymentPlan {
        ExtraPaymentPlan::new()
    }

    fn sum_interest(result: &AmortizationResult) -> Money {
        result.rows.iter().map(|r| r.interest).sum()
    }

    #[test]
    fn test_twelve_month_textbook_schedule() {
        let result = simulate_amortization(dec!(12_000), dec!(12), 1, &no_extra()).unwrap();

        assert_eq!(result.installment, dec!(1066.19));
        assert_eq!(result.periods_used, 12);
        assert_eq!(result.total_interest, dec!(794.23));

        let first = &result.rows[0];
        assert_eq!(first.period, 1);
        assert_eq!(first.interest, dec!(120.00));
        assert_eq!(first.principal, dec!(946.19));
        assert_eq!(first.remaining_balance, dec!(11053.81));
        assert_eq!(first.total_payment, dec!(1066.19));

        let sixth = &result.rows[5];
        assert_eq!(sixth.interest, dec!(71.73));
        assert_eq!(sixth.remaining_balance, dec!(6179.02));

        // Final month absorbs the rounding residual of the installment.
        let last = result.last_row().unwrap();
        assert_eq!(last.interest, dec!(10.56));
        assert_eq!(last.principal, dec!(1055.58));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_principal_fully_repaid_without_extras() {
        let result = simulate_amortization(dec!(100_000), dec!(7.5), 30, &no_extra()).unwrap();
        assert_eq!(result.periods_used, 360);
        assert_eq!(result.total_principal, dec!(100_000));
        assert_eq!(result.total_interest, dec!(151721.99));
        assert!(!result.paid_off_early());
        assert_eq!(result.total_amount_paid().unwrap(), dec!(251721.99));
    }

    #[test]
    fn test_total_interest_is_sum_of_rows() {
        let plan = ExtraPaymentPlan::parse("{1: 50000, 60: 10000}").unwrap();
        let result = simulate_amortization(dec!(200_000), dec!(6), 30, &plan).unwrap();
        assert_eq!(result.total_interest, sum_interest(&result));
        assert_eq!(result.total_interest, dec!(77659.89));
        assert_eq!(result.periods_used, 182);
    }

    #[test]
    fn test_extra_payment_row_fields() {
        let plan = ExtraPaymentPlan::parse("{1: 50000}").unwrap();
        let result = simulate_amortization(dec!(200_000), dec!(6), 30, &plan).unwrap();
        let first = &result.rows[0];
        assert_eq!(first.interest, dec!(1000.00));
        assert_eq!(first.principal, dec!(199.10));
        assert_eq!(first.extra_payment, dec!(50000));
        assert_eq!(first.total_payment, dec!(51199.10));
        assert_eq!(first.remaining_balance, dec!(149800.90));
        assert_eq!(result.total_extra_payments, dec!(50000));
    }

    #[test]
    fn test_overshooting_extra_ends_schedule_that_period() {
        let plan = ExtraPaymentPlan::parse("{3: 20000}").unwrap();
        let result = simulate_amortization(dec!(10_000), dec!(12), 1, &plan).unwrap();

        assert_eq!(result.periods_used, 3);
        let last = result.last_row().unwrap();
        assert_eq!(last.extra_payment, dec!(20000));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
        assert_eq!(result.total_interest, dec!(276.27));
        assert!(result.paid_off_early());
    }

    #[test]
    fn test_scheduled_principal_capped_at_balance() {
        let plan = ExtraPaymentPlan::parse("{12: 500000}").unwrap();
        let result = simulate_amortization(dec!(3_500_000), dec!(9.35), 20, &plan).unwrap();
        let last = result.last_row().unwrap();
        assert_eq!(last.period, 172);
        assert_eq!(last.interest, dec!(2.92));
        assert_eq!(last.principal, dec!(374.34));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_extra_in_final_period_reduces_scheduled_principal() {
        let plan = ExtraPaymentPlan::parse("{12: 100}").unwrap();
        let result = simulate_amortization(dec!(10_000), dec!(12), 1, &plan).unwrap();
        let last = result.last_row().unwrap();
        assert_eq!(last.period, 12);
        assert_eq!(last.extra_payment, dec!(100));
        assert_eq!(last.principal, dec!(779.67));
        assert_eq!(last.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_entries_beyond_term_are_inert() {
        let baseline = simulate_amortization(dec!(12_000), dec!(12), 1, &no_extra()).unwrap();
        let plan = ExtraPaymentPlan::parse("{13: 1000, 400: 5}").unwrap();
        let result = simulate_amortization(dec!(12_000), dec!(12), 1, &plan).unwrap();
        assert_eq!(result, baseline);
    }

    #[test]
    fn test_half_cent_interest_rounds_to_even() {
        let result = simulate_amortization(dec!(1001), dec!(6), 1, &no_extra()).unwrap();
        assert_eq!(result.installment, dec!(86.15));
        assert_eq!(result.rows[0].interest, dec!(5.00));
        assert_eq!(result.rows[0].principal, dec!(81.15));
        assert_eq!(result.total_interest, dec!(32.83));
    }

    #[test]
    fn test_zero_rate_has_no_interest() {
        let result = simulate_amortization(dec!(120_000), Decimal::ZERO, 10, &no_extra()).unwrap();
        assert_eq!(result.periods_used, 120);
        assert!(result.rows.iter().all(|r| r.interest.is_zero()));
        assert!(result.rows.iter().all(|r| r.principal == dec!(1000)));
        assert_eq!(result.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_residual_lands_in_last_row() {
        let result = simulate_amortization(dec!(1000), Decimal::ZERO, 1, &no_extra()).unwrap();
        assert_eq!(result.periods_used, 12);
        assert_eq!(result.rows[0].principal, dec!(83.33));
        assert_eq!(result.rows[11].principal, dec!(83.37));
        assert_eq!(result.rows[11].remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_terms_are_rejected() {
        let err = simulate_amortization(Decimal::ZERO, dec!(5), 10, &no_extra()).unwrap_err();
        assert!(matches!(err, LoanError::InvalidInput { .. }));
    }

    #[test]
    fn test_extra_payment_at_decimal_limit_is_reported() {
        let plan = ExtraPaymentPlan::parse("{1: 79228162514264337593543950335}").unwrap();
        let result = simulate_amortization(dec!(1000), dec!(5), 1, &plan);
        assert!(matches!(result, Err(LoanError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_principal_too_large_for_interest_is_reported() {
        let principal = dec!(10_000_000_000_000_000_000_000_000_000);
        assert!(compute_installment(principal, dec!(10), 1).is_ok());

        let result = simulate_amortization(principal, dec!(10), 1, &no_extra());
        assert!(matches!(result, Err(LoanError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_tenure_above_ceiling_is_rejected_before_simulating() {
        let result = simulate_amortization(dec!(1000), Decimal::ZERO, 100_000_000, &no_extra());
        assert!(matches!(
            result,
            Err(LoanError::InvalidInput { ref field, .. }) if field == "tenure_years"
        ));
    }

    #[test]
    fn test_build_schedule_envelope() {
        let input = ScheduleInput {
            terms: LoanTerms::new(dec!(12_000), dec!(12), 1),
            extra_payments: ExtraPaymentPlan::parse("{2: 11000, 30: 10}").unwrap(),
        };
        let output = build_schedule(&input).unwrap();
        assert!(output.methodology.contains("amortization"));
        assert_eq!(output.metadata.rounding, "half_even_2dp");
        assert_eq!(output.result.periods_used, 2);
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("30"));
        assert_eq!(output.assumptions["tenure_years"], 1);
    }

    #[test]
    fn test_from_json_reports_serialization_errors() {
        let input = ScheduleInput::from_json(serde_json::json!({
            "principal": "12000",
            "annual_rate": "12",
            "tenure_years": 1,
            "extra_payments": "{3: 250}"
        }))
        .unwrap();
        assert_eq!(input.extra_payments.get(3), dec!(250));

        let err = ScheduleInput::from_json(serde_json::json!({
            "principal": "12000",
            "annual_rate": "12",
            "tenure_years": 1,
            "extra_payments": "{3: -250}"
        }))
        .unwrap_err();
        match err {
            LoanError::SerializationError(message) => {
                assert!(message.contains("Malformed extra payment plan"), "{message}")
            }
            other => panic!("Expected SerializationError, got {other:?}"),
        }

        let missing = ScheduleInput::from_json(serde_json::json!({"principal": "1"}));
        assert!(matches!(missing, Err(LoanError::SerializationError(_))));
    }

    #[test]
    fn test_schedule_input_from_json() {
        let json = r#"{
            "principal": "3500000",
            "annual_rate": "9.35",
            "tenure_years": 20,
            "extra_payments": [{"period": 12, "amount": "500000"}]
        }"#;
        let input: ScheduleInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.terms.tenure_years, 20);
        assert_eq!(input.extra_payments.get(12), dec!(500000));

        let bare: ScheduleInput =
            serde_json::from_str(r#"{"principal": 1000, "annual_rate": 5, "tenure_years": 1}"#)
                .unwrap();
        assert!(bare.extra_payments.is_empty());
    }
}
