//! Savings from extra payments: the schedule is simulated once without any
//! extra payment (baseline) and once with the caller's plan.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{checked_add, join_periods, simulate_amortization, ScheduleInput};
use crate::extra_payments::ExtraPaymentPlan;
use crate::rounding::round_money;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanResult;

/// Baseline vs. extra-payment totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPaymentComparison {
    pub installment: Money,
    pub baseline_total_interest: Money,
    pub total_interest: Money,
    /// Baseline interest minus interest with extra payments.
    pub interest_saved: Money,
    pub baseline_periods: u32,
    pub periods_used: u32,
    pub months_reduced: u32,
    /// Principal plus baseline interest.
    pub baseline_total_amount_paid: Money,
    /// Principal plus interest with extra payments.
    pub total_amount_paid: Money,
}

/// Compare the schedule with extra payments against the plain schedule.
pub fn compare_extra_payments(
    input: &ScheduleInput,
) -> LoanResult<ComputationOutput<ExtraPaymentComparison>> {
    let start = Instant::now();
    let terms = &input.terms;

    let baseline = simulate_amortization(
        terms.principal,
        terms.annual_rate,
        terms.tenure_years,
        &ExtraPaymentPlan::new(),
    )?;
    let accelerated = simulate_amortization(
        terms.principal,
        terms.annual_rate,
        terms.tenure_years,
        &input.extra_payments,
    )?;

    let mut warnings = Vec::new();
    if input.extra_payments.is_empty() {
        warnings.push("No extra payments supplied; both schedules are identical".to_string());
    }
    let beyond_term = input.extra_payments.periods_after(baseline.nominal_periods);
    if !beyond_term.is_empty() {
        warnings.push(format!(
            "Extra payments for periods {} are beyond the {}-month term",
            join_periods(&beyond_term),
            baseline.nominal_periods
        ));
    }
    let after_payoff: Vec<u32> = input
        .extra_payments
        .periods_after(accelerated.periods_used)
        .into_iter()
        .filter(|p| *p <= baseline.nominal_periods)
        .collect();
    if !after_payoff.is_empty() {
        warnings.push(format!(
            "Extra payments for periods {} fall after payoff in period {}",
            join_periods(&after_payoff),
            accelerated.periods_used
        ));
    }

    let principal = round_money(terms.principal);
    let result = ExtraPaymentComparison {
        installment: baseline.installment,
        baseline_total_interest: baseline.total_interest,
        total_interest: accelerated.total_interest,
        interest_saved: baseline.total_interest - accelerated.total_interest,
        baseline_periods: baseline.periods_used,
        periods_used: accelerated.periods_used,
        months_reduced: baseline.periods_used.saturating_sub(accelerated.periods_used),
        baseline_total_amount_paid: checked_add(
            principal,
            baseline.total_interest,
            "baseline total amount paid",
        )?,
        total_amount_paid: checked_add(principal, accelerated.total_interest, "total amount paid")?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Baseline vs. extra-payment amortization comparison",
        input,
        warnings,
        elapsed,
        result,
    ))
}

impl ExtraPaymentComparison {
    /// Share of baseline interest avoided, as a decimal (0.25 = 25%).
    pub fn interest_saved_ratio(&self) -> Decimal {
        if self.baseline_total_interest.is_zero() {
            Decimal::ZERO
        } else {
            self.interest_saved / self.baseline_total_interest
        }
    }
}
