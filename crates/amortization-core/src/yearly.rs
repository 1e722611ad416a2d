//! Loan-year buckets of a schedule, the series behind a principal-reduction
//! chart. Months 1–12 form year 1, months 13–24 year 2, and so on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{simulate_amortization, AmortizationRow, ScheduleInput};
use crate::installment::PERIODS_PER_YEAR;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LoanResult;

/// Totals for one loan year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBucket {
    /// 1-based loan year.
    pub year: u32,
    /// Remaining balance after the last month of the year.
    pub closing_balance: Money,
    /// Scheduled principal plus extra payments.
    pub principal_paid: Money,
    pub interest_paid: Money,
    /// Months of the year that were simulated (short for a payoff year).
    pub months: u32,
}

/// Group schedule rows into loan years.
///
/// Rows must be in period order, as the simulator produces them.
pub fn yearly_summary(rows: &[AmortizationRow]) -> Vec<YearlyBucket> {
    let mut buckets: Vec<YearlyBucket> = Vec::new();

    for row in rows {
        let year = (row.period - 1) / PERIODS_PER_YEAR + 1;
        let paid = row.principal + row.extra_payment;

        match buckets.last_mut() {
            Some(bucket) if bucket.year == year => {
                bucket.closing_balance = row.remaining_balance;
                bucket.principal_paid += paid;
                bucket.interest_paid += row.interest;
                bucket.months += 1;
            }
            _ => buckets.push(YearlyBucket {
                year,
                closing_balance: row.remaining_balance,
                principal_paid: paid,
                interest_paid: row.interest,
                months: 1,
            }),
        }
    }

    buckets
}

/// Simulate the schedule and summarise it by loan year.
pub fn build_yearly_summary(
    input: &ScheduleInput,
) -> LoanResult<ComputationOutput<Vec<YearlyBucket>>> {
    let start = Instant::now();
    let terms = &input.terms;

    let schedule = simulate_amortization(
        terms.principal,
        terms.annual_rate,
        terms.tenure_years,
        &input.extra_payments,
    )?;
    let buckets = yearly_summary(&schedule.rows);

    let mut warnings = Vec::new();
    if let Some(last) = buckets.last() {
        if last.months < PERIODS_PER_YEAR && last.closing_balance == Decimal::ZERO {
            warnings.push(format!(
                "Loan is retired {} months into year {}",
                last.months, last.year
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortization schedule grouped by loan year",
        input,
        warnings,
        elapsed,
        buckets,
    ))
}
