//! Fixed installment (EMI) for a level-payment loan.
//!
//! Monthly compounding on a flat 12-period year: the monthly rate is the
//! annual percentage divided by 1200 and the term is `tenure_years * 12`
//! periods. The installment is rounded to the currency minor unit.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanError;
use crate::rounding::round_money;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanResult;

/// Periods per year. Tenure is converted to months with this factor.
pub const PERIODS_PER_YEAR: u32 = 12;

/// Longest accepted term. Schedules hold one row per month.
pub const MAX_TENURE_YEARS: u32 = 100;

/// Annual percentage → monthly decimal rate divisor (12 months × 100).
const MONTHLY_RATE_DIVISOR: Decimal = dec!(1200);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Immutable terms of a fixed-rate installment loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed.
    pub principal: Money,
    /// Annual interest rate as a percentage (e.g., 9.35 for 9.35%).
    pub annual_rate: Decimal,
    /// Loan duration in whole years.
    pub tenure_years: u32,
}

/// Installment derived from a set of loan terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicPaymentInfo {
    /// Fixed monthly installment, rounded to 2 dp.
    pub installment: Money,
    /// Nominal number of monthly periods (`tenure_years * 12`).
    pub total_periods: u32,
    /// Monthly rate as a decimal (annual percent / 1200).
    pub monthly_rate: Rate,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Decimal, tenure_years: u32) -> Self {
        Self {
            principal,
            annual_rate,
            tenure_years,
        }
    }

    /// Decode loan terms from a JSON document (file or stdin body).
    pub fn from_json(value: serde_json::Value) -> LoanResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn validate(&self) -> LoanResult<()> {
        validate_terms(self.principal, self.annual_rate, self.tenure_years)
    }

    pub fn installment(&self) -> LoanResult<PeriodicPaymentInfo> {
        compute_installment(self.principal, self.annual_rate, self.tenure_years)
    }

    /// Interest accrued on `balance` over one month, rounded to 2 dp.
    pub fn monthly_interest(&self, balance: Money) -> LoanResult<Money> {
        monthly_interest(balance, self.annual_rate)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the fixed monthly installment and nominal period count.
///
/// `E = P·r·(1+r)^n / ((1+r)^n − 1)` with `r = R / 1200` and `n = T × 12`.
/// A zero rate degenerates to straight-line repayment `E = P / n`.
///
/// # Errors
///
/// `InvalidInput` when the principal is not positive, the rate is negative
/// or the tenure is zero or above [`MAX_TENURE_YEARS`].
/// `FinancialImpossibility` when the compounding factor overflows the
/// decimal range.
pub fn compute_installment(
    principal: Money,
    annual_rate_percent: Decimal,
    tenure_years: u32,
) -> LoanResult<PeriodicPaymentInfo> {
    validate_terms(principal, annual_rate_percent, tenure_years)?;

    let total_periods = tenure_years * PERIODS_PER_YEAR;
    let monthly_rate = monthly_rate(annual_rate_percent);
    let n = Decimal::from(total_periods);

    let factor = if monthly_rate.is_zero() {
        Decimal::ONE
    } else {
        (Decimal::ONE + monthly_rate)
            .checked_powu(u64::from(total_periods))
            .ok_or_else(|| {
                LoanError::FinancialImpossibility(format!(
                    "compounding factor overflows at {annual_rate_percent}% over {total_periods} months"
                ))
            })?
    };

    // A rate below decimal resolution leaves the factor at exactly one.
    let raw = if factor == Decimal::ONE {
        principal / n
    } else {
        // (1+r)^n / ((1+r)^n − 1), kept as a ratio so large factors cannot
        // overflow the product with the principal.
        let ratio = factor / (factor - Decimal::ONE);
        principal
            .checked_mul(monthly_rate)
            .and_then(|interest| interest.checked_mul(ratio))
            .ok_or_else(|| {
                LoanError::FinancialImpossibility(format!(
                    "installment overflows for principal {principal} at {annual_rate_percent}%"
                ))
            })?
    };

    Ok(PeriodicPaymentInfo {
        installment: round_money(raw),
        total_periods,
        monthly_rate,
    })
}

/// Installment for `terms`, wrapped in the standard computation envelope.
pub fn calculate_installment(
    terms: &LoanTerms,
) -> LoanResult<ComputationOutput<PeriodicPaymentInfo>> {
    let start = Instant::now();
    let info = terms.installment()?;

    let mut warnings = Vec::new();
    if info.monthly_rate.is_zero() {
        warnings.push("Zero interest rate: installment is principal divided by months".to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment annuity (EMI), monthly compounding",
        terms,
        warnings,
        elapsed,
        info,
    ))
}

/// Monthly decimal rate for an annual percentage.
pub fn monthly_rate(annual_rate_percent: Decimal) -> Rate {
    annual_rate_percent / MONTHLY_RATE_DIVISOR
}

/// One month of interest on `balance`, rounded to 2 dp.
///
/// Computed as `balance × R / 1200` so that exact half-cent results stay
/// exact and the tie-breaking rule decides them.
///
/// # Errors
///
/// `FinancialImpossibility` when the product leaves the decimal range.
pub fn monthly_interest(balance: Money, annual_rate_percent: Decimal) -> LoanResult<Money> {
    let accrued = balance.checked_mul(annual_rate_percent).ok_or_else(|| {
        LoanError::FinancialImpossibility(format!(
            "monthly interest overflows on balance {balance} at {annual_rate_percent}%"
        ))
    })?;
    Ok(round_money(accrued / MONTHLY_RATE_DIVISOR))
}

fn validate_terms(principal: Money, annual_rate: Decimal, tenure_years: u32) -> LoanResult<()> {
    if principal <= Decimal::ZERO {
        return Err(LoanError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if annual_rate < Decimal::ZERO {
        return Err(LoanError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if tenure_years == 0 {
        return Err(LoanError::InvalidInput {
            field: "tenure_years".into(),
            reason: "Tenure must be at least one year".into(),
        });
    }
    if tenure_years > MAX_TENURE_YEARS {
        return Err(LoanError::InvalidInput {
            field: "tenure_years".into(),
            reason: format!("Tenure cannot exceed {MAX_TENURE_YEARS} years"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_mortgage_installment() {
        let info = compute_installment(dec!(3_500_000), dec!(9.35), 20).unwrap();
        assert_eq!(info.installment, dec!(32282.53));
        assert_eq!(info.total_periods, 240);
    }

    #[test]
    fn test_textbook_installments() {
        assert_eq!(
            compute_installment(dec!(12_000), dec!(12), 1).unwrap().installment,
            dec!(1066.19)
        );
        assert_eq!(
            compute_installment(dec!(100_000), dec!(7.5), 30).unwrap().installment,
            dec!(699.21)
        );
        assert_eq!(
            compute_installment(dec!(200_000), dec!(6), 30).unwrap().installment,
            dec!(1199.10)
        );
    }

    #[test]
    fn test_monthly_rate_is_annual_over_1200() {
        let info = compute_installment(dec!(12_000), dec!(12), 1).unwrap();
        assert_eq!(info.monthly_rate, dec!(0.01));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let info = compute_installment(dec!(120_000), Decimal::ZERO, 10).unwrap();
        assert_eq!(info.installment, dec!(1000));
        assert_eq!(info.total_periods, 120);
        assert!(info.monthly_rate.is_zero());
    }

    #[test]
    fn test_zero_rate_tie_rounds_to_even() {
        // 12000.06 / 12 = 1000.005
        let info = compute_installment(dec!(12_000.06), Decimal::ZERO, 1).unwrap();
        assert_eq!(info.installment, dec!(1000.00));
    }

    #[test]
    fn test_rejects_non_positive_principal() {
        for principal in [Decimal::ZERO, dec!(-1)] {
            let err = compute_installment(principal, dec!(5), 10).unwrap_err();
            match err {
                LoanError::InvalidInput { field, .. } => assert_eq!(field, "principal"),
                other => panic!("Expected InvalidInput, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_negative_rate() {
        let err = compute_installment(dec!(1000), dec!(-0.5), 10).unwrap_err();
        assert!(matches!(err, LoanError::InvalidInput { ref field, .. } if field == "annual_rate"));
    }

    #[test]
    fn test_rejects_zero_tenure() {
        let err = compute_installment(dec!(1000), dec!(5), 0).unwrap_err();
        assert!(matches!(err, LoanError::InvalidInput { ref field, .. } if field == "tenure_years"));
    }

    #[test]
    fn test_overflowing_factor_is_reported() {
        let result = compute_installment(dec!(1000), dec!(100_000), 100);
        assert!(matches!(result, Err(LoanError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_monthly_interest_half_cent_tie() {
        // 1001 * 6 / 1200 = 5.005 exactly
        assert_eq!(monthly_interest(dec!(1001), dec!(6)).unwrap(), dec!(5.00));
        assert_eq!(
            monthly_interest(dec!(3_500_000), dec!(9.35)).unwrap(),
            dec!(27270.83)
        );
    }

    #[test]
    fn test_monthly_interest_overflow_is_reported() {
        let result = monthly_interest(dec!(10_000_000_000_000_000_000_000_000_000), dec!(10));
        assert!(matches!(result, Err(LoanError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_rejects_tenure_above_ceiling() {
        assert!(compute_installment(dec!(1000), Decimal::ZERO, MAX_TENURE_YEARS).is_ok());

        for tenure in [MAX_TENURE_YEARS + 1, 100_000_000, u32::MAX] {
            let err = compute_installment(dec!(1000), Decimal::ZERO, tenure).unwrap_err();
            assert!(
                matches!(err, LoanError::InvalidInput { ref field, .. } if field == "tenure_years"),
                "tenure {tenure} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_calculate_installment_envelope() {
        let output = calculate_installment(&LoanTerms::new(dec!(12_000), dec!(12), 1)).unwrap();
        assert_eq!(output.result.installment, dec!(1066.19));
        assert!(output.warnings.is_empty());
        assert!(output.methodology.contains("EMI"));

        let free = calculate_installment(&LoanTerms::new(dec!(1200), Decimal::ZERO, 1)).unwrap();
        assert_eq!(free.result.installment, dec!(100));
        assert_eq!(free.warnings.len(), 1);
    }

    #[test]
    fn test_loan_terms_from_json() {
        let terms = LoanTerms::from_json(serde_json::json!({
            "principal": "12000",
            "annual_rate": "12",
            "tenure_years": 1
        }))
        .unwrap();
        assert_eq!(terms, LoanTerms::new(dec!(12_000), dec!(12), 1));

        let err = LoanTerms::from_json(serde_json::json!({"principal": "12000"})).unwrap_err();
        assert!(matches!(err, LoanError::SerializationError(_)));
    }

    #[test]
    fn test_loan_terms_delegates() {
        let terms = LoanTerms::new(dec!(3_500_000), dec!(9.35), 20);
        assert!(terms.validate().is_ok());
        assert_eq!(terms.installment().unwrap().installment, dec!(32282.53));
        assert_eq!(terms.monthly_interest(dec!(3_500_000)).unwrap(), dec!(27270.83));
    }
}
