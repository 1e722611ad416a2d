use clap::Args;
use log::info;
use rust_decimal::Decimal;
use serde_json::Value;

use amortization_core::installment::{calculate_installment, LoanTerms};

use crate::input;
use crate::output::money::{self, Currency};

/// Arguments for the installment calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct InstallmentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 9.35)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Tenure in whole years
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Format money fields for this currency
    #[arg(long, ignore_case = true)]
    pub currency: Option<Currency>,
}

pub fn run_installment(args: InstallmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.principal.is_none() {
        match input::stdin::read_stdin()? {
            Some(data) => LoanTerms::from_json(data)?,
            None => terms_from_flags(args.principal, args.rate, args.tenure)?,
        }
    } else {
        terms_from_flags(args.principal, args.rate, args.tenure)?
    };

    info!(
        "installment for {} at {}% over {} years",
        terms.principal, terms.annual_rate, terms.tenure_years
    );
    let result = calculate_installment(&terms)?;
    let mut value = serde_json::to_value(result)?;
    if let Some(currency) = args.currency {
        money::apply_currency(&mut value, currency);
    }
    Ok(value)
}

/// Build loan terms from individual flags, naming the first one missing.
pub fn terms_from_flags(
    principal: Option<Decimal>,
    rate: Option<Decimal>,
    tenure: Option<u32>,
) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    let principal = principal
        .ok_or("--principal is required (or provide --input / stdin)")?;
    let rate = rate.ok_or("--rate is required (or provide --input / stdin)")?;
    let tenure = tenure.ok_or("--tenure is required (or provide --input / stdin)")?;
    Ok(LoanTerms::new(principal, rate, tenure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_terms_from_flags() {
        let terms = terms_from_flags(Some(dec!(12000)), Some(dec!(12)), Some(1)).unwrap();
        assert_eq!(terms, LoanTerms::new(dec!(12000), dec!(12), 1));
    }

    #[test]
    fn test_missing_flag_is_named() {
        let err = terms_from_flags(Some(dec!(12000)), None, Some(1)).unwrap_err();
        assert!(err.to_string().contains("--rate"));
    }
}
