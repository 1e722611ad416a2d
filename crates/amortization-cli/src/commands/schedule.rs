use clap::Args;
use log::{debug, info};
use rust_decimal::Decimal;
use serde_json::Value;

use amortization_core::comparison::compare_extra_payments;
use amortization_core::extra_payments::{ExtraPaymentEntry, ExtraPaymentPlan};
use amortization_core::yearly::build_yearly_summary;
use amortization_core::{build_schedule, ScheduleInput};

use crate::commands::installment::terms_from_flags;
use crate::input;
use crate::output::money::{self, Currency};

/// Loan terms plus extra payments, shared by schedule, compare and yearly
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
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

    /// Extra payments as a period → amount mapping, e.g. "{12: 500000, 24: 250000}"
    #[arg(long)]
    pub extra: Option<ExtraPaymentPlan>,

    /// A single extra payment as PERIOD:AMOUNT (repeatable)
    #[arg(long = "payment", value_name = "PERIOD:AMOUNT")]
    pub payments: Vec<ExtraPaymentEntry>,

    /// Format money fields for this currency
    #[arg(long, ignore_case = true)]
    pub currency: Option<Currency>,
}

pub fn run_schedule(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input = resolve_input(&args)?;
    let result = build_schedule(&schedule_input)?;
    render(serde_json::to_value(result)?, args.currency)
}

pub fn run_compare(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input = resolve_input(&args)?;
    let result = compare_extra_payments(&schedule_input)?;
    render(serde_json::to_value(result)?, args.currency)
}

pub fn run_yearly(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input = resolve_input(&args)?;
    let result = build_yearly_summary(&schedule_input)?;
    render(serde_json::to_value(result)?, args.currency)
}

fn render(mut value: Value, currency: Option<Currency>) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(currency) = currency {
        money::apply_currency(&mut value, currency);
    }
    Ok(value)
}

/// `--input` file, else piped stdin, else flags. `--extra` and `--payment`
/// entries are merged into whatever plan the input already carries.
fn resolve_input(args: &LoanArgs) -> Result<ScheduleInput, Box<dyn std::error::Error>> {
    let mut schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.principal.is_none() {
        match input::stdin::read_stdin()? {
            Some(data) => ScheduleInput::from_json(data)?,
            None => from_flags(args)?,
        }
    } else {
        from_flags(args)?
    };

    if args.extra.is_some() || !args.payments.is_empty() {
        let mut entries = schedule_input.extra_payments.to_entries();
        if let Some(ref extra) = args.extra {
            entries.extend(extra.iter());
        }
        entries.extend(args.payments.iter().copied());
        schedule_input.extra_payments = ExtraPaymentPlan::try_from(entries)?;
    }

    info!(
        "loan of {} at {}% over {} years with {} extra payment(s)",
        schedule_input.terms.principal,
        schedule_input.terms.annual_rate,
        schedule_input.terms.tenure_years,
        schedule_input.extra_payments.len()
    );
    debug!("extra payments: {:?}", schedule_input.extra_payments.to_entries());
    Ok(schedule_input)
}

fn from_flags(args: &LoanArgs) -> Result<ScheduleInput, Box<dyn std::error::Error>> {
    Ok(ScheduleInput {
        terms: terms_from_flags(args.principal, args.rate, args.tenure)?,
        extra_payments: ExtraPaymentPlan::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flag_args(extra: Option<&str>, payments: &[&str]) -> LoanArgs {
        LoanArgs {
            input: None,
            principal: Some(dec!(3_500_000)),
            rate: Some(dec!(9.35)),
            tenure: Some(20),
            extra: extra.map(|s| s.parse().unwrap()),
            payments: payments.iter().map(|s| s.parse().unwrap()).collect(),
            currency: None,
        }
    }

    #[test]
    fn test_flags_without_extras() {
        let resolved = resolve_input(&flag_args(None, &[])).unwrap();
        assert_eq!(resolved.terms.tenure_years, 20);
        assert!(resolved.extra_payments.is_empty());
    }

    #[test]
    fn test_extra_and_payment_flags_merge() {
        let resolved = resolve_input(&flag_args(Some("{12: 500000}"), &["24:1000"])).unwrap();
        assert_eq!(resolved.extra_payments.len(), 2);
        assert_eq!(resolved.extra_payments.get(12), dec!(500000));
        assert_eq!(resolved.extra_payments.get(24), dec!(1000));
    }

    #[test]
    fn test_duplicate_period_across_flags_is_rejected() {
        let err = resolve_input(&flag_args(Some("{12: 500000}"), &["12:1"])).unwrap_err();
        assert!(err.to_string().contains("Malformed extra payment plan"));
    }

    #[test]
    fn test_compare_reports_savings() {
        let value = run_compare(flag_args(Some("{12: 500000}"), &[])).unwrap();
        assert_eq!(value["result"]["interest_saved"], "1727114.40");
        assert_eq!(value["result"]["months_reduced"], 68);
    }
}
