//! Locale-aware currency formatting for money fields in command output.

use clap::ValueEnum;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;

/// Currencies the CLI can format, each with the conventions of its home
/// locale.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Currency {
    USD,
    EUR,
    INR,
    GBP,
    JPY,
    CNY,
    AUD,
    CAD,
    CHF,
}

struct LocaleFormat {
    symbol: &'static str,
    symbol_first: bool,
    /// Between symbol and number.
    spacing: &'static str,
    group: &'static str,
    decimal: &'static str,
    decimals: u32,
    /// 3 digits, then groups of 2 (lakh/crore).
    indian_grouping: bool,
}

const fn prefix(symbol: &'static str) -> LocaleFormat {
    LocaleFormat {
        symbol,
        symbol_first: true,
        spacing: "",
        group: ",",
        decimal: ".",
        decimals: 2,
        indian_grouping: false,
    }
}

impl Currency {
    fn locale_format(self) -> LocaleFormat {
        match self {
            Currency::USD | Currency::AUD | Currency::CAD => prefix("$"),
            Currency::GBP => prefix("£"),
            Currency::CNY => prefix("¥"),
            Currency::INR => LocaleFormat {
                indian_grouping: true,
                ..prefix("₹")
            },
            Currency::JPY => LocaleFormat {
                decimals: 0,
                ..prefix("￥")
            },
            // fr_FR
            Currency::EUR => LocaleFormat {
                symbol: "€",
                symbol_first: false,
                spacing: "\u{a0}",
                group: "\u{202f}",
                decimal: ",",
                decimals: 2,
                indian_grouping: false,
            },
            // de_CH
            Currency::CHF => LocaleFormat {
                spacing: "\u{a0}",
                group: "\u{2019}",
                ..prefix("CHF")
            },
        }
    }

    /// Render `amount` the way the currency's home locale writes it.
    pub fn format(self, amount: Decimal) -> String {
        let fmt = self.locale_format();
        let rounded = amount.round_dp_with_strategy(fmt.decimals, RoundingStrategy::MidpointNearestEven);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();

        let digits = format!("{:.*}", fmt.decimals as usize, rounded.abs());
        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (digits.as_str(), None),
        };

        let mut number = group_digits(whole, fmt.group, fmt.indian_grouping);
        if let Some(fraction) = fraction {
            number.push_str(fmt.decimal);
            number.push_str(fraction);
        }

        let body = if fmt.symbol_first {
            format!("{}{}{}", fmt.symbol, fmt.spacing, number)
        } else {
            format!("{}{}{}", number, fmt.spacing, fmt.symbol)
        };
        if negative {
            format!("-{}", body)
        } else {
            body
        }
    }
}

fn group_digits(whole: &str, separator: &str, indian: bool) -> String {
    let digits: Vec<char> = whole.chars().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut end = digits.len();
    let mut size = 3;

    while end > size {
        groups.push(digits[end - size..end].iter().collect());
        end -= size;
        if indian {
            size = 2;
        }
    }
    groups.push(digits[..end].iter().collect());
    groups.reverse();
    groups.join(separator)
}

/// Money-valued fields across installment, schedule, comparison and yearly
/// results.
const MONEY_FIELDS: [&str; 16] = [
    "installment",
    "interest",
    "principal",
    "extra_payment",
    "total_payment",
    "remaining_balance",
    "total_interest",
    "total_principal",
    "total_extra_payments",
    "baseline_total_interest",
    "interest_saved",
    "baseline_total_amount_paid",
    "total_amount_paid",
    "closing_balance",
    "principal_paid",
    "interest_paid",
];

/// Replace every money field under `result` with its formatted string.
/// Other envelope sections are left as computed.
pub fn apply_currency(value: &mut Value, currency: Currency) {
    if let Some(result) = value.get_mut("result") {
        format_fields(result, currency);
    }
}

fn format_fields(value: &mut Value, currency: Currency) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if MONEY_FIELDS.contains(&key.as_str()) {
                    if let Some(amount) = as_decimal(val) {
                        *val = Value::String(currency.format(amount));
                        continue;
                    }
                }
                format_fields(val, currency);
            }
        }
        Value::Array(items) => {
            for item in items {
                format_fields(item, currency);
            }
        }
        _ => {}
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}
