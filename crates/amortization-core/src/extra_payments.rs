//! Extra (additional) principal payments keyed by 1-based month number.
//!
//! A plan is validated once, at the boundary, and is immutable afterwards.
//! Text input is limited to a literal mapping such as `{12: 500000, 24: 1000.50}`;
//! nothing in it is ever evaluated.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use crate::amortization::checked_add;
use crate::error::LoanError;
use crate::types::Money;
use crate::LoanResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One caller-owned extra payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPaymentEntry {
    /// 1-based month the payment is applied in.
    pub period: u32,
    /// Additional principal paid that month.
    pub amount: Money,
}

/// Validated mapping of period → extra payment amount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraPaymentPlan {
    payments: BTreeMap<u32, Money>,
}

/// Wire forms accepted for a plan: a list of rows, a JSON object keyed by
/// period, or the literal mapping text.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlan {
    Entries(Vec<RawEntry>),
    Mapping(BTreeMap<String, Decimal>),
    Text(String),
}

#[derive(Deserialize)]
struct RawEntry {
    period: serde_json::Number,
    amount: Decimal,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl ExtraPaymentPlan {
    /// Plan with no extra payments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a plan from an ordered list of rows.
    ///
    /// # Errors
    ///
    /// `MalformedExtraPaymentPlan` for a zero period, a negative amount or a
    /// period listed twice. One bad row rejects the whole plan.
    pub fn from_entries(entries: &[ExtraPaymentEntry]) -> LoanResult<Self> {
        let mut payments = BTreeMap::new();
        for entry in entries {
            validate_entry(entry.period, entry.amount)?;
            if payments.insert(entry.period, entry.amount).is_some() {
                return Err(LoanError::malformed_plan(format!(
                    "period {} is listed more than once",
                    entry.period
                )));
            }
        }
        Ok(Self { payments })
    }

    /// Parse a literal mapping of positive integers to non-negative amounts.
    ///
    /// Braces are optional, a trailing comma is allowed and `_` may separate
    /// digits. Empty input yields an empty plan.
    pub fn parse(text: &str) -> LoanResult<Self> {
        let entries = PlanParser::new(text).parse_plan()?;
        Self::from_entries(&entries)
    }

    /// Extra payment scheduled for `period`, zero when none.
    pub fn get(&self, period: u32) -> Money {
        self.payments.get(&period).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Entries in period order.
    pub fn iter(&self) -> impl Iterator<Item = ExtraPaymentEntry> + '_ {
        self.payments
            .iter()
            .map(|(&period, &amount)| ExtraPaymentEntry { period, amount })
    }

    /// Sum of all scheduled extra payments, including inert ones.
    pub fn total(&self) -> LoanResult<Money> {
        self.payments
            .values()
            .try_fold(Decimal::ZERO, |acc, &amount| {
                checked_add(acc, amount, "extra payment total")
            })
    }

    /// Periods with a payment strictly after `period`.
    pub fn periods_after(&self, period: u32) -> Vec<u32> {
        self.payments
            .range(period.saturating_add(1)..)
            .map(|(&p, _)| p)
            .collect()
    }

    pub fn to_entries(&self) -> Vec<ExtraPaymentEntry> {
        self.iter().collect()
    }
}

impl FromStr for ExtraPaymentPlan {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for ExtraPaymentEntry {
    type Err = LoanError;

    /// Parse a single `period:amount` pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = PlanParser::new(s);
        parser.skip_whitespace();
        let entry = parser.parse_entry()?;
        parser.skip_whitespace();
        parser.expect_end()?;
        validate_entry(entry.period, entry.amount)?;
        Ok(entry)
    }
}

impl TryFrom<Vec<ExtraPaymentEntry>> for ExtraPaymentPlan {
    type Error = LoanError;

    fn try_from(entries: Vec<ExtraPaymentEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(&entries)
    }
}

impl Serialize for ExtraPaymentPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for ExtraPaymentPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawPlan::deserialize(deserializer)?;
        ExtraPaymentPlan::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl ExtraPaymentPlan {
    fn from_raw(raw: RawPlan) -> LoanResult<Self> {
        match raw {
            RawPlan::Entries(rows) => {
                let entries = rows
                    .into_iter()
                    .map(|row| {
                        let period = row
                            .period
                            .as_u64()
                            .and_then(|p| u32::try_from(p).ok())
                            .ok_or_else(|| {
                                LoanError::malformed_plan(format!(
                                    "period {} is not a positive integer",
                                    row.period
                                ))
                            })?;
                        Ok(ExtraPaymentEntry {
                            period,
                            amount: row.amount,
                        })
                    })
                    .collect::<LoanResult<Vec<_>>>()?;
                Self::from_entries(&entries)
            }
            RawPlan::Mapping(map) => {
                let entries = map
                    .into_iter()
                    .map(|(key, amount)| {
                        let period = parse_period_key(key.trim())?;
                        Ok(ExtraPaymentEntry { period, amount })
                    })
                    .collect::<LoanResult<Vec<_>>>()?;
                Self::from_entries(&entries)
            }
            RawPlan::Text(text) => Self::parse(&text),
        }
    }
}

fn validate_entry(period: u32, amount: Money) -> LoanResult<()> {
    if period == 0 {
        return Err(LoanError::malformed_plan(
            "periods are 1-based; period 0 does not exist",
        ));
    }
    if amount < Decimal::ZERO {
        return Err(LoanError::malformed_plan(format!(
            "amount {amount} for period {period} is negative"
        )));
    }
    Ok(())
}

fn parse_period_key(key: &str) -> LoanResult<u32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LoanError::malformed_plan(format!(
            "period '{key}' is not a positive integer"
        )));
    }
    key.parse::<u32>()
        .map_err(|_| LoanError::malformed_plan(format!("period '{key}' is out of range")))
}

// ---------------------------------------------------------------------------
// Literal parser
// ---------------------------------------------------------------------------

struct PlanParser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> PlanParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn parse_plan(&mut self) -> LoanResult<Vec<ExtraPaymentEntry>> {
        let mut entries = Vec::new();
        self.skip_whitespace();

        let braced = self.eat('{');
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('}') if braced => break,
                _ => {}
            }

            entries.push(self.parse_entry()?);
            self.skip_whitespace();

            if !self.eat(',') {
                break;
            }
        }

        self.skip_whitespace();
        if braced && !self.eat('}') {
            return Err(self.unexpected("',' or '}'"));
        }
        self.skip_whitespace();
        self.expect_end()?;
        Ok(entries)
    }

    fn parse_entry(&mut self) -> LoanResult<ExtraPaymentEntry> {
        let key = self.take_while(|c| c.is_ascii_digit());
        if key.is_empty() {
            return Err(match self.peek() {
                Some('-') => LoanError::malformed_plan("periods must be positive integers"),
                _ => self.unexpected("a period number"),
            });
        }
        if self.peek() == Some('.') {
            return Err(LoanError::malformed_plan(format!(
                "period '{key}.' is not a whole month"
            )));
        }
        let period = parse_period_key(key)?;

        self.skip_whitespace();
        if !self.eat(':') {
            return Err(self.unexpected("':'"));
        }
        self.skip_whitespace();

        if self.peek() == Some('-') {
            return Err(LoanError::malformed_plan(format!(
                "amount for period {period} is negative"
            )));
        }
        let amount = self.parse_amount(period)?;
        Ok(ExtraPaymentEntry { period, amount })
    }

    fn parse_amount(&mut self, period: u32) -> LoanResult<Money> {
        let integer = self.take_while(|c| c.is_ascii_digit() || c == '_');
        let mut literal: String = integer.chars().filter(|&c| c != '_').collect();
        if literal.is_empty() || integer.starts_with('_') || integer.ends_with('_') {
            return Err(self.unexpected("an amount"));
        }

        if self.eat('.') {
            let fraction = self.take_while(|c| c.is_ascii_digit());
            if fraction.is_empty() {
                return Err(self.unexpected("digits after the decimal point"));
            }
            literal.push('.');
            literal.push_str(fraction);
        }

        Decimal::from_str(&literal).map_err(|e| {
            LoanError::malformed_plan(format!("amount '{literal}' for period {period}: {e}"))
        })
    }

    fn expect_end(&mut self) -> LoanResult<()> {
        match self.chars.peek() {
            None => Ok(()),
            Some(_) => Err(self.unexpected("end of input")),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.offset();
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.chars.next();
        }
        &self.src[start..self.offset()]
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len())
    }

    fn unexpected(&mut self, expected: &str) -> LoanError {
        let at = self.offset();
        match self.peek() {
            Some(c) => LoanError::malformed_plan(format!(
                "expected {expected} at position {at}, found '{c}'"
            )),
            None => LoanError::malformed_plan(format!("expected {expected}, found end of input")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
