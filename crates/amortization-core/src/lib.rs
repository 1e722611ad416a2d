//! Fixed-rate loan installment (EMI) and amortization schedules with extra
//! principal payments. All math in `rust_decimal::Decimal`, rounded to the
//! currency minor unit as each amount is computed.
//!
//! ```
//! use amortization_core::{simulate_amortization, ExtraPaymentPlan};
//! use rust_decimal_macros::dec;
//!
//! let plan = ExtraPaymentPlan::parse("{12: 500000}").unwrap();
//! let schedule = simulate_amortization(dec!(3_500_000), dec!(9.35), 20, &plan).unwrap();
//! assert_eq!(schedule.installment, dec!(32282.53));
//! assert_eq!(schedule.periods_used, 172);
//! ```

pub mod amortization;
pub mod error;
pub mod extra_payments;
pub mod installment;
pub mod rounding;
pub mod types;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "yearly")]
pub mod yearly;

pub use amortization::{
    build_schedule, simulate_amortization, AmortizationResult, AmortizationRow, ScheduleInput,
};
pub use error::LoanError;
pub use extra_payments::{ExtraPaymentEntry, ExtraPaymentPlan};
pub use installment::{calculate_installment, compute_installment, LoanTerms, PeriodicPaymentInfo};
pub use types::*;

/// Standard result type for all amortization operations
pub type LoanResult<T> = Result<T, LoanError>;
