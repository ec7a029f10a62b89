//! Fixed-payment loan amortization with optional extra principal.
//!
//! The scheduled payment is set once from the loan's original terms. Each
//! period charges interest on the opening balance, applies the scheduled
//! principal, then applies any additional principal, so extra payments
//! shorten the payoff rather than lowering the payment.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::dates::add_months;
use crate::error::ProformaError;
use crate::time_value::pmt;
use crate::types::{round_to_cent, with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

const MONTHS_PER_YEAR: u32 = 12;

fn default_annual_payments() -> u32 {
    12
}

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Terms of a fixed-rate, fully amortizing loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Amount borrowed
    pub principal: Money,
    /// Annual interest rate (0.04 = 4%)
    pub annual_rate: Rate,
    /// Original term in years
    pub years: u32,
    /// Payments per year; must divide 12
    #[serde(default = "default_annual_payments")]
    pub annual_payments: u32,
    /// Extra principal paid every period
    #[serde(default)]
    pub additional_payment: Money,
    /// Date of the first payment
    pub start_date: NaiveDate,
}

/// One row of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    pub period: u32,
    pub date: NaiveDate,
    pub beginning_balance: Money,
    /// Scheduled payment, capped at the payoff amount in the final period
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub additional_payment: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSummary {
    pub payoff_date: NaiveDate,
    pub num_payments: u32,
    pub annual_rate: Rate,
    pub years: u32,
    pub principal: Money,
    /// Scheduled payment per period
    pub payment: Money,
    pub additional_payment: Money,
    pub total_interest: Money,
    /// Principal plus total interest
    pub total_paid: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationTable {
    pub periods: Vec<AmortizationPeriod>,
    pub summary: AmortizationSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fixed payment per period from the loan's original terms, rounded to the
/// cent.
pub fn scheduled_payment(input: &LoanInput) -> ProformaResult<Money> {
    validate_terms(input)?;
    let rate = period_rate(input);
    let nper = total_periods(input)?;
    let payment = pmt(rate, nper, input.principal, Decimal::ZERO).map_err(|e| {
        ProformaError::InvalidLoanTerms {
            field: "principal".into(),
            reason: e.to_string(),
        }
    })?;
    Ok(round_to_cent(-payment))
}

/// Build the full period-by-period schedule until the balance reaches zero.
pub fn amortization_table(input: &LoanInput) -> ProformaResult<ComputationOutput<AmortizationTable>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let table = build_table(input)?;

    let scheduled = total_periods(input)?;
    if input.additional_payment > Decimal::ZERO && table.summary.num_payments < scheduled {
        debug!(
            saved = scheduled - table.summary.num_payments,
            "additional principal shortens payoff"
        );
    }
    if input.annual_rate.is_zero() {
        let msg = "Zero interest rate: payments are straight-line principal".to_string();
        warn!("{msg}");
        warnings.push(msg);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Payment Amortization with Additional Principal",
        input,
        warnings,
        elapsed,
        table,
    ))
}

/// Amortize several loans and return their summaries side by side, in
/// input order.
pub fn compare_loans(
    loans: &[LoanInput],
) -> ProformaResult<ComputationOutput<Vec<AmortizationSummary>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if loans.is_empty() {
        warnings.push("No loans supplied; comparison is empty".into());
    }

    let summaries = loans
        .iter()
        .map(|loan| build_table(loan).map(|t| t.summary))
        .collect::<ProformaResult<Vec<_>>>()?;

    if let Some(cheapest) = summaries.iter().min_by_key(|s| s.total_interest) {
        debug!(
            loans = summaries.len(),
            lowest_interest = %cheapest.total_interest,
            "compared loans"
        );
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan Comparison (amortization summaries)",
        &serde_json::json!({ "loan_count": loans.len() }),
        warnings,
        elapsed,
        summaries,
    ))
}

// ---------------------------------------------------------------------------
// Schedule construction
// ---------------------------------------------------------------------------

fn build_table(input: &LoanInput) -> ProformaResult<AmortizationTable> {
    let payment = scheduled_payment(input)?;
    let rate = period_rate(input);

    // Interest is charged on a balance that never exceeds the principal, so
    // bounding the first period bounds every later one.
    let first_interest = input
        .principal
        .checked_mul(rate)
        .filter(|interest| input.principal.checked_add(*interest).is_some())
        .map(round_to_cent)
        .ok_or_else(|| ProformaError::InvalidLoanTerms {
            field: "principal".into(),
            reason: format!("Interest on {} overflows", input.principal),
        })?;
    if payment <= first_interest {
        return Err(ProformaError::InvalidLoanTerms {
            field: "payment".into(),
            reason: format!(
                "Payment {payment} does not cover first-period interest {first_interest}"
            ),
        });
    }

    let step = MONTHS_PER_YEAR / input.annual_payments;
    let mut periods: Vec<AmortizationPeriod> =
        Vec::with_capacity(total_periods(input)? as usize);
    let mut balance = input.principal;
    let mut period: u32 = 0;

    // Payment exceeds interest on the opening balance, so every period
    // retires at least a cent and the balance reaches exactly zero.
    while balance > Decimal::ZERO {
        let offset = period.checked_mul(step).ok_or_else(|| {
            ProformaError::DateError(format!("Payment {} is beyond any calendar", period + 1))
        })?;
        let date = add_months(input.start_date, offset)?;
        period += 1;

        let interest = round_to_cent(balance * rate);
        let paid = payment.min(balance + interest);
        let principal = paid - interest;
        let additional = input.additional_payment.min(balance - principal);
        let ending_balance = balance - (principal + additional);

        periods.push(AmortizationPeriod {
            period,
            date,
            beginning_balance: balance,
            payment: paid,
            interest,
            principal,
            additional_payment: additional,
            ending_balance,
        });
        balance = ending_balance;
    }

    let totals_overflow = || ProformaError::InvalidLoanTerms {
        field: "principal".into(),
        reason: format!("Lifetime interest on {} overflows", input.principal),
    };
    let total_interest = periods
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.interest))
        .ok_or_else(totals_overflow)?;
    let total_paid = input
        .principal
        .checked_add(total_interest)
        .ok_or_else(totals_overflow)?;
    let payoff_date = periods.last().map(|p| p.date).unwrap_or(input.start_date);

    let summary = AmortizationSummary {
        payoff_date,
        num_payments: period,
        annual_rate: input.annual_rate,
        years: input.years,
        principal: input.principal,
        payment,
        additional_payment: input.additional_payment,
        total_interest,
        total_paid,
    };

    debug!(
        periods = period,
        payment = %payment,
        total_interest = %total_interest,
        "built amortization table"
    );

    Ok(AmortizationTable { periods, summary })
}

fn period_rate(input: &LoanInput) -> Rate {
    input.annual_rate / Decimal::from(input.annual_payments)
}

fn total_periods(input: &LoanInput) -> ProformaResult<u32> {
    input
        .years
        .checked_mul(input.annual_payments)
        .ok_or_else(|| ProformaError::InvalidLoanTerms {
            field: "years".into(),
            reason: format!(
                "{} years of {} payments is too many periods",
                input.years, input.annual_payments
            ),
        })
}

fn validate_terms(input: &LoanInput) -> ProformaResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(ProformaError::InvalidLoanTerms {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if input.annual_rate < Decimal::ZERO {
        return Err(ProformaError::InvalidLoanTerms {
            field: "annual_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if input.years == 0 {
        return Err(ProformaError::InvalidLoanTerms {
            field: "years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }
    if input.annual_payments == 0 || MONTHS_PER_YEAR % input.annual_payments != 0 {
        return Err(ProformaError::InvalidLoanTerms {
            field: "annual_payments".into(),
            reason: format!(
                "{} payments per year does not divide the year into whole months",
                input.annual_payments
            ),
        });
    }
    total_periods(input)?;
    let maturity = input
        .years
        .checked_mul(MONTHS_PER_YEAR)
        .and_then(|months| add_months(input.start_date, months).ok());
    if maturity.is_none() {
        return Err(ProformaError::InvalidLoanTerms {
            field: "years".into(),
            reason: format!(
                "A {}-year term from {} ends past the last representable date",
                input.years, input.start_date
            ),
        });
    }
    if input.additional_payment < Decimal::ZERO {
        return Err(ProformaError::InvalidLoanTerms {
            field: "additional_payment".into(),
            reason: "Additional payment cannot be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
