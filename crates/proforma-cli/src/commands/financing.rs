use chrono::{Datelike, Local, Months, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use proforma_core::financing::amortization::{self, LoanInput};

use crate::input;

/// Arguments for a loan amortization table
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate (e.g. 0.04)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Payments per year
    #[arg(long, default_value_t = 12)]
    pub annual_payments: u32,

    /// Extra principal paid each period
    #[arg(long)]
    pub additional_payment: Option<Decimal>,

    /// First payment date (YYYY-MM-DD); defaults to the first of next month
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        let start_date = match args.start_date {
            Some(date) => date,
            None => first_of_next_month()?,
        };
        LoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            annual_payments: args.annual_payments,
            additional_payment: args.additional_payment.unwrap_or(Decimal::ZERO),
            start_date,
        }
    };

    let result = amortization::amortization_table(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for comparing several loans
#[derive(Args)]
pub struct LoanCompareArgs {
    /// Path to JSON or YAML input file: an array of loans or `{"loans": [...]}`
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LoanList {
    Bare(Vec<LoanInput>),
    Wrapped { loans: Vec<LoanInput> },
}

impl LoanList {
    fn into_loans(self) -> Vec<LoanInput> {
        match self {
            LoanList::Bare(loans) | LoanList::Wrapped { loans } => loans,
        }
    }
}

pub fn run_loan_compare(args: LoanCompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loans: LoanList = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for loan comparison".into());
    };
    let result = amortization::compare_loans(&loans.into_loans())?;
    Ok(serde_json::to_value(result)?)
}

fn first_of_next_month() -> Result<NaiveDate, Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();
    today
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .ok_or_else(|| "Cannot determine the first of next month".into())
}
