use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use proforma_core::leasing::expenses::{self, ExpenseAllocationInput};
use proforma_core::leasing::lease::{self, LeaseInput};
use proforma_core::leasing::rent_roll::{self, RentRollInput};
use proforma_core::leasing::ExpenseType;

use crate::input;

/// Arguments for a single lease schedule
#[derive(Args)]
pub struct LeaseArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// First day of the lease (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the lease, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Tenant name
    #[arg(long)]
    pub tenant: Option<String>,

    /// Suite identifier
    #[arg(long)]
    pub suite: Option<String>,

    /// Annual rent per unit of area
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Occupied area
    #[arg(long)]
    pub area: Option<Decimal>,

    /// Expense reimbursement type: NNN, "BASE YEAR", "FULL SERVICE" or "PLUS UTILITIES"
    #[arg(long, default_value = "NNN")]
    pub expense_type: ExpenseType,

    /// Annual rent increase applied each January 1 (e.g. 0.03)
    #[arg(long)]
    pub annual_increase: Option<Decimal>,
}

pub fn run_lease(args: LeaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lease_input: LeaseInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        lease_from_flags(args)?
    };

    let result = lease::build_lease_schedule(&lease_input)?;
    Ok(serde_json::to_value(result)?)
}

fn lease_from_flags(args: LeaseArgs) -> Result<LeaseInput, Box<dyn std::error::Error>> {
    Ok(LeaseInput {
        start_date: args
            .start_date
            .ok_or("--start-date is required (or provide --input)")?,
        end_date: args
            .end_date
            .ok_or("--end-date is required (or provide --input)")?,
        tenant_name: args
            .tenant
            .ok_or("--tenant is required (or provide --input)")?,
        suite: args
            .suite
            .ok_or("--suite is required (or provide --input)")?,
        rental_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
        occupied_area: args.area.ok_or("--area is required (or provide --input)")?,
        expense_type: args.expense_type,
        annual_increase: args.annual_increase,
    })
}

/// Arguments for rent roll aggregation
#[derive(Args)]
pub struct RentRollArgs {
    /// Path to JSON or YAML input file with a `leases` array
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_rent_roll(args: RentRollArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let roll_input: RentRollInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for rent roll".into());
    };
    let result = rent_roll::rent_roll(&roll_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for operating expense allocation
#[derive(Args)]
pub struct ExpensesArgs {
    /// Path to JSON or YAML input file with leases, expenses and building area
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_expenses(args: ExpensesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let alloc_input: ExpenseAllocationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for expense allocation".into());
    };
    let result = expenses::calculate_expense_allocation(&alloc_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct LeaseCli {
        #[command(flatten)]
        lease: LeaseArgs,
    }

    fn flags(extra: &[&str]) -> LeaseArgs {
        let mut argv = vec![
            "lease",
            "--start-date",
            "2018-09-01",
            "--end-date",
            "2030-08-31",
            "--tenant",
            "Dental Associates",
            "--rate",
            "17.46",
            "--area",
            "1235",
        ];
        argv.extend_from_slice(extra);
        LeaseCli::parse_from(argv).lease
    }

    #[test]
    fn test_lease_flags_require_suite() {
        let err = lease_from_flags(flags(&[])).unwrap_err();
        assert!(err.to_string().contains("--suite"));
    }

    #[test]
    fn test_lease_flags_with_suite() {
        let input = lease_from_flags(flags(&["--suite", "100"])).unwrap();
        assert_eq!(input.suite, "100");
        assert_eq!(input.tenant_name, "Dental Associates");
        assert_eq!(input.expense_type, ExpenseType::TripleNet);
    }
}
