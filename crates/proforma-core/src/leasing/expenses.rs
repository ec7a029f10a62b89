//! Operating expense ledger and tenant expense recoveries.
//!
//! A building's yearly operating expenses are apportioned to each tenant
//! by pro-rata share of area. How much a tenant actually reimburses depends
//! on its [`ExpenseType`]: NNN tenants pay their share of current expenses,
//! BASE YEAR tenants pay only the growth since their lease started, and
//! gross leases pay nothing.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::ProformaError;
use crate::leasing::lease::{build_lease_schedule, LeaseInput, LeaseStats};
use crate::leasing::rent_roll::{build_rent_roll, RentRoll};
use crate::leasing::ExpenseType;
use crate::time_value::escalate;
use crate::types::{round_up_to_cent, with_metadata, Area, ComputationOutput, Money, Rate};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Annual expense growth assumed when none is given
pub const DEFAULT_GROWTH_RATE: Rate = dec!(0.03);

const MONTHS_PER_YEAR: Decimal = dec!(12);

fn default_growth_rate() -> Rate {
    DEFAULT_GROWTH_RATE
}

fn default_frequency() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Expense ledger
// ---------------------------------------------------------------------------

/// An operating expense as entered: `amount` is paid `frequency` times a year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub name: String,
    pub amount: Money,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    pub year: i32,
}

/// An operating expense with its derived yearly total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub name: String,
    pub amount: Money,
    pub frequency: u32,
    pub year: i32,
    /// amount * frequency
    pub yearly_expense: Money,
}

impl ExpenseRecord {
    pub fn new(name: impl Into<String>, amount: Money, year: i32, frequency: u32) -> Self {
        Self {
            name: name.into(),
            amount,
            frequency,
            year,
            yearly_expense: amount * Decimal::from(frequency),
        }
    }
}

impl From<ExpenseItem> for ExpenseRecord {
    fn from(item: ExpenseItem) -> Self {
        ExpenseRecord::new(item.name, item.amount, item.year, item.frequency)
    }
}

/// Ordered, append-only list of expense records. Adding a record returns a
/// new ledger and leaves the original untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLedger {
    records: Vec<ExpenseRecord>,
}

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_expense(&self, record: ExpenseRecord) -> Self {
        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.extend(self.records.iter().cloned());
        records.push(record);
        Self { records }
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of yearly expenses across every record
    pub fn total(&self) -> Money {
        self.records.iter().map(|r| r.yearly_expense).sum()
    }

    /// Sum of yearly expenses recorded for `year`
    pub fn total_for_year(&self, year: i32) -> Money {
        self.records
            .iter()
            .filter(|r| r.year == year)
            .map(|r| r.yearly_expense)
            .sum()
    }
}

impl FromIterator<ExpenseRecord> for ExpenseLedger {
    fn from_iter<I: IntoIterator<Item = ExpenseRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Allocation types
// ---------------------------------------------------------------------------

/// Building-level assumptions for expense recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationParams {
    /// Total operating expenses for `expense_year`
    pub total_expenses: Money,
    /// Rentable area of the whole building
    pub building_area: Area,
    /// Annual expense growth (e.g. 0.03 = 3%)
    #[serde(default = "default_growth_rate")]
    pub growth_rate: Rate,
    /// Year the `total_expenses` figure belongs to
    pub expense_year: i32,
}

/// Expense recovery for one tenant-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedExpenseRow {
    pub month: NaiveDate,
    pub tenant_name: String,
    pub suite: String,
    pub occupied_area: Area,
    pub expense_type: ExpenseType,
    pub start_year: i32,
    /// occupied_area / building_area
    pub prorata_share: Decimal,
    /// NNN rows carry the tenant's share of that year's escalated expenses;
    /// BASE YEAR rows carry one month of growth over the lease-start year.
    /// Negative values are expense credits.
    pub expense_amount: Money,
}

/// Leases, expenses and building assumptions for a full allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseAllocationInput {
    pub leases: Vec<LeaseInput>,
    pub expenses: Vec<ExpenseItem>,
    pub building_area: Area,
    #[serde(default = "default_growth_rate")]
    pub growth_rate: Rate,
    pub expense_year: i32,
}

/// Output of a full allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseAllocation {
    /// Yearly operating expenses for the expense year
    pub total_expenses: Money,
    pub expenses: Vec<ExpenseRecord>,
    pub rows: Vec<AllocatedExpenseRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Allocate building expenses to every tenant-month of a rent roll.
pub fn allocate_expenses(
    roll: &RentRoll,
    params: &AllocationParams,
) -> ProformaResult<Vec<AllocatedExpenseRow>> {
    validate_params(params)?;

    roll.full
        .iter()
        .map(|row| {
            let prorata_share = share_of_building(row.occupied_area, params.building_area)?;
            let annual = annual_recovery(
                row.expense_type,
                prorata_share,
                params,
                row.month.year(),
                row.start_year,
            )?;
            let expense_amount = match row.expense_type {
                ExpenseType::BaseYear => annual / MONTHS_PER_YEAR,
                _ => annual,
            };

            Ok(AllocatedExpenseRow {
                month: row.month,
                tenant_name: row.tenant_name.clone(),
                suite: row.suite.clone(),
                occupied_area: row.occupied_area,
                expense_type: row.expense_type,
                start_year: row.start_year,
                prorata_share,
                expense_amount: round_up_to_cent(expense_amount),
            })
        })
        .collect()
}

/// A single lease's expense reimbursement for one billing year.
pub fn lease_expense_for_year(
    stats: &LeaseStats,
    params: &AllocationParams,
    year: i32,
) -> ProformaResult<Money> {
    validate_params(params)?;

    let prorata_share = share_of_building(stats.occupied_area, params.building_area)?;
    let annual = annual_recovery(
        stats.expense_type,
        prorata_share,
        params,
        year,
        stats.start_date.year(),
    )?;
    Ok(round_up_to_cent(annual))
}

/// Build the rent roll for `input.leases`, total the expense ledger for the
/// expense year and allocate it across every tenant-month.
pub fn calculate_expense_allocation(
    input: &ExpenseAllocationInput,
) -> ProformaResult<ComputationOutput<ExpenseAllocation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let ledger: ExpenseLedger = input
        .expenses
        .iter()
        .cloned()
        .map(ExpenseRecord::from)
        .collect();

    if ledger.is_empty() {
        warnings.push("No expense records supplied; every recovery is zero".into());
    }
    let other_years = ledger
        .records()
        .iter()
        .filter(|r| r.year != input.expense_year)
        .count();
    if other_years > 0 {
        warnings.push(format!(
            "{other_years} expense record(s) outside {} excluded from the base total",
            input.expense_year
        ));
    }

    let params = AllocationParams {
        total_expenses: ledger.total_for_year(input.expense_year),
        building_area: input.building_area,
        growth_rate: input.growth_rate,
        expense_year: input.expense_year,
    };
    validate_params(&params)?;

    let mut schedules = Vec::with_capacity(input.leases.len());
    for lease in &input.leases {
        if lease.occupied_area > input.building_area {
            warnings.push(format!(
                "{} occupies {} against a building area of {}",
                lease.tenant_name, lease.occupied_area, input.building_area
            ));
        }
        let built = build_lease_schedule(lease)?;
        warnings.extend(built.warnings);
        schedules.push(built.result);
    }

    let leased: Area = input.leases.iter().map(|l| l.occupied_area).sum();
    if leased > input.building_area {
        warnings.push(format!(
            "Leased area {leased} exceeds building area {}; check for overlapping leases",
            input.building_area
        ));
    }
    for w in &warnings {
        warn!("{w}");
    }

    let roll = build_rent_roll(&schedules);
    let rows = allocate_expenses(&roll, &params)?;

    debug!(
        rows = rows.len(),
        records = ledger.len(),
        total_expenses = %params.total_expenses,
        "allocated operating expenses"
    );

    let output = ExpenseAllocation {
        total_expenses: params.total_expenses,
        expenses: ledger.records().to_vec(),
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Pro-rata Expense Recovery (NNN / Base Year)",
        &params,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_params(params: &AllocationParams) -> ProformaResult<()> {
    if params.building_area <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "building_area".into(),
            reason: "Building area must be positive".into(),
        });
    }
    if params.total_expenses < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "total_expenses".into(),
            reason: "Operating expenses cannot be negative".into(),
        });
    }
    if params.growth_rate <= dec!(-1) {
        return Err(ProformaError::InvalidInput {
            field: "growth_rate".into(),
            reason: "Growth rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

/// Tenant's unrounded yearly reimbursement for `billing_year`.
fn annual_recovery(
    expense_type: ExpenseType,
    prorata_share: Decimal,
    params: &AllocationParams,
    billing_year: i32,
    start_year: i32,
) -> ProformaResult<Money> {
    let escalated = |year: i32| -> ProformaResult<Money> {
        let periods = year.checked_sub(params.expense_year).ok_or_else(|| {
            ProformaError::InvalidInput {
                field: "expense_year".into(),
                reason: format!("{year} is out of reach of expense year {}", params.expense_year),
            }
        })?;
        escalate(params.total_expenses, params.growth_rate, periods)
    };
    let share_of = |amount: Money| {
        prorata_share
            .checked_mul(amount)
            .ok_or_else(|| ProformaError::InvalidInput {
                field: "total_expenses".into(),
                reason: format!("Share {prorata_share} of {amount} overflows"),
            })
    };

    match expense_type {
        ExpenseType::TripleNet => share_of(escalated(billing_year)?),
        ExpenseType::BaseYear => {
            let growth = escalated(billing_year)?
                .checked_sub(escalated(start_year)?)
                .ok_or_else(|| ProformaError::InvalidInput {
                    field: "total_expenses".into(),
                    reason: format!("Expense growth from {start_year} to {billing_year} overflows"),
                })?;
            share_of(growth)
        }
        ExpenseType::FullService | ExpenseType::PlusUtilities => Ok(Decimal::ZERO),
    }
}

fn share_of_building(occupied_area: Area, building_area: Area) -> ProformaResult<Decimal> {
    occupied_area
        .checked_div(building_area)
        .ok_or_else(|| ProformaError::InvalidInput {
            field: "building_area".into(),
            reason: format!("{occupied_area} over {building_area} overflows"),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leasing::lease::fixed_rate_schedule;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn lease(tenant: &str, area: Area, expense_type: ExpenseType, start: NaiveDate) -> LeaseInput {
        LeaseInput {
            start_date: start,
            end_date: d(2022, 12, 31),
            tenant_name: tenant.into(),
            suite: tenant.into(),
            rental_rate: dec!(20),
            occupied_area: area,
            expense_type,
            annual_increase: None,
        }
    }

    fn params() -> AllocationParams {
        AllocationParams {
            total_expenses: dec!(12000),
            building_area: dec!(10000),
            growth_rate: dec!(0.10),
            expense_year: 2019,
        }
    }

    fn roll_of(leases: &[LeaseInput]) -> RentRoll {
        let schedules: Vec<_> = leases
            .iter()
            .map(|l| fixed_rate_schedule(l).unwrap())
            .collect();
        build_rent_roll(&schedules)
    }

    // --- Ledger ---

    #[test]
    fn test_record_yearly_expense() {
        let utilities = ExpenseRecord::new("Utilities", dec!(2300), 2019, 12);
        assert_eq!(utilities.yearly_expense, dec!(27600));
    }

    #[test]
    fn test_ledger_with_expense_returns_new_ledger() {
        let empty = ExpenseLedger::new();
        let one = empty.with_expense(ExpenseRecord::new("Tax", dec!(2300), 2019, 1));
        let two = one.with_expense(ExpenseRecord::new("Insurance", dec!(2300), 2019, 1));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(two.records()[0].name, "Tax");
        assert_eq!(two.records()[1].name, "Insurance");
        assert_eq!(two.total(), dec!(4600));
    }

    #[test]
    fn test_ledger_total_for_year() {
        let ledger: ExpenseLedger = vec![
            ExpenseRecord::new("Tax", dec!(2300), 2019, 1),
            ExpenseRecord::new("Tax", dec!(2400), 2020, 1),
            ExpenseRecord::new("Utilities", dec!(100), 2019, 12),
        ]
        .into_iter()
        .collect();
        assert_eq!(ledger.total_for_year(2019), dec!(3500));
        assert_eq!(ledger.total_for_year(2020), dec!(2400));
        assert_eq!(ledger.total_for_year(2021), Decimal::ZERO);
    }

    // --- Allocation ---

    #[test]
    fn test_nnn_share_of_base_year_expenses() {
        let roll = roll_of(&[lease("A", dec!(1000), ExpenseType::TripleNet, d(2019, 1, 1))]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        let jan_2019 = &rows[0];
        assert_eq!(jan_2019.prorata_share, dec!(0.1));
        assert_eq!(jan_2019.expense_amount, dec!(1200));
    }

    #[test]
    fn test_nnn_escalates_with_calendar_year() {
        let roll = roll_of(&[lease("A", dec!(1000), ExpenseType::TripleNet, d(2019, 1, 1))]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        let y2020 = rows.iter().find(|r| r.month == d(2020, 1, 31)).unwrap();
        let y2021 = rows.iter().find(|r| r.month == d(2021, 1, 31)).unwrap();
        assert_eq!(y2020.expense_amount, dec!(1320));
        assert_eq!(y2021.expense_amount, dec!(1452));
    }

    #[test]
    fn test_nnn_discounts_years_before_expense_year() {
        let roll = roll_of(&[lease("A", dec!(1000), ExpenseType::TripleNet, d(2018, 1, 1))]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        // 1200 / 1.1 = 1090.909... rounded up
        assert_eq!(rows[0].expense_amount, dec!(1090.91));
    }

    #[test]
    fn test_nnn_scales_linearly_with_area() {
        let roll = roll_of(&[
            lease("Small", dec!(1000), ExpenseType::TripleNet, d(2019, 1, 1)),
            lease("Large", dec!(2000), ExpenseType::TripleNet, d(2019, 1, 1)),
        ]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        for month in rows.chunks(2) {
            assert_eq!(month[0].month, month[1].month);
            assert_eq!(month[1].expense_amount, month[0].expense_amount * dec!(2));
        }
    }

    #[test]
    fn test_base_year_zero_in_start_year() {
        let roll = roll_of(&[lease("B", dec!(1000), ExpenseType::BaseYear, d(2019, 1, 1))]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        assert!(rows
            .iter()
            .filter(|r| r.month.year() == 2019)
            .all(|r| r.expense_amount.is_zero()));
    }

    #[test]
    fn test_base_year_bills_monthly_growth() {
        let roll = roll_of(&[lease("B", dec!(1000), ExpenseType::BaseYear, d(2019, 1, 1))]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        let y2020 = rows.iter().find(|r| r.month == d(2020, 6, 30)).unwrap();
        // 0.1 * (13200 - 12000) / 12 = 10
        assert_eq!(y2020.expense_amount, dec!(10));
        let y2021 = rows.iter().find(|r| r.month == d(2021, 6, 30)).unwrap();
        // 0.1 * (14520 - 12000) / 12 = 21
        assert_eq!(y2021.expense_amount, dec!(21));
    }

    #[test]
    fn test_gross_leases_pay_nothing() {
        let roll = roll_of(&[
            lease("C", dec!(1000), ExpenseType::FullService, d(2019, 1, 1)),
            lease("D", dec!(1000), ExpenseType::PlusUtilities, d(2019, 1, 1)),
        ]);
        let rows = allocate_expenses(&roll, &params()).unwrap();
        assert!(rows.iter().all(|r| r.expense_amount.is_zero()));
    }

    #[test]
    fn test_zero_building_area_error() {
        let mut p = params();
        p.building_area = Decimal::ZERO;
        let roll = roll_of(&[lease("A", dec!(1000), ExpenseType::TripleNet, d(2019, 1, 1))]);
        assert!(allocate_expenses(&roll, &p).is_err());
    }

    #[test]
    fn test_empty_roll_allocates_nothing() {
        let rows = allocate_expenses(&RentRoll::default(), &params()).unwrap();
        assert!(rows.is_empty());
    }

    // --- Single lease, single year ---

    #[test]
    fn test_lease_expense_for_year_base_year_credit() {
        let sched =
            fixed_rate_schedule(&lease("B", dec!(1000), ExpenseType::BaseYear, d(2021, 1, 1)))
                .unwrap();
        // Billing a year before the lease started produces a credit
        let amount = lease_expense_for_year(&sched.stats, &params(), 2020).unwrap();
        // 0.1 * (13200 - 14520) = -132
        assert_eq!(amount, dec!(-132));
    }

    #[test]
    fn test_lease_expense_for_year_nnn() {
        let sched =
            fixed_rate_schedule(&lease("A", dec!(2500), ExpenseType::TripleNet, d(2019, 1, 1)))
                .unwrap();
        let amount = lease_expense_for_year(&sched.stats, &params(), 2019).unwrap();
        assert_eq!(amount, dec!(3000));
    }

    // --- Envelope ---

    #[test]
    fn test_calculate_allocation_totals_expense_year_only() {
        let input = ExpenseAllocationInput {
            leases: vec![lease("A", dec!(1000), ExpenseType::TripleNet, d(2019, 1, 1))],
            expenses: vec![
                ExpenseItem {
                    name: "Tax".into(),
                    amount: dec!(6000),
                    frequency: 1,
                    year: 2019,
                },
                ExpenseItem {
                    name: "Insurance".into(),
                    amount: dec!(500),
                    frequency: 12,
                    year: 2019,
                },
                ExpenseItem {
                    name: "Tax".into(),
                    amount: dec!(7000),
                    frequency: 1,
                    year: 2020,
                },
            ],
            building_area: dec!(10000),
            growth_rate: dec!(0.10),
            expense_year: 2019,
        };
        let result = calculate_expense_allocation(&input).unwrap();
        assert_eq!(result.result.total_expenses, dec!(12000));
        assert_eq!(result.result.expenses.len(), 3);
        assert_eq!(result.result.rows[0].expense_amount, dec!(1200));
        assert!(result.warnings.iter().any(|w| w.contains("excluded")));
    }

    #[test]
    fn test_nnn_far_future_year_overflow_error() {
        let far = LeaseInput {
            end_date: d(4100, 12, 31),
            ..lease("Far", dec!(1000), ExpenseType::TripleNet, d(4100, 1, 1))
        };
        let mut p = params();
        p.growth_rate = dec!(0.03);
        let roll = roll_of(&[far]);
        assert!(matches!(
            allocate_expenses(&roll, &p),
            Err(ProformaError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_calculate_allocation_empty_ledger_warning() {
        let input = ExpenseAllocationInput {
            leases: vec![lease("A", dec!(1000), ExpenseType::TripleNet, d(2019, 1, 1))],
            expenses: vec![],
            building_area: dec!(10000),
            growth_rate: DEFAULT_GROWTH_RATE,
            expense_year: 2019,
        };
        let result = calculate_expense_allocation(&input).unwrap();
        assert_eq!(result.result.total_expenses, Decimal::ZERO);
        assert!(result.result.rows.iter().all(|r| r.expense_amount.is_zero()));
        assert!(result.warnings.iter().any(|w| w.contains("No expense records")));
    }

    #[test]
    fn test_calculate_allocation_oversized_tenant_warning() {
        let input = ExpenseAllocationInput {
            leases: vec![lease("A", dec!(20000), ExpenseType::TripleNet, d(2019, 1, 1))],
            expenses: vec![ExpenseItem {
                name: "Tax".into(),
                amount: dec!(1000),
                frequency: 1,
                year: 2019,
            }],
            building_area: dec!(10000),
            growth_rate: DEFAULT_GROWTH_RATE,
            expense_year: 2019,
        };
        let result = calculate_expense_allocation(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("occupies")));
    }

    #[test]
    fn test_default_growth_rate_applied_when_missing() {
        let json = r#"{
            "leases": [],
            "expenses": [{"name": "Tax", "amount": "2300", "year": 2019}],
            "building_area": "45000",
            "expense_year": 2019
        }"#;
        let input: ExpenseAllocationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.growth_rate, dec!(0.03));
        assert_eq!(input.expenses[0].frequency, 1);
    }
}
