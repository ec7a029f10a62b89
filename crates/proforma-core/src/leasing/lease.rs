//! Lease schedule builder.
//!
//! Turns one lease's terms into a month-by-month rent table indexed by
//! month end, prorating the first and last months by occupied days. Leases
//! with an annual increase are built as one fixed-rate segment per calendar
//! year and stitched back together.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::dates;
use crate::error::ProformaError;
use crate::leasing::ExpenseType;
use crate::types::{
    round_to_cent, round_up_to_cent, with_metadata, Area, ComputationOutput, Money, Rate,
};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Terms of a single tenant's lease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseInput {
    /// First day of the lease (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the lease (inclusive)
    pub end_date: NaiveDate,
    pub tenant_name: String,
    pub suite: String,
    /// Annual rent per unit of area (e.g. $/sf/yr)
    pub rental_rate: Money,
    /// Leased area
    pub occupied_area: Area,
    /// Expense reimbursement structure
    pub expense_type: ExpenseType,
    /// Annual rate increase applied every January 1 (e.g. 0.03 = 3%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_increase: Option<Rate>,
}

/// One tenant-month of rent. Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Last calendar day of the month
    pub month: NaiveDate,
    pub tenant_name: String,
    pub suite: String,
    pub occupied_area: Area,
    pub rental_rate: Money,
    /// Rent for a fully occupied month, rounded up to the cent
    pub full_month_rent: Money,
    pub is_first_month: bool,
    pub is_last_month: bool,
    /// Occupied days in the first/last month; zero for interior months
    pub partial_days: u32,
    /// Rent actually due this month
    pub collected_rent: Money,
    pub expense_type: ExpenseType,
    /// Calendar year the lease started (expense base year)
    pub start_year: i32,
}

/// Summary statistics over the whole lease term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tenant_name: String,
    pub suite: String,
    /// Contract rate, or the average rate over the term when escalating
    pub rental_rate: Money,
    pub occupied_area: Area,
    /// Sum of collected rent across the term
    pub total_lease_value: Money,
    pub months_in_lease: u32,
    pub expense_type: ExpenseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_increase: Option<Rate>,
}

/// Monthly rent table plus summary for one lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseSchedule {
    pub rows: Vec<ScheduleRow>,
    pub stats: LeaseStats,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a lease's monthly rent schedule, escalating the rate every calendar
/// year when `annual_increase` is set.
pub fn build_lease_schedule(
    input: &LeaseInput,
) -> ProformaResult<ComputationOutput<LeaseSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (schedule, methodology) = match input.annual_increase {
        Some(increase) => (
            escalating_schedule(input, increase)?,
            "Escalating Lease Schedule (rate reset each January 1)",
        ),
        None => (fixed_rate_schedule(input)?, "Fixed Rate Lease Schedule"),
    };

    if input.rental_rate.is_zero() {
        warnings.push(format!(
            "Rental rate for {} is zero; schedule collects no rent",
            input.tenant_name
        ));
    }
    if let Some(increase) = input.annual_increase {
        if increase < Decimal::ZERO {
            warnings.push(format!(
                "Annual increase {increase} is negative; rent declines each year"
            ));
        }
    }
    for w in &warnings {
        warn!(tenant = %input.tenant_name, "{w}");
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, schedule))
}

/// Schedule for a lease whose rate is fixed for the whole term.
pub fn fixed_rate_schedule(input: &LeaseInput) -> ProformaResult<LeaseSchedule> {
    validate_lease(input)?;

    let rows = segment_rows(input, input.rental_rate, input.start_date, input.end_date)?;
    let stats = summarize(input, input.rental_rate, None, &rows);

    debug!(
        tenant = %input.tenant_name,
        suite = %input.suite,
        months = rows.len(),
        total = %stats.total_lease_value,
        "built fixed rate lease schedule"
    );
    Ok(LeaseSchedule { rows, stats })
}

/// Schedule for a lease whose rate grows by `annual_increase` every
/// January 1. Each calendar year is built as its own segment, then the
/// first/last-month markers are recomputed against the real term.
pub fn escalating_schedule(
    input: &LeaseInput,
    annual_increase: Rate,
) -> ProformaResult<LeaseSchedule> {
    validate_lease(input)?;
    if annual_increase <= dec!(-1) {
        return Err(ProformaError::InvalidInput {
            field: "annual_increase".into(),
            reason: "Annual increase must be greater than -100%".into(),
        });
    }

    let growth = Decimal::ONE + annual_increase;
    let mut rate = input.rental_rate;
    let mut segment_start = input.start_date;
    let mut rows: Vec<ScheduleRow> = Vec::new();

    loop {
        let segment_end = dates::year_end(segment_start)?.min(input.end_date);
        rows.extend(segment_rows(input, rate, segment_start, segment_end)?);
        if segment_end >= input.end_date {
            break;
        }
        segment_start = dates::next_year_start(segment_start)?;
        rate *= growth;
    }

    rows.sort_by_key(|row| row.month);

    // A January 1 reset is not a partial month
    for row in &mut rows {
        let occ = occupancy(row.month, input.start_date, input.end_date);
        row.is_first_month = occ.is_first_month;
        row.is_last_month = occ.is_last_month;
        row.partial_days = occ.partial_days();
    }

    let average_rate = average_rate(&rows, input.occupied_area).unwrap_or(input.rental_rate);
    let stats = summarize(input, average_rate, Some(annual_increase), &rows);

    debug!(
        tenant = %input.tenant_name,
        suite = %input.suite,
        months = rows.len(),
        average_rate = %stats.rental_rate,
        total = %stats.total_lease_value,
        "built escalating lease schedule"
    );
    Ok(LeaseSchedule { rows, stats })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_lease(input: &LeaseInput) -> ProformaResult<()> {
    if input.end_date < input.start_date {
        return Err(ProformaError::InvalidRange {
            context: format!("lease {} suite {}", input.tenant_name, input.suite),
            start: input.start_date,
            end: input.end_date,
        });
    }

    if input.occupied_area <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "occupied_area".into(),
            reason: "Occupied area must be positive".into(),
        });
    }

    if input.rental_rate < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "rental_rate".into(),
            reason: "Rental rate cannot be negative".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Row construction
// ---------------------------------------------------------------------------

/// How a lease term overlaps one calendar month.
struct Occupancy {
    is_first_month: bool,
    is_last_month: bool,
    occupied_days: u32,
    days_in_month: u32,
}

impl Occupancy {
    fn is_partial(&self) -> bool {
        self.occupied_days < self.days_in_month
    }

    fn partial_days(&self) -> u32 {
        if self.is_first_month || self.is_last_month {
            self.occupied_days
        } else {
            0
        }
    }
}

/// `month_end` must be the last day of its month.
fn occupancy(month_end: NaiveDate, start: NaiveDate, end: NaiveDate) -> Occupancy {
    let first_day = dates::month_start(month_end).max(start);
    let last_day = month_end.min(end);
    let occupied_days = u32::try_from((last_day - first_day).num_days() + 1).unwrap_or(0);

    Occupancy {
        is_first_month: dates::same_month(month_end, start),
        is_last_month: dates::same_month(month_end, end),
        occupied_days,
        days_in_month: month_end.day(),
    }
}

fn segment_rows(
    input: &LeaseInput,
    rate: Money,
    start: NaiveDate,
    end: NaiveDate,
) -> ProformaResult<Vec<ScheduleRow>> {
    let full_month_rent = round_up_to_cent(input.occupied_area * rate / MONTHS_PER_YEAR);
    let start_year = input.start_date.year();

    let rows = dates::month_ends_between(start, end)?
        .into_iter()
        .map(|month| {
            let occ = occupancy(month, start, end);
            let collected_rent = if occ.is_partial() {
                round_to_cent(
                    full_month_rent * Decimal::from(occ.occupied_days)
                        / Decimal::from(occ.days_in_month),
                )
            } else {
                full_month_rent
            };

            ScheduleRow {
                month,
                tenant_name: input.tenant_name.clone(),
                suite: input.suite.clone(),
                occupied_area: input.occupied_area,
                rental_rate: round_to_cent(rate),
                full_month_rent,
                is_first_month: occ.is_first_month,
                is_last_month: occ.is_last_month,
                partial_days: occ.partial_days(),
                collected_rent,
                expense_type: input.expense_type,
                start_year,
            }
        })
        .collect();

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Mean full-month rent annualised back to a per-area rate.
fn average_rate(rows: &[ScheduleRow], area: Area) -> Option<Money> {
    if rows.is_empty() || area.is_zero() {
        return None;
    }
    let total: Money = rows.iter().map(|r| r.full_month_rent).sum();
    let mean = total / Decimal::from(rows.len() as u64);
    Some((mean * MONTHS_PER_YEAR / area).round_dp(4))
}

fn summarize(
    input: &LeaseInput,
    rental_rate: Money,
    annual_increase: Option<Rate>,
    rows: &[ScheduleRow],
) -> LeaseStats {
    LeaseStats {
        start_date: input.start_date,
        end_date: input.end_date,
        tenant_name: input.tenant_name.clone(),
        suite: input.suite.clone(),
        rental_rate,
        occupied_area: input.occupied_area,
        total_lease_value: rows.iter().map(|r| r.collected_rent).sum(),
        months_in_lease: dates::months_between(input.start_date, input.end_date),
        expense_type: input.expense_type,
        annual_increase,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
