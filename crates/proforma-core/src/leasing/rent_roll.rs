use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::leasing::lease::{build_lease_schedule, LeaseInput, LeaseSchedule, ScheduleRow};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ProformaResult;

/// Leases that make up a property's rent roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentRollInput {
    pub leases: Vec<LeaseInput>,
}

/// Rent collected across all tenants in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRent {
    pub month: NaiveDate,
    pub months_rent: Money,
    /// Number of leases with a row in this month
    pub lease_count: u32,
    pub year: i32,
}

/// Rent collected across all tenants in one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRent {
    pub year: i32,
    pub years_rent: Money,
}

/// Property-level rent tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentRoll {
    /// Every tenant-month row, sorted by month
    pub full: Vec<ScheduleRow>,
    pub monthly: Vec<MonthlyRent>,
    pub yearly: Vec<YearlyRent>,
}

/// Merge lease schedules into full, monthly and yearly rent tables.
///
/// Rows from the same month keep the order of `schedules`.
pub fn build_rent_roll(schedules: &[LeaseSchedule]) -> RentRoll {
    let mut full: Vec<ScheduleRow> = schedules
        .iter()
        .flat_map(|s| s.rows.iter().cloned())
        .collect();
    full.sort_by_key(|row| row.month);

    let mut by_month: BTreeMap<NaiveDate, (Money, u32)> = BTreeMap::new();
    for row in &full {
        let entry = by_month.entry(row.month).or_insert((Decimal::ZERO, 0));
        entry.0 += row.collected_rent;
        entry.1 += 1;
    }

    let monthly: Vec<MonthlyRent> = by_month
        .into_iter()
        .map(|(month, (months_rent, lease_count))| MonthlyRent {
            month,
            months_rent,
            lease_count,
            year: month.year(),
        })
        .collect();

    let mut by_year: BTreeMap<i32, Money> = BTreeMap::new();
    for m in &monthly {
        *by_year.entry(m.year).or_insert(Decimal::ZERO) += m.months_rent;
    }

    let yearly = by_year
        .into_iter()
        .map(|(year, years_rent)| YearlyRent { year, years_rent })
        .collect();

    RentRoll {
        full,
        monthly,
        yearly,
    }
}

/// Build every lease's schedule and aggregate them into a rent roll. The
/// first lease that fails aborts the whole roll.
pub fn rent_roll(input: &RentRollInput) -> ProformaResult<ComputationOutput<RentRoll>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut schedules = Vec::with_capacity(input.leases.len());
    for lease in &input.leases {
        let built = build_lease_schedule(lease)?;
        warnings.extend(built.warnings);
        schedules.push(built.result);
    }

    if schedules.is_empty() {
        warnings.push("No leases supplied; rent roll is empty".into());
    }

    for (i, a) in input.leases.iter().enumerate() {
        for b in &input.leases[i + 1..] {
            let overlaps = a.start_date <= b.end_date && b.start_date <= a.end_date;
            if a.suite == b.suite && overlaps {
                let msg = format!(
                    "Suite {} is leased to both {} and {} over overlapping terms",
                    a.suite, a.tenant_name, b.tenant_name
                );
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    let roll = build_rent_roll(&schedules);
    debug!(
        leases = schedules.len(),
        rows = roll.full.len(),
        months = roll.monthly.len(),
        years = roll.yearly.len(),
        "built rent roll"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent Roll Aggregation (monthly and calendar-year totals)",
        &serde_json::json!({
            "lease_count": input.leases.len(),
        }),
        warnings,
        elapsed,
        roll,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leasing::lease::fixed_rate_schedule;
    use crate::leasing::ExpenseType;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn lease(tenant: &str, suite: &str, start: NaiveDate, end: NaiveDate, rate: Money) -> LeaseInput {
        LeaseInput {
            start_date: start,
            end_date: end,
            tenant_name: tenant.into(),
            suite: suite.into(),
            rental_rate: rate,
            occupied_area: dec!(1200),
            expense_type: ExpenseType::TripleNet,
            annual_increase: None,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        let roll = build_rent_roll(&[]);
        assert_eq!(roll, RentRoll::default());
    }

    #[test]
    fn test_overlapping_leases_counted_per_month() {
        let a = fixed_rate_schedule(&lease("A", "1", d(2020, 1, 1), d(2020, 6, 30), dec!(12))).unwrap();
        let b = fixed_rate_schedule(&lease("B", "2", d(2020, 4, 1), d(2020, 12, 31), dec!(24))).unwrap();
        let roll = build_rent_roll(&[a, b]);

        assert_eq!(roll.full.len(), 6 + 9);
        assert_eq!(roll.monthly.len(), 12);

        let april = roll.monthly.iter().find(|m| m.month == d(2020, 4, 30)).unwrap();
        assert_eq!(april.lease_count, 2);
        // 1200 * 12 / 12 + 1200 * 24 / 12
        assert_eq!(april.months_rent, dec!(3600));

        let jan = &roll.monthly[0];
        assert_eq!(jan.lease_count, 1);
        assert_eq!(jan.months_rent, dec!(1200));

        assert_eq!(roll.yearly.len(), 1);
        assert_eq!(roll.yearly[0].year, 2020);
        assert_eq!(roll.yearly[0].years_rent, dec!(1200) * dec!(6) + dec!(2400) * dec!(9));
    }

    #[test]
    fn test_full_rows_sorted_with_input_order_within_month() {
        let a = fixed_rate_schedule(&lease("A", "1", d(2020, 1, 1), d(2020, 3, 31), dec!(12))).unwrap();
        let b = fixed_rate_schedule(&lease("B", "2", d(2020, 1, 1), d(2020, 3, 31), dec!(12))).unwrap();
        let roll = build_rent_roll(&[a, b]);
        let tenants: Vec<&str> = roll.full.iter().map(|r| r.tenant_name.as_str()).collect();
        assert_eq!(tenants, vec!["A", "B", "A", "B", "A", "B"]);
    }

    #[test]
    fn test_rent_roll_propagates_first_error() {
        let input = RentRollInput {
            leases: vec![
                lease("A", "1", d(2020, 1, 1), d(2020, 6, 30), dec!(12)),
                lease("B", "2", d(2020, 6, 1), d(2020, 1, 1), dec!(12)),
            ],
        };
        assert!(rent_roll(&input).is_err());
    }

    #[test]
    fn test_duplicate_suite_warning() {
        let input = RentRollInput {
            leases: vec![
                lease("A", "1", d(2020, 1, 1), d(2020, 6, 30), dec!(12)),
                lease("B", "1", d(2020, 6, 1), d(2020, 12, 31), dec!(12)),
            ],
        };
        let result = rent_roll(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("Suite 1")));
    }

    #[test]
    fn test_back_to_back_tenants_in_same_suite_no_warning() {
        let input = RentRollInput {
            leases: vec![
                lease("A", "1", d(2020, 1, 1), d(2020, 6, 30), dec!(12)),
                lease("B", "1", d(2020, 7, 1), d(2020, 12, 31), dec!(12)),
            ],
        };
        let result = rent_roll(&input).unwrap();
        assert!(result.warnings.is_empty());
        assert_eq!(result.result.monthly.len(), 12);
        assert!(result.result.monthly.iter().all(|m| m.lease_count == 1));
    }
}
