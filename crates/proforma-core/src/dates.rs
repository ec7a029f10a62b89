//! Calendar helpers for month-indexed schedules.
//!
//! Schedules are indexed by the last calendar day of each month, so most of
//! the work here is moving between month starts and month ends.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ProformaError;
use crate::ProformaResult;

/// Average Gregorian month length in days (365.2425 / 12).
const AVERAGE_MONTH_DAYS: Decimal = dec!(30.436875);

/// First calendar day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month
    date.with_day(1).unwrap_or(date)
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> ProformaResult<NaiveDate> {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| ProformaError::DateError(format!("No month end representable after {date}")))
}

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> ProformaResult<u32> {
    Ok(month_end(date)?.day())
}

/// True when both dates fall in the same calendar month of the same year.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Month-end dates for every calendar month touched by `[start, end]`.
pub fn month_ends_between(start: NaiveDate, end: NaiveDate) -> ProformaResult<Vec<NaiveDate>> {
    let mut months = Vec::new();
    if end < start {
        return Ok(months);
    }

    let mut cursor = month_start(start);
    while cursor <= end {
        months.push(month_end(cursor)?);
        cursor = cursor
            .checked_add_months(Months::new(1))
            .ok_or_else(|| ProformaError::DateError(format!("Cannot advance past {cursor}")))?;
    }
    Ok(months)
}

/// Add whole calendar months, clamping to the end of shorter months.
pub fn add_months(date: NaiveDate, months: u32) -> ProformaResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ProformaError::DateError(format!("Cannot add {months} months to {date}")))
}

/// Term length in whole months, measured in average-length months and
/// rounded to the nearest integer.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days().max(0);
    let months = (Decimal::from(days) / AVERAGE_MONTH_DAYS).round();
    months.to_u32().unwrap_or(u32::MAX)
}

/// Last day of the calendar year containing `date`.
pub fn year_end(date: NaiveDate) -> ProformaResult<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), 12, 31)
        .ok_or_else(|| ProformaError::DateError(format!("No year end for {date}")))
}

/// First day of the calendar year following `date`.
pub fn next_year_start(date: NaiveDate) -> ProformaResult<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        .ok_or_else(|| ProformaError::DateError(format!("No year after {date}")))
}
