use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use proforma_core::financing::amortization::{self, LoanInput};
use proforma_core::leasing::expenses::{self, ExpenseAllocationInput};
use proforma_core::leasing::lease::{self, LeaseInput};
use proforma_core::leasing::rent_roll::{self as roll, RentRollInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Leasing
// ---------------------------------------------------------------------------

#[napi]
pub fn lease_schedule(input_json: String) -> NapiResult<String> {
    let input: LeaseInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lease::build_lease_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rent_roll(input_json: String) -> NapiResult<String> {
    let input: RentRollInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = roll::rent_roll(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn expense_allocation(input_json: String) -> NapiResult<String> {
    let input: ExpenseAllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = expenses::calculate_expense_allocation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_table(input_json: String) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortization_table(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct CompareLoansInput {
    loans: Vec<LoanInput>,
}

/// Takes `{"loans": [...]}`.
#[napi]
pub fn compare_loans(input_json: String) -> NapiResult<String> {
    let input: CompareLoansInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::compare_loans(&input.loans).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
