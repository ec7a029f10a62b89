use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProformaError;

/// How a tenant reimburses the landlord for building operating expenses.
///
/// Serialized with the labels used on rent rolls ("NNN", "BASE YEAR", ...).
/// Any other label is rejected when parsed or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpenseType {
    /// Triple net: tenant pays its full pro-rata share every year
    TripleNet,
    /// Tenant pays only the growth above its base-year expenses
    BaseYear,
    /// Landlord absorbs all operating expenses
    FullService,
    /// Gross rent plus separately metered utilities
    PlusUtilities,
}

impl ExpenseType {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseType::TripleNet => "NNN",
            ExpenseType::BaseYear => "BASE YEAR",
            ExpenseType::FullService => "FULL SERVICE",
            ExpenseType::PlusUtilities => "PLUS UTILITIES",
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpenseType {
    type Err = ProformaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NNN" => Ok(ExpenseType::TripleNet),
            "BASE YEAR" => Ok(ExpenseType::BaseYear),
            "FULL SERVICE" => Ok(ExpenseType::FullService),
            "PLUS UTILITIES" => Ok(ExpenseType::PlusUtilities),
            _ => Err(ProformaError::UnknownExpenseType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExpenseType {
    type Error = ProformaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExpenseType> for String {
    fn from(value: ExpenseType) -> Self {
        value.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("NNN".parse::<ExpenseType>().unwrap(), ExpenseType::TripleNet);
        assert_eq!(" base year ".parse::<ExpenseType>().unwrap(), ExpenseType::BaseYear);
        assert_eq!("Full Service".parse::<ExpenseType>().unwrap(), ExpenseType::FullService);
        assert_eq!("PLUS UTILITIES".parse::<ExpenseType>().unwrap(), ExpenseType::PlusUtilities);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "GROSS".parse::<ExpenseType>().unwrap_err();
        assert!(matches!(err, ProformaError::UnknownExpenseType(ref s) if s == "GROSS"));
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ExpenseType::BaseYear).unwrap();
        assert_eq!(json, "\"BASE YEAR\"");
        let parsed: ExpenseType = serde_json::from_str("\"NNN\"").unwrap();
        assert_eq!(parsed, ExpenseType::TripleNet);
    }

    #[test]
    fn test_serde_rejects_unknown_label() {
        let err = serde_json::from_str::<ExpenseType>("\"MODIFIED GROSS\"").unwrap_err();
        assert!(err.to_string().contains("Unknown expense type"));
    }
}
