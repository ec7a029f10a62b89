pub mod dates;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "leasing")]
pub mod leasing;

#[cfg(feature = "financing")]
pub mod financing;

pub use error::ProformaError;
pub use types::*;

/// Standard result type for all proforma operations
pub type ProformaResult<T> = Result<T, ProformaError>;
