pub mod financing;
pub mod leasing;
