pub mod expense_type;
pub mod expenses;
pub mod lease;
pub mod rent_roll;

pub use expense_type::ExpenseType;
