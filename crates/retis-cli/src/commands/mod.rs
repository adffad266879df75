pub mod check;
pub mod crossings;
