pub mod descriptions;
pub mod error;
pub mod search;
