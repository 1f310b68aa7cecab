pub mod archival;
pub mod error;
pub mod schema;
