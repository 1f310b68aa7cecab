pub mod error;
pub mod fetcher;
pub mod naming;
pub mod transport;
