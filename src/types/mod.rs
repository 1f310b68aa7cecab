pub mod interval;
pub mod raw_file;
pub mod record;
pub mod station;
