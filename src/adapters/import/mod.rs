//! Import adapters. Load complaint submissions from files.

pub mod csv_import;

pub use csv_import::{parse_complaints_csv, read_complaints_csv};
