//! Infrastructure adapters. Implement outbound ports.
//!
//! SQLite/in-memory stores, CSV import, terminal UI. Map errors to DomainError.

pub mod import;
pub mod persistence;
pub mod ui;
