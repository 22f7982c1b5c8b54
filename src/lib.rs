//! inspection-roster: complaint log → deduplicated, scored business roster, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
