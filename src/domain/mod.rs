//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod aggregation;
pub mod entities;
pub mod errors;
pub mod intake;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod similarity;

pub use entities::{
    BusinessAggregate, BusinessRecord, ComplaintRecord, ComplaintStatus, Location,
    RefreshSummary, StatusCounts,
};
pub use errors::DomainError;
pub use intake::ComplaintDraft;
