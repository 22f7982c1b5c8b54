//! Application use cases. Orchestrate domain logic via ports.

pub mod intake_service;
pub mod persistence_sync;
pub mod refresh_scheduler;
pub mod roster_service;

pub use intake_service::IntakeService;
pub use persistence_sync::PersistenceSync;
pub use refresh_scheduler::RefreshScheduler;
pub use roster_service::RosterService;
