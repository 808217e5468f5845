//! Donation allocation engine.
//!
//! Projects and donations hold capacity counters. An [`Allocator`] pass
//! matches the new capacity of one entity against the open entities of the
//! other kind, oldest first, through a [`Repository`].

pub use allocations::Allocation;
pub use allocator::Allocator;
pub use commands::{DonationNew, ProjectNew, ProjectUpdate, UserNew};
pub use donations::Donation;
pub use error::EngineError;
pub use fund::{Fund, FundKind};
pub use memory::MemoryRepository;
pub use ops::{Engine, EngineBuilder, FundingReportRow};
pub use projects::Project;
pub use repository::{Repository, SeaRepository};
pub use users::User;

pub mod allocations;
mod allocator;
mod commands;
pub mod donations;
mod error;
mod fund;
mod memory;
mod ops;
pub mod projects;
mod repository;
pub mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
