//! # taskbrief Core
//!
//! Domain types, traits, and error definitions for the taskbrief context
//! assembly pipeline. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (persistent store, change log, refresh
//! trigger) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with in-memory/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod entity;
pub mod error;
pub mod policy;
pub mod record;
pub mod role;
pub mod session;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use entity::{Project, ScopeLevel, Task, WorkGroup};
pub use error::{Error, Result, StoreError};
pub use policy::{EnforcementLevel, PolicyRule};
pub use record::{ContextRecord, Dimension, Field, FieldKind, SixDimensions};
pub use role::RoleAssignment;
pub use session::{SessionSummary, SummaryKind};
pub use store::{ChangeLog, ContextStore};
