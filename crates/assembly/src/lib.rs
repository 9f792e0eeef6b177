//! The taskbrief assembly pipeline.
//!
//! Turns a task id into a complete, quality-scored briefing payload:
//!
//! 1. **Merge** the six-dimension context recorded at project,
//!    work-group, and task scope — most specific wins per field
//! 2. **Score** the merged record against external facts, file
//!    coverage, and freshness
//! 3. **Enrich** with role SOP text and recent session summaries
//! 4. **Filter** auxiliary material down to the assigned role's
//!    capabilities
//! 5. **Govern** with the project's applicable policy rules
//!
//! The [`staleness`] module watches assembled records age and re-runs
//! the pipeline when they drift out of date.

pub mod amalgams;
pub mod cache;
pub mod merge;
pub mod orchestrator;
pub mod payload;
pub mod role_filter;
pub mod rules;
pub mod scoring;
pub mod sop;
pub mod staleness;
pub mod temporal;

pub use cache::PayloadCache;
pub use merge::{ContextMerger, Provenance};
pub use orchestrator::Orchestrator;
pub use payload::{AssemblyMetadata, ContextPayload};
pub use role_filter::RoleFilter;
pub use scoring::{Band, ConfidenceScore, SubScores};
pub use sop::SopLoader;
pub use staleness::{
    AutoRefreshOptions, RefreshFailure, RefreshReport, RefreshService, RefreshTrigger,
    StalePriority, StalenessOptions, StalenessRecord,
};
pub use temporal::TemporalLoader;
