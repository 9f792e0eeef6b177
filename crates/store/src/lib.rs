//! In-memory store backend — useful for testing and ephemeral sessions.
//!
//! Implements the `taskbrief-core` store traits over plain `RwLock`'d
//! collections. Persistent database-backed stores are external
//! collaborators and out of scope; this backend exists so the pipeline
//! and its degraded paths can be exercised without one.

mod in_memory;

pub use in_memory::{FailPoint, InMemoryStore};
